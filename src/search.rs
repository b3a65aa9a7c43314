// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::dates::short_date_or_dash;
use crate::error::SearchError;
use crate::http::HttpClient;

/// Default endpoint of the iTunes search API
pub const ITUNES_SEARCH_URL: &str = "https://itunes.apple.com/search";

/// A podcast as listed by a directory search
#[derive(Debug, Clone, PartialEq)]
pub struct PodcastSummary {
    pub name: String,
    pub artwork_url: String,
    /// Release date as reported by the directory, usually ISO-8601
    pub release_date: Option<String>,
    pub feed_url: String,
}

impl PodcastSummary {
    /// Release date as `MM/DD/YY`, or `-` when unknown or unparseable
    pub fn last_updated_display(&self) -> String {
        short_date_or_dash(self.release_date.as_deref())
    }
}

/// A directory that can be searched for podcasts by term
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, term: &str) -> Result<Vec<PodcastSummary>, SearchError>;
}

#[derive(Debug, Deserialize)]
struct ItunesResponse {
    #[serde(default)]
    results: Vec<ItunesResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItunesResult {
    #[serde(default)]
    collection_censored_name: Option<String>,
    #[serde(default, rename = "artworkUrl100")]
    artwork_url_100: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    feed_url: Option<String>,
}

impl ItunesResult {
    /// Results without a feed cannot be subscribed to and are dropped
    fn into_summary(self) -> Option<PodcastSummary> {
        let feed_url = self.feed_url.filter(|url| !url.trim().is_empty())?;

        Some(PodcastSummary {
            name: self.collection_censored_name.unwrap_or_default(),
            artwork_url: self.artwork_url_100.unwrap_or_default(),
            release_date: self.release_date,
            feed_url,
        })
    }
}

/// Podcast search backed by the iTunes directory
pub struct ItunesSearch<C> {
    client: C,
    base_url: String,
}

impl<C: HttpClient> ItunesSearch<C> {
    pub fn new(client: C) -> Self {
        Self::with_base_url(client, ITUNES_SEARCH_URL)
    }

    /// Point the search at a different endpoint
    pub fn with_base_url(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn query_url(&self, term: &str) -> Result<Url, SearchError> {
        Ok(Url::parse_with_params(
            &self.base_url,
            &[("media", "podcast"), ("term", term)],
        )?)
    }
}

#[async_trait]
impl<C: HttpClient> SearchProvider for ItunesSearch<C> {
    async fn search(&self, term: &str) -> Result<Vec<PodcastSummary>, SearchError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.query_url(term)?;
        tracing::debug!(url = %url, "Searching podcasts");

        let response = self
            .client
            .get(url.as_str())
            .await
            .map_err(SearchError::FetchFailed)?;

        if !response.is_success() {
            return Err(SearchError::HttpStatus(response.status));
        }

        let parsed: ItunesResponse = serde_json::from_slice(&response.body)?;

        Ok(parsed
            .results
            .into_iter()
            .filter_map(ItunesResult::into_summary)
            .collect())
    }
}
