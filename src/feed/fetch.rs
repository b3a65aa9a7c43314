// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::time::Duration;

use bytes::Bytes;
use url::Url;

use crate::error::FeedError;
use crate::http::HttpClient;

use super::parse::{RawFeedDocument, parse_feed};

/// Default upper bound for a single feed request
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches feed documents through an [`HttpClient`]
#[derive(Clone)]
pub struct FeedClient<C> {
    client: C,
    timeout: Duration,
}

impl<C: HttpClient> FeedClient<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Replace the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch raw feed bytes from a URL (without parsing).
    ///
    /// Transport failures, timeouts and non-2xx statuses are all errors.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Bytes, FeedError> {
        Url::parse(url).map_err(|e| FeedError::InvalidUrl {
            url: url.to_string(),
            source: e,
        })?;

        let response = tokio::time::timeout(self.timeout, self.client.get(url))
            .await
            .map_err(|_| FeedError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            })?
            .map_err(|e| FeedError::FetchFailed {
                url: url.to_string(),
                source: e,
            })?;

        if !response.is_success() {
            return Err(FeedError::HttpStatus {
                url: url.to_string(),
                status: response.status,
            });
        }

        Ok(response.body)
    }

    /// Fetch and parse a podcast feed
    pub async fn fetch(&self, url: &str) -> Result<RawFeedDocument, FeedError> {
        tracing::debug!(url = %url, "Fetching feed");
        let bytes = self.fetch_bytes(url).await?;
        let feed = parse_feed(&bytes)?;
        tracing::debug!(url = %url, items = feed.episodes.len(), "Parsed feed");
        Ok(feed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::http::HttpResponse;
    use async_trait::async_trait;

    const FEED: &str = r#"<rss><channel><title>Remote</title>
        <item><guid>1</guid></item>
        <item><guid>2</guid></item>
    </channel></rss>"#;

    struct MockHttpClient {
        status: u16,
        body: &'static str,
        delay: Duration,
    }

    impl MockHttpClient {
        fn ok(body: &'static str) -> Self {
            Self {
                status: 200,
                body,
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn get(&self, _url: &str) -> Result<HttpResponse, reqwest::Error> {
            tokio::time::sleep(self.delay).await;
            Ok(HttpResponse {
                status: self.status,
                body: Bytes::from_static(self.body.as_bytes()),
            })
        }
    }

    #[tokio::test]
    async fn fetch_parses_successful_response() {
        let client = FeedClient::new(MockHttpClient::ok(FEED));

        let feed = client.fetch("https://example.com/feed.xml").await.unwrap();

        assert_eq!(feed.title.as_deref(), Some("Remote"));
        assert_eq!(feed.episodes.len(), 2);
    }

    #[tokio::test]
    async fn fetch_rejects_non_success_status() {
        let client = FeedClient::new(MockHttpClient {
            status: 404,
            body: "Not Found",
            delay: Duration::ZERO,
        });

        let result = client.fetch("https://example.com/feed.xml").await;

        match result.unwrap_err() {
            FeedError::HttpStatus { status, .. } => assert_eq!(status, 404),
            other => panic!("Expected HttpStatus error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_reports_parse_failures() {
        let client = FeedClient::new(MockHttpClient::ok("<rss><channel>"));

        let result = client.fetch("https://example.com/feed.xml").await;

        assert!(matches!(result, Err(FeedError::Parse(_))));
    }

    #[tokio::test]
    async fn fetch_rejects_invalid_url() {
        let client = FeedClient::new(MockHttpClient::ok(FEED));

        let result = client.fetch("not a url").await;

        assert!(matches!(result, Err(FeedError::InvalidUrl { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_times_out() {
        let client = FeedClient::new(MockHttpClient {
            status: 200,
            body: FEED,
            delay: Duration::from_secs(60),
        })
        .with_timeout(Duration::from_secs(5));

        let result = client.fetch("https://example.com/feed.xml").await;

        match result.unwrap_err() {
            FeedError::Timeout { timeout, .. } => assert_eq!(timeout, Duration::from_secs(5)),
            other => panic!("Expected Timeout error, got {other:?}"),
        }
    }

    #[test]
    fn default_timeout_is_applied() {
        let client = FeedClient::new(MockHttpClient::ok(FEED));
        assert_eq!(client.timeout(), DEFAULT_FETCH_TIMEOUT);
    }
}
