// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when fetching or parsing RSS feeds
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Invalid feed URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to fetch feed from {url}: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Fetching {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("Failed to parse RSS feed: {0}")]
    Parse(String),
}

/// Errors raised by a podcast store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read library file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write library file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse library JSON in {path}: {source}")]
    JsonParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize library: {0}")]
    JsonSerializeFailed(#[from] serde_json::Error),

    #[error("Episode '{guid}' has no owning podcast id")]
    MissingPodcastId { guid: String },

    #[error("No podcast with id {0}")]
    UnknownPodcast(i64),
}

/// Errors that can occur when querying a podcast directory
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid search URL: {0}")]
    InvalidQuery(#[from] url::ParseError),

    #[error("Search request failed: {0}")]
    FetchFailed(#[source] reqwest::Error),

    #[error("Search returned HTTP error {0}")]
    HttpStatus(u16),

    #[error("Failed to parse search response: {0}")]
    JsonParseFailed(#[from] serde_json::Error),
}

/// Top-level errors for sync operations
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Podcast {feed_url} has not been saved yet")]
    NotPersisted { feed_url: String },
}
