// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod dates;
pub mod error;
pub mod feed;
pub mod http;
pub mod model;
pub mod progress;
pub mod reconcile;
pub mod search;
pub mod store;
pub mod sync;

// Re-export main types for convenience
pub use error::{FeedError, SearchError, StoreError, SyncError};
pub use feed::{FeedClient, RawEpisode, RawFeedDocument, parse_feed};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use model::{Episode, Podcast, UpdateSummary};
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter};
pub use reconcile::{EpisodeReconciler, new_episodes};
pub use search::{ItunesSearch, PodcastSummary, SearchProvider};
pub use store::{JsonStore, MemoryStore, PodcastStore};
pub use sync::{SyncCoordinator, SyncOptions};
