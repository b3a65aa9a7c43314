// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

/// Events emitted while refreshing podcasts, for progress reporting
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A refresh of `total` podcasts is starting
    RefreshStarted { total: usize },

    /// Feed is being fetched from URL
    FetchingFeed { url: String },

    /// Feed has been parsed and reconciled
    FeedReconciled {
        podcast_title: String,
        total_episodes: usize,
        new_episodes: usize,
    },

    /// A feed could not be refreshed; siblings continue
    FeedFailed { url: String, error: String },

    /// One more podcast finished, successfully or not
    RefreshProgress { done: usize, total: usize },

    /// All podcasts have been processed
    RefreshCompleted {
        updated_podcasts: usize,
        new_episodes: usize,
        failed_count: usize,
    },
}

/// Trait for reporting progress events during a refresh.
///
/// Implementations can use this to display progress bars, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {
        // Intentionally empty
    }
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}
