// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::error::SyncError;
use crate::feed::{DEFAULT_FETCH_TIMEOUT, FeedClient};
use crate::http::HttpClient;
use crate::model::{Episode, Podcast, UpdateSummary};
use crate::progress::{ProgressEvent, SharedProgressReporter};
use crate::reconcile::EpisodeReconciler;
use crate::store::PodcastStore;

/// Options for podcast synchronization
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Maximum number of feeds fetched at the same time
    pub max_concurrent: usize,
    /// Upper bound for a single feed request
    pub fetch_timeout: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            max_concurrent: 8,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Keeps saved podcasts in sync with their feeds.
///
/// The HTTP client, store and progress reporter are all injected.
pub struct SyncCoordinator<C, S: ?Sized> {
    feeds: FeedClient<C>,
    store: Arc<S>,
    options: SyncOptions,
    reporter: SharedProgressReporter,
}

impl<C: HttpClient, S: PodcastStore + ?Sized> SyncCoordinator<C, S> {
    pub fn new(
        client: C,
        store: Arc<S>,
        options: SyncOptions,
        reporter: SharedProgressReporter,
    ) -> Self {
        let feeds = FeedClient::new(client).with_timeout(options.fetch_timeout);

        Self {
            feeds,
            store,
            options,
            reporter,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Refresh every saved podcast and save new episodes.
    ///
    /// The podcast list is read once up front; podcasts added or removed
    /// while the refresh runs are not considered. Feeds are processed
    /// concurrently (at most `max_concurrent` at a time) and independently:
    /// a failing feed is logged and skipped. Only podcasts with at least one
    /// new episode appear in the result, in completion order.
    pub async fn refresh_all(&self) -> Result<Vec<UpdateSummary>, SyncError> {
        let podcasts = self.store.load_all_podcasts().await?;
        let total = podcasts.len();

        self.reporter.report(ProgressEvent::RefreshStarted { total });

        if podcasts.is_empty() {
            self.reporter.report(ProgressEvent::RefreshCompleted {
                updated_podcasts: 0,
                new_episodes: 0,
                failed_count: 0,
            });
            return Ok(Vec::new());
        }

        let done = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);

        let outcomes: Vec<Option<UpdateSummary>> = stream::iter(podcasts)
            .map(|podcast| {
                let done = &done;
                let failed = &failed;

                async move {
                    let outcome = self.refresh_podcast(&podcast).await;

                    let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
                    self.reporter.report(ProgressEvent::RefreshProgress {
                        done: finished,
                        total,
                    });

                    match outcome {
                        Ok(new_episodes) if new_episodes.is_empty() => None,
                        Ok(new_episodes) => Some(UpdateSummary::new(&podcast, new_episodes)),
                        Err(e) => {
                            failed.fetch_add(1, Ordering::SeqCst);
                            tracing::warn!(
                                feed_url = %podcast.feed_url,
                                error = %e,
                                "Failed to refresh podcast"
                            );
                            self.reporter.report(ProgressEvent::FeedFailed {
                                url: podcast.feed_url.clone(),
                                error: e.to_string(),
                            });
                            None
                        }
                    }
                }
            })
            .buffer_unordered(self.options.max_concurrent.max(1))
            .collect()
            .await;

        let summaries: Vec<UpdateSummary> = outcomes.into_iter().flatten().collect();
        let new_episodes: usize = summaries.iter().map(|s| s.new_count).sum();
        let failed_count = failed.load(Ordering::SeqCst);

        tracing::info!(
            podcasts = total,
            updated = summaries.len(),
            new_episodes = new_episodes,
            failed = failed_count,
            "Refresh finished"
        );

        self.reporter.report(ProgressEvent::RefreshCompleted {
            updated_podcasts: summaries.len(),
            new_episodes,
            failed_count,
        });

        Ok(summaries)
    }

    /// Callback form of [`refresh_all`](Self::refresh_all).
    ///
    /// `on_complete` runs exactly once, after every podcast has been
    /// processed. If the podcast list cannot be read it receives an empty
    /// list.
    pub async fn refresh_all_with<F>(&self, on_complete: F)
    where
        F: FnOnce(Vec<UpdateSummary>),
    {
        let summaries = self.refresh_all().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load podcasts for refresh");
            Vec::new()
        });
        on_complete(summaries);
    }

    /// Fetch, reconcile and save one podcast's feed
    async fn refresh_podcast(&self, podcast: &Podcast) -> Result<Vec<Episode>, SyncError> {
        self.reporter.report(ProgressEvent::FetchingFeed {
            url: podcast.feed_url.clone(),
        });

        let feed = self.feeds.fetch(&podcast.feed_url).await?;
        let total_episodes = feed.episodes.len();

        let new_episodes = EpisodeReconciler::new(&*self.store)
            .reconcile(podcast, feed)
            .await?;

        self.reporter.report(ProgressEvent::FeedReconciled {
            podcast_title: podcast.title.clone(),
            total_episodes,
            new_episodes: new_episodes.len(),
        });

        Ok(new_episodes)
    }

    /// Look up a podcast, preferring the store over the network.
    ///
    /// A saved podcast is returned with its episodes attached. Otherwise the
    /// feed is fetched and converted but not saved; a failed fetch yields
    /// `None`.
    pub async fn get_podcast(&self, feed_url: &str) -> Result<Option<Podcast>, SyncError> {
        if let Some(mut podcast) = self.store.load_podcast_by_url(feed_url).await? {
            if let Some(id) = podcast.id {
                podcast.episodes = self.store.load_episodes(id).await?;
            }
            return Ok(Some(podcast));
        }

        match self.feeds.fetch(feed_url).await {
            Ok(feed) => Ok(Some(Podcast::from_feed(feed_url, "", feed))),
            Err(e) => {
                tracing::warn!(feed_url = %feed_url, error = %e, "Failed to fetch podcast");
                Ok(None)
            }
        }
    }

    /// Save a podcast and all of its episodes.
    ///
    /// Returns the podcast with its id and the episodes' owning id assigned.
    pub async fn subscribe(&self, mut podcast: Podcast) -> Result<Podcast, SyncError> {
        let id = self.store.upsert_podcast(&podcast).await?;
        podcast.id = Some(id);

        for episode in &mut podcast.episodes {
            episode.podcast_id = Some(id);
        }
        self.store.upsert_episodes(&podcast.episodes).await?;

        tracing::info!(
            feed_url = %podcast.feed_url,
            id = id,
            episodes = podcast.episodes.len(),
            "Subscribed to podcast"
        );

        Ok(podcast)
    }

    /// Delete a saved podcast; `false` if it was not saved
    pub async fn unsubscribe(&self, feed_url: &str) -> Result<bool, SyncError> {
        let Some(podcast) = self.store.load_podcast_by_url(feed_url).await? else {
            return Ok(false);
        };

        let deleted = self.store.delete_podcast(&podcast).await?;
        if deleted {
            tracing::info!(feed_url = %feed_url, "Unsubscribed from podcast");
        }
        Ok(deleted)
    }

    /// All saved podcasts, ordered by title
    pub async fn podcasts(&self) -> Result<Vec<Podcast>, SyncError> {
        Ok(self.store.load_all_podcasts().await?)
    }
}
