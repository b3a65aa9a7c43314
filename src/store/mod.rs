// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Persistence boundary for podcasts and episodes.
//!
//! Stores own durability only; deciding which episodes are new happens in
//! [`crate::reconcile`].

mod json;
mod library;
mod memory;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{Episode, Podcast};

pub use json::JsonStore;
pub use memory::MemoryStore;

/// Query contract of a podcast store
#[async_trait]
pub trait PodcastStore: Send + Sync {
    /// All saved podcasts ordered by title, without episodes attached
    async fn load_all_podcasts(&self) -> Result<Vec<Podcast>, StoreError>;

    /// The saved podcast with the given feed URL, without episodes attached
    async fn load_podcast_by_url(&self, url: &str) -> Result<Option<Podcast>, StoreError>;

    /// Episodes of a saved podcast, newest first
    async fn load_episodes(&self, podcast_id: i64) -> Result<Vec<Episode>, StoreError>;

    /// Insert or replace a podcast, returning its id
    async fn upsert_podcast(&self, podcast: &Podcast) -> Result<i64, StoreError>;

    /// Insert or replace an episode of a saved podcast, returning its row id
    async fn upsert_episode(&self, episode: &Episode) -> Result<i64, StoreError>;

    /// Insert or replace several episodes, returning their row ids in order.
    ///
    /// Stores that write through to disk persist the whole batch at once.
    async fn upsert_episodes(&self, episodes: &[Episode]) -> Result<Vec<i64>, StoreError> {
        let mut ids = Vec::with_capacity(episodes.len());
        for episode in episodes {
            ids.push(self.upsert_episode(episode).await?);
        }
        Ok(ids)
    }

    /// Delete a podcast together with its episodes.
    ///
    /// Returns `false` if the podcast was not saved.
    async fn delete_podcast(&self, podcast: &Podcast) -> Result<bool, StoreError>;
}
