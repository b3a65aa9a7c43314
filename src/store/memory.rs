// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::model::{Episode, Podcast};

use super::PodcastStore;
use super::library::Library;

/// A store that keeps everything in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    library: Mutex<Library>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PodcastStore for MemoryStore {
    async fn load_all_podcasts(&self) -> Result<Vec<Podcast>, StoreError> {
        Ok(self.library.lock().await.podcasts())
    }

    async fn load_podcast_by_url(&self, url: &str) -> Result<Option<Podcast>, StoreError> {
        Ok(self.library.lock().await.podcast_by_url(url))
    }

    async fn load_episodes(&self, podcast_id: i64) -> Result<Vec<Episode>, StoreError> {
        Ok(self.library.lock().await.episodes(podcast_id))
    }

    async fn upsert_podcast(&self, podcast: &Podcast) -> Result<i64, StoreError> {
        Ok(self.library.lock().await.upsert_podcast(podcast))
    }

    async fn upsert_episode(&self, episode: &Episode) -> Result<i64, StoreError> {
        self.library.lock().await.upsert_episode(episode)
    }

    async fn upsert_episodes(&self, episodes: &[Episode]) -> Result<Vec<i64>, StoreError> {
        self.library.lock().await.upsert_episodes(episodes)
    }

    async fn delete_podcast(&self, podcast: &Podcast) -> Result<bool, StoreError> {
        Ok(self.library.lock().await.delete_podcast(podcast))
    }
}
