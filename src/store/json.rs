// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::model::{Episode, Podcast};

use super::PodcastStore;
use super::library::Library;

/// A store persisted as a single JSON file.
///
/// Every write replaces the file atomically: the library is written to a
/// `.partial` sibling first and renamed over the original.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    library: Mutex<Library>,
}

impl JsonStore {
    /// Open the library file at `path`, starting empty if it does not exist
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let library = match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| StoreError::JsonParseFailed {
                    path: path.clone(),
                    source: e,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Library::default(),
            Err(e) => return Err(StoreError::ReadFailed { path, source: e }),
        };

        Ok(Self {
            path,
            library: Mutex::new(library),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply a change to a copy of the library, persist it, then publish it
    async fn update<T>(
        &self,
        change: impl FnOnce(&mut Library) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut library = self.library.lock().await;

        let mut next = library.clone();
        let result = change(&mut next)?;
        self.persist(&next).await?;
        *library = next;

        Ok(result)
    }

    async fn persist(&self, library: &Library) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(library)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::WriteFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let mut partial = OsString::from(self.path.as_os_str());
        partial.push(".partial");
        let partial = PathBuf::from(partial);

        tokio::fs::write(&partial, json)
            .await
            .map_err(|e| StoreError::WriteFailed {
                path: partial.clone(),
                source: e,
            })?;

        tokio::fs::rename(&partial, &self.path)
            .await
            .map_err(|e| StoreError::WriteFailed {
                path: self.path.clone(),
                source: e,
            })
    }
}

#[async_trait]
impl PodcastStore for JsonStore {
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
        self.update(|library| Ok(library.upsert_podcast(podcast)))
            .await
    }

    async fn upsert_episode(&self, episode: &Episode) -> Result<i64, StoreError> {
        self.update(|library| library.upsert_episode(episode)).await
    }

    async fn upsert_episodes(&self, episodes: &[Episode]) -> Result<Vec<i64>, StoreError> {
        self.update(|library| library.upsert_episodes(episodes))
            .await
    }

    async fn delete_podcast(&self, podcast: &Podcast) -> Result<bool, StoreError> {
        self.update(|library| Ok(library.delete_podcast(podcast)))
            .await
    }
}
