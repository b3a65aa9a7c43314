// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashSet;

use crate::error::SyncError;
use crate::feed::RawFeedDocument;
use crate::model::{Episode, Podcast};
use crate::store::PodcastStore;

/// Select the remote episodes whose guid is not known locally.
///
/// Guids are compared as exact strings. Remote order is kept, and a remote
/// episode repeating an earlier remote guid is dropped.
pub fn new_episodes(local: &[Episode], remote: Vec<Episode>) -> Vec<Episode> {
    let mut seen: HashSet<String> = local.iter().map(|e| e.guid.clone()).collect();

    remote
        .into_iter()
        .filter(|episode| seen.insert(episode.guid.clone()))
        .collect()
}

/// Merges a freshly fetched feed into the stored episodes of one podcast
pub struct EpisodeReconciler<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: PodcastStore + ?Sized> EpisodeReconciler<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Persist the episodes of `remote` that `local` does not have yet.
    ///
    /// Returns the saved episodes with their owning podcast id assigned.
    /// Episodes missing from the remote feed are left in place.
    pub async fn reconcile(
        &self,
        local: &Podcast,
        remote: RawFeedDocument,
    ) -> Result<Vec<Episode>, SyncError> {
        let podcast_id = local.id.ok_or_else(|| SyncError::NotPersisted {
            feed_url: local.feed_url.clone(),
        })?;

        let remote = Podcast::from_feed(&local.feed_url, &local.image_url, remote);
        let stored = self.store.load_episodes(podcast_id).await?;

        let mut fresh = new_episodes(&stored, remote.episodes);
        for episode in &mut fresh {
            episode.podcast_id = Some(podcast_id);
        }
        if !fresh.is_empty() {
            self.store.upsert_episodes(&fresh).await?;
        }

        tracing::debug!(
            feed_url = %local.feed_url,
            stored = stored.len(),
            new = fresh.len(),
            "Reconciled episodes"
        );

        Ok(fresh)
    }
}
