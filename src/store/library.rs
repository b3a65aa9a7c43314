// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::{Episode, Podcast};

/// The complete set of saved podcasts and episodes.
///
/// Shared by the store implementations; podcasts are kept without their
/// episode lists, episodes are kept as separate rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Library {
    #[serde(default)]
    last_podcast_id: i64,
    #[serde(default)]
    last_episode_id: i64,
    #[serde(default)]
    podcasts: Vec<Podcast>,
    #[serde(default)]
    episodes: Vec<EpisodeRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EpisodeRow {
    id: i64,
    #[serde(flatten)]
    episode: Episode,
}

impl Library {
    /// All podcasts ordered by title
    pub(crate) fn podcasts(&self) -> Vec<Podcast> {
        let mut podcasts = self.podcasts.clone();
        podcasts.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        podcasts
    }

    pub(crate) fn podcast_by_url(&self, url: &str) -> Option<Podcast> {
        self.podcasts.iter().find(|p| p.feed_url == url).cloned()
    }

    /// Episodes of one podcast, newest first
    pub(crate) fn episodes(&self, podcast_id: i64) -> Vec<Episode> {
        let mut episodes: Vec<Episode> = self
            .episodes
            .iter()
            .filter(|row| row.episode.podcast_id == Some(podcast_id))
            .map(|row| row.episode.clone())
            .collect();
        episodes.sort_by(|a, b| b.release_date.cmp(&a.release_date));
        episodes
    }

    /// Insert or replace a podcast, matched by id and then by feed URL.
    ///
    /// Replacing a podcast keeps its episodes.
    pub(crate) fn upsert_podcast(&mut self, podcast: &Podcast) -> i64 {
        let existing = podcast
            .id
            .and_then(|id| self.podcasts.iter().position(|p| p.id == Some(id)))
            .or_else(|| {
                self.podcasts
                    .iter()
                    .position(|p| p.feed_url == podcast.feed_url)
            });

        let mut row = podcast.clone();
        row.episodes.clear();

        match existing {
            Some(index) => {
                let id = self.podcasts[index].id.or(podcast.id).unwrap_or_default();
                row.id = Some(id);
                self.podcasts[index] = row;
                id
            }
            None => {
                let id = match podcast.id {
                    Some(id) => id,
                    None => self.last_podcast_id + 1,
                };
                self.last_podcast_id = self.last_podcast_id.max(id);
                row.id = Some(id);
                self.podcasts.push(row);
                id
            }
        }
    }

    /// Insert or replace an episode, matched by owning podcast and guid
    pub(crate) fn upsert_episode(&mut self, episode: &Episode) -> Result<i64, StoreError> {
        let podcast_id = self.owner_id(episode)?;

        if let Some(row) = self
            .episodes
            .iter_mut()
            .find(|row| row.episode.podcast_id == Some(podcast_id) && row.episode.guid == episode.guid)
        {
            row.episode = episode.clone();
            return Ok(row.id);
        }

        self.last_episode_id += 1;
        let id = self.last_episode_id;
        self.episodes.push(EpisodeRow {
            id,
            episode: episode.clone(),
        });
        Ok(id)
    }

    /// Insert or replace several episodes.
    ///
    /// Every owner is checked first, so a failing batch changes nothing.
    pub(crate) fn upsert_episodes(&mut self, episodes: &[Episode]) -> Result<Vec<i64>, StoreError> {
        for episode in episodes {
            self.owner_id(episode)?;
        }

        episodes
            .iter()
            .map(|episode| self.upsert_episode(episode))
            .collect()
    }

    fn owner_id(&self, episode: &Episode) -> Result<i64, StoreError> {
        let podcast_id = episode
            .podcast_id
            .ok_or_else(|| StoreError::MissingPodcastId {
                guid: episode.guid.clone(),
            })?;

        if !self.podcasts.iter().any(|p| p.id == Some(podcast_id)) {
            return Err(StoreError::UnknownPodcast(podcast_id));
        }
        Ok(podcast_id)
    }

    /// Remove a podcast and its episodes; `false` when it was not saved
    pub(crate) fn delete_podcast(&mut self, podcast: &Podcast) -> bool {
        let Some(index) = self.podcasts.iter().position(|p| match podcast.id {
            Some(id) => p.id == Some(id),
            None => p.feed_url == podcast.feed_url,
        }) else {
            return false;
        };

        let removed = self.podcasts.remove(index);
        self.episodes
            .retain(|row| row.episode.podcast_id != removed.id);
        true
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use chrono::{TimeZone, Utc};

    pub(crate) fn make_podcast(feed_url: &str, title: &str) -> Podcast {
        Podcast {
            id: None,
            feed_url: feed_url.to_string(),
            title: title.to_string(),
            description: String::new(),
            image_url: String::new(),
            last_updated: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            episodes: vec![],
        }
    }

    pub(crate) fn make_episode(podcast_id: Option<i64>, guid: &str, day: u32) -> Episode {
        Episode {
            guid: guid.to_string(),
            podcast_id,
            title: format!("Episode {guid}"),
            description: String::new(),
            media_url: format!("https://example.com/{guid}.mp3"),
            mime_type: "audio/mpeg".to_string(),
            release_date: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            duration: String::new(),
        }
    }

    #[test]
    fn upsert_assigns_increasing_ids() {
        let mut library = Library::default();

        let a = library.upsert_podcast(&make_podcast("https://a.example/feed", "A"));
        let b = library.upsert_podcast(&make_podcast("https://b.example/feed", "B"));

        assert_eq!(a, 1);
        assert_eq!(b, 2);
    }

    #[test]
    fn upsert_by_url_replaces_and_keeps_id() {
        let mut library = Library::default();
        let id = library.upsert_podcast(&make_podcast("https://a.example/feed", "Old"));

        let again = library.upsert_podcast(&make_podcast("https://a.example/feed", "New"));

        assert_eq!(id, again);
        let podcasts = library.podcasts();
        assert_eq!(podcasts.len(), 1);
        assert_eq!(podcasts[0].title, "New");
        assert_eq!(podcasts[0].id, Some(id));
    }

    #[test]
    fn podcasts_are_stored_without_episode_lists() {
        let mut library = Library::default();
        let mut podcast = make_podcast("https://a.example/feed", "A");
        podcast.episodes.push(make_episode(None, "x", 1));

        library.upsert_podcast(&podcast);

        assert!(library.podcasts()[0].episodes.is_empty());
    }

    #[test]
    fn podcasts_are_ordered_by_title() {
        let mut library = Library::default();
        library.upsert_podcast(&make_podcast("https://c.example/feed", "Charlie"));
        library.upsert_podcast(&make_podcast("https://a.example/feed", "Alpha"));
        library.upsert_podcast(&make_podcast("https://b.example/feed", "Bravo"));

        let titles: Vec<_> = library.podcasts().into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["Alpha", "Bravo", "Charlie"]);
    }

    #[test]
    fn episodes_are_newest_first_and_scoped_to_podcast() {
        let mut library = Library::default();
        let a = library.upsert_podcast(&make_podcast("https://a.example/feed", "A"));
        let b = library.upsert_podcast(&make_podcast("https://b.example/feed", "B"));

        library.upsert_episode(&make_episode(Some(a), "old", 1)).unwrap();
        library.upsert_episode(&make_episode(Some(a), "new", 20)).unwrap();
        library.upsert_episode(&make_episode(Some(b), "other", 10)).unwrap();

        let guids: Vec<_> = library.episodes(a).into_iter().map(|e| e.guid).collect();
        assert_eq!(guids, vec!["new", "old"]);
    }

    #[test]
    fn episode_upsert_replaces_on_same_guid() {
        let mut library = Library::default();
        let a = library.upsert_podcast(&make_podcast("https://a.example/feed", "A"));

        let first = library.upsert_episode(&make_episode(Some(a), "g", 1)).unwrap();
        let mut changed = make_episode(Some(a), "g", 1);
        changed.title = "Renamed".to_string();
        let second = library.upsert_episode(&changed).unwrap();

        assert_eq!(first, second);
        let episodes = library.episodes(a);
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].title, "Renamed");
    }

    #[test]
    fn episode_upsert_requires_saved_podcast() {
        let mut library = Library::default();

        assert!(matches!(
            library.upsert_episode(&make_episode(None, "g", 1)),
            Err(StoreError::MissingPodcastId { .. })
        ));
        assert!(matches!(
            library.upsert_episode(&make_episode(Some(42), "g", 1)),
            Err(StoreError::UnknownPodcast(42))
        ));
    }

    #[test]
    fn batch_upsert_is_all_or_nothing() {
        let mut library = Library::default();
        let a = library.upsert_podcast(&make_podcast("https://a.example/feed", "A"));

        let result = library.upsert_episodes(&[
            make_episode(Some(a), "ok", 1),
            make_episode(Some(99), "orphan", 2),
        ]);
        assert!(matches!(result, Err(StoreError::UnknownPodcast(99))));
        assert!(library.episodes(a).is_empty());

        let ids = library
            .upsert_episodes(&[make_episode(Some(a), "one", 1), make_episode(Some(a), "two", 2)])
            .unwrap();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(library.episodes(a).len(), 2);
    }

    #[test]
    fn delete_removes_podcast_and_its_episodes() {
        let mut library = Library::default();
        let a = library.upsert_podcast(&make_podcast("https://a.example/feed", "A"));
        let b = library.upsert_podcast(&make_podcast("https://b.example/feed", "B"));
        library.upsert_episode(&make_episode(Some(a), "a1", 1)).unwrap();
        library.upsert_episode(&make_episode(Some(b), "b1", 1)).unwrap();

        let podcast = library.podcast_by_url("https://a.example/feed").unwrap();
        assert!(library.delete_podcast(&podcast));

        assert!(library.podcast_by_url("https://a.example/feed").is_none());
        assert!(library.episodes(a).is_empty());
        assert_eq!(library.episodes(b).len(), 1);
        assert!(!library.delete_podcast(&podcast));
    }
}
