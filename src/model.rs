// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::dates::parse_feed_date_or_now;
use crate::feed::{RawEpisode, RawFeedDocument};

/// A podcast, either freshly converted from a feed or loaded from a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Podcast {
    /// Store-assigned id, `None` until the podcast has been saved
    pub id: Option<i64>,
    /// Natural key of the podcast
    pub feed_url: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub last_updated: DateTime<Utc>,
    /// Only populated when explicitly attached; stores keep episodes apart
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub episodes: Vec<Episode>,
}

/// A single episode of a podcast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Publisher-declared identifier, unique per feed
    pub guid: String,
    /// Owning podcast, assigned when the episode is saved
    pub podcast_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub media_url: String,
    pub mime_type: String,
    pub release_date: DateTime<Utc>,
    /// Free-form duration as published (`"30:00"`, `"1800"`, ...)
    pub duration: String,
}

/// New episodes found for one podcast during a refresh
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSummary {
    pub feed_url: String,
    pub name: String,
    pub new_count: usize,
    pub new_episodes: Vec<Episode>,
}

impl Podcast {
    /// Convert a parsed feed into a podcast.
    ///
    /// `image_url` usually comes from a directory listing; when it is empty
    /// the image declared by the feed is used instead. An empty channel
    /// description is replaced by the channel summary.
    pub fn from_feed(feed_url: &str, image_url: &str, feed: RawFeedDocument) -> Self {
        let description = match feed.description {
            Some(description) if !description.is_empty() => description,
            _ => feed.summary.unwrap_or_default(),
        };

        let image_url = if image_url.is_empty() {
            feed.image_url.unwrap_or_default()
        } else {
            image_url.to_string()
        };

        Self {
            id: None,
            feed_url: feed_url.to_string(),
            title: feed.title.unwrap_or_default(),
            description,
            image_url,
            last_updated: feed.last_updated.unwrap_or_else(Utc::now),
            episodes: feed.episodes.into_iter().map(Episode::from_raw).collect(),
        }
    }

    /// Whether the podcast has been saved to a store
    pub fn is_subscribed(&self) -> bool {
        self.id.is_some()
    }
}

impl Episode {
    /// Convert a raw feed item, filling missing text with empty strings
    pub fn from_raw(raw: RawEpisode) -> Self {
        let guid = episode_key(&raw);

        Self {
            guid,
            podcast_id: None,
            title: raw.title.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            media_url: raw.url.unwrap_or_default(),
            mime_type: raw.mime_type.unwrap_or_default(),
            release_date: parse_feed_date_or_now(raw.pub_date.as_deref()),
            duration: raw.duration.unwrap_or_default(),
        }
    }

    /// Video episodes are recognized by their MIME type only
    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video")
    }
}

impl UpdateSummary {
    pub fn new(podcast: &Podcast, new_episodes: Vec<Episode>) -> Self {
        Self {
            feed_url: podcast.feed_url.clone(),
            name: podcast.title.clone(),
            new_count: new_episodes.len(),
            new_episodes,
        }
    }
}

/// Deduplication key for a raw item.
///
/// Items without a guid fall back to their enclosure URL, then to a hash of
/// title and publish date, so that guid-less items never collide with each
/// other on the empty string.
fn episode_key(raw: &RawEpisode) -> String {
    let non_blank = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(String::from)
    };

    if let Some(guid) = non_blank(&raw.guid) {
        return guid;
    }
    if let Some(url) = non_blank(&raw.url) {
        return url;
    }

    let mut hasher = Sha256::new();
    hasher.update(raw.title.as_deref().unwrap_or_default());
    hasher.update(b"\n");
    hasher.update(raw.pub_date.as_deref().unwrap_or_default());
    let digest = hasher.finalize();

    let hex: String = digest.iter().map(|byte| format!("{byte:02x}")).collect();
    format!("sha256:{hex}")
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    fn raw_episode(guid: Option<&str>, title: &str) -> RawEpisode {
        RawEpisode {
            title: Some(title.to_string()),
            guid: guid.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn from_feed_copies_channel_fields() {
        let feed = RawFeedDocument {
            title: Some("Test Podcast".to_string()),
            description: Some("About things".to_string()),
            summary: Some("Summary".to_string()),
            last_updated: Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()),
            image_url: Some("https://example.com/feed.jpg".to_string()),
            episodes: vec![raw_episode(Some("a"), "Ep A")],
        };

        let podcast = Podcast::from_feed("https://example.com/feed.xml", "", feed);

        assert_eq!(podcast.id, None);
        assert!(!podcast.is_subscribed());
        assert_eq!(podcast.feed_url, "https://example.com/feed.xml");
        assert_eq!(podcast.title, "Test Podcast");
        assert_eq!(podcast.description, "About things");
        assert_eq!(podcast.image_url, "https://example.com/feed.jpg");
        assert_eq!(
            podcast.last_updated,
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
        );
        assert_eq!(podcast.episodes.len(), 1);
    }

    #[test]
    fn empty_description_falls_back_to_summary() {
        let feed = RawFeedDocument {
            description: Some(String::new()),
            summary: Some("From itunes:summary".to_string()),
            ..Default::default()
        };
        let podcast = Podcast::from_feed("https://example.com/feed.xml", "", feed);
        assert_eq!(podcast.description, "From itunes:summary");

        let feed = RawFeedDocument {
            summary: Some("Only a summary".to_string()),
            ..Default::default()
        };
        let podcast = Podcast::from_feed("https://example.com/feed.xml", "", feed);
        assert_eq!(podcast.description, "Only a summary");
    }

    #[test]
    fn caller_image_wins_over_feed_image() {
        let feed = RawFeedDocument {
            image_url: Some("https://example.com/feed.jpg".to_string()),
            ..Default::default()
        };
        let podcast = Podcast::from_feed(
            "https://example.com/feed.xml",
            "https://directory.example.com/art.jpg",
            feed,
        );
        assert_eq!(podcast.image_url, "https://directory.example.com/art.jpg");
    }

    #[test]
    fn episode_fields_default_to_empty() {
        let episode = Episode::from_raw(RawEpisode {
            guid: Some("only-guid".to_string()),
            ..Default::default()
        });

        assert_eq!(episode.guid, "only-guid");
        assert_eq!(episode.podcast_id, None);
        assert_eq!(episode.title, "");
        assert_eq!(episode.media_url, "");
        assert_eq!(episode.mime_type, "");
        assert_eq!(episode.duration, "");
        assert!(!episode.is_video());
    }

    #[test]
    fn episode_parses_release_date() {
        let episode = Episode::from_raw(RawEpisode {
            guid: Some("g".to_string()),
            pub_date: Some("Mon, 01 Jan 2024 12:00:00 +0000".to_string()),
            ..Default::default()
        });
        assert_eq!(
            episode.release_date,
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn video_is_derived_from_mime_type() {
        let mut episode = Episode::from_raw(raw_episode(Some("v"), "Video"));
        episode.mime_type = "video/mp4".to_string();
        assert!(episode.is_video());

        episode.mime_type = "audio/mpeg".to_string();
        assert!(!episode.is_video());
    }

    #[test]
    fn missing_guid_falls_back_to_enclosure_url() {
        let episode = Episode::from_raw(RawEpisode {
            title: Some("No guid".to_string()),
            guid: Some("   ".to_string()),
            url: Some("https://example.com/ep.mp3".to_string()),
            ..Default::default()
        });
        assert_eq!(episode.guid, "https://example.com/ep.mp3");
    }

    #[test]
    fn guidless_episodes_get_distinct_synthesized_keys() {
        let first = Episode::from_raw(RawEpisode {
            title: Some("First".to_string()),
            pub_date: Some("Mon, 01 Jan 2024 12:00:00 +0000".to_string()),
            ..Default::default()
        });
        let second = Episode::from_raw(RawEpisode {
            title: Some("Second".to_string()),
            pub_date: Some("Mon, 01 Jan 2024 12:00:00 +0000".to_string()),
            ..Default::default()
        });
        let first_again = Episode::from_raw(RawEpisode {
            title: Some("First".to_string()),
            pub_date: Some("Mon, 01 Jan 2024 12:00:00 +0000".to_string()),
            ..Default::default()
        });

        assert!(first.guid.starts_with("sha256:"));
        assert_eq!(first.guid.len(), "sha256:".len() + 64);
        assert_ne!(first.guid, second.guid);
        assert_eq!(first.guid, first_again.guid);
    }

    #[test]
    fn update_summary_counts_episodes() {
        let podcast = Podcast::from_feed(
            "https://example.com/feed.xml",
            "",
            RawFeedDocument {
                title: Some("Show".to_string()),
                ..Default::default()
            },
        );
        let episodes = vec![
            Episode::from_raw(raw_episode(Some("1"), "One")),
            Episode::from_raw(raw_episode(Some("2"), "Two")),
        ];

        let summary = UpdateSummary::new(&podcast, episodes);

        assert_eq!(summary.feed_url, "https://example.com/feed.xml");
        assert_eq!(summary.name, "Show");
        assert_eq!(summary.new_count, 2);
        assert_eq!(summary.new_episodes.len(), 2);
    }
}
