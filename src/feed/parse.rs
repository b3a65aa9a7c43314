// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, BytesText, Event};

use crate::dates::parse_feed_date;
use crate::error::FeedError;

/// Channel-level data of a feed, as found in the document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFeedDocument {
    pub title: Option<String>,
    pub description: Option<String>,
    /// `itunes:summary`, used when the description is empty
    pub summary: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    /// Items in document order
    pub episodes: Vec<RawEpisode>,
}

/// Item-level data of a feed, as found in the document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEpisode {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub guid: Option<String>,
    pub pub_date: Option<String>,
    pub link: Option<String>,
    /// Enclosure `url` attribute
    pub url: Option<String>,
    /// Enclosure `type` attribute
    pub mime_type: Option<String>,
}

/// Parse RSS feed XML bytes.
///
/// Only the structure `channel > item > field` is interpreted; any other
/// element is walked through and ignored. Text is decoded in the encoding
/// the XML declaration names (UTF-8 when absent). Malformed XML fails the
/// whole document.
pub fn parse_feed(xml_bytes: &[u8]) -> Result<RawFeedDocument, FeedError> {
    let mut reader = Reader::from_reader(xml_bytes);
    let mut walker = FeedWalker::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => walker.open(&e, &reader),
            Ok(Event::Empty(e)) => {
                walker.open(&e, &reader);
                walker.close();
            }
            Ok(Event::End(_)) => walker.close(),
            Ok(Event::Text(e)) => walker.text(&unescape_text(&e, reader.decoder())),
            Ok(Event::CData(e)) => walker.text(&decode(&e, reader.decoder())),
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(FeedError::Parse(format!(
                    "{e} (at byte {})",
                    reader.error_position()
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    walker.finish()
}

/// Entity-unescape text content.
///
/// Feeds regularly contain HTML entities (`&nbsp;`, `&eacute;`) that are not
/// defined in XML; those are decoded as HTML instead of failing the feed.
fn unescape_text(text: &BytesText<'_>, decoder: Decoder) -> String {
    match text.unescape() {
        Ok(unescaped) => unescaped.into_owned(),
        Err(_) => html_escape::decode_html_entities(&decode(text, decoder)).into_owned(),
    }
}

/// Decode raw bytes in the document encoding, replacing invalid sequences
fn decode(bytes: &[u8], decoder: Decoder) -> String {
    match decoder.decode(bytes) {
        Ok(text) => text.into_owned(),
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn attribute(element: &BytesStart<'_>, reader: &Reader<&[u8]>, key: &str) -> Option<String> {
    element
        .try_get_attribute(key)
        .ok()
        .flatten()
        .and_then(|attr| attr.decode_and_unescape_value(reader.decoder()).ok())
        .map(|value| value.into_owned())
}

/// Where the walker currently is relative to the feed structure
#[derive(Debug, Default)]
enum State {
    #[default]
    InChannel,
    /// Inside a `channel > item`; `depth` is the item's depth in the element
    /// stack.
    InItem { episode: RawEpisode, depth: usize },
}

/// Text fields captured from element content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    ChannelTitle,
    ChannelDescription,
    ChannelSummary,
    ChannelPubDate,
    ChannelImage,
    ItemTitle,
    ItemDescription,
    ItemDuration,
    ItemGuid,
    ItemPubDate,
    ItemLink,
}

#[derive(Debug)]
struct Capture {
    field: Field,
    depth: usize,
    text: String,
}

#[derive(Debug, Default)]
struct FeedWalker {
    document: RawFeedDocument,
    state: State,
    /// Names of the currently open elements, outermost first
    stack: Vec<String>,
    capture: Option<Capture>,
    seen_root: bool,
}

impl FeedWalker {
    fn open(&mut self, element: &BytesStart<'_>, reader: &Reader<&[u8]>) {
        let name = decode(element.name().as_ref(), reader.decoder());
        let parent = self.stack.last().cloned();
        let grandparent = self.stack.iter().rev().nth(1).cloned();
        let depth = self.stack.len() + 1;
        self.seen_root = true;

        let field = match (grandparent.as_deref(), parent.as_deref(), name.as_str()) {
            (_, Some("channel"), "item") => {
                self.commit_item();
                self.state = State::InItem {
                    episode: RawEpisode::default(),
                    depth,
                };
                None
            }
            (_, Some("channel"), "title") => Some(Field::ChannelTitle),
            (_, Some("channel"), "description") => Some(Field::ChannelDescription),
            (_, Some("channel"), "itunes:summary") => Some(Field::ChannelSummary),
            (_, Some("channel"), "pubDate") => Some(Field::ChannelPubDate),
            (_, Some("channel"), "itunes:image") => {
                if let Some(href) = attribute(element, reader, "href") {
                    self.document.image_url = Some(href);
                }
                None
            }
            (Some("channel"), Some("image"), "url") => Some(Field::ChannelImage),
            (Some("channel"), Some("item"), "title") => Some(Field::ItemTitle),
            (Some("channel"), Some("item"), "description") => Some(Field::ItemDescription),
            (Some("channel"), Some("item"), "itunes:duration") => Some(Field::ItemDuration),
            (Some("channel"), Some("item"), "guid") => Some(Field::ItemGuid),
            (Some("channel"), Some("item"), "pubDate") => Some(Field::ItemPubDate),
            (Some("channel"), Some("item"), "link") => Some(Field::ItemLink),
            (Some("channel"), Some("item"), "enclosure") => {
                if let State::InItem { episode, .. } = &mut self.state {
                    episode.url = attribute(element, reader, "url");
                    episode.mime_type = attribute(element, reader, "type");
                }
                None
            }
            _ => None,
        };

        // Only the outermost field captures; text of elements nested in it
        // joins that field.
        if let Some(field) = field
            && self.capture.is_none()
        {
            self.capture = Some(Capture {
                field,
                depth,
                text: String::new(),
            });
        }

        self.stack.push(name);
    }

    fn close(&mut self) {
        let depth = self.stack.len();

        if self.capture.as_ref().is_some_and(|c| c.depth == depth)
            && let Some(capture) = self.capture.take()
        {
            self.store(capture.field, capture.text.trim().to_string());
        }

        if matches!(self.state, State::InItem { depth: item_depth, .. } if item_depth == depth) {
            self.commit_item();
        }

        self.stack.pop();
    }

    fn text(&mut self, text: &str) {
        if let Some(capture) = &mut self.capture {
            capture.text.push_str(text);
        }
    }

    fn commit_item(&mut self) {
        if let State::InItem { episode, .. } = std::mem::take(&mut self.state) {
            self.document.episodes.push(episode);
        }
    }

    fn store(&mut self, field: Field, value: String) {
        match field {
            Field::ChannelTitle => self.document.title = Some(value),
            Field::ChannelDescription => self.document.description = Some(value),
            Field::ChannelSummary => self.document.summary = Some(value),
            Field::ChannelPubDate => self.document.last_updated = parse_feed_date(&value),
            Field::ChannelImage => self.document.image_url = Some(value),
            Field::ItemTitle => self.store_item(|e| &mut e.title, value),
            Field::ItemDescription => self.store_item(|e| &mut e.description, value),
            Field::ItemDuration => self.store_item(|e| &mut e.duration, value),
            Field::ItemGuid => self.store_item(|e| &mut e.guid, value),
            Field::ItemPubDate => self.store_item(|e| &mut e.pub_date, value),
            Field::ItemLink => self.store_item(|e| &mut e.link, value),
        }
    }

    fn store_item(&mut self, slot: fn(&mut RawEpisode) -> &mut Option<String>, value: String) {
        if let State::InItem { episode, .. } = &mut self.state {
            *slot(episode) = Some(value);
        }
    }

    fn finish(self) -> Result<RawFeedDocument, FeedError> {
        if !self.seen_root {
            return Err(FeedError::Parse("document has no root element".to_string()));
        }
        if let Some(open) = self.stack.last() {
            return Err(FeedError::Parse(format!(
                "unexpected end of document inside <{open}>"
            )));
        }
        Ok(self.document)
    }
}
