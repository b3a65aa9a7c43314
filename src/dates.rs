// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Date handling for feed and directory timestamps.
//!
//! Feeds carry RFC 2822 style dates (`Mon, 01 Jan 2024 12:00:00 GMT`) with a
//! lot of variation in practice; directory services use a short ISO-like
//! `YYYY-MM-DDTHH:MM:SS` form. Both parsers return `None` on failure and
//! leave the fallback to the caller.

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};

const SHORT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const SHORT_DATE_LEN: usize = 19;

/// Formats tried when a feed date is not valid RFC 2822
const RELAXED_FEED_FORMATS: [&str; 4] = [
    "%a, %d %b %Y %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%a, %d %B %Y %H:%M:%S %z",
];

/// Parse a feed date such as `Wed, 02 Oct 2002 13:00:00 GMT`
pub fn parse_feed_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc2822(text)
        .or_else(|_| DateTime::parse_from_rfc3339(text))
        .ok()
        .or_else(|| {
            RELAXED_FEED_FORMATS
                .iter()
                .find_map(|format| DateTime::parse_from_str(text, format).ok())
        })
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse a feed date, falling back to the current time when it is missing
/// or unparseable.
///
/// Do not use the result for ordering that has to be correct: a broken date
/// sorts as "just published".
pub fn parse_feed_date_or_now(text: Option<&str>) -> DateTime<Utc> {
    text.and_then(parse_feed_date).unwrap_or_else(Utc::now)
}

/// Parse a `YYYY-MM-DDTHH:MM:SS` timestamp.
///
/// Anything after the seconds (a `Z`, fractional seconds, an offset) is
/// ignored.
pub fn parse_short_date(text: &str) -> Option<NaiveDateTime> {
    let prefix = text.trim().get(..SHORT_DATE_LEN)?;
    NaiveDateTime::parse_from_str(prefix, SHORT_DATE_FORMAT).ok()
}

/// Short numeric display form, `MM/DD/YY`
pub fn format_short_date<D: Datelike>(date: &D) -> String {
    format!(
        "{:02}/{:02}/{:02}",
        date.month(),
        date.day(),
        date.year().rem_euclid(100)
    )
}

/// Display a short-form timestamp, or `-` when it is missing or invalid
pub fn short_date_or_dash(text: Option<&str>) -> String {
    text.and_then(parse_short_date)
        .map(|date| format_short_date(&date))
        .unwrap_or_else(|| "-".to_string())
}
