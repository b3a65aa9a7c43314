// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod fetch;
mod parse;

pub use fetch::{DEFAULT_FETCH_TIMEOUT, FeedClient};
pub use parse::{RawEpisode, RawFeedDocument, parse_feed};
