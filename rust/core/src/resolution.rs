// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Forecast horizon selector.
//!
//! The resolution picks both the upstream date window and the cache
//! partition a forecast lives in. Each resolution is cached independently.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Forecast horizon requested by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "Latest")]
    Latest,
    #[serde(rename = "Tomorrow", alias = "Tommorow")]
    Tomorrow,
    #[serde(rename = "7days")]
    SevenDays,
    #[serde(rename = "15days")]
    FifteenDays,
}

impl Resolution {
    /// All selectors, in horizon order.
    pub const ALL: [Resolution; 4] = [
        Resolution::Latest,
        Resolution::Tomorrow,
        Resolution::SevenDays,
        Resolution::FifteenDays,
    ];

    /// Name used on the wire and in partition keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Latest => "Latest",
            Resolution::Tomorrow => "Tomorrow",
            Resolution::SevenDays => "7days",
            Resolution::FifteenDays => "15days",
        }
    }

    /// Whether upstream queries and responses carry the `daily` section.
    pub fn includes_daily(&self) -> bool {
        !matches!(self, Resolution::Latest)
    }

    /// Days between today and the first forecast day.
    pub(crate) fn offset_days(&self) -> i64 {
        match self {
            Resolution::Latest => 0,
            Resolution::Tomorrow => 1,
            Resolution::SevenDays => 7,
            Resolution::FifteenDays => 15,
        }
    }
}

impl FromStr for Resolution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Latest" => Ok(Resolution::Latest),
            // Older clients send the misspelled form.
            "Tomorrow" | "Tommorow" => Ok(Resolution::Tomorrow),
            "7days" => Ok(Resolution::SevenDays),
            "15days" => Ok(Resolution::FifteenDays),
            other => Err(Error::InvalidSelector(other.to_string())),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
