// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Upstream query date windows.
//!
//! Maps a [`Resolution`] to the `start_date`/`end_date` pair sent upstream.
//! All dates are UTC calendar days formatted as `YYYY-MM-DD`.
//!
//! | selector    | start             | end                     |
//! |-------------|-------------------|-------------------------|
//! | Latest      | today             | (now + 1 hour).date     |
//! | Tomorrow    | today + 1 day     | today + 1 day           |
//! | SevenDays   | today + 7 days    | today + 7 days          |
//! | FifteenDays | today + 15 days   | today + 15 days         |
//!
//! `Latest` spans the current day (or rolls into the next one during the
//! last hour before midnight); every other selector queries a single day.

use crate::error::Result;
use crate::resolution::Resolution;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive calendar-day range for an upstream query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateWindow {
    /// `start_date` as sent upstream.
    pub fn start_param(&self) -> String {
        self.start_date.format("%Y-%m-%d").to_string()
    }

    /// `end_date` as sent upstream.
    pub fn end_param(&self) -> String {
        self.end_date.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start_param(), self.end_param())
    }
}

/// Compute the forecast window for `resolution` at instant `now`.
pub fn resolve(resolution: Resolution, now: DateTime<Utc>) -> DateWindow {
    let today = now.date_naive();
    match resolution {
        Resolution::Latest => DateWindow {
            start_date: today,
            end_date: (now + Duration::hours(1)).date_naive(),
        },
        other => {
            let day = today + Duration::days(other.offset_days());
            DateWindow {
                start_date: day,
                end_date: day,
            }
        }
    }
}

/// Parse a raw selector and resolve its window.
pub fn resolve_str(selector: &str, now: DateTime<Utc>) -> Result<DateWindow> {
    let resolution = selector.parse::<Resolution>()?;
    Ok(resolve(resolution, now))
}

/// Window used by the city-details query.
///
/// Multi-day horizons span from today through the horizon instead of a
/// single day, so the details view can plot the whole range.
pub fn resolve_detail_window(resolution: Resolution, now: DateTime<Utc>) -> DateWindow {
    match resolution {
        Resolution::SevenDays | Resolution::FifteenDays => {
            let today = now.date_naive();
            DateWindow {
                start_date: today,
                end_date: today + Duration::days(resolution.offset_days()),
            }
        }
        _ => resolve(resolution, now),
    }
}
