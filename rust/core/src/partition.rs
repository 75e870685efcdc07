// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Short-term cache partitions with lazy expiry.
//!
//! The short-term cache keeps one [`Partition`] per [`Resolution`]. A
//! partition is an append-only list of entries; nothing expires in the
//! background. Expiry is observed only when a lookup touches a matching
//! entry, at which point stale entries for that coordinate are dropped from
//! the partition. Unread stale entries linger until their key is read.
//!
//! Coordinates match by exact string equality: `"40.7"` and `"40.70"` are
//! different keys.

use crate::payload::ForecastPayload;
use crate::resolution::Resolution;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default time-to-live of a cache entry, in seconds.
pub const DEFAULT_TTL_SECS: i64 = 60 * 60;

/// Default time-to-live of a cache entry.
pub fn default_ttl() -> Duration {
    Duration::seconds(DEFAULT_TTL_SECS)
}

/// Cache key: a coordinate pair as sent by the client plus a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub latitude: String,
    pub longitude: String,
    pub resolution: Resolution,
}

impl CacheKey {
    pub fn new(
        latitude: impl Into<String>,
        longitude: impl Into<String>,
        resolution: Resolution,
    ) -> Self {
        Self {
            latitude: latitude.into(),
            longitude: longitude.into(),
            resolution,
        }
    }

    /// Whether `entry` is stored under this key's coordinate.
    pub fn matches(&self, entry: &CacheEntry) -> bool {
        entry.latitude == self.latitude && entry.longitude == self.longitude
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}@{}", self.latitude, self.longitude, self.resolution)
    }
}

/// A stored forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub latitude: String,
    pub longitude: String,
    pub payload: ForecastPayload,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: &CacheKey, payload: ForecastPayload, stored_at: DateTime<Utc>) -> Self {
        Self {
            latitude: key.latitude.clone(),
            longitude: key.longitude.clone(),
            payload,
            stored_at,
        }
    }

    /// An entry is stale once its age is strictly greater than `ttl`.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.stored_at) > ttl
    }
}

/// Result of a partition lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    /// Freshest matching entry, if any.
    pub hit: Option<CacheEntry>,
    /// Number of stale entries dropped for the key.
    pub evicted: usize,
}

impl Lookup {
    /// Whether the partition changed and must be written back.
    pub fn is_dirty(&self) -> bool {
        self.evicted > 0
    }
}

/// All cache entries for one resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Partition {
    entries: Vec<CacheEntry>,
}

impl Partition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CacheEntry] {
        &self.entries
    }

    /// Append an entry. Existing entries for the same key are left in place.
    pub fn push(&mut self, entry: CacheEntry) {
        self.entries.push(entry);
    }

    /// Find the freshest entry for `key`, dropping stale ones.
    ///
    /// Only entries matching `key` are checked for expiry; stale entries
    /// for other coordinates are untouched. When several fresh entries
    /// match, the one with the latest `stored_at` wins, and among equal
    /// timestamps the one appended last.
    pub fn lookup(&mut self, key: &CacheKey, now: DateTime<Utc>, ttl: Duration) -> Lookup {
        let before = self.entries.len();
        self.entries
            .retain(|entry| !(key.matches(entry) && entry.is_expired(now, ttl)));
        let evicted = before - self.entries.len();

        let hit = self
            .entries
            .iter()
            .filter(|entry| key.matches(entry))
            .max_by_key(|entry| entry.stored_at)
            .cloned();

        Lookup { hit, evicted }
    }
}
