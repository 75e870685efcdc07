// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request coordinator: archive, then cache, then upstream.
//!
//! ```text
//! validate ──invalid──> 400, no I/O
//!    │
//! archive ──hit──> archived document
//!    │ miss
//! cache (when enabled) ──fresh hit──> shaped cached forecast
//!    │ miss / expired
//! resolve window -> upstream ──error──> 500
//!    │ ok
//! persist to cache + archive in the background -> shaped forecast
//! ```
//!
//! Persistence is best-effort: a forecast fetched from upstream is returned
//! even if writing it to either store fails. Concurrent misses for the same
//! key each go upstream; there is no request coalescing.

use super::archive::ArchiveStore;
use super::cache::CacheStore;
use super::upstream::ForecastSource;
use crate::error::ApiError;
use forecast_gateway_core::{window, CacheKey, Clock, ForecastPayload, ForecastRequest};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio_util::task::TaskTracker;

/// Where a forecast response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Archive,
    Cache,
    Upstream,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Archive => "archive",
            Origin::Cache => "cache",
            Origin::Upstream => "upstream",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A forecast response and its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastOutcome {
    pub origin: Origin,
    pub body: Value,
}

/// Orchestrates lookups across the archive, the cache and the upstream API.
pub struct Coordinator {
    archive: Arc<dyn ArchiveStore>,
    cache: Arc<dyn CacheStore>,
    upstream: Arc<dyn ForecastSource>,
    clock: Arc<dyn Clock>,
    cache_reads: bool,
    persistence: TaskTracker,
}

impl Coordinator {
    pub fn new(
        archive: Arc<dyn ArchiveStore>,
        cache: Arc<dyn CacheStore>,
        upstream: Arc<dyn ForecastSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            archive,
            cache,
            upstream,
            clock,
            cache_reads: false,
            persistence: TaskTracker::new(),
        }
    }

    /// Consult the short-term cache between the archive and upstream.
    pub fn with_cache_reads(mut self, enabled: bool) -> Self {
        self.cache_reads = enabled;
        self
    }

    /// Serve a forecast request.
    pub async fn forecast(&self, request: &ForecastRequest) -> Result<ForecastOutcome, ApiError> {
        let key = request.validate()?;

        if let Some(body) = self.lookup_archive(&key).await {
            return Ok(ForecastOutcome {
                origin: Origin::Archive,
                body,
            });
        }

        if self.cache_reads {
            if let Some(payload) = self.lookup_cache(&key).await {
                return Ok(ForecastOutcome {
                    origin: Origin::Cache,
                    body: serde_json::to_value(payload.shape(key.resolution))?,
                });
            }
        }

        let window = window::resolve(key.resolution, self.clock.now());
        tracing::info!(
            latitude = %key.latitude,
            longitude = %key.longitude,
            resolution = %key.resolution,
            window = %window,
            "Fetching forecast from upstream"
        );

        let payload = self
            .upstream
            .fetch(&key.latitude, &key.longitude, key.resolution, &window)
            .await?;

        let body = serde_json::to_value(payload.shape(key.resolution))?;
        self.persist(key, payload);

        Ok(ForecastOutcome {
            origin: Origin::Upstream,
            body,
        })
    }

    /// Detailed forecast passthrough. Never cached or archived.
    pub async fn city_details(&self, request: &ForecastRequest) -> Result<Value, ApiError> {
        let key = request.validate()?;
        let window = window::resolve_detail_window(key.resolution, self.clock.now());
        let details = self
            .upstream
            .fetch_city_details(&key.latitude, &key.longitude, key.resolution, &window)
            .await?;
        Ok(details)
    }

    /// Wait until every background write started so far has finished.
    pub async fn wait_for_persistence(&self) {
        self.persistence.close();
        self.persistence.wait().await;
        self.persistence.reopen();
    }

    async fn lookup_archive(&self, key: &CacheKey) -> Option<Value> {
        match self.archive.get(&key.latitude, &key.longitude).await {
            Ok(Some(record)) => {
                tracing::info!(
                    latitude = %key.latitude,
                    longitude = %key.longitude,
                    stored_at = %record.stored_at,
                    "Archive HIT"
                );
                Some(record.payload)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Archive lookup failed, treating as miss");
                None
            }
        }
    }

    async fn lookup_cache(&self, key: &CacheKey) -> Option<ForecastPayload> {
        match self.cache.get(key).await {
            Ok(Some(entry)) => {
                tracing::info!(key = %key, stored_at = %entry.stored_at, "Cache HIT");
                Some(entry.payload)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Cache lookup failed, treating as miss");
                None
            }
        }
    }

    fn persist(&self, key: CacheKey, payload: ForecastPayload) {
        let cache = self.cache.clone();
        let archive = self.archive.clone();

        self.persistence.spawn(async move {
            if let Err(e) = cache.put(&key, &payload).await {
                tracing::error!(error = %e, key = %key, "Failed to cache forecast");
            }
            if let Err(e) = archive
                .put(&key.latitude, &key.longitude, &payload.to_value())
                .await
            {
                tracing::error!(error = %e, key = %key, "Failed to archive forecast");
            }
        });
    }
}
