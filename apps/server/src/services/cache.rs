// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Short-term forecast cache on disk using cacache.
//!
//! Each resolution is one partition stored under a single cacache key
//! (`weather_cache_<resolution>`) as a JSON list of entries. Every read and
//! write loads and rewrites the whole partition, so partition access is
//! serialized per resolution.
//!
//! cacache is content-addressed and append-only, so a plain `write` to an
//! existing key leaves the previous blob and index line behind. Rewrites
//! therefore remove the key fully first, keeping one index bucket and one
//! content file per partition. The stored document carries its resolution
//! so two partitions never share a content hash.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::Duration;
use forecast_gateway_core::{CacheEntry, CacheKey, Clock, ForecastPayload, Partition, Resolution};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Short-term store keyed by coordinate and resolution.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Freshest unexpired entry for `key`. Expired entries for the key are
    /// removed as a side effect.
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, StoreError>;

    /// Append a new entry for `key` stamped with the current time.
    async fn put(&self, key: &CacheKey, payload: &ForecastPayload) -> Result<(), StoreError>;
}

/// On-disk form of a partition.
#[derive(Serialize, Deserialize)]
struct StoredPartition<P> {
    resolution: Resolution,
    entries: P,
}

/// Partitioned disk cache with lazy expiry.
pub struct ForecastCache {
    cache_dir: PathBuf,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    locks: [Mutex<()>; 4],
}

impl ForecastCache {
    /// Create a new cache in the specified directory.
    pub async fn new(cache_dir: &str, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let path = PathBuf::from(cache_dir);

        if let Err(e) = tokio::fs::create_dir_all(&path).await {
            tracing::warn!(
                error = %e,
                path = %path.display(),
                "Failed to create cache directory"
            );
        }

        Self {
            cache_dir: path,
            ttl,
            clock,
            locks: Default::default(),
        }
    }

    /// cacache key holding the partition for `resolution`.
    pub fn partition_key(resolution: Resolution) -> String {
        format!("weather_cache_{}", resolution.as_str())
    }

    fn lock(&self, resolution: Resolution) -> &Mutex<()> {
        &self.locks[resolution as usize]
    }

    async fn load(&self, resolution: Resolution) -> Result<Partition, StoreError> {
        match cacache::read(&self.cache_dir, Self::partition_key(resolution)).await {
            Ok(data) => {
                let stored: StoredPartition<Partition> = serde_json::from_slice(&data)?;
                Ok(stored.entries)
            }
            Err(cacache::Error::EntryNotFound(_, _)) => Ok(Partition::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Drop the index bucket and content blob currently held for `key`.
    async fn remove_fully(&self, key: &str) -> Result<(), StoreError> {
        if cacache::metadata(&self.cache_dir, key).await?.is_some() {
            cacache::RemoveOpts::new()
                .remove_fully(true)
                .remove(&self.cache_dir, key)
                .await?;
        }
        Ok(())
    }

    async fn store(&self, resolution: Resolution, partition: &Partition) -> Result<(), StoreError> {
        let key = Self::partition_key(resolution);
        self.remove_fully(&key).await?;

        if partition.is_empty() {
            tracing::debug!(resolution = %resolution, "Removed empty cache partition");
            return Ok(());
        }

        let data = serde_json::to_vec(&StoredPartition {
            resolution,
            entries: partition,
        })?;
        cacache::write(&self.cache_dir, &key, &data).await?;
        tracing::debug!(
            resolution = %resolution,
            entries = partition.len(),
            size = data.len(),
            "Wrote cache partition"
        );
        Ok(())
    }
}

#[async_trait]
impl CacheStore for ForecastCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, StoreError> {
        let _guard = self.lock(key.resolution).lock().await;
        let mut partition = self.load(key.resolution).await?;
        let lookup = partition.lookup(key, self.clock.now(), self.ttl);

        if lookup.is_dirty() {
            tracing::debug!(key = %key, evicted = lookup.evicted, "Cache expired, removing entries");
            self.store(key.resolution, &partition).await?;
        }

        match &lookup.hit {
            Some(_) => tracing::debug!(key = %key, "Cache HIT"),
            None => tracing::debug!(key = %key, "Cache MISS"),
        }

        Ok(lookup.hit)
    }

    async fn put(&self, key: &CacheKey, payload: &ForecastPayload) -> Result<(), StoreError> {
        let _guard = self.lock(key.resolution).lock().await;
        let mut partition = self.load(key.resolution).await?;
        partition.push(CacheEntry::new(key, payload.clone(), self.clock.now()));
        self.store(key.resolution, &partition).await
    }
}

#[cfg(test)]
impl ForecastCache {
    /// Snapshot of a partition, without expiring anything.
    pub async fn partition(&self, resolution: Resolution) -> Result<Partition, StoreError> {
        let _guard = self.lock(resolution).lock().await;
        self.load(resolution).await
    }
}
