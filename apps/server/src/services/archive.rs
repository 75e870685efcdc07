// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Long-term forecast archive.
//!
//! The archive keeps every successfully fetched forecast, keyed by the
//! coordinate strings the client sent. It has no resolution dimension and
//! no expiry: once a record exists for a coordinate, it answers every later
//! request for that coordinate, whatever the resolution or age.
//!
//! Several records can accumulate for one coordinate (concurrent misses,
//! different resolutions fetched before the first write landed). `get`
//! returns the one with the latest `stored_at`, ties going to the record
//! written last.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use forecast_gateway_core::Clock;
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// An archived upstream forecast document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveRecord {
    pub id: Uuid,
    pub latitude: String,
    pub longitude: String,
    pub payload: Value,
    pub stored_at: DateTime<Utc>,
}

/// Append-only archive keyed by coordinate.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Most recent record for the coordinate, if any.
    async fn get(&self, latitude: &str, longitude: &str) -> Result<Option<ArchiveRecord>, StoreError>;

    /// Append a record for the coordinate.
    async fn put(&self, latitude: &str, longitude: &str, payload: &Value) -> Result<(), StoreError>;
}

/// PostgreSQL-backed archive.
pub struct PgArchive {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PgArchive {
    /// Connect to the database and apply pending migrations.
    pub async fn connect(database_url: &str, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Connected to forecast archive database");
        Ok(Self { pool, clock })
    }
}

#[async_trait]
impl ArchiveStore for PgArchive {
    async fn get(&self, latitude: &str, longitude: &str) -> Result<Option<ArchiveRecord>, StoreError> {
        let row = sqlx::query_as::<_, (Uuid, String, String, Json<Value>, DateTime<Utc>)>(
            r#"
            SELECT id, latitude, longitude, payload, stored_at
            FROM weather_archive
            WHERE latitude = $1 AND longitude = $2
            ORDER BY stored_at DESC, seq DESC
            LIMIT 1
            "#,
        )
        .bind(latitude)
        .bind(longitude)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, latitude, longitude, payload, stored_at)| ArchiveRecord {
            id,
            latitude,
            longitude,
            payload: payload.0,
            stored_at,
        }))
    }

    async fn put(&self, latitude: &str, longitude: &str, payload: &Value) -> Result<(), StoreError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO weather_archive (id, latitude, longitude, payload, stored_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(latitude)
        .bind(longitude)
        .bind(Json(payload))
        .bind(self.clock.now())
        .execute(&self.pool)
        .await?;

        tracing::debug!(id = %id, latitude, longitude, "Archived forecast");
        Ok(())
    }
}

/// Process-local archive, used when no database is configured.
pub struct MemoryArchive {
    records: RwLock<FxHashMap<(String, String), Vec<ArchiveRecord>>>,
    clock: Arc<dyn Clock>,
}

impl MemoryArchive {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: RwLock::new(FxHashMap::default()),
            clock,
        }
    }
}

#[async_trait]
impl ArchiveStore for MemoryArchive {
    async fn get(&self, latitude: &str, longitude: &str) -> Result<Option<ArchiveRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .get(&(latitude.to_string(), longitude.to_string()))
            .and_then(|list| list.iter().max_by_key(|r| r.stored_at))
            .cloned())
    }

    async fn put(&self, latitude: &str, longitude: &str, payload: &Value) -> Result<(), StoreError> {
        let record = ArchiveRecord {
            id: Uuid::new_v4(),
            latitude: latitude.to_string(),
            longitude: longitude.to_string(),
            payload: payload.clone(),
            stored_at: self.clock.now(),
        };
        self.records
            .write()
            .await
            .entry((record.latitude.clone(), record.longitude.clone()))
            .or_default()
            .push(record);
        Ok(())
    }
}

#[cfg(test)]
impl MemoryArchive {
    /// Number of records stored for a coordinate.
    pub async fn count(&self, latitude: &str, longitude: &str) -> usize {
        self.records
            .read()
            .await
            .get(&(latitude.to_string(), longitude.to_string()))
            .map_or(0, Vec::len)
    }
}
