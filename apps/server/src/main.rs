// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Forecast Gateway Server - caching front for the Open-Meteo forecast API.
//!
//! Requests are answered from the long-term archive when the coordinate has
//! been fetched before, otherwise from upstream. Every upstream result is
//! written to a per-resolution short-term cache and to the archive in the
//! background.
//!
//! # Endpoints
//!
//! - `GET /api/v1/health` - Health check
//! - `GET /api/weather?lat=&lon=&selectedValue=` - Forecast (Latest, Tomorrow, 7days, 15days)
//! - `GET /api/cityDetails?lat=&lon=&selectedValue=` - Detailed upstream forecast

use axum::{
    http::{HeaderValue, Method, StatusCode},
    routing::get,
    Router,
};
use chrono::Duration as TtlDuration;
use forecast_gateway_core::{Clock, SystemClock};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod config;
mod error;
mod routes;
mod services;
mod types;

use config::Config;
use services::{ArchiveStore, Coordinator, ForecastCache, MemoryArchive, OpenMeteoClient, PgArchive};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(&config);

    let archive_kind = if config.database_url.is_some() { "postgres" } else { "memory" };
    tracing::info!(
        port = config.port,
        cache_dir = %config.cache_dir,
        cache_ttl_secs = config.cache_ttl_secs,
        cache_reads_enabled = config.cache_reads_enabled,
        upstream_url = %config.upstream_url,
        archive = archive_kind,
        "Starting Forecast Gateway"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let cache = Arc::new(
        ForecastCache::new(
            &config.cache_dir,
            TtlDuration::seconds(config.cache_ttl_secs),
            clock.clone(),
        )
        .await,
    );

    let archive: Arc<dyn ArchiveStore> = match &config.database_url {
        Some(url) => Arc::new(PgArchive::connect(url, clock.clone()).await?),
        None => {
            tracing::warn!("DATABASE_URL not set, archive is kept in memory");
            Arc::new(MemoryArchive::new(clock.clone()))
        }
    };

    let upstream = Arc::new(OpenMeteoClient::new(
        &config.upstream_url,
        Duration::from_secs(config.upstream_timeout_secs),
    )?);

    let coordinator = Arc::new(
        Coordinator::new(archive, cache, upstream, clock).with_cache_reads(config.cache_reads_enabled),
    );

    let state = AppState {
        coordinator: coordinator.clone(),
        config: Arc::new(config.clone()),
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Flushing pending cache and archive writes");
    coordinator.wait_for_persistence().await;

    Ok(())
}

/// Build the application router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        // Root endpoint - API information
        .route("/", get(routes::health::info))
        // Health check
        .route("/api/v1/health", get(routes::health::check))
        // Forecast endpoints
        .route("/api/weather", get(routes::weather::forecast))
        .route("/api/cityDetails", get(routes::weather::city_details))
        // Middleware
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_permissive() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET])
}

fn init_tracing(config: &Config) {
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,tower_http=debug,forecast_gateway_server=debug".into());

    if config.log_json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
