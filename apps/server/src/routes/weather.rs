// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Forecast endpoints.

use crate::error::ApiError;
use crate::types::{CityDetailsResponse, FORECAST_SOURCE_HEADER};
use crate::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use forecast_gateway_core::ForecastRequest;

/// GET /api/weather - Forecast for a coordinate and resolution.
pub async fn forecast(
    State(state): State<AppState>,
    query: Result<Query<ForecastRequest>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(request) = query?;
    let outcome = state.coordinator.forecast(&request).await?;

    tracing::debug!(origin = %outcome.origin, "Serving forecast");

    Ok((
        [(FORECAST_SOURCE_HEADER, outcome.origin.as_str())],
        Json(outcome.body),
    )
        .into_response())
}

/// GET /api/cityDetails - Detailed forecast passthrough.
pub async fn city_details(
    State(state): State<AppState>,
    query: Result<Query<ForecastRequest>, QueryRejection>,
) -> Result<Json<CityDetailsResponse>, ApiError> {
    let Query(request) = query?;
    let city_details = state.coordinator.city_details(&request).await?;
    Ok(Json(CityDetailsResponse { city_details }))
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::services::{Coordinator, ForecastCache, MemoryArchive, OpenMeteoClient};
    use crate::{build_router, AppState};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use chrono::{TimeZone, Utc};
    use forecast_gateway_core::{default_ttl, FixedClock};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn upstream_document() -> Value {
        json!({
            "latitude": 40.710335,
            "longitude": -73.99307,
            "current": {"time": "2024-06-01T12:00", "temperature_2m": 15, "weather_code": 3},
            "hourly": {"time": ["2024-06-01T00:00"], "temperature_2m": [14.1], "weather_code": [3]}
        })
    }

    async fn app(server: &MockServer, dir: &tempfile::TempDir) -> (Router, Arc<Coordinator>) {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()));
        let cache = Arc::new(
            ForecastCache::new(dir.path().to_str().unwrap(), default_ttl(), clock.clone()).await,
        );
        let archive = Arc::new(MemoryArchive::new(clock.clone()));
        let upstream = Arc::new(
            OpenMeteoClient::new(&format!("{}/v1/forecast", server.uri()), Duration::from_secs(5))
                .unwrap(),
        );
        let coordinator = Arc::new(Coordinator::new(archive, cache, upstream, clock));

        let mut config = Config::from_lookup(|_| None);
        config.cache_dir = dir.path().to_string_lossy().into_owned();

        let state = AppState {
            coordinator: coordinator.clone(),
            config: Arc::new(config),
        };
        (build_router(state), coordinator)
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Option<String>, Value) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let source = response
            .headers()
            .get("x-forecast-source")
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, source, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_forecast_then_archive_hit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(upstream_document()))
            .expect(1)
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let (app, coordinator) = app(&server, &dir).await;

        let (status, source, body) = get(&app, "/api/weather?lat=40.7&lon=-74.0&selectedValue=Latest").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(source.as_deref(), Some("upstream"));
        assert_eq!(body["current_weather"], json!(3));
        assert_eq!(body["current_temperature"], json!(15));
        assert!(body.get("daily").is_none());

        coordinator.wait_for_persistence().await;

        let (status, source, body) = get(&app, "/api/weather?lat=40.7&lon=-74.0&selectedValue=Latest").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(source.as_deref(), Some("archive"));
        assert_eq!(body, upstream_document());
    }

    #[tokio::test]
    async fn test_invalid_selector_is_bad_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(upstream_document()))
            .expect(0)
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app(&server, &dir).await;

        let (status, _, body) = get(&app, "/api/weather?lat=40.7&lon=-74.0&selectedValue=invalid").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], json!("VALIDATION_ERROR"));
    }

    #[tokio::test]
    async fn test_missing_parameter_is_bad_request() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app(&server, &dir).await;

        let (status, _, body) = get(&app, "/api/weather?lat=40.7&selectedValue=Latest").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("longitude"));
    }

    #[tokio::test]
    async fn test_malformed_query_is_json_validation_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(upstream_document()))
            .expect(0)
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app(&server, &dir).await;

        // `lat` is an alias of `latitude`, so this sets the field twice.
        let (status, _, body) =
            get(&app, "/api/weather?lat=40.7&latitude=41.0&lon=-74.0&selectedValue=Latest").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], json!("VALIDATION_ERROR"));

        let (status, _, body) =
            get(&app, "/api/cityDetails?lon=1&longitude=2&lat=40.7&selectedValue=Latest").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], json!("VALIDATION_ERROR"));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app(&server, &dir).await;

        let (status, _, body) = get(&app, "/api/weather?lat=40.7&lon=-74.0&selectedValue=7days").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], json!("UPSTREAM_UNAVAILABLE"));
    }

    #[tokio::test]
    async fn test_city_details_wraps_upstream_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"daily": {"time": ["2024-06-01"]}})))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app(&server, &dir).await;

        let (status, _, body) = get(&app, "/api/cityDetails?lat=40.7&lon=-74.0&selectedValue=15days").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"cityDetails": {"daily": {"time": ["2024-06-01"]}}}));
    }

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app(&server, &dir).await;

        let (status, _, body) = get(&app, "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!("healthy"));
    }
}
