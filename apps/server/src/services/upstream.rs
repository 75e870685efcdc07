// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Open-Meteo forecast API client.
//!
//! One request per call, no retries. The client-level timeout is the only
//! timeout applied to upstream traffic.

use async_trait::async_trait;
use forecast_gateway_core::{DateWindow, ForecastPayload, Resolution};
use serde_json::Value;
use std::time::Duration;

/// Errors from the upstream forecast provider.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Network failure, timeout or non-2xx status.
    #[error("{0}")]
    Unavailable(String),

    /// The response body did not match the forecast schema.
    #[error("{0}")]
    Malformed(String),
}

/// Variables requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSet {
    pub current: Option<&'static [&'static str]>,
    pub hourly: &'static [&'static str],
    pub daily: Option<&'static [&'static str]>,
}

const FORECAST_HOURLY: &[&str] = &["temperature_2m", "weather_code"];
const LATEST_CURRENT: &[&str] = &["temperature_2m", "is_day", "weather_code"];
const MULTI_DAY_CURRENT: &[&str] = &["temperature_2m", "weather_code"];
const MULTI_DAY_DAILY: &[&str] = &["temperature_2m_max", "temperature_2m_min"];

const DETAIL_HOURLY: &[&str] = &["temperature_2m", "weather_code", "wind_speed_10m", "wind_direction_10m"];
const DETAIL_CURRENT: &[&str] = &[
    "temperature_2m",
    "is_day",
    "weather_code",
    "wind_speed_10m",
    "wind_direction_10m",
];
const DETAIL_DAILY_SHORT: &[&str] = &[
    "weather_code",
    "temperature_2m_max",
    "temperature_2m_min",
    "wind_speed_10m_max",
    "wind_gusts_10m_max",
];
const DETAIL_DAILY_RANGE: &[&str] = &[
    "weather_code",
    "temperature_2m_max",
    "temperature_2m_min",
    "wind_speed_10m_max",
    "wind_speed_10m_min",
];

impl FieldSet {
    /// Variables for a gateway forecast at `resolution`.
    pub fn forecast(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Latest => FieldSet {
                current: Some(LATEST_CURRENT),
                hourly: FORECAST_HOURLY,
                daily: None,
            },
            _ => FieldSet {
                current: Some(MULTI_DAY_CURRENT),
                hourly: FORECAST_HOURLY,
                daily: Some(MULTI_DAY_DAILY),
            },
        }
    }

    /// Variables for the city details view at `resolution`.
    pub fn city_details(resolution: Resolution) -> Self {
        match resolution {
            Resolution::SevenDays | Resolution::FifteenDays => FieldSet {
                current: None,
                hourly: DETAIL_HOURLY,
                daily: Some(DETAIL_DAILY_RANGE),
            },
            _ => FieldSet {
                current: Some(DETAIL_CURRENT),
                hourly: DETAIL_HOURLY,
                daily: Some(DETAIL_DAILY_SHORT),
            },
        }
    }

    fn query(&self, latitude: &str, longitude: &str, window: &DateWindow) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
        ];
        if let Some(current) = self.current {
            params.push(("current", current.join(",")));
        }
        params.push(("hourly", self.hourly.join(",")));
        if let Some(daily) = self.daily {
            params.push(("daily", daily.join(",")));
        }
        params.push(("start_date", window.start_param()));
        params.push(("end_date", window.end_param()));
        params
    }
}

/// Source of forecast documents.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// Fetch the forecast for a coordinate over `window`.
    async fn fetch(
        &self,
        latitude: &str,
        longitude: &str,
        resolution: Resolution,
        window: &DateWindow,
    ) -> Result<ForecastPayload, UpstreamError>;

    /// Fetch the detailed (wind, daily extremes) document, unshaped.
    async fn fetch_city_details(
        &self,
        latitude: &str,
        longitude: &str,
        resolution: Resolution,
        window: &DateWindow,
    ) -> Result<Value, UpstreamError>;
}

/// HTTP client for the Open-Meteo forecast endpoint.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    endpoint: String,
    http: reqwest::Client,
}

impl OpenMeteoClient {
    /// Create a client for `endpoint` (e.g. `https://api.open-meteo.com/v1/forecast`).
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("forecast-gateway/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            http,
        })
    }

    async fn get(&self, params: &[(&'static str, String)]) -> Result<Vec<u8>, UpstreamError> {
        let resp = self
            .http
            .get(&self.endpoint)
            .query(params)
            .send()
            .await
            .map_err(|e| UpstreamError::Unavailable(format!("Request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(UpstreamError::Unavailable(format!(
                "Upstream returned {}: {}",
                status, snippet
            )));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| UpstreamError::Unavailable(format!("Reading response failed: {e}")))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl ForecastSource for OpenMeteoClient {
    async fn fetch(
        &self,
        latitude: &str,
        longitude: &str,
        resolution: Resolution,
        window: &DateWindow,
    ) -> Result<ForecastPayload, UpstreamError> {
        let params = FieldSet::forecast(resolution).query(latitude, longitude, window);
        tracing::debug!(latitude, longitude, resolution = %resolution, window = %window, "Fetching upstream forecast");

        let body = self.get(&params).await?;
        ForecastPayload::from_slice(&body).map_err(|e| UpstreamError::Malformed(e.to_string()))
    }

    async fn fetch_city_details(
        &self,
        latitude: &str,
        longitude: &str,
        resolution: Resolution,
        window: &DateWindow,
    ) -> Result<Value, UpstreamError> {
        let params = FieldSet::city_details(resolution).query(latitude, longitude, window);
        tracing::debug!(latitude, longitude, resolution = %resolution, window = %window, "Fetching city details");

        let body = self.get(&params).await?;
        serde_json::from_slice(&body)
            .map_err(|e| UpstreamError::Malformed(format!("Invalid JSON: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn window() -> DateWindow {
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        DateWindow {
            start_date: day,
            end_date: day,
        }
    }

    fn client(server: &MockServer) -> OpenMeteoClient {
        OpenMeteoClient::new(&format!("{}/v1/forecast", server.uri()), Duration::from_secs(5)).unwrap()
    }

    fn forecast_body() -> Value {
        json!({
            "latitude": 40.710335,
            "longitude": -73.99307,
            "current": {"time": "2024-06-01T12:00", "temperature_2m": 15, "weather_code": 3},
            "hourly": {"time": ["2024-06-01T00:00"], "temperature_2m": [14.1], "weather_code": [3]}
        })
    }

    #[tokio::test]
    async fn test_fetch_latest_sends_current_and_hourly() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("latitude", "40.7"))
            .and(query_param("longitude", "-74.0"))
            .and(query_param("current", "temperature_2m,is_day,weather_code"))
            .and(query_param("hourly", "temperature_2m,weather_code"))
            .and(query_param_is_missing("daily"))
            .and(query_param("start_date", "2024-06-01"))
            .and(query_param("end_date", "2024-06-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .expect(1)
            .mount(&server)
            .await;

        let payload = client(&server)
            .fetch("40.7", "-74.0", Resolution::Latest, &window())
            .await
            .unwrap();
        assert_eq!(payload.current.weather_code, serde_json::Number::from(3));
        assert!(payload.daily.is_none());
    }

    #[tokio::test]
    async fn test_fetch_multi_day_requests_daily() {
        let server = MockServer::start().await;
        let mut body = forecast_body();
        body["daily"] = json!({"time": ["2024-06-01"], "temperature_2m_max": [20.0], "temperature_2m_min": [11.0]});

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("current", "temperature_2m,weather_code"))
            .and(query_param("daily", "temperature_2m_max,temperature_2m_min"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;

        let payload = client(&server)
            .fetch("40.7", "-74.0", Resolution::SevenDays, &window())
            .await
            .unwrap();
        assert!(payload.daily.is_some());
    }

    #[tokio::test]
    async fn test_non_success_status_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Too many requests"))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch("40.7", "-74.0", Resolution::Latest, &window())
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Unavailable(_)));
        assert!(err.to_string().contains("429"), "error should mention status: {}", err);
    }

    #[tokio::test]
    async fn test_schema_mismatch_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": false, "hourly": {}})))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch("40.7", "-74.0", Resolution::Latest, &window())
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        // Nothing listens on the discard port.
        let client = OpenMeteoClient::new("http://127.0.0.1:9/v1/forecast", Duration::from_secs(2)).unwrap();
        let err = client
            .fetch("40.7", "-74.0", Resolution::Latest, &window())
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_city_details_multi_day_omits_current() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param_is_missing("current"))
            .and(query_param(
                "daily",
                "weather_code,temperature_2m_max,temperature_2m_min,wind_speed_10m_max,wind_speed_10m_min",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"daily": {"time": []}})))
            .expect(1)
            .mount(&server)
            .await;

        let doc = client(&server)
            .fetch_city_details("40.7", "-74.0", Resolution::FifteenDays, &window())
            .await
            .unwrap();
        assert_eq!(doc, json!({"daily": {"time": []}}));
    }

    #[test]
    fn test_field_sets() {
        assert!(FieldSet::forecast(Resolution::Latest).daily.is_none());
        assert!(FieldSet::forecast(Resolution::Tomorrow).daily.is_some());
        assert!(FieldSet::city_details(Resolution::Latest).current.is_some());
        assert!(FieldSet::city_details(Resolution::SevenDays).current.is_none());
    }
}
