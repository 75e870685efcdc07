// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Forecast documents and client response shaping.

use crate::error::{Error, Result};
use crate::resolution::Resolution;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// `current` section of an upstream forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature_2m: Number,
    pub weather_code: Number,
    /// `time`, `interval`, `is_day` and anything else upstream sends.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A forecast document as returned by the upstream provider.
///
/// Only the sections the gateway reads are typed. All other top-level
/// fields (`latitude`, `elevation`, `timezone`, `*_units`, ...) are kept in
/// `extra` so that serializing a payload reproduces the upstream document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPayload {
    pub current: CurrentConditions,
    pub hourly: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ForecastPayload {
    /// Decode an upstream JSON document.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::InvalidPayload(e.to_string()))
    }

    /// Decode an upstream JSON body.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| Error::InvalidPayload(e.to_string()))
    }

    /// The full document as JSON.
    pub fn to_value(&self) -> Value {
        // Maps and numbers always serialize.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Build the client-facing response for `resolution`.
    pub fn shape(&self, resolution: Resolution) -> ForecastResponse {
        ForecastResponse {
            current_weather: self.current.weather_code.clone(),
            current_temperature: self.current.temperature_2m.clone(),
            hourly: self.hourly.clone(),
            daily: if resolution.includes_daily() {
                self.daily.clone()
            } else {
                None
            },
        }
    }
}

/// Response body for a freshly fetched or cached forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub current_weather: Number,
    pub current_temperature: Number,
    pub hourly: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily: Option<Map<String, Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn upstream_document() -> Value {
        json!({
            "latitude": 40.710335,
            "longitude": -73.99307,
            "generationtime_ms": 0.05,
            "timezone": "GMT",
            "current_units": {"temperature_2m": "°C"},
            "current": {"time": "2024-06-01T12:00", "interval": 900, "temperature_2m": 15, "weather_code": 3},
            "hourly": {"time": ["2024-06-01T00:00"], "temperature_2m": [14.2], "weather_code": [3]},
            "daily": {"time": ["2024-06-01"], "temperature_2m_max": [19.0], "temperature_2m_min": [11.5]}
        })
    }

    #[test]
    fn test_document_survives_decode() {
        let doc = upstream_document();
        let payload = ForecastPayload::from_value(doc.clone()).unwrap();
        assert_eq!(payload.to_value(), doc);
        assert_eq!(payload.extra["timezone"], json!("GMT"));
        assert_eq!(payload.current.extra["interval"], json!(900));
    }

    #[test]
    fn test_shape_latest_omits_daily() {
        let payload = ForecastPayload::from_value(upstream_document()).unwrap();
        let shaped = serde_json::to_value(payload.shape(Resolution::Latest)).unwrap();
        assert_eq!(
            shaped,
            json!({
                "current_weather": 3,
                "current_temperature": 15,
                "hourly": {"time": ["2024-06-01T00:00"], "temperature_2m": [14.2], "weather_code": [3]}
            })
        );
    }

    #[test]
    fn test_shape_multi_day_includes_daily() {
        let payload = ForecastPayload::from_value(upstream_document()).unwrap();
        let shaped = payload.shape(Resolution::SevenDays);
        let daily = shaped.daily.expect("daily section");
        assert_eq!(daily["temperature_2m_max"], json!([19.0]));
    }

    #[test]
    fn test_missing_current_is_invalid() {
        let err = ForecastPayload::from_value(json!({"hourly": {}})).unwrap_err();
        assert!(matches!(err, Error::InvalidPayload(_)));
        assert!(!err.is_validation());
    }

    #[test]
    fn test_non_numeric_temperature_is_invalid() {
        let doc = json!({
            "current": {"temperature_2m": "warm", "weather_code": 1},
            "hourly": {}
        });
        assert!(ForecastPayload::from_value(doc).is_err());
    }

    #[test]
    fn test_from_slice_rejects_garbage() {
        assert!(ForecastPayload::from_slice(b"<html>busy</html>").is_err());
    }
}
