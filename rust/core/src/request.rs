// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound forecast request validation.

use crate::error::{Error, Result};
use crate::partition::CacheKey;
use crate::resolution::Resolution;
use serde::Deserialize;

/// Forecast request as received from a client.
///
/// Accepts both the short query names used by the web client (`lat`, `lon`,
/// `selectedValue`) and the long ones.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastRequest {
    #[serde(default, alias = "lat")]
    pub latitude: Option<String>,
    #[serde(default, alias = "lon")]
    pub longitude: Option<String>,
    #[serde(default, alias = "selectedValue")]
    pub resolution: Option<String>,
}

impl ForecastRequest {
    pub fn new(
        latitude: impl Into<String>,
        longitude: impl Into<String>,
        resolution: impl Into<String>,
    ) -> Self {
        Self {
            latitude: Some(latitude.into()),
            longitude: Some(longitude.into()),
            resolution: Some(resolution.into()),
        }
    }

    /// Check presence of every field and parse the selector.
    ///
    /// Empty strings count as missing. Coordinates are kept verbatim: they
    /// are cache keys, not numbers.
    pub fn validate(&self) -> Result<CacheKey> {
        let latitude = required(&self.latitude, "latitude")?;
        let longitude = required(&self.longitude, "longitude")?;
        let resolution: Resolution = required(&self.resolution, "resolution")?.parse()?;
        Ok(CacheKey::new(latitude, longitude, resolution))
    }
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::MissingField(field)),
    }
}
