// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response types for the API.

use serde::Serialize;
use serde_json::Value;

/// Header naming where a forecast response came from.
pub const FORECAST_SOURCE_HEADER: &str = "x-forecast-source";

/// City details response wrapping the raw upstream document.
#[derive(Debug, Clone, Serialize)]
pub struct CityDetailsResponse {
    #[serde(rename = "cityDetails")]
    pub city_details: Value,
}
