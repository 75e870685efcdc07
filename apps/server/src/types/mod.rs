// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Type definitions for API responses.
//!
//! Forecast request and response bodies are defined in
//! `forecast_gateway_core`; this module holds the server-only wrappers.

mod response;

pub use response::{CityDetailsResponse, FORECAST_SOURCE_HEADER};
