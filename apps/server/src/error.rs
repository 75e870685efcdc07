// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types and handling for the server.

use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream forecast service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream forecast response malformed: {0}")]
    UpstreamMalformed(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Errors raised by the cache and archive stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cache storage error: {0}")]
    Cacache(#[from] cacache::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ApiError {
    /// Status code and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::UpstreamUnavailable(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_UNAVAILABLE")
            }
            ApiError::UpstreamMalformed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_MALFORMED")
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(error = %self, code, "Request failed");
        } else {
            tracing::debug!(error = %self, code, "Request rejected");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<forecast_gateway_core::Error> for ApiError {
    fn from(err: forecast_gateway_core::Error) -> Self {
        if err.is_validation() {
            ApiError::Validation(err.to_string())
        } else {
            ApiError::UpstreamMalformed(err.to_string())
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(format!("JSON error: {}", err))
    }
}

impl From<crate::services::UpstreamError> for ApiError {
    fn from(err: crate::services::UpstreamError) -> Self {
        use crate::services::UpstreamError;
        match err {
            UpstreamError::Unavailable(msg) => ApiError::UpstreamUnavailable(msg),
            UpstreamError::Malformed(msg) => ApiError::UpstreamMalformed(msg),
        }
    }
}
