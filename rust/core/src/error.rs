// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for request validation and payload decoding.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the pure gateway logic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A required request field was absent or empty.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The resolution selector is not one of the known horizons.
    #[error("Invalid resolution selector: {0:?}")]
    InvalidSelector(String),

    /// An upstream document did not match the forecast schema.
    #[error("Invalid forecast payload: {0}")]
    InvalidPayload(String),
}

impl Error {
    /// True for errors caused by the client's request rather than upstream data.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::MissingField(_) | Error::InvalidSelector(_))
    }
}
