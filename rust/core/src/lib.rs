// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Forecast Gateway Core
//!
//! Pure logic behind the forecast gateway: everything that decides *what*
//! to ask the upstream provider and *whether* a stored forecast may still be
//! served, with no I/O of its own.
//!
//! ## Overview
//!
//! - **Resolution**: the forecast horizon a client asks for
//!   (`Latest`, `Tomorrow`, `7days`, `15days`)
//! - **Window Resolver**: maps a resolution and "now" to the
//!   `start_date`/`end_date` pair of the upstream query
//! - **Partitions**: per-resolution short-term cache lists with lazy,
//!   read-triggered expiry
//! - **Payloads**: upstream forecast documents and the shaped client response
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use forecast_gateway_core::{window, ForecastRequest, SystemClock, Clock};
//!
//! let key = ForecastRequest::new("40.7", "-74.0", "7days").validate()?;
//! let window = window::resolve(key.resolution, SystemClock.now());
//! println!("{} -> {}", key, window);
//! ```

pub mod clock;
pub mod error;
pub mod partition;
pub mod payload;
pub mod request;
pub mod resolution;
pub mod window;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Error, Result};
pub use partition::{default_ttl, CacheEntry, CacheKey, Lookup, Partition, DEFAULT_TTL_SECS};
pub use payload::{CurrentConditions, ForecastPayload, ForecastResponse};
pub use request::ForecastRequest;
pub use resolution::Resolution;
pub use window::{resolve, resolve_detail_window, resolve_str, DateWindow};
