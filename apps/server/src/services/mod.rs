// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Service modules for forecast lookup, caching and archiving.

pub mod archive;
pub mod cache;
pub mod coordinator;
pub mod upstream;

pub use archive::{ArchiveStore, MemoryArchive, PgArchive};
pub use cache::ForecastCache;
pub use coordinator::Coordinator;
pub use upstream::{OpenMeteoClient, UpstreamError};
