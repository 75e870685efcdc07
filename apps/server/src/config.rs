// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Server configuration loaded from environment variables.

use forecast_gateway_core::DEFAULT_TTL_SECS;

/// Default upstream forecast endpoint.
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on.
    pub port: u16,
    /// Directory for the short-term forecast cache.
    pub cache_dir: String,
    /// Cache entry time-to-live in seconds.
    pub cache_ttl_secs: i64,
    /// Consult the short-term cache before fetching upstream.
    pub cache_reads_enabled: bool,
    /// PostgreSQL connection string for the forecast archive.
    /// When unset, the archive lives in process memory.
    pub database_url: Option<String>,
    /// Upstream forecast API endpoint.
    pub upstream_url: String,
    /// Upstream request timeout in seconds.
    pub upstream_timeout_secs: u64,
    /// Overall request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Allowed CORS origins (comma-separated, or "*" for all).
    pub cors_origins: Vec<String>,
    /// Emit JSON logs instead of human-readable ones.
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |name: &str, default: u64| -> u64 {
            lookup(name)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };
        let flag = |name: &str| -> bool {
            lookup(name)
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(false)
        };

        Self {
            port: lookup("PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(5000),
            cache_dir: lookup("CACHE_DIR").unwrap_or_else(|| {
                std::env::current_dir()
                    .ok()
                    .and_then(|dir| dir.join(".cache").to_str().map(|s| s.to_string()))
                    .unwrap_or_else(|| "./.cache".into())
            }),
            cache_ttl_secs: lookup("CACHE_TTL_SECS")
                .and_then(|v| v.trim().parse().ok())
                .filter(|secs: &i64| *secs >= 0)
                .unwrap_or(DEFAULT_TTL_SECS),
            cache_reads_enabled: flag("CACHE_READS_ENABLED"),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            upstream_url: lookup("UPSTREAM_URL").unwrap_or_else(|| DEFAULT_UPSTREAM_URL.into()),
            upstream_timeout_secs: parsed("UPSTREAM_TIMEOUT_SECS", 10),
            request_timeout_secs: parsed("REQUEST_TIMEOUT_SECS", 30),
            cors_origins: lookup("CORS_ORIGINS")
                .unwrap_or_else(|| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            log_json: lookup("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
        }
    }

    /// Whether every origin is allowed.
    pub fn cors_permissive(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
