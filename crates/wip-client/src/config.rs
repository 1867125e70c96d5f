//! Client configuration.

use wip_core::defaults::{API_URL, REQUEST_TIMEOUT_SECS};

/// Environment variable holding the API base URL.
pub const ENV_API_URL: &str = "WIP_API_URL";

/// Environment variable holding the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "WIP_TIMEOUT_SECS";

/// Configuration for the HTTP stores.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the wip API (no trailing slash needed).
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: API_URL.to_string(),
            timeout_seconds: REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Unset or unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let base_url = std::env::var(ENV_API_URL).unwrap_or_else(|_| API_URL.to_string());
        let timeout_seconds = std::env::var(ENV_TIMEOUT_SECS)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(REQUEST_TIMEOUT_SECS);

        Self {
            base_url,
            timeout_seconds,
        }
    }

    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }
}
