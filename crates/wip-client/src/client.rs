//! Shared HTTP plumbing for the item and blob stores.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use tracing::warn;

use wip_core::{Error, Result};

use crate::config::ClientConfig;

/// Error body returned by the API: `{"error": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// A configured reqwest client bound to one API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base = config.base_url.trim_end_matches('/');
        let base_url = Url::parse(&format!("{}/", base))
            .map_err(|e| Error::Config(format!("invalid API URL {}: {}", config.base_url, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn http(&self) -> &Client {
        &self.client
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint path (no leading slash) against the base URL.
    pub fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("invalid endpoint {}: {}", path, e)))
    }

    /// Pass successful responses through; turn everything else into an error.
    ///
    /// 404 becomes [`Error::NotFound`] and 400 becomes [`Error::InvalidInput`]
    /// so callers can tell a gone resource from a transport failure.
    pub async fn check(&self, endpoint: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error)
            .unwrap_or(text);
        warn!(endpoint, status = %status, error = %message, "API request failed");

        Err(match status {
            StatusCode::NOT_FOUND => Error::NotFound(message),
            StatusCode::BAD_REQUEST => Error::InvalidInput(message),
            _ => Error::Request(format!("API returned {}: {}", status, message)),
        })
    }
}
