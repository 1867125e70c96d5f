//! Server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use wip_core::defaults::{BLOB_STORAGE_PATH, MAX_UPLOAD_BYTES, MEDIA_ROUTE, SERVER_HOST, SERVER_PORT};
use wip_core::{Error, Result};

/// Configuration for the API server, read from the environment.
///
/// | Variable            | Default                         |
/// |---------------------|---------------------------------|
/// | `HOST`              | `0.0.0.0`                       |
/// | `PORT`              | `3000`                          |
/// | `BLOB_STORAGE_PATH` | `/var/lib/wip/blobs`            |
/// | `PUBLIC_BASE_URL`   | `http://localhost:{PORT}/media` |
/// | `MAX_UPLOAD_BYTES`  | 256MB                           |
/// | `ALLOWED_ORIGINS`   | any origin                      |
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub blob_storage_path: PathBuf,
    pub public_base_url: String,
    pub max_upload_bytes: usize,
    pub allowed_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: SERVER_HOST.to_string(),
            port: SERVER_PORT,
            blob_storage_path: PathBuf::from(BLOB_STORAGE_PATH),
            public_base_url: format!("http://localhost:{}{}", SERVER_PORT, MEDIA_ROUTE),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            allowed_origins: Vec::new(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Malformed numbers are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(v) => v
                .parse()
                .map_err(|_| Error::Config(format!("PORT must be a port number, got {:?}", v)))?,
            None => defaults.port,
        };
        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(v) => v.parse().map_err(|_| {
                Error::Config(format!("MAX_UPLOAD_BYTES must be a byte count, got {:?}", v))
            })?,
            None => defaults.max_upload_bytes,
        };
        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            blob_storage_path: lookup("BLOB_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.blob_storage_path),
            public_base_url: lookup("PUBLIC_BASE_URL")
                .unwrap_or_else(|| format!("http://localhost:{}{}", port, MEDIA_ROUTE)),
            max_upload_bytes,
            allowed_origins,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("invalid bind address {}:{}: {}", self.host, self.port, e)))
    }
}
