//! Error types for wip.

use thiserror::Error;

/// Result type alias using wip's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for wip operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Item not found
    #[error("Item not found: {0}")]
    ItemNotFound(uuid::Uuid),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A file was rejected before upload (type or size)
    #[error("Invalid file {file}: {reason}")]
    Validation { file: String, reason: String },

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Blob upload failed
    #[error("Upload error: {0}")]
    Upload(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
