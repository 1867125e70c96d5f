//! # wip-client
//!
//! HTTP implementations of [`wip_core::ItemStore`] and
//! [`wip_core::BlobStore`] that talk to a running `wip-api` server.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wip_client::{ClientConfig, HttpBlobStore, HttpItemStore};
//! use wip_feed::{FeedConfig, FeedEngine};
//!
//! #[tokio::main]
//! async fn main() -> wip_core::Result<()> {
//!     let config = ClientConfig::from_env();
//!     let engine = FeedEngine::new(
//!         Arc::new(HttpItemStore::new(config.clone())?),
//!         Arc::new(HttpBlobStore::new(config)?),
//!         FeedConfig::default(),
//!     );
//!     engine.initial_load(None).await?;
//!     Ok(())
//! }
//! ```

pub mod blobs;
pub mod client;
pub mod config;
pub mod items;

pub use blobs::HttpBlobStore;
pub use client::ApiClient;
pub use config::ClientConfig;
pub use items::HttpItemStore;
