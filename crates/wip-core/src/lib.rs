//! # wip-core
//!
//! Core types, traits, and validation rules for the wip done-items log.
//!
//! This crate provides the data model shared by the feed engine, the HTTP
//! client, and the API server, together with the store traits that the
//! engine consumes.

pub mod defaults;
pub mod error;
pub mod file_safety;
pub mod models;
pub mod temporal;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use file_safety::{
    detect_content_type, generate_file_path, is_image, is_valid_file_size, is_valid_file_type,
    is_video, is_video_url, sanitize_file_stem, validate_upload,
};
pub use models::*;
pub use temporal::DateRange;
pub use traits::*;
