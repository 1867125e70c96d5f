//! Centralized default constants for wip.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// PAGINATION
// =============================================================================

/// Page size used by the live feed for the initial load and each older page.
pub const FEED_PAGE_SIZE: i64 = 15;

/// Default page size for `GET /items` when the caller passes no limit.
pub const PAGE_LIMIT: i64 = 20;

/// Page size for the timeline (review) view.
pub const TIMELINE_PAGE_LIMIT: i64 = 100;

/// Default page offset.
pub const PAGE_OFFSET: i64 = 0;

// =============================================================================
// UPLOADS
// =============================================================================

/// Maximum accepted media file size (50MB).
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Bucket (top-level directory) that uploaded media lands in.
pub const STORAGE_BUCKET: &str = "done-media";

/// Maximum length of the sanitized filename stem in generated blob paths.
pub const FILE_STEM_MAX_LEN: usize = 50;

/// Length of the random suffix in generated blob paths.
pub const FILE_SUFFIX_LEN: usize = 6;

// =============================================================================
// FEED ENGINE
// =============================================================================

/// Prefix of the textual form of client-generated temporary item ids.
pub const TEMP_ID_PREFIX: &str = "temp-";

/// URL scheme of local (non-network) media preview references.
pub const PREVIEW_SCHEME: &str = "local-preview://";

/// Distance from the bottom (px) under which the feed counts as "at the bottom".
pub const SCROLL_BOTTOM_THRESHOLD_PX: f64 = 100.0;

/// Capacity of the engine's broadcast event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// SERVER / CLIENT
// =============================================================================

/// Default HTTP server bind address.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

/// Default request body limit of the API server (several max-size files).
pub const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Path prefix under which the API server serves stored media.
pub const MEDIA_ROUTE: &str = "/media";

/// Default base URL the HTTP client talks to.
pub const API_URL: &str = "http://localhost:3000";

/// Default request timeout for the HTTP client (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default directory for the filesystem blob store.
pub const BLOB_STORAGE_PATH: &str = "/var/lib/wip/blobs";
