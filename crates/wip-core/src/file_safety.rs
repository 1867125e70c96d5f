//! Upload validation and blob path generation.
//!
//! Only images and videos are accepted, up to [`MAX_FILE_SIZE`] bytes.
//! Validation runs on the caller side before any network traffic.

use chrono::Utc;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

use crate::defaults::{FILE_STEM_MAX_LEN, FILE_SUFFIX_LEN, MAX_FILE_SIZE};
use crate::error::{Error, Result};

/// Accepted image MIME types.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
];

/// Accepted video MIME types.
pub const ALLOWED_VIDEO_TYPES: &[&str] = &["video/mp4", "video/webm", "video/ogg", "video/quicktime"];

/// URL extensions rendered as video.
const VIDEO_URL_EXTENSIONS: &[&str] = &[".mp4", ".webm", ".ogg", ".mov", ".avi"];

static DISALLOWED_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9.-]").unwrap());
static DASH_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());

/// Whether the MIME type is on the image/video allow-list.
pub fn is_valid_file_type(mime: &str) -> bool {
    ALLOWED_IMAGE_TYPES.contains(&mime) || ALLOWED_VIDEO_TYPES.contains(&mime)
}

/// Whether the size is within the upload limit.
pub fn is_valid_file_size(size: u64) -> bool {
    size <= MAX_FILE_SIZE
}

pub fn is_image(mime: &str) -> bool {
    mime.starts_with("image/")
}

pub fn is_video(mime: &str) -> bool {
    mime.starts_with("video/")
}

/// Guess whether a stored media URL points at a video, by extension.
pub fn is_video_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    VIDEO_URL_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Validate a file before upload.
pub fn validate_upload(name: &str, mime: &str, size: u64) -> Result<()> {
    if !is_valid_file_type(mime) {
        return Err(Error::Validation {
            file: name.to_string(),
            reason: "Invalid file type. Only images and videos are allowed.".to_string(),
        });
    }
    if !is_valid_file_size(size) {
        return Err(Error::Validation {
            file: name.to_string(),
            reason: "File size exceeds 50MB limit.".to_string(),
        });
    }
    Ok(())
}

/// Sanitize a filename stem for use in a blob path.
///
/// Lowercases, replaces anything outside `[a-z0-9.-]` with a dash, collapses
/// dash runs, trims leading/trailing dashes, and truncates to
/// [`FILE_STEM_MAX_LEN`] characters.
pub fn sanitize_file_stem(stem: &str) -> String {
    let lower = stem.to_lowercase();
    let replaced = DISALLOWED_CHARS.replace_all(&lower, "-");
    let collapsed = DASH_RUNS.replace_all(&replaced, "-");
    let trimmed = collapsed.trim_matches('-');
    // Only ASCII survives the replacement, so byte truncation is char-safe.
    trimmed[..trimmed.len().min(FILE_STEM_MAX_LEN)].to_string()
}

/// Split `name` into `(stem, extension)`; the extension is the part after
/// the last dot, if any.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (name, None),
    }
}

/// Generate a unique blob path: `{timestamp_ms}-{random}-{sanitized}.{ext}`.
pub fn generate_file_path(original_name: &str) -> String {
    let suffix: String = {
        const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
        let mut rng = rand::thread_rng();
        (0..FILE_SUFFIX_LEN)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    };
    build_file_path(original_name, Utc::now().timestamp_millis(), &suffix)
}

/// Deterministic core of [`generate_file_path`].
pub fn build_file_path(original_name: &str, timestamp_ms: i64, suffix: &str) -> String {
    let (stem, ext) = split_extension(original_name);
    let sanitized = sanitize_file_stem(stem);
    match ext {
        Some(ext) => format!("{}-{}-{}.{}", timestamp_ms, suffix, sanitized, ext),
        None => format!("{}-{}-{}", timestamp_ms, suffix, sanitized),
    }
}

/// Resolve the content type of an uploaded part.
///
/// A claimed type wins unless it is missing or generic, in which case the
/// magic bytes decide.
pub fn detect_content_type(data: &[u8], claimed: Option<&str>) -> String {
    match claimed {
        Some(c) if !c.is_empty() && c != "application/octet-stream" => c.to_string(),
        _ => infer::get(data)
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string()),
    }
}
