//! Core data models for wip.
//!
//! These types are shared across all wip crates. `Item` mirrors the stored
//! row (snake_case on the wire); request and response envelopes use the
//! camelCase field names of the HTTP surface.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::temporal::DateRange;

// =============================================================================
// ITEM TYPES
// =============================================================================

/// A persisted done item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub content: Option<String>,
    pub media_urls: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Media URLs as a slice (empty when the column is null).
    pub fn media(&self) -> &[String] {
        self.media_urls.as_deref().unwrap_or(&[])
    }
}

/// Trim text and map blank strings to `None`.
pub fn normalize_content(content: Option<&str>) -> Option<String> {
    content
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

/// Check the item invariant: non-blank content or at least one media URL.
pub fn has_payload(content: Option<&str>, media_urls: &[String]) -> bool {
    normalize_content(content).is_some() || !media_urls.is_empty()
}

/// Request body for creating an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub media_urls: Option<Vec<String>>,
}

impl CreateItemRequest {
    /// Build a normalized request: blank content becomes `None`, an empty
    /// media list becomes `None`.
    pub fn new(content: Option<&str>, media_urls: Vec<String>) -> Self {
        Self {
            content: normalize_content(content),
            media_urls: if media_urls.is_empty() {
                None
            } else {
                Some(media_urls)
            },
        }
    }

    /// Normalize a request received over the wire.
    pub fn normalized(self) -> Self {
        Self::new(self.content.as_deref(), self.media_urls.unwrap_or_default())
    }

    /// Reject requests carrying neither content nor media.
    pub fn validate(&self) -> Result<()> {
        let media = self.media_urls.as_deref().unwrap_or(&[]);
        if !has_payload(self.content.as_deref(), media) {
            return Err(Error::InvalidInput(
                "An item needs content or at least one media file".to_string(),
            ));
        }
        Ok(())
    }
}

/// Request body for a partial update.
///
/// Absent fields are left untouched; a field explicitly set to `null` clears
/// the column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub media_urls: Option<Option<Vec<String>>>,
}

impl UpdateItemRequest {
    /// Content-only edit; blank content is sent as `null`.
    pub fn content(content: &str) -> Self {
        Self {
            content: Some(normalize_content(Some(content))),
            media_urls: None,
        }
    }

    /// Whether the request changes nothing.
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.media_urls.is_none()
    }

    /// Apply the patch to an item in place.
    pub fn apply_to(&self, item: &mut Item) {
        if let Some(content) = &self.content {
            item.content = content.clone();
        }
        if let Some(media) = &self.media_urls {
            item.media_urls = media.clone();
        }
    }
}

/// Distinguish a present `null` from an absent field.
fn deserialize_some<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

// =============================================================================
// LISTING
// =============================================================================

/// Paginated list request, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItemsRequest {
    pub limit: i64,
    pub offset: i64,
    /// Inclusive lower bound on `created_at`.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub end_date: Option<DateTime<Utc>>,
}

impl ListItemsRequest {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit,
            offset,
            start_date: None,
            end_date: None,
        }
    }

    /// Restrict to an optional date range.
    pub fn with_range(mut self, range: Option<DateRange>) -> Self {
        self.start_date = range.map(|r| r.start);
        self.end_date = range.map(|r| r.end);
        self
    }

    /// Whether `created_at` satisfies the date bounds.
    pub fn matches(&self, created_at: DateTime<Utc>) -> bool {
        self.start_date.map_or(true, |s| created_at >= s)
            && self.end_date.map_or(true, |e| created_at <= e)
    }
}

/// Query string of `GET /items`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

impl From<&ListItemsRequest> for ListItemsQuery {
    fn from(req: &ListItemsRequest) -> Self {
        Self {
            limit: Some(req.limit),
            offset: Some(req.offset),
            start_date: req.start_date,
            end_date: req.end_date,
        }
    }
}

impl ListItemsQuery {
    /// Resolve defaults into a list request.
    pub fn into_request(self) -> Result<ListItemsRequest> {
        let limit = self.limit.unwrap_or(crate::defaults::PAGE_LIMIT);
        let offset = self.offset.unwrap_or(crate::defaults::PAGE_OFFSET);
        if limit <= 0 {
            return Err(Error::InvalidInput(format!(
                "limit must be positive, got {}",
                limit
            )));
        }
        if offset < 0 {
            return Err(Error::InvalidInput(format!(
                "offset must not be negative, got {}",
                offset
            )));
        }
        Ok(ListItemsRequest {
            limit,
            offset,
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }
}

/// One page of items, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemsResponse {
    pub items: Vec<Item>,
    pub has_more: bool,
}

impl ListItemsResponse {
    /// Build a page; `has_more` is true iff the page is exactly `limit` long.
    pub fn from_page(items: Vec<Item>, limit: i64) -> Self {
        let has_more = items.len() as i64 == limit;
        Self { items, has_more }
    }
}

// =============================================================================
// FILES AND UPLOADS
// =============================================================================

/// A file picked locally and not yet uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Location of an uploaded blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBlob {
    pub url: String,
    pub path: String,
}

/// One successfully uploaded file in an upload response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub url: String,
    pub path: String,
    #[serde(rename = "type")]
    pub content_type: String,
}

/// One rejected file in an upload response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFailure {
    pub file: String,
    pub error: String,
}

/// Response of `POST /upload`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub files: Vec<UploadedFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<UploadFailure>>,
}
