//! Store traits consumed by the feed engine.
//!
//! These define the narrow contract the engine needs from its remote
//! collaborators, enabling HTTP, in-memory, and mock backends.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

/// Remote store owning the persisted items.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Fetch one page ordered newest first.
    ///
    /// `has_more` is true iff the page is exactly `limit` long.
    async fn list(&self, req: ListItemsRequest) -> Result<ListItemsResponse>;

    /// Create an item; the store assigns `id` and `created_at`.
    async fn create(&self, req: CreateItemRequest) -> Result<Item>;

    /// Apply a partial update and return the stored item.
    async fn update(&self, id: Uuid, req: UpdateItemRequest) -> Result<Item>;

    /// Delete an item.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// Remote store for uploaded media.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload one file under a generated unique path and return its public URL.
    ///
    /// Callers validate type and size first (see [`crate::validate_upload`]).
    async fn upload(&self, file: &LocalFile) -> Result<StoredBlob>;
}
