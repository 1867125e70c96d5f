//! In-memory item store.
//!
//! Honors the full list/create/update/delete contract: newest-first pages,
//! inclusive date bounds, `has_more` iff the page is exactly `limit` long,
//! store-assigned ids and strictly increasing `created_at`.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use wip_core::{
    has_payload, normalize_content, CreateItemRequest, Error, Item, ItemStore, ListItemsRequest,
    ListItemsResponse, Result, UpdateItemRequest,
};

/// Items kept in a vector ordered oldest first.
#[derive(Default)]
pub struct MemoryItemStore {
    items: RwLock<Vec<Item>>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing items (any order).
    pub fn with_items(mut items: Vec<Item>) -> Self {
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Self {
            items: RwLock::new(items),
        }
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    pub async fn get(&self, id: Uuid) -> Option<Item> {
        self.items.read().await.iter().find(|i| i.id == id).cloned()
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn list(&self, req: ListItemsRequest) -> Result<ListItemsResponse> {
        if req.limit <= 0 || req.offset < 0 {
            return Err(Error::InvalidInput(format!(
                "invalid page: limit={} offset={}",
                req.limit, req.offset
            )));
        }
        let items = self.items.read().await;
        let page: Vec<Item> = items
            .iter()
            .rev()
            .filter(|i| req.matches(i.created_at))
            .skip(req.offset as usize)
            .take(req.limit as usize)
            .cloned()
            .collect();
        debug!(
            offset = req.offset,
            limit = req.limit,
            returned = page.len(),
            "Listed items"
        );
        Ok(ListItemsResponse::from_page(page, req.limit))
    }

    async fn create(&self, req: CreateItemRequest) -> Result<Item> {
        let req = req.normalized();
        req.validate()?;

        let mut items = self.items.write().await;
        let now = Utc::now();
        let created_at = match items.last() {
            Some(last) if last.created_at >= now => last.created_at + Duration::microseconds(1),
            _ => now,
        };
        let item = Item {
            id: Uuid::now_v7(),
            content: req.content,
            media_urls: req.media_urls,
            created_at,
        };
        items.push(item.clone());
        info!(item_id = %item.id, "Item created");
        Ok(item)
    }

    async fn update(&self, id: Uuid, req: UpdateItemRequest) -> Result<Item> {
        let mut items = self.items.write().await;
        let item = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(Error::ItemNotFound(id))?;

        let mut patched = item.clone();
        req.apply_to(&mut patched);
        patched.content = normalize_content(patched.content.as_deref());
        if patched.media_urls.as_ref().is_some_and(|m| m.is_empty()) {
            patched.media_urls = None;
        }
        if !has_payload(patched.content.as_deref(), patched.media()) {
            return Err(Error::InvalidInput(
                "An item needs content or at least one media file".to_string(),
            ));
        }
        *item = patched.clone();
        debug!(item_id = %id, "Item updated");
        Ok(patched)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut items = self.items.write().await;
        let pos = items
            .iter()
            .position(|i| i.id == id)
            .ok_or(Error::ItemNotFound(id))?;
        items.remove(pos);
        info!(item_id = %id, "Item deleted");
        Ok(())
    }
}
