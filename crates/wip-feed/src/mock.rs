//! Scriptable in-process stores for engine tests.
//!
//! Both mocks log every call, can be told to fail a given operation, and can
//! hold requests at a gate until the test releases them. Gates are what make
//! interleavings reproducible: start two operations, then decide which one
//! completes first.
//!
//! ```rust,ignore
//! let items = MockItemStore::new()
//!     .with_items(fixtures)
//!     .with_failure(Operation::Delete)
//!     .with_gate(Operation::Create);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Semaphore;
use uuid::Uuid;

use wip_core::{
    generate_file_path, BlobStore, CreateItemRequest, Error, Item, ItemStore, ListItemsRequest,
    ListItemsResponse, LocalFile, Result, StoredBlob, UpdateItemRequest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Create,
    Update,
    Delete,
    Upload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub operation: Operation,
    pub input: String,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Shared call log, failure switches, and gates.
#[derive(Clone, Default)]
struct Script {
    call_log: Arc<Mutex<Vec<MockCall>>>,
    failing: Arc<Mutex<HashSet<Operation>>>,
    gates: Arc<Mutex<HashMap<Operation, Arc<Semaphore>>>>,
}

impl Script {
    fn log_call(&self, operation: Operation, input: String) {
        lock(&self.call_log).push(MockCall { operation, input });
    }

    fn set_failing(&self, operation: Operation, failing: bool) {
        let mut set = lock(&self.failing);
        if failing {
            set.insert(operation);
        } else {
            set.remove(&operation);
        }
    }

    fn add_gate(&self, operation: Operation) {
        lock(&self.gates).insert(operation, Arc::new(Semaphore::new(0)));
    }

    fn release(&self, operation: Operation, count: usize) {
        if let Some(gate) = lock(&self.gates).get(&operation) {
            gate.add_permits(count);
        }
    }

    /// Log the call, wait at the gate, then report whether to fail.
    async fn enter(&self, operation: Operation, input: String) -> Result<()> {
        self.log_call(operation, input);
        let gate = lock(&self.gates).get(&operation).cloned();
        if let Some(gate) = gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|e| Error::Internal(e.to_string()))?;
            permit.forget();
        }
        if lock(&self.failing).contains(&operation) {
            return Err(Error::Request(format!("mock {:?} failure", operation)));
        }
        Ok(())
    }

    fn calls(&self) -> Vec<MockCall> {
        lock(&self.call_log).clone()
    }

    fn call_count(&self, operation: Operation) -> usize {
        lock(&self.call_log)
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    async fn wait_for_calls(&self, operation: Operation, count: usize) {
        while self.call_count(operation) < count {
            tokio::time::sleep(StdDuration::from_millis(1)).await;
        }
    }
}

// =============================================================================
// ITEM STORE
// =============================================================================

/// In-memory [`ItemStore`] with scripting hooks.
#[derive(Clone, Default)]
pub struct MockItemStore {
    items: Arc<Mutex<Vec<Item>>>,
    script: Script,
}

impl MockItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed stored items.
    pub fn with_items(self, items: Vec<Item>) -> Self {
        lock(&self.items).extend(items);
        self
    }

    pub fn with_failure(self, operation: Operation) -> Self {
        self.script.set_failing(operation, true);
        self
    }

    /// Hold every `operation` request until [`release`](Self::release).
    pub fn with_gate(self, operation: Operation) -> Self {
        self.script.add_gate(operation);
        self
    }

    pub fn set_failing(&self, operation: Operation, failing: bool) {
        self.script.set_failing(operation, failing);
    }

    pub fn release(&self, operation: Operation, count: usize) {
        self.script.release(operation, count);
    }

    pub fn get_calls(&self) -> Vec<MockCall> {
        self.script.calls()
    }

    pub fn call_count(&self, operation: Operation) -> usize {
        self.script.call_count(operation)
    }

    /// Wait until `count` calls of `operation` reached the store.
    pub async fn wait_for_calls(&self, operation: Operation, count: usize) {
        self.script.wait_for_calls(operation, count).await
    }

    /// Snapshot of stored items, newest first.
    pub fn stored(&self) -> Vec<Item> {
        let mut items = lock(&self.items).clone();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items
    }

    /// Insert directly, bypassing the script (another client wrote it).
    pub fn insert_remote(&self, item: Item) {
        lock(&self.items).push(item);
    }

    pub fn remove_remote(&self, id: Uuid) {
        lock(&self.items).retain(|i| i.id != id);
    }
}

#[async_trait]
impl ItemStore for MockItemStore {
    async fn list(&self, req: ListItemsRequest) -> Result<ListItemsResponse> {
        self.script
            .enter(Operation::List, format!("offset={} limit={}", req.offset, req.limit))
            .await?;
        let page: Vec<Item> = self
            .stored()
            .into_iter()
            .filter(|i| req.matches(i.created_at))
            .skip(req.offset as usize)
            .take(req.limit as usize)
            .collect();
        Ok(ListItemsResponse::from_page(page, req.limit))
    }

    async fn create(&self, req: CreateItemRequest) -> Result<Item> {
        self.script
            .enter(Operation::Create, req.content.clone().unwrap_or_default())
            .await?;
        req.validate()?;
        let mut items = lock(&self.items);
        let latest = items.iter().map(|i| i.created_at).max();
        let now = Utc::now();
        let created_at = match latest {
            Some(latest) if latest >= now => latest + Duration::milliseconds(1),
            _ => now,
        };
        let item = Item {
            id: Uuid::now_v7(),
            content: req.content,
            media_urls: req.media_urls,
            created_at,
        };
        items.push(item.clone());
        Ok(item)
    }

    async fn update(&self, id: Uuid, req: UpdateItemRequest) -> Result<Item> {
        self.script.enter(Operation::Update, id.to_string()).await?;
        let mut items = lock(&self.items);
        let item = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(Error::ItemNotFound(id))?;
        req.apply_to(item);
        Ok(item.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.script.enter(Operation::Delete, id.to_string()).await?;
        let mut items = lock(&self.items);
        let before = items.len();
        items.retain(|i| i.id != id);
        if items.len() == before {
            return Err(Error::ItemNotFound(id));
        }
        Ok(())
    }
}

// =============================================================================
// BLOB STORE
// =============================================================================

/// [`BlobStore`] that records uploads and hands out fake public URLs.
#[derive(Clone, Default)]
pub struct MockBlobStore {
    failing_files: Arc<Mutex<HashSet<String>>>,
    script: Script,
}

impl MockBlobStore {
    pub const BASE_URL: &'static str = "https://blobs.test/done-media";

    pub fn new() -> Self {
        Self::default()
    }

    /// Fail uploads of the named file only.
    pub fn with_failing_file(self, name: impl Into<String>) -> Self {
        lock(&self.failing_files).insert(name.into());
        self
    }

    pub fn with_failure(self) -> Self {
        self.script.set_failing(Operation::Upload, true);
        self
    }

    pub fn with_gate(self) -> Self {
        self.script.add_gate(Operation::Upload);
        self
    }

    pub fn release(&self, count: usize) {
        self.script.release(Operation::Upload, count);
    }

    pub fn get_calls(&self) -> Vec<MockCall> {
        self.script.calls()
    }

    pub fn upload_count(&self) -> usize {
        self.script.call_count(Operation::Upload)
    }

    pub async fn wait_for_uploads(&self, count: usize) {
        self.script.wait_for_calls(Operation::Upload, count).await
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn upload(&self, file: &LocalFile) -> Result<StoredBlob> {
        self.script
            .enter(Operation::Upload, file.name.clone())
            .await?;
        if lock(&self.failing_files).contains(&file.name) {
            return Err(Error::Upload(format!("mock failure for {}", file.name)));
        }
        let path = generate_file_path(&file.name);
        Ok(StoredBlob {
            url: format!("{}/{}", Self::BASE_URL, path),
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_item_store_lists_newest_first() {
        let store = MockItemStore::new();
        let first = store.create(CreateItemRequest::new(Some("a"), vec![])).await.unwrap();
        let second = store.create(CreateItemRequest::new(Some("b"), vec![])).await.unwrap();

        let page = store.list(ListItemsRequest::new(10, 0)).await.unwrap();
        assert_eq!(page.items[0].id, second.id);
        assert_eq!(page.items[1].id, first.id);
        assert!(!page.has_more);
        assert_eq!(store.call_count(Operation::Create), 2);
    }

    #[tokio::test]
    async fn test_mock_failure_injection() {
        let store = MockItemStore::new().with_failure(Operation::Create);
        assert!(store.create(CreateItemRequest::new(Some("a"), vec![])).await.is_err());
        assert!(store.stored().is_empty());

        store.set_failing(Operation::Create, false);
        assert!(store.create(CreateItemRequest::new(Some("a"), vec![])).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_gate_holds_until_released() {
        let store = MockItemStore::new().with_gate(Operation::Delete);
        let missing = Uuid::new_v4();

        let handle = {
            let store = store.clone();
            tokio::spawn(async move { store.delete(missing).await })
        };
        store.wait_for_calls(Operation::Delete, 1).await;
        assert!(!handle.is_finished());

        store.release(Operation::Delete, 1);
        let result = handle.await.unwrap();
        assert!(matches!(result, Err(Error::ItemNotFound(_))));
    }

    #[tokio::test]
    async fn test_mock_blob_store_fails_named_file() {
        let blobs = MockBlobStore::new().with_failing_file("bad.png");
        let ok = blobs
            .upload(&LocalFile::new("good.png", "image/png", vec![1u8]))
            .await
            .unwrap();
        assert!(ok.url.starts_with(MockBlobStore::BASE_URL));
        assert!(ok.url.ends_with("-good.png"));

        let err = blobs
            .upload(&LocalFile::new("bad.png", "image/png", vec![1u8]))
            .await;
        assert!(err.is_err());
        assert_eq!(blobs.upload_count(), 2);
    }
}
