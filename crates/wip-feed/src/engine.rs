//! Async effect runner around [`FeedState`].
//!
//! Each operation takes the lock, applies the optimistic transition, drops
//! the lock, awaits the store, then takes the lock again to reconcile. The
//! lock is never held across an await, so every transition is atomic with
//! respect to concurrently running operations.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use wip_core::defaults::{FEED_PAGE_SIZE, TIMELINE_PAGE_LIMIT};
use wip_core::{
    validate_upload, BlobStore, CreateItemRequest, DateRange, Error, Item, ItemStore, LocalFile,
    Result,
};

use crate::events::{EventBus, FeedEvent};
use crate::preview::PreviewArena;
use crate::state::{FeedSnapshot, FeedState, LoadKind, LoadTicket, Outcome};

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// Items per page for the initial load and every older page.
    pub page_size: i64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: FEED_PAGE_SIZE,
        }
    }
}

impl FeedConfig {
    /// Settings for the timeline view.
    pub fn timeline() -> Self {
        Self {
            page_size: TIMELINE_PAGE_LIMIT,
        }
    }

    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size;
        self
    }
}

/// Feed synchronization engine.
///
/// Cheap to clone; clones share state, stores, previews, and the event bus.
#[derive(Clone)]
pub struct FeedEngine {
    state: Arc<Mutex<FeedState>>,
    items: Arc<dyn ItemStore>,
    blobs: Arc<dyn BlobStore>,
    previews: PreviewArena,
    events: EventBus,
}

impl FeedEngine {
    pub fn new(items: Arc<dyn ItemStore>, blobs: Arc<dyn BlobStore>, config: FeedConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(FeedState::new(config.page_size))),
            items,
            blobs,
            previews: PreviewArena::new(),
            events: EventBus::default(),
        }
    }

    /// Publish on an externally owned bus.
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.state().snapshot()
    }

    /// Live local previews, for resolving `local-preview://` URLs.
    pub fn previews(&self) -> &PreviewArena {
        &self.previews
    }

    fn state(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // =========================================================================
    // LOADING
    // =========================================================================

    /// Load the newest page under `filter`, replacing the list.
    pub async fn initial_load(&self, filter: Option<DateRange>) -> Result<Outcome> {
        let ticket = self.state().begin_initial_load(filter);
        self.events.emit(FeedEvent::ItemsChanged);
        self.run_load(ticket).await
    }

    /// Replace the filter, drop the loaded rows, and reload.
    pub async fn set_filter(&self, filter: Option<DateRange>) -> Result<Outcome> {
        let ticket = self.state().begin_set_filter(filter);
        info!(
            start = ?filter.map(|f| f.start),
            end = ?filter.map(|f| f.end),
            epoch = ticket.epoch,
            "Filter changed"
        );
        self.events.emit(FeedEvent::ItemsChanged);
        self.run_load(ticket).await
    }

    /// Prepend the next older page. No-op without more items or while a
    /// load is running.
    pub async fn load_older(&self) -> Result<Outcome> {
        let next = self.state().begin_load_older();
        let Some(ticket) = next else {
            debug!("Older page not requested");
            return Ok(Outcome::Skipped);
        };
        self.events.emit(FeedEvent::ItemsChanged);
        self.run_load(ticket).await
    }

    async fn run_load(&self, ticket: LoadTicket) -> Result<Outcome> {
        debug!(
            epoch = ticket.epoch,
            offset = ticket.request.offset,
            limit = ticket.request.limit,
            kind = ?ticket.kind,
            "Requesting page"
        );
        match self.items.list(ticket.request.clone()).await {
            Ok(page) => {
                let (outcome, added) = {
                    let mut state = self.state();
                    let before = state.items().len();
                    let outcome = state.complete_load(&ticket, Ok(page));
                    (outcome, state.items().len().saturating_sub(before))
                };
                if outcome == Outcome::Applied {
                    self.events.emit(FeedEvent::ItemsChanged);
                    match ticket.kind {
                        LoadKind::Initial => self.events.emit(FeedEvent::ScrollToBottom),
                        LoadKind::Older => self.events.emit(FeedEvent::OlderPrepended { count: added }),
                    }
                }
                Ok(outcome)
            }
            Err(err) => {
                let outcome = self.state().complete_load(&ticket, Err(&err));
                self.settle_failure(outcome, "load items", err)
            }
        }
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Post an item: visible at once, confirmed or removed later.
    pub async fn send(&self, content: &str, files: Vec<LocalFile>) -> Result<Outcome> {
        // Released when this function returns, whichever way it returns.
        let lease = self.previews.lease(&files);
        let temp_id = self.state().begin_send(content, lease.urls(), Utc::now())?;
        info!(temp_id = %temp_id, file_count = files.len(), "Sending item");
        self.events.emit(FeedEvent::ItemsChanged);
        self.events.emit(FeedEvent::ScrollToBottom);

        let result = self.upload_and_create(content, files).await;
        match result {
            Ok(item) => {
                let item_id = item.id;
                let outcome = self.state().complete_send(temp_id, Ok(item));
                info!(temp_id = %temp_id, item_id = %item_id, ?outcome, "Item confirmed");
                self.events.emit(FeedEvent::ItemsChanged);
                Ok(outcome)
            }
            Err(err) => {
                let outcome = self.state().complete_send(temp_id, Err(&err));
                self.settle_failure(outcome, "send item", err)
            }
        }
    }

    /// Validate, upload in parallel, then create.
    async fn upload_and_create(&self, content: &str, files: Vec<LocalFile>) -> Result<Item> {
        let mut accepted = Vec::with_capacity(files.len());
        for file in files {
            match validate_upload(&file.name, &file.mime_type, file.size()) {
                Ok(()) => accepted.push(file),
                Err(Error::Validation { file, reason }) => {
                    warn!(file = %file, reason = %reason, "File rejected before upload");
                    self.events.emit(FeedEvent::FileRejected { file, reason });
                }
                Err(other) => return Err(other),
            }
        }

        let uploads = join_all(accepted.iter().map(|file| self.blobs.upload(file))).await;
        let urls = uploads
            .into_iter()
            .map(|blob| blob.map(|b| b.url))
            .collect::<Result<Vec<_>>>()?;

        let request = CreateItemRequest::new(Some(content), urls);
        request.validate()?;
        self.items.create(request).await
    }

    /// Edit an item's content in place.
    pub async fn update(&self, id: Uuid, content: &str) -> Result<Outcome> {
        let ticket = self.state().begin_update(id, content)?;
        debug!(item_id = %id, revision = ticket.revision, "Updating item");
        self.events.emit(FeedEvent::ItemsChanged);

        match self.items.update(id, ticket.request.clone()).await {
            Ok(item) => {
                let outcome = self.state().complete_update(&ticket, Ok(item));
                if outcome == Outcome::Stale {
                    debug!(item_id = %id, revision = ticket.revision, "Update result discarded");
                }
                self.events.emit(FeedEvent::ItemsChanged);
                Ok(outcome)
            }
            Err(err) => {
                let outcome = self.state().complete_update(&ticket, Err(&err));
                self.settle_failure(outcome, "update item", err)
            }
        }
    }

    /// Remove an item at once; it comes back if the store refuses.
    pub async fn delete(&self, id: Uuid) -> Result<Outcome> {
        let ticket = self.state().begin_delete(id)?;
        debug!(item_id = %id, "Deleting item");
        self.events.emit(FeedEvent::ItemsChanged);

        let result = self.items.delete(id).await;
        let outcome = self.state().complete_delete(&ticket, result.as_ref().map(|_| ()));
        match result {
            Err(err) if outcome == Outcome::RolledBack => {
                self.settle_failure(outcome, "delete item", err)
            }
            _ => {
                info!(item_id = %id, ?outcome, "Item deleted");
                Ok(outcome)
            }
        }
    }

    /// Alert and return the error for a rollback; swallow stale failures.
    fn settle_failure(&self, outcome: Outcome, action: &str, err: Error) -> Result<Outcome> {
        self.events.emit(FeedEvent::ItemsChanged);
        if outcome != Outcome::RolledBack {
            debug!(action, error = %err, ?outcome, "Failure of superseded operation discarded");
            return Ok(outcome);
        }
        warn!(action, error = %err, "Store operation failed, rolled back");
        self.events.emit(FeedEvent::Alert {
            message: format!("Failed to {}: {}", action, err),
        });
        Err(err)
    }
}
