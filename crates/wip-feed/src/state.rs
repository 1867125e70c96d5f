//! Pure state machine behind the feed.
//!
//! Every operation is split in two synchronous transitions: `begin_*` applies
//! the optimistic change and returns a ticket, `complete_*` validates the
//! ticket against the current state and reconciles the store's answer.
//! Nothing here performs I/O, so any interleaving of completions can be
//! replayed directly in tests.
//!
//! Correlation tokens:
//! - loads carry the filter epoch they were issued under,
//! - sends carry their temporary id,
//! - edits carry the item id plus a per-item edit revision,
//! - deletes carry the item id; the removed row is retained here.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use wip_core::{
    has_payload, normalize_content, DateRange, Error, Item, ListItemsRequest, ListItemsResponse,
    Result, UpdateItemRequest,
};

use crate::entry::{FeedItem, ItemKey};

/// How a completion was reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The store's answer was applied to the list.
    Applied,
    /// The request failed and the optimistic change was reverted.
    RolledBack,
    /// The completion no longer matched the current state and was dropped.
    Stale,
    /// Preconditions were not met; nothing was requested.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Initial,
    Older,
}

/// A store answer handed back to the state. Errors are borrowed so the
/// engine can still return them to its caller.
pub type Reply<'a, T> = std::result::Result<T, &'a Error>;

/// An issued page request.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    pub epoch: u64,
    pub kind: LoadKind,
    pub request: ListItemsRequest,
}

/// An issued content edit.
#[derive(Debug, Clone)]
pub struct UpdateTicket {
    pub id: Uuid,
    pub revision: u64,
    pub previous: Option<String>,
    pub request: UpdateItemRequest,
}

/// An issued delete. The removed row is retained by the state.
#[derive(Debug, Clone, Copy)]
pub struct DeleteTicket {
    pub id: Uuid,
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedSnapshot {
    pub items: Vec<FeedItem>,
    pub has_more: bool,
    pub is_loading: bool,
    pub is_loading_older: bool,
    pub filter: Option<DateRange>,
}

/// Local list state owned by the engine.
#[derive(Debug)]
pub struct FeedState {
    /// Ascending by `created_at`, oldest first.
    items: Vec<FeedItem>,
    has_more: bool,
    filter: Option<DateRange>,
    page_size: i64,
    epoch: u64,
    loading_initial: bool,
    loading_older: bool,
    /// Temporary ids whose create has not completed.
    pending_optimistic: HashSet<Uuid>,
    /// Rows removed optimistically, kept for rollback.
    deleting: HashMap<Uuid, FeedItem>,
    /// Pending deletes inside the loaded window; still counted by the store.
    hidden: HashSet<Uuid>,
    /// Latest edit revision per item.
    edit_revisions: HashMap<Uuid, u64>,
    next_revision: u64,
}

impl FeedState {
    pub fn new(page_size: i64) -> Self {
        Self {
            items: Vec::new(),
            has_more: false,
            filter: None,
            page_size,
            epoch: 0,
            loading_initial: false,
            loading_older: false,
            pending_optimistic: HashSet::new(),
            deleting: HashMap::new(),
            hidden: HashSet::new(),
            edit_revisions: HashMap::new(),
            next_revision: 0,
        }
    }

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn filter(&self) -> Option<DateRange> {
        self.filter
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_loading(&self) -> bool {
        self.loading_initial
    }

    pub fn is_loading_older(&self) -> bool {
        self.loading_older
    }

    pub fn pending_optimistic(&self) -> &HashSet<Uuid> {
        &self.pending_optimistic
    }

    pub fn find(&self, key: ItemKey) -> Option<&FeedItem> {
        self.items.iter().find(|e| e.key == key)
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            items: self.items.clone(),
            has_more: self.has_more,
            is_loading: self.loading_initial,
            is_loading_older: self.loading_older,
            filter: self.filter,
        }
    }

    /// Offset of the next older page.
    ///
    /// Counts confirmed rows the filtered listing returns, plus rows hidden
    /// by a pending delete (the store still has them). Placeholders are not
    /// on the store yet.
    pub fn next_offset(&self) -> i64 {
        let confirmed = self
            .items
            .iter()
            .filter(|e| !e.is_pending() && self.in_filter(e.created_at))
            .count();
        (confirmed + self.hidden.len()) as i64
    }

    fn in_filter(&self, created_at: DateTime<Utc>) -> bool {
        self.filter.map_or(true, |range| range.contains(created_at))
    }

    fn position(&self, key: ItemKey) -> Option<usize> {
        self.items.iter().position(|e| e.key == key)
    }

    fn page_request(&self, offset: i64) -> ListItemsRequest {
        ListItemsRequest::new(self.page_size, offset).with_range(self.filter)
    }

    // =========================================================================
    // LOADING
    // =========================================================================

    /// Start loading the newest page under `filter`, superseding any load in
    /// flight.
    pub fn begin_initial_load(&mut self, filter: Option<DateRange>) -> LoadTicket {
        self.filter = filter;
        self.epoch += 1;
        self.loading_initial = true;
        self.loading_older = false;
        LoadTicket {
            epoch: self.epoch,
            kind: LoadKind::Initial,
            request: self.page_request(0),
        }
    }

    /// Replace the filter: drop every loaded row (placeholders outside the
    /// new bound included) and start a fresh initial load.
    pub fn begin_set_filter(&mut self, filter: Option<DateRange>) -> LoadTicket {
        self.items.retain(|e| {
            e.is_pending() && filter.map_or(true, |range| range.contains(e.created_at))
        });
        self.hidden.clear();
        self.has_more = false;
        self.begin_initial_load(filter)
    }

    /// Start loading the next older page; `None` when there is nothing to
    /// load or a load is already running.
    pub fn begin_load_older(&mut self) -> Option<LoadTicket> {
        if !self.has_more || self.loading_older || self.loading_initial {
            return None;
        }
        self.loading_older = true;
        Some(LoadTicket {
            epoch: self.epoch,
            kind: LoadKind::Older,
            request: self.page_request(self.next_offset()),
        })
    }

    pub fn complete_load(
        &mut self,
        ticket: &LoadTicket,
        result: Reply<'_, ListItemsResponse>,
    ) -> Outcome {
        if ticket.epoch != self.epoch {
            debug!(
                epoch = ticket.epoch,
                current_epoch = self.epoch,
                "Discarding page from superseded filter"
            );
            return Outcome::Stale;
        }
        match ticket.kind {
            LoadKind::Initial => self.loading_initial = false,
            LoadKind::Older => self.loading_older = false,
        }
        let page = match result {
            Ok(page) => page,
            Err(_) => return Outcome::RolledBack,
        };

        let rows = self.admit_page(page.items, ticket.kind);
        match ticket.kind {
            LoadKind::Initial => {
                let pending: Vec<FeedItem> =
                    self.items.drain(..).filter(FeedItem::is_pending).collect();
                self.items = rows;
                self.items.extend(pending);
            }
            LoadKind::Older => {
                self.items.splice(0..0, rows);
            }
        }
        self.has_more = page.has_more;
        Outcome::Applied
    }

    /// Turn a newest-first page into oldest-first rows, skipping ids that are
    /// already shown or pending deletion.
    fn admit_page(&mut self, page: Vec<Item>, kind: LoadKind) -> Vec<FeedItem> {
        let mut seen: HashSet<Uuid> = match kind {
            LoadKind::Initial => {
                self.hidden.clear();
                HashSet::new()
            }
            LoadKind::Older => self.items.iter().filter_map(|e| e.key.stored_id()).collect(),
        };

        let mut rows = Vec::with_capacity(page.len());
        for item in page.into_iter().rev() {
            if self.deleting.contains_key(&item.id) {
                self.hidden.insert(item.id);
                continue;
            }
            if seen.insert(item.id) {
                rows.push(FeedItem::from(item));
            }
        }
        rows
    }

    // =========================================================================
    // SEND
    // =========================================================================

    /// Append an optimistic placeholder and return its temporary id.
    pub fn begin_send(
        &mut self,
        content: &str,
        preview_urls: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<Uuid> {
        if !has_payload(Some(content), &preview_urls) {
            return Err(Error::InvalidInput(
                "Nothing to send: add some text or a file".to_string(),
            ));
        }
        let temp_id = Uuid::new_v4();
        self.items.push(FeedItem {
            key: ItemKey::Temporary(temp_id),
            content: normalize_content(Some(content)),
            media_urls: preview_urls,
            created_at: now,
        });
        self.pending_optimistic.insert(temp_id);
        Ok(temp_id)
    }

    pub fn complete_send(&mut self, temp_id: Uuid, result: Reply<'_, Item>) -> Outcome {
        self.pending_optimistic.remove(&temp_id);
        let Some(pos) = self.position(ItemKey::Temporary(temp_id)) else {
            debug!(temp_id = %temp_id, "Placeholder already gone, dropping send result");
            return Outcome::Stale;
        };
        match result {
            Ok(item) => {
                if self.position(ItemKey::Stored(item.id)).is_some() {
                    // A reload already brought the confirmed row in.
                    self.items.remove(pos);
                } else if !self.in_filter(item.created_at) {
                    debug!(temp_id = %temp_id, item_id = %item.id, "Sent item is outside the active filter");
                    self.items.remove(pos);
                } else {
                    self.items[pos].confirm(item);
                    self.reposition_confirmed(pos);
                }
                Outcome::Applied
            }
            Err(_) => {
                self.items.remove(pos);
                Outcome::RolledBack
            }
        }
    }

    /// Move a freshly confirmed row among the other confirmed rows so they
    /// stay ascending by the store's `created_at`. Placeholders keep their
    /// relative order.
    fn reposition_confirmed(&mut self, mut pos: usize) {
        let created_at = self.items[pos].created_at;

        while let Some(prev) = self.items[..pos].iter().rposition(|e| !e.is_pending()) {
            if self.items[prev].created_at <= created_at {
                break;
            }
            let entry = self.items.remove(pos);
            self.items.insert(prev, entry);
            pos = prev;
        }

        while let Some(skip) = self.items[pos + 1..].iter().position(|e| !e.is_pending()) {
            let next = pos + 1 + skip;
            if self.items[next].created_at >= created_at {
                break;
            }
            let entry = self.items.remove(pos);
            self.items.insert(next, entry);
            pos = next;
        }
    }

    // =========================================================================
    // UPDATE
    // =========================================================================

    /// Rewrite an item's content in place, remembering the previous value.
    pub fn begin_update(&mut self, id: Uuid, content: &str) -> Result<UpdateTicket> {
        let pos = self
            .position(ItemKey::Stored(id))
            .ok_or(Error::ItemNotFound(id))?;
        if !has_payload(Some(content), &self.items[pos].media_urls) {
            return Err(Error::InvalidInput(
                "An item without media needs some text".to_string(),
            ));
        }

        self.next_revision += 1;
        let revision = self.next_revision;
        self.edit_revisions.insert(id, revision);

        let previous = std::mem::replace(
            &mut self.items[pos].content,
            normalize_content(Some(content)),
        );
        Ok(UpdateTicket {
            id,
            revision,
            previous,
            request: UpdateItemRequest::content(content),
        })
    }

    pub fn complete_update(&mut self, ticket: &UpdateTicket, result: Reply<'_, Item>) -> Outcome {
        let latest = self.edit_revisions.get(&ticket.id) == Some(&ticket.revision);
        if latest {
            self.edit_revisions.remove(&ticket.id);
        }

        if let Err(Error::ItemNotFound(_) | Error::NotFound(_)) = result {
            // Deleted remotely; never resurrect it.
            if let Some(pos) = self.position(ItemKey::Stored(ticket.id)) {
                self.items.remove(pos);
            }
            debug!(item_id = %ticket.id, "Edited item no longer exists on the store");
            return Outcome::Stale;
        }

        let entry = match self.position(ItemKey::Stored(ticket.id)) {
            Some(pos) => &mut self.items[pos],
            None => {
                // Deleted locally meanwhile: keep the retained copy truthful
                // in case the delete is rolled back, but show nothing.
                if let (true, Some(retained)) = (latest, self.deleting.get_mut(&ticket.id)) {
                    match result {
                        Ok(item) => retained.confirm(item),
                        Err(_) => retained.content = ticket.previous.clone(),
                    }
                }
                return Outcome::Stale;
            }
        };
        if !latest {
            debug!(item_id = %ticket.id, revision = ticket.revision, "Superseded edit result dropped");
            return Outcome::Stale;
        }

        match result {
            Ok(item) => {
                entry.confirm(item);
                Outcome::Applied
            }
            Err(_) => {
                entry.content = ticket.previous.clone();
                Outcome::RolledBack
            }
        }
    }

    // =========================================================================
    // DELETE
    // =========================================================================

    /// Remove an item optimistically, retaining it for rollback.
    pub fn begin_delete(&mut self, id: Uuid) -> Result<DeleteTicket> {
        let pos = self
            .position(ItemKey::Stored(id))
            .ok_or(Error::ItemNotFound(id))?;
        let removed = self.items.remove(pos);
        self.deleting.insert(id, removed);
        self.hidden.insert(id);
        Ok(DeleteTicket { id })
    }

    pub fn complete_delete(&mut self, ticket: &DeleteTicket, result: Reply<'_, ()>) -> Outcome {
        let retained = self.deleting.remove(&ticket.id);
        let was_hidden = self.hidden.remove(&ticket.id);

        match result {
            Ok(()) | Err(Error::ItemNotFound(_) | Error::NotFound(_)) => {
                self.edit_revisions.remove(&ticket.id);
                Outcome::Applied
            }
            Err(_) => {
                match retained {
                    // Only rows still inside the current window come back.
                    Some(entry) if was_hidden && self.position(entry.key).is_none() => {
                        self.insert_by_created_at(entry);
                    }
                    _ => debug!(item_id = %ticket.id, "Rolled-back delete is outside the current window"),
                }
                Outcome::RolledBack
            }
        }
    }

    fn insert_by_created_at(&mut self, entry: FeedItem) {
        let at = self
            .items
            .partition_point(|e| e.created_at <= entry.created_at);
        self.items.insert(at, entry);
    }
}

impl Default for FeedState {
    fn default() -> Self {
        Self::new(wip_core::defaults::FEED_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap()
    }

    fn item(minute: i64, content: &str) -> Item {
        Item {
            id: Uuid::new_v4(),
            content: Some(content.to_string()),
            media_urls: None,
            created_at: base() + Duration::minutes(minute),
        }
    }

    /// Items at minutes `0..count`, ascending.
    fn dataset(count: i64) -> Vec<Item> {
        (0..count).map(|m| item(m, &format!("item {}", m))).collect()
    }

    /// Serve a request the way the store does: newest first, offset/limit.
    fn serve(all: &[Item], req: &ListItemsRequest) -> ListItemsResponse {
        let mut matching: Vec<Item> = all
            .iter()
            .filter(|i| req.matches(i.created_at))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let page: Vec<Item> = matching
            .into_iter()
            .skip(req.offset as usize)
            .take(req.limit as usize)
            .collect();
        ListItemsResponse::from_page(page, req.limit)
    }

    fn loaded(all: &[Item], page_size: i64) -> FeedState {
        let mut state = FeedState::new(page_size);
        let ticket = state.begin_initial_load(None);
        let outcome = state.complete_load(&ticket, Ok(serve(all, &ticket.request)));
        assert_eq!(outcome, Outcome::Applied);
        state
    }

    fn assert_strictly_ascending_unique(state: &FeedState) {
        let items = state.items();
        for pair in items.windows(2) {
            assert!(pair[0].created_at < pair[1].created_at, "order broken");
        }
        let keys: HashSet<ItemKey> = items.iter().map(|e| e.key).collect();
        assert_eq!(keys.len(), items.len(), "duplicate ids");
    }

    fn keys(state: &FeedState) -> Vec<ItemKey> {
        state.items().iter().map(|e| e.key).collect()
    }

    fn failure() -> Error {
        Error::Request("connection reset".to_string())
    }

    #[test]
    fn test_initial_load_shows_newest_page_oldest_first() {
        let all = dataset(20);
        let state = loaded(&all, 5);

        let contents: Vec<_> = state
            .items()
            .iter()
            .map(|e| e.content.clone().unwrap())
            .collect();
        assert_eq!(contents, vec!["item 15", "item 16", "item 17", "item 18", "item 19"]);
        assert!(state.has_more());
        assert!(!state.is_loading());
    }

    #[test]
    fn test_load_older_until_exhausted_keeps_strict_order() {
        let all = dataset(23);
        let mut state = loaded(&all, 5);

        while let Some(ticket) = state.begin_load_older() {
            let outcome = state.complete_load(&ticket, Ok(serve(&all, &ticket.request)));
            assert_eq!(outcome, Outcome::Applied);
            assert_strictly_ascending_unique(&state);
        }

        assert_eq!(state.items().len(), 23);
        assert!(!state.has_more());
    }

    #[test]
    fn test_load_older_offset_is_read_at_call_time() {
        let all = dataset(12);
        let mut state = loaded(&all, 4);

        let sent = state.begin_send("draft", vec![], base() + Duration::hours(1)).unwrap();
        let ticket = state.begin_load_older().unwrap();
        // Placeholders are not on the store yet, so they do not move the cursor.
        assert_eq!(ticket.request.offset, 4);

        state.complete_send(sent, Ok(item(90, "draft")));
        assert_eq!(state.next_offset(), 5);
    }

    #[test]
    fn test_load_older_is_noop_without_more() {
        let all = dataset(3);
        let mut state = loaded(&all, 5);
        assert!(!state.has_more());

        let before = state.snapshot();
        assert!(state.begin_load_older().is_none());
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn test_load_older_is_noop_while_in_flight() {
        let all = dataset(30);
        let mut state = loaded(&all, 5);

        let first = state.begin_load_older();
        assert!(first.is_some());
        assert!(state.is_loading_older());
        assert!(state.begin_load_older().is_none());
    }

    #[test]
    fn test_load_older_waits_for_initial_load() {
        let all = dataset(30);
        let mut state = loaded(&all, 5);
        let _reload = state.begin_initial_load(None);
        assert!(state.begin_load_older().is_none());
    }

    #[test]
    fn test_older_page_from_superseded_filter_is_discarded() {
        let all = dataset(30);
        let mut state = loaded(&all, 5);

        let older = state.begin_load_older().unwrap();
        let range = DateRange::new(base(), base() + Duration::minutes(9));
        let filtered = state.begin_set_filter(Some(range));

        let stale = state.complete_load(&older, Ok(serve(&all, &older.request)));
        assert_eq!(stale, Outcome::Stale);
        assert!(state.items().is_empty());

        state.complete_load(&filtered, Ok(serve(&all, &filtered.request)));
        assert!(state.items().iter().all(|e| range.contains(e.created_at)));
        // The new epoch is free to paginate again.
        assert!(!state.is_loading_older());
    }

    #[test]
    fn test_out_of_order_initial_loads_keep_latest_filter() {
        let all = dataset(30);
        let mut state = FeedState::new(5);

        let first = state.begin_set_filter(None);
        let range = DateRange::new(base(), base() + Duration::minutes(2));
        let second = state.begin_set_filter(Some(range));

        assert_eq!(
            state.complete_load(&second, Ok(serve(&all, &second.request))),
            Outcome::Applied
        );
        assert_eq!(
            state.complete_load(&first, Ok(serve(&all, &first.request))),
            Outcome::Stale
        );
        assert_eq!(state.items().len(), 3);
        assert_eq!(state.filter(), Some(range));
    }

    #[test]
    fn test_failed_initial_load_clears_loading_flag() {
        let mut state = FeedState::new(5);
        let ticket = state.begin_initial_load(None);
        assert!(state.is_loading());
        assert_eq!(state.complete_load(&ticket, Err(&failure())), Outcome::RolledBack);
        assert!(!state.is_loading());
        assert!(state.items().is_empty());
    }

    #[test]
    fn test_send_is_visible_before_confirmation() {
        let mut state = loaded(&dataset(3), 5);
        let temp_id = state.begin_send("hello", vec![], base() + Duration::hours(1)).unwrap();

        let last = state.items().last().unwrap();
        assert_eq!(last.key, ItemKey::Temporary(temp_id));
        assert_eq!(last.content.as_deref(), Some("hello"));
        assert!(state.pending_optimistic().contains(&temp_id));
    }

    #[test]
    fn test_failed_send_restores_previous_list() {
        let mut state = loaded(&dataset(3), 5);
        let before = keys(&state);

        let temp_id = state.begin_send("hello", vec![], base() + Duration::hours(1)).unwrap();
        assert_eq!(state.complete_send(temp_id, Err(&failure())), Outcome::RolledBack);

        assert_eq!(keys(&state), before);
        assert!(state.pending_optimistic().is_empty());
    }

    #[test]
    fn test_confirmed_send_keeps_its_position() {
        let mut state = loaded(&dataset(2), 5);
        let first = state.begin_send("first", vec![], base() + Duration::hours(1)).unwrap();
        let second = state.begin_send("second", vec![], base() + Duration::hours(2)).unwrap();

        let confirmed = item(61, "first");
        assert_eq!(state.complete_send(first, Ok(confirmed.clone())), Outcome::Applied);

        let tail: Vec<ItemKey> = keys(&state).into_iter().rev().take(2).collect();
        assert_eq!(
            tail,
            vec![ItemKey::Temporary(second), ItemKey::Stored(confirmed.id)]
        );
    }

    #[test]
    fn test_concurrent_sends_fail_independently() {
        let mut state = loaded(&dataset(2), 5);
        let a = state.begin_send("a", vec![], base() + Duration::hours(1)).unwrap();
        let b = state.begin_send("b", vec![], base() + Duration::hours(2)).unwrap();

        assert_eq!(state.complete_send(a, Err(&failure())), Outcome::RolledBack);
        assert!(state.find(ItemKey::Temporary(b)).is_some());

        assert_eq!(state.complete_send(b, Ok(item(120, "b"))), Outcome::Applied);
        assert_eq!(state.items().len(), 3);
    }

    #[test]
    fn test_send_without_payload_is_rejected_up_front() {
        let mut state = loaded(&dataset(1), 5);
        let err = state.begin_send("   ", vec![], base()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(state.items().len(), 1);
    }

    #[test]
    fn test_media_only_send_is_accepted() {
        let mut state = FeedState::new(5);
        let preview = "local-preview://x".to_string();
        let temp_id = state.begin_send("", vec![preview.clone()], base()).unwrap();
        let entry = state.find(ItemKey::Temporary(temp_id)).unwrap();
        assert_eq!(entry.content, None);
        assert_eq!(entry.media_urls, vec![preview]);
    }

    #[test]
    fn test_placeholders_survive_reload() {
        let all = dataset(3);
        let mut state = loaded(&all, 5);
        let temp_id = state.begin_send("hi", vec![], base() + Duration::hours(1)).unwrap();

        let reload = state.begin_initial_load(None);
        state.complete_load(&reload, Ok(serve(&all, &reload.request)));
        assert_eq!(state.items().last().unwrap().key, ItemKey::Temporary(temp_id));
    }

    #[test]
    fn test_send_confirmation_after_reload_picked_it_up() {
        let mut all = dataset(3);
        let mut state = loaded(&all, 5);
        let temp_id = state.begin_send("hi", vec![], base() + Duration::hours(1)).unwrap();

        let confirmed = item(60, "hi");
        all.push(confirmed.clone());
        let reload = state.begin_initial_load(None);
        state.complete_load(&reload, Ok(serve(&all, &reload.request)));

        assert_eq!(state.complete_send(temp_id, Ok(confirmed)), Outcome::Applied);
        assert_eq!(state.items().len(), 4);
        assert_strictly_ascending_unique(&state);
    }

    #[test]
    fn test_update_is_optimistic_and_reverts_on_failure() {
        let all = dataset(3);
        let mut state = loaded(&all, 5);
        let id = all[1].id;

        let ticket = state.begin_update(id, "new text").unwrap();
        let shown = state.find(ItemKey::Stored(id)).unwrap();
        assert_eq!(shown.content.as_deref(), Some("new text"));

        assert_eq!(state.complete_update(&ticket, Err(&failure())), Outcome::RolledBack);
        let shown = state.find(ItemKey::Stored(id)).unwrap();
        assert_eq!(shown.content.as_deref(), Some("item 1"));
    }

    #[test]
    fn test_update_applies_store_normalized_content() {
        let all = dataset(2);
        let mut state = loaded(&all, 5);
        let id = all[0].id;

        let ticket = state.begin_update(id, "  tidy  ").unwrap();
        let mut stored = all[0].clone();
        stored.content = Some("tidy".to_string());

        assert_eq!(state.complete_update(&ticket, Ok(stored)), Outcome::Applied);
        let shown = state.find(ItemKey::Stored(id)).unwrap();
        assert_eq!(shown.content.as_deref(), Some("tidy"));
    }

    #[test]
    fn test_update_result_after_delete_does_not_resurrect() {
        let all = dataset(3);
        let mut state = loaded(&all, 5);
        let id = all[2].id;

        let update = state.begin_update(id, "edited").unwrap();
        let delete = state.begin_delete(id).unwrap();
        state.complete_delete(&delete, Ok(()));

        let mut stored = all[2].clone();
        stored.content = Some("edited".to_string());
        assert_eq!(state.complete_update(&update, Ok(stored)), Outcome::Stale);
        assert!(state.find(ItemKey::Stored(id)).is_none());
    }

    #[test]
    fn test_stale_edit_does_not_clobber_newer_edit() {
        let all = dataset(2);
        let mut state = loaded(&all, 5);
        let id = all[0].id;

        let first = state.begin_update(id, "one").unwrap();
        let second = state.begin_update(id, "two").unwrap();

        assert_eq!(state.complete_update(&first, Err(&failure())), Outcome::Stale);
        assert_eq!(
            state.find(ItemKey::Stored(id)).unwrap().content.as_deref(),
            Some("two")
        );

        assert_eq!(state.complete_update(&second, Err(&failure())), Outcome::RolledBack);
        assert_eq!(
            state.find(ItemKey::Stored(id)).unwrap().content.as_deref(),
            Some("one")
        );
    }

    #[test]
    fn test_update_of_remotely_deleted_item_drops_it() {
        let all = dataset(2);
        let mut state = loaded(&all, 5);
        let id = all[0].id;

        let ticket = state.begin_update(id, "edit").unwrap();
        let outcome = state.complete_update(&ticket, Err(&Error::ItemNotFound(id)));
        assert_eq!(outcome, Outcome::Stale);
        assert!(state.find(ItemKey::Stored(id)).is_none());
    }

    #[test]
    fn test_update_rejects_placeholder_and_blank_text() {
        let all = dataset(1);
        let mut state = loaded(&all, 5);

        let temp_id = state.begin_send("pending", vec![], base()).unwrap();
        assert!(matches!(
            state.begin_update(temp_id, "edit"),
            Err(Error::ItemNotFound(_))
        ));
        assert!(matches!(
            state.begin_update(all[0].id, "  "),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_delete_is_optimistic_and_reinserts_by_created_at() {
        let all = dataset(12);
        let mut state = loaded(&all, 4);
        let target = all[9].id;

        let ticket = state.begin_delete(target).unwrap();
        assert!(state.find(ItemKey::Stored(target)).is_none());

        // Shift indexes underneath the pending delete.
        let older = state.begin_load_older().unwrap();
        state.complete_load(&older, Ok(serve(&all, &older.request)));
        state.begin_send("new", vec![], base() + Duration::hours(3)).unwrap();

        assert_eq!(state.complete_delete(&ticket, Err(&failure())), Outcome::RolledBack);
        assert!(state.find(ItemKey::Stored(target)).is_some());
        assert_strictly_ascending_unique(&state);
    }

    #[test]
    fn test_pending_delete_keeps_pagination_aligned() {
        let all = dataset(12);
        let mut state = loaded(&all, 4);

        let ticket = state.begin_delete(all[10].id).unwrap();
        let older = state.begin_load_older().unwrap();
        assert_eq!(older.request.offset, 4);

        state.complete_load(&older, Ok(serve(&all, &older.request)));
        assert_eq!(state.items().len(), 7);
        assert_strictly_ascending_unique(&state);

        state.complete_delete(&ticket, Ok(()));
        assert_eq!(state.next_offset(), 7);
    }

    #[test]
    fn test_reload_hides_rows_with_pending_delete() {
        let all = dataset(5);
        let mut state = loaded(&all, 10);
        let target = all[4].id;

        let ticket = state.begin_delete(target).unwrap();
        let reload = state.begin_initial_load(None);
        state.complete_load(&reload, Ok(serve(&all, &reload.request)));
        assert!(state.find(ItemKey::Stored(target)).is_none());
        assert_eq!(state.next_offset(), 5);

        state.complete_delete(&ticket, Err(&failure()));
        assert!(state.find(ItemKey::Stored(target)).is_some());
    }

    #[test]
    fn test_rolled_back_delete_outside_new_filter_stays_hidden() {
        let all = dataset(10);
        let mut state = loaded(&all, 10);
        let target = all[9].id;

        let ticket = state.begin_delete(target).unwrap();
        let range = DateRange::new(base(), base() + Duration::minutes(3));
        let filtered = state.begin_set_filter(Some(range));
        state.complete_load(&filtered, Ok(serve(&all, &filtered.request)));

        assert_eq!(state.complete_delete(&ticket, Err(&failure())), Outcome::RolledBack);
        assert!(state.find(ItemKey::Stored(target)).is_none());
    }

    #[test]
    fn test_delete_of_missing_item_counts_as_done() {
        let all = dataset(2);
        let mut state = loaded(&all, 5);
        let id = all[0].id;

        let ticket = state.begin_delete(id).unwrap();
        let outcome = state.complete_delete(&ticket, Err(&Error::ItemNotFound(id)));
        assert_eq!(outcome, Outcome::Applied);
        assert!(state.find(ItemKey::Stored(id)).is_none());
    }

    #[test]
    fn test_rolled_back_delete_carries_edit_made_meanwhile() {
        let all = dataset(2);
        let mut state = loaded(&all, 5);
        let id = all[1].id;

        let update = state.begin_update(id, "edited").unwrap();
        let delete = state.begin_delete(id).unwrap();
        state.complete_update(&update, Err(&failure()));
        state.complete_delete(&delete, Err(&failure()));

        let shown = state.find(ItemKey::Stored(id)).unwrap();
        assert_eq!(shown.content.as_deref(), Some("item 1"));
    }

    #[test]
    fn test_send_outside_filter_leaves_pagination_aligned() {
        let all = dataset(30);
        let range = DateRange::new(base(), base() + Duration::minutes(19));
        let mut state = FeedState::new(5);
        let ticket = state.begin_set_filter(Some(range));
        state.complete_load(&ticket, Ok(serve(&all, &ticket.request)));

        let temp_id = state.begin_send("late", vec![], base() + Duration::hours(5)).unwrap();
        let sent = item(300, "late");
        assert_eq!(state.complete_send(temp_id, Ok(sent.clone())), Outcome::Applied);
        assert!(state.find(ItemKey::Stored(sent.id)).is_none());

        let mut store = all.clone();
        store.push(sent);
        while let Some(ticket) = state.begin_load_older() {
            state.complete_load(&ticket, Ok(serve(&store, &ticket.request)));
        }

        assert_eq!(state.items().len(), 20);
        assert!(state.items().iter().all(|e| range.contains(e.created_at)));
        assert_strictly_ascending_unique(&state);
    }

    #[test]
    fn test_confirms_in_reverse_order_keep_confirmed_rows_ascending() {
        let mut state = loaded(&dataset(2), 5);
        let a = state.begin_send("a", vec![], base() + Duration::hours(1)).unwrap();
        let b = state.begin_send("b", vec![], base() + Duration::hours(1)).unwrap();

        // The store created "b" first.
        let stored_b = item(60, "b");
        let stored_a = item(61, "a");
        assert_eq!(state.complete_send(b, Ok(stored_b.clone())), Outcome::Applied);
        assert_eq!(state.complete_send(a, Ok(stored_a.clone())), Outcome::Applied);

        let tail: Vec<ItemKey> = keys(&state).into_iter().skip(2).collect();
        assert_eq!(
            tail,
            vec![ItemKey::Stored(stored_b.id), ItemKey::Stored(stored_a.id)]
        );
        assert_strictly_ascending_unique(&state);
    }

    #[test]
    fn test_set_filter_drops_rows_immediately() {
        let all = dataset(5);
        let mut state = loaded(&all, 5);
        state.begin_set_filter(None);
        assert!(state.items().is_empty());
        assert!(state.is_loading());
    }
}
