//! # wip-feed
//!
//! Client-side feed synchronization for the wip done-items log.
//!
//! This crate provides:
//! - `FeedState`, the pure state machine behind the ordered, paginated,
//!   optimistically mutated item list
//! - `FeedEngine`, which runs store requests and reconciles their results
//! - The date filter controller (quick filters and calendar ranges)
//! - Day grouping for the feed and timeline views
//! - Scroll anchoring helpers and engine events for the presentation layer
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wip_feed::{FeedConfig, FeedEngine};
//! use wip_store::{FilesystemBlobStore, MemoryItemStore};
//!
//! #[tokio::main]
//! async fn main() -> wip_core::Result<()> {
//!     let engine = FeedEngine::new(
//!         Arc::new(MemoryItemStore::new()),
//!         Arc::new(FilesystemBlobStore::new("/tmp/wip", "http://localhost:3000/media")),
//!         FeedConfig::default(),
//!     );
//!     engine.initial_load(None).await?;
//!     engine.send("shipped the release", vec![]).await?;
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod entry;
pub mod events;
pub mod filter;
pub mod grouping;
pub mod preview;
pub mod scroll;
pub mod state;

// Scriptable stores for engine tests
#[cfg(test)]
pub mod mock;

pub use engine::{FeedConfig, FeedEngine};
pub use entry::{FeedItem, ItemKey};
pub use events::{EventBus, FeedEvent};
pub use filter::{DateFilterController, DaySpan, FilterSelection, QuickFilter};
pub use grouping::{group_by_day, DayGroup, DayLabel, GroupView};
pub use preview::{PreviewArena, PreviewLease};
pub use scroll::{is_near_bottom, ScrollAnchor};
pub use state::{FeedSnapshot, FeedState, Outcome};
