//! Engine events and the broadcast bus the presentation layer subscribes to.
//!
//! The engine never renders anything. It publishes what changed and which
//! side effects the view should perform (scroll to the newest entry, show an
//! alert, report a rejected file); views re-read a snapshot on
//! [`FeedEvent::ItemsChanged`].

use serde::Serialize;
use tokio::sync::broadcast;

/// Notifications published by the feed engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    /// The local list, `has_more`, or a loading flag changed.
    ItemsChanged,
    /// The view should scroll to the newest (bottom) entry once rendered.
    ScrollToBottom,
    /// Older entries were prepended; the view should restore its scroll anchor.
    OlderPrepended { count: usize },
    /// A file was rejected before upload and excluded from its send.
    FileRejected { file: String, reason: String },
    /// A store operation failed and its optimistic change was rolled back.
    Alert { message: String },
}

impl FeedEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            FeedEvent::ItemsChanged => "items_changed",
            FeedEvent::ScrollToBottom => "scroll_to_bottom",
            FeedEvent::OlderPrepended { .. } => "older_prepended",
            FeedEvent::FileRejected { .. } => "file_rejected",
            FeedEvent::Alert { .. } => "alert",
        }
    }
}

/// Broadcast-based bus distributing [`FeedEvent`]s to any number of views.
///
/// Slow receivers that fall behind get a `Lagged` error and miss events;
/// they recover by reading a fresh snapshot.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<FeedEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event. Dropped silently when nobody listens.
    pub fn emit(&self, event: FeedEvent) {
        tracing::debug!(
            event_type = event.event_type(),
            subscriber_count = self.tx.receiver_count(),
            "Feed event"
        );
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(wip_core::defaults::EVENT_CHANNEL_CAPACITY)
    }
}
