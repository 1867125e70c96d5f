//! Entries of the local feed list.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use wip_core::defaults::TEMP_ID_PREFIX;
use wip_core::Item;

/// Identity of a feed entry.
///
/// Store-assigned ids and client-generated placeholder ids never collide:
/// the textual form of a temporary id carries the [`TEMP_ID_PREFIX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKey {
    Stored(Uuid),
    Temporary(Uuid),
}

impl ItemKey {
    /// Generate a fresh temporary key.
    pub fn new_temporary() -> Self {
        Self::Temporary(Uuid::new_v4())
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }

    /// The store id, if this entry is confirmed.
    pub fn stored_id(&self) -> Option<Uuid> {
        match self {
            Self::Stored(id) => Some(*id),
            Self::Temporary(_) => None,
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stored(id) => write!(f, "{}", id),
            Self::Temporary(id) => write!(f, "{}{}", TEMP_ID_PREFIX, id),
        }
    }
}

impl FromStr for ItemKey {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix(TEMP_ID_PREFIX) {
            Some(rest) => Ok(Self::Temporary(rest.parse()?)),
            None => Ok(Self::Stored(s.parse()?)),
        }
    }
}

impl Serialize for ItemKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One row of the feed: a confirmed item or an optimistic placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedItem {
    pub key: ItemKey,
    pub content: Option<String>,
    pub media_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl FeedItem {
    /// Whether the entry still waits for store confirmation.
    pub fn is_pending(&self) -> bool {
        self.key.is_temporary()
    }

    /// Overwrite the fields with a store-confirmed item.
    pub(crate) fn confirm(&mut self, item: Item) {
        self.key = ItemKey::Stored(item.id);
        self.content = item.content;
        self.media_urls = item.media_urls.unwrap_or_default();
        self.created_at = item.created_at;
    }
}

impl From<Item> for FeedItem {
    fn from(item: Item) -> Self {
        Self {
            key: ItemKey::Stored(item.id),
            content: item.content,
            media_urls: item.media_urls.unwrap_or_default(),
            created_at: item.created_at,
        }
    }
}
