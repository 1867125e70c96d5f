//! Local preview references for files that are still uploading.
//!
//! A placeholder cannot point at the network yet, so each picked file gets a
//! `local-preview://<uuid>` handle registered in the arena. The view resolves
//! handles back to the file bytes. Handles live exactly as long as the
//! [`PreviewLease`] returned by [`PreviewArena::lease`]; dropping the lease
//! releases them on success, failure, and early return alike.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use wip_core::defaults::PREVIEW_SCHEME;
use wip_core::LocalFile;

/// Owned collection of live preview handles.
#[derive(Clone, Default)]
pub struct PreviewArena {
    entries: Arc<Mutex<HashMap<Uuid, LocalFile>>>,
}

impl PreviewArena {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<Uuid, LocalFile>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register one handle per file, in order.
    pub fn lease(&self, files: &[LocalFile]) -> PreviewLease {
        let mut entries = self.entries();
        let handles: Vec<Uuid> = files
            .iter()
            .map(|file| {
                let handle = Uuid::new_v4();
                entries.insert(handle, file.clone());
                handle
            })
            .collect();
        PreviewLease {
            arena: self.clone(),
            handles,
        }
    }

    /// Look up the file behind a preview URL, if it is still live.
    pub fn resolve(&self, url: &str) -> Option<LocalFile> {
        let handle = parse_preview_url(url)?;
        self.entries().get(&handle).cloned()
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, handles: &[Uuid]) {
        let mut entries = self.entries();
        for handle in handles {
            entries.remove(handle);
        }
    }
}

/// Scoped ownership of a batch of preview handles.
pub struct PreviewLease {
    arena: PreviewArena,
    handles: Vec<Uuid>,
}

impl PreviewLease {
    /// Preview URLs in file order.
    pub fn urls(&self) -> Vec<String> {
        self.handles.iter().map(|h| preview_url(*h)).collect()
    }
}

impl Drop for PreviewLease {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            tracing::debug!(count = self.handles.len(), "Releasing preview handles");
            self.arena.release(&self.handles);
        }
    }
}

pub fn preview_url(handle: Uuid) -> String {
    format!("{}{}", PREVIEW_SCHEME, handle)
}

/// Whether a media URL is a local preview rather than a stored blob.
pub fn is_preview_url(url: &str) -> bool {
    url.starts_with(PREVIEW_SCHEME)
}

fn parse_preview_url(url: &str) -> Option<Uuid> {
    url.strip_prefix(PREVIEW_SCHEME)?.parse().ok()
}
