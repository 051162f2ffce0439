//! Revocable handles for display-ready bytes
//!
//! The store plays the role of an object-URL registry: [`BlobStore::create`]
//! hands out a [`BlobUrl`] that stays valid until it is revoked. Every live
//! blob is counted, so a reader can check that a reset left nothing behind.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use log::debug;

/// Opaque reference to a live blob
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlobUrl {
    id: u64,
}

impl BlobUrl {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Display for BlobUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:manga-reader/{}", self.id)
    }
}

/// Bytes and their MIME type
#[derive(Clone, Debug)]
pub struct Blob {
    pub bytes: Arc<[u8]>,
    pub mime: String,
}

impl Blob {
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime: mime.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Counters over the store's lifetime
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlobStats {
    pub created: u64,
    pub revoked: u64,
    pub live: usize,
    pub live_bytes: usize,
}

#[derive(Default)]
struct StoreInner {
    next_id: u64,
    live: HashMap<u64, Blob>,
    created: u64,
    revoked: u64,
}

/// Shared registry of live blobs. Clones share the same registry.
#[derive(Clone, Default)]
pub struct BlobStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, blob: Blob) -> BlobUrl {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.next_id += 1;
        let id = inner.next_id;
        debug!(
            "blob created: id={id} mime={} ({} bytes)",
            blob.mime,
            blob.len()
        );
        inner.live.insert(id, blob);
        inner.created += 1;
        BlobUrl { id }
    }

    /// Looks up a live blob. Revoked handles resolve to `None`.
    pub fn get(&self, url: &BlobUrl) -> Option<Blob> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .live
            .get(&url.id)
            .cloned()
    }

    /// Frees a blob. Returns false if it was already revoked.
    pub fn revoke(&self, url: &BlobUrl) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.live.remove(&url.id).is_some() {
            inner.revoked += 1;
            debug!("blob revoked: id={}", url.id);
            true
        } else {
            false
        }
    }

    pub fn is_live(&self, url: &BlobUrl) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .live
            .contains_key(&url.id)
    }

    pub fn live_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .live
            .len()
    }

    pub fn stats(&self) -> BlobStats {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        BlobStats {
            created: inner.created,
            revoked: inner.revoked,
            live: inner.live.len(),
            live_bytes: inner.live.values().map(Blob::len).sum(),
        }
    }
}

impl fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobStore")
            .field("stats", &self.stats())
            .finish()
    }
}
