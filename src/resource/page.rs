//! Lazily materialized pages
//!
//! A [`Page`] turns its raw content into a [`BlobUrl`] the first time it is
//! resolved and keeps that handle until it is released. The slot lock is held
//! across materialization, so concurrent callers wait for the first one and
//! then share its handle instead of decoding twice.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;

use super::blob_store::{Blob, BlobStore, BlobUrl};
use crate::error::{ReaderError, Result};
use crate::input::{InputFile, guess_mime};

/// Something that can produce a page's bytes on demand
pub trait PageContent: Send + Sync {
    fn materialize(&self) -> Result<Blob>;
}

impl PageContent for InputFile {
    fn materialize(&self) -> Result<Blob> {
        let bytes = self.read_bytes()?;
        Ok(Blob::new(bytes, guess_mime(self.name(), None)))
    }
}

#[derive(Debug)]
enum Slot {
    Empty,
    Ready(BlobUrl),
    Released,
}

/// One displayable unit of an archive or image set
pub struct Page {
    name: String,
    content: Arc<dyn PageContent>,
    store: BlobStore,
    slot: Mutex<Slot>,
}

impl Page {
    pub fn new(name: impl Into<String>, content: Arc<dyn PageContent>, store: BlobStore) -> Self {
        Self {
            name: name.into(),
            content,
            store,
            slot: Mutex::new(Slot::Empty),
        }
    }

    /// Display name, used for ordering and alt text
    pub fn name(&self) -> &str {
        &self.name
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the page's handle, materializing it on first use.
    ///
    /// Fails with [`ReaderError::HandleRevoked`] once the page has been
    /// released; a released page is never materialized again.
    pub fn resolve(&self) -> Result<BlobUrl> {
        let mut slot = self.slot();
        match &*slot {
            Slot::Ready(url) => return Ok(url.clone()),
            Slot::Released => return Err(ReaderError::HandleRevoked(self.name.clone())),
            Slot::Empty => {}
        }

        let blob = self.content.materialize()?;
        debug!("materialized page '{}' ({} bytes)", self.name, blob.len());
        let url = self.store.create(blob);
        *slot = Slot::Ready(url.clone());
        Ok(url)
    }

    /// Revokes the handle if one was produced. Returns true if a handle was freed.
    pub fn release(&self) -> bool {
        let previous = std::mem::replace(&mut *self.slot(), Slot::Released);
        match previous {
            Slot::Ready(url) => self.store.revoke(&url),
            Slot::Empty | Slot::Released => false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(*self.slot(), Slot::Ready(_))
    }

    pub fn is_released(&self) -> bool {
        matches!(*self.slot(), Slot::Released)
    }
}

impl Drop for Page {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("name", &self.name)
            .field("slot", &*self.slot())
            .finish()
    }
}
