//! Sequential full-document pass
//!
//! [`VerticalPass`] yields one block per page, in order. Nothing is produced
//! ahead of the consumer: page `n + 1` is not touched until the block for page
//! `n` has been taken, which keeps at most one rasterization in flight.

use super::surface::{Block, PageTag, SurfaceLayout};
use super::{document_block, image_block};
use crate::error::{ReaderError, Result};
use crate::resource::BlobStore;
use crate::source::{PageRef, PageSource};

pub struct VerticalPass<'a> {
    source: &'a PageSource,
    store: &'a BlobStore,
    layout: SurfaceLayout,
    next: usize,
    total: usize,
    compact: bool,
}

impl<'a> VerticalPass<'a> {
    pub fn new(
        source: &'a PageSource,
        store: &'a BlobStore,
        layout: SurfaceLayout,
        compact: bool,
    ) -> Self {
        Self {
            source,
            store,
            layout,
            next: 0,
            total: source.total_count(),
            compact,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

impl Iterator for VerticalPass<'_> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }
        let index = self.next;
        self.next += 1;

        let tag = Some(PageTag {
            number: index + 1,
            total: self.total,
            compact: self.compact,
        });
        let block = match self.source.page_at(index) {
            Some(PageRef::Document { number, document }) => {
                document_block(document, number, &self.layout, tag, None)
            }
            Some(PageRef::Image(page)) => image_block(page, self.store, index + 1, tag),
            None => Err(ReaderError::render(format!("page {} is missing", index + 1))),
        };
        Some(block)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.next;
        (remaining, Some(remaining))
    }
}
