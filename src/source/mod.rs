//! Page sources
//!
//! Every load turns its input into exactly one [`PageSource`]. Rendering and
//! the pager only ever talk to this enum, never to the concrete sources.

pub mod archive;
pub mod document;
pub mod images;
#[cfg(feature = "pdf")]
pub mod mupdf_engine;
pub mod pdf;

pub use archive::{ArchiveDecoder, ArchiveEntry, ArchiveReader, ArchiveSource, ZipDecoder};
pub use document::{
    Bitmap, Document, DocumentPage, DocumentParser, NoDocumentEngine, default_parser,
};
pub use images::ImageSetSource;
pub use pdf::{FallbackController, FallbackDocument, FallbackState, PdfOutcome, PdfSource};

use log::debug;

use crate::input::InputKind;
use crate::resource::Page;

#[derive(Debug)]
pub enum PageSource {
    Pdf(PdfSource),
    Archive(ArchiveSource),
    Images(ImageSetSource),
}

/// A single page, borrowed from its source
#[derive(Clone, Copy)]
pub enum PageRef<'a> {
    /// 1-based page of a parsed document
    Document {
        number: usize,
        document: &'a dyn Document,
    },
    Image(&'a Page),
}

impl PageSource {
    pub fn kind(&self) -> InputKind {
        match self {
            PageSource::Pdf(_) => InputKind::Pdf,
            PageSource::Archive(_) => InputKind::Archive,
            PageSource::Images(_) => InputKind::Images,
        }
    }

    pub fn total_count(&self) -> usize {
        match self {
            PageSource::Pdf(source) => source.page_count(),
            PageSource::Archive(source) => source.pages().len(),
            PageSource::Images(source) => source.pages().len(),
        }
    }

    /// Page at a zero-based index.
    pub fn page_at(&self, index: usize) -> Option<PageRef<'_>> {
        match self {
            PageSource::Pdf(source) => {
                let document = source.document()?;
                (index < source.page_count()).then_some(PageRef::Document {
                    number: index + 1,
                    document,
                })
            }
            PageSource::Archive(source) => source.pages().get(index).map(PageRef::Image),
            PageSource::Images(source) => source.pages().get(index).map(PageRef::Image),
        }
    }

    /// Image-backed pages; empty for a document source.
    pub fn pages(&self) -> &[Page] {
        match self {
            PageSource::Pdf(_) => &[],
            PageSource::Archive(source) => source.pages(),
            PageSource::Images(source) => source.pages(),
        }
    }

    pub fn document(&self) -> Option<&dyn Document> {
        match self {
            PageSource::Pdf(source) => source.document(),
            _ => None,
        }
    }

    /// Frees every resource the source holds. Safe to call more than once.
    pub fn teardown(&mut self) {
        let freed = match self {
            PageSource::Pdf(source) => usize::from(source.teardown()),
            PageSource::Archive(source) => source.release_all(),
            PageSource::Images(source) => source.release_all(),
        };
        debug!("{} source torn down, {freed} resources freed", self.kind().as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputFile;
    use crate::resource::BlobStore;
    use crate::test_utils::FakeParser;

    fn image_source(store: &BlobStore, count: usize) -> PageSource {
        let files = (1..=count)
            .map(|i| InputFile::from_bytes(format!("p{i}.png"), vec![0u8; 2]))
            .collect();
        PageSource::Images(ImageSetSource::from_files(files, store).unwrap())
    }

    #[test]
    fn image_source_exposes_pages_by_index() {
        let store = BlobStore::new();
        let source = image_source(&store, 3);

        assert_eq!(source.kind(), InputKind::Images);
        assert_eq!(source.total_count(), 3);
        assert!(source.document().is_none());
        match source.page_at(2) {
            Some(PageRef::Image(page)) => assert_eq!(page.name(), "p3.png"),
            _ => panic!("expected image page"),
        }
        assert!(source.page_at(3).is_none());
    }

    #[test]
    fn document_source_has_no_image_pages() {
        let parser = FakeParser::with_pages(4);
        let document = parser.parse(std::sync::Arc::from(&b"%PDF"[..])).unwrap();
        let source = PageSource::Pdf(PdfSource::new("book.pdf", document));

        assert_eq!(source.total_count(), 4);
        assert!(source.pages().is_empty());
        match source.page_at(0) {
            Some(PageRef::Document { number, .. }) => assert_eq!(number, 1),
            _ => panic!("expected document page"),
        }
        assert!(source.page_at(4).is_none());
    }

    #[test]
    fn teardown_is_idempotent() {
        let store = BlobStore::new();
        let mut source = image_source(&store, 2);
        for page in source.pages() {
            page.resolve().unwrap();
        }
        assert_eq!(store.live_count(), 2);

        source.teardown();
        source.teardown();
        assert_eq!(store.live_count(), 0);
        assert_eq!(store.stats().revoked, 2);
    }
}
