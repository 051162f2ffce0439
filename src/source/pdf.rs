//! PDF loading and the degraded preview path
//!
//! [`FallbackController`] makes exactly one parse attempt per load. Success
//! yields a navigable [`PdfSource`]; any parser failure yields a
//! [`FallbackDocument`] that holds the original bytes for whole-document
//! embedding. There is no retry: a new load has to reset the controller.

use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};

use super::document::{Document, DocumentParser};
use crate::error::{ReaderError, Result};
use crate::input::{InputFile, PDF_MIME};
use crate::resource::{Blob, BlobStore, BlobUrl};

/// A parsed document with a fixed page count
pub struct PdfSource {
    name: String,
    document: Option<Box<dyn Document>>,
    page_count: usize,
}

impl PdfSource {
    pub fn new(name: impl Into<String>, document: Box<dyn Document>) -> Self {
        let page_count = document.page_count();
        Self {
            name: name.into(),
            document: Some(document),
            page_count,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Page count captured at parse time. Zero after teardown.
    pub fn page_count(&self) -> usize {
        if self.document.is_some() { self.page_count } else { 0 }
    }

    pub fn document(&self) -> Option<&dyn Document> {
        self.document.as_deref()
    }

    /// Releases the engine's resources. Returns false if already torn down.
    pub fn teardown(&mut self) -> bool {
        match self.document.take() {
            Some(mut document) => {
                document.release();
                debug!("released parsed document '{}'", self.name);
                true
            }
            None => false,
        }
    }
}

impl Drop for PdfSource {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for PdfSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfSource")
            .field("name", &self.name)
            .field("page_count", &self.page_count)
            .field("live", &self.document.is_some())
            .finish()
    }
}

/// Whole-document display resource used when parsing failed
#[derive(Debug)]
pub struct FallbackDocument {
    name: String,
    handle: BlobUrl,
    store: BlobStore,
    released: bool,
}

impl FallbackDocument {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> &BlobUrl {
        &self.handle
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        self.store.revoke(&self.handle)
    }
}

impl Drop for FallbackDocument {
    fn drop(&mut self) {
        self.release();
    }
}

#[derive(Debug)]
pub enum PdfOutcome {
    Parsed(PdfSource),
    Fallback(FallbackDocument),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackState {
    #[default]
    NotAttempted,
    Parsed,
    Fallback,
}

#[derive(Debug, Default)]
pub struct FallbackController {
    state: FallbackState,
}

impl FallbackController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FallbackState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = FallbackState::NotAttempted;
    }

    /// Parses `file`, or falls back to embedding it whole.
    ///
    /// Only reading the file can fail outright. Parser errors of any kind are
    /// absorbed into [`PdfOutcome::Fallback`].
    pub fn attempt(
        &mut self,
        file: &InputFile,
        parser: &dyn DocumentParser,
        store: &BlobStore,
    ) -> Result<PdfOutcome> {
        if self.state != FallbackState::NotAttempted {
            return Err(ReaderError::Parse(format!(
                "'{}' was already attempted in this load",
                file.name()
            )));
        }

        let bytes = file.read_bytes()?;
        match parser.parse(Arc::clone(&bytes)) {
            Ok(document) => {
                self.state = FallbackState::Parsed;
                let source = PdfSource::new(file.name(), document);
                info!(
                    "parsed '{}' with {} pages",
                    file.name(),
                    source.page_count()
                );
                Ok(PdfOutcome::Parsed(source))
            }
            Err(err) => {
                warn!("falling back to embedded viewer for '{}': {err}", file.name());
                self.state = FallbackState::Fallback;
                let handle = store.create(Blob::new(bytes, PDF_MIME));
                Ok(PdfOutcome::Fallback(FallbackDocument {
                    name: file.name().to_string(),
                    handle,
                    store: store.clone(),
                    released: false,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeParser;

    fn pdf() -> InputFile {
        InputFile::from_bytes("book.pdf", b"%PDF-1.7 fake".to_vec())
    }

    #[test]
    fn successful_parse_transitions_to_parsed() {
        let store = BlobStore::new();
        let parser = FakeParser::with_pages(3);
        let mut controller = FallbackController::new();

        let outcome = controller.attempt(&pdf(), &parser, &store).unwrap();
        assert_eq!(controller.state(), FallbackState::Parsed);
        match outcome {
            PdfOutcome::Parsed(source) => assert_eq!(source.page_count(), 3),
            other => panic!("expected parsed source, got {other:?}"),
        }
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn parse_failure_embeds_original_bytes() {
        let store = BlobStore::new();
        let parser = FakeParser::failing();
        let mut controller = FallbackController::new();

        let outcome = controller.attempt(&pdf(), &parser, &store).unwrap();
        assert_eq!(controller.state(), FallbackState::Fallback);
        let PdfOutcome::Fallback(mut fallback) = outcome else {
            panic!("expected fallback");
        };
        let blob = store.get(fallback.handle()).unwrap();
        assert_eq!(blob.mime, PDF_MIME);
        assert_eq!(&*blob.bytes, b"%PDF-1.7 fake");

        assert!(fallback.release());
        assert!(!fallback.release());
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn fallback_is_terminal_until_reset() {
        let store = BlobStore::new();
        let mut controller = FallbackController::new();
        controller.attempt(&pdf(), &FakeParser::failing(), &store).unwrap();

        let retry = controller.attempt(&pdf(), &FakeParser::with_pages(2), &store);
        assert!(retry.is_err());
        assert_eq!(controller.state(), FallbackState::Fallback);

        controller.reset();
        let outcome = controller.attempt(&pdf(), &FakeParser::with_pages(2), &store).unwrap();
        assert!(matches!(outcome, PdfOutcome::Parsed(_)));
    }

    #[test]
    fn teardown_releases_document_once() {
        let parser = FakeParser::with_pages(2);
        let document = parser.parse(Arc::from(&b"%PDF"[..])).unwrap();
        let mut source = PdfSource::new("book.pdf", document);

        assert!(source.teardown());
        assert!(!source.teardown());
        assert_eq!(source.page_count(), 0);
        assert!(source.document().is_none());
        assert_eq!(parser.released_count(), 1);
    }
}
