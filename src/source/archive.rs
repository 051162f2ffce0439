//! Comic archives (CBZ/ZIP)
//!
//! The archive is indexed once when opened. Entry bytes are decompressed only
//! when a page is resolved, so the decompressed archive is never held in
//! memory as a whole.

use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, info};
use zip::ZipArchive;

use crate::error::{ReaderError, Result};
use crate::input::{InputFile, guess_mime, is_supported_image};
use crate::natural_sort::sort_naturally_by;
use crate::resource::{Blob, BlobStore, Page, PageContent};

/// Upper bound on the buffer reserved up front for one entry
const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

pub const NO_ARCHIVE_IMAGES: &str = "Archive does not contain supported image files.";

/// One entry of an archive's central directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub is_dir: bool,
    /// Content type reported by the decoder, if it knows one
    pub mime: Option<String>,
}

/// An opened archive
pub trait ArchiveReader: Send + Sync {
    fn entries(&self) -> &[ArchiveEntry];

    fn read(&self, name: &str) -> Result<Vec<u8>>;
}

pub trait ArchiveDecoder: Send + Sync {
    fn open(&self, bytes: Arc<[u8]>) -> Result<Arc<dyn ArchiveReader>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ZipDecoder;

impl ArchiveDecoder for ZipDecoder {
    fn open(&self, bytes: Arc<[u8]>) -> Result<Arc<dyn ArchiveReader>> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ReaderError::decode("archive", e))?;

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let file = archive
                .by_index(index)
                .map_err(|e| ReaderError::decode(format!("archive entry #{index}"), e))?;
            entries.push(ArchiveEntry {
                name: file.name().to_string(),
                is_dir: file.is_dir(),
                mime: None,
            });
        }

        Ok(Arc::new(ZipReader {
            archive: Mutex::new(archive),
            entries,
        }))
    }
}

struct ZipReader {
    archive: Mutex<ZipArchive<Cursor<Arc<[u8]>>>>,
    entries: Vec<ArchiveEntry>,
}

impl ArchiveReader for ZipReader {
    fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let mut archive = self.archive.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = archive
            .by_name(name)
            .map_err(|e| ReaderError::decode(format!("archive entry '{name}'"), e))?;
        // The declared size comes from the archive and is only a hint.
        let hint = file.size().min(MAX_PREALLOCATION);
        let mut bytes = Vec::with_capacity(hint as usize);
        file.read_to_end(&mut bytes)
            .map_err(|e| ReaderError::decode(format!("archive entry '{name}'"), e))?;
        Ok(bytes)
    }
}

/// Page content backed by a single archive entry
struct ArchiveEntryContent {
    archive: Arc<dyn ArchiveReader>,
    name: String,
    mime: Option<String>,
}

impl PageContent for ArchiveEntryContent {
    fn materialize(&self) -> Result<Blob> {
        let bytes = self.archive.read(&self.name)?;
        Ok(Blob::new(bytes, guess_mime(&self.name, self.mime.as_deref())))
    }
}

/// Image pages read from one archive, in natural order
#[derive(Debug)]
pub struct ArchiveSource {
    name: String,
    pages: Vec<Page>,
}

impl ArchiveSource {
    pub fn open(file: &InputFile, decoder: &dyn ArchiveDecoder, store: &BlobStore) -> Result<Self> {
        let bytes = file.read_bytes()?;
        let archive = decoder.open(bytes)?;

        let mut entries: Vec<&ArchiveEntry> = archive
            .entries()
            .iter()
            .filter(|entry| !entry.is_dir && is_supported_image(&entry.name))
            .collect();
        if entries.is_empty() {
            return Err(ReaderError::NoCompatibleContent(NO_ARCHIVE_IMAGES.to_string()));
        }
        sort_naturally_by(&mut entries, |entry| entry.name.as_str());

        let pages = entries
            .into_iter()
            .map(|entry| {
                let content = ArchiveEntryContent {
                    archive: Arc::clone(&archive),
                    name: entry.name.clone(),
                    mime: entry.mime.clone(),
                };
                Page::new(entry.name.clone(), Arc::new(content), store.clone())
            })
            .collect::<Vec<_>>();

        info!(
            "archive '{}' indexed: {} image pages of {} entries",
            file.name(),
            pages.len(),
            archive.entries().len()
        );
        Ok(Self {
            name: file.name().to_string(),
            pages,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Releases every page handle. Returns how many handles were freed.
    pub fn release_all(&self) -> usize {
        let freed = self.pages.iter().filter(|page| page.release()).count();
        debug!("archive '{}' released {freed} handles", self.name);
        freed
    }
}
