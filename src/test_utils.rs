//! Fakes and fixture builders shared by unit and integration tests.

use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use image::{DynamicImage, ImageFormat, RgbImage};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{ReaderError, Result};
use crate::resource::{Blob, PageContent};
use crate::source::{Bitmap, Document, DocumentPage, DocumentParser};

#[derive(Default)]
struct ParserLog {
    parses: AtomicUsize,
    released: AtomicUsize,
    rasterized: Mutex<Vec<(usize, f32)>>,
}

/// Document parser with scripted page sizes and failures
#[derive(Clone)]
pub struct FakeParser {
    sizes: Vec<(f32, f32)>,
    fail_parse: bool,
    fail_raster_on: Option<usize>,
    log: Arc<ParserLog>,
}

impl FakeParser {
    /// Parser producing `count` pages of 100x150 points.
    pub fn with_pages(count: usize) -> Self {
        Self::with_sizes(vec![(100.0, 150.0); count])
    }

    pub fn with_sizes(sizes: Vec<(f32, f32)>) -> Self {
        Self {
            sizes,
            fail_parse: false,
            fail_raster_on: None,
            log: Arc::default(),
        }
    }

    /// Parser that rejects every input, like a malformed PDF.
    pub fn failing() -> Self {
        Self {
            fail_parse: true,
            ..Self::with_pages(0)
        }
    }

    /// Makes rasterizing the given 1-based page fail.
    pub fn fail_rasterizing(mut self, number: usize) -> Self {
        self.fail_raster_on = Some(number);
        self
    }

    pub fn parse_count(&self) -> usize {
        self.log.parses.load(Ordering::SeqCst)
    }

    pub fn released_count(&self) -> usize {
        self.log.released.load(Ordering::SeqCst)
    }

    /// `(page number, scale)` for every rasterization, in call order.
    pub fn rasterized(&self) -> Vec<(usize, f32)> {
        self.log
            .rasterized
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DocumentParser for FakeParser {
    fn parse(&self, _bytes: Arc<[u8]>) -> Result<Box<dyn Document>> {
        self.log.parses.fetch_add(1, Ordering::SeqCst);
        if self.fail_parse {
            return Err(ReaderError::Parse("Invalid PDF structure".to_string()));
        }
        Ok(Box::new(FakeDocument {
            sizes: self.sizes.clone(),
            fail_raster_on: self.fail_raster_on,
            log: Arc::clone(&self.log),
            released: false,
        }))
    }
}

struct FakeDocument {
    sizes: Vec<(f32, f32)>,
    fail_raster_on: Option<usize>,
    log: Arc<ParserLog>,
    released: bool,
}

impl Document for FakeDocument {
    fn page_count(&self) -> usize {
        self.sizes.len()
    }

    fn page(&self, number: usize) -> Result<Box<dyn DocumentPage + '_>> {
        if self.released {
            return Err(ReaderError::render("document has been released"));
        }
        let size = number
            .checked_sub(1)
            .and_then(|index| self.sizes.get(index))
            .copied()
            .ok_or_else(|| ReaderError::render(format!("no page {number}")))?;
        Ok(Box::new(FakePage {
            number,
            size,
            fail: self.fail_raster_on == Some(number),
            log: &self.log,
        }))
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.log.released.fetch_add(1, Ordering::SeqCst);
        }
    }
}

struct FakePage<'a> {
    number: usize,
    size: (f32, f32),
    fail: bool,
    log: &'a ParserLog,
}

impl DocumentPage for FakePage<'_> {
    fn size(&self) -> (f32, f32) {
        self.size
    }

    fn rasterize(&self, scale: f32) -> Result<Bitmap> {
        self.log
            .rasterized
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((self.number, scale));
        if self.fail {
            return Err(ReaderError::render(format!("page {} is damaged", self.number)));
        }
        let width = ((self.size.0 * scale).floor() as u32).max(1);
        let height = ((self.size.1 * scale).floor() as u32).max(1);
        Ok(Bitmap::blank(width, height))
    }
}

/// Page content that counts how often it was materialized
pub struct CountingContent {
    bytes: Vec<u8>,
    mime: String,
    calls: AtomicUsize,
}

impl CountingContent {
    pub fn new(bytes: Vec<u8>, mime: &str) -> Arc<Self> {
        Arc::new(Self {
            bytes,
            mime: mime.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PageContent for CountingContent {
    fn materialize(&self) -> Result<Blob> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Blob::new(self.bytes.clone(), self.mime.clone()))
    }
}

/// Encodes a white RGB image as PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, image::Rgb([255, 255, 255]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode png fixture");
    out.into_inner()
}

/// Builds a stored ZIP archive. Names ending in `/` become directories.
pub fn zip_bytes(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, bytes) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).expect("zip directory");
        } else {
            writer.start_file(*name, options).expect("zip entry");
            writer.write_all(bytes).expect("zip entry bytes");
        }
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Writes files under `root`, creating parent directories as needed.
pub fn write_tree(root: &Path, files: &[(&str, Vec<u8>)]) {
    for (relative, bytes) in files {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create fixture dir");
        }
        std::fs::write(&path, bytes).expect("write fixture file");
    }
}
