//! Document parser seam
//!
//! A [`DocumentParser`] turns PDF bytes into a [`Document`] with a fixed page
//! count. Pages rasterize to RGB [`Bitmap`]s at a caller-chosen scale. The
//! MuPDF engine lives behind the `pdf` feature; without it every parse fails
//! and PDFs take the fallback path.

use std::fmt;
use std::sync::Arc;

use crate::error::{ReaderError, Result};

/// Packed RGB pixels, three bytes per pixel, no row padding
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected {
            return Err(ReaderError::render(format!(
                "bitmap buffer is {} bytes, expected {expected} for {width}x{height}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Solid white bitmap.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0xFF; width as usize * height as usize * 3],
        }
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bitmap({}x{})", self.width, self.height)
    }
}

pub trait DocumentPage {
    /// Page size in points at scale 1.
    fn size(&self) -> (f32, f32);

    fn rasterize(&self, scale: f32) -> Result<Bitmap>;
}

pub trait Document {
    fn page_count(&self) -> usize;

    /// Loads a page by its 1-based number.
    fn page(&self, number: usize) -> Result<Box<dyn DocumentPage + '_>>;

    /// Frees engine resources. Pages cannot be loaded afterwards.
    fn release(&mut self);
}

pub trait DocumentParser: Send + Sync {
    fn parse(&self, bytes: Arc<[u8]>) -> Result<Box<dyn Document>>;
}

/// Parser used when no PDF engine is compiled in
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDocumentEngine;

impl DocumentParser for NoDocumentEngine {
    fn parse(&self, _bytes: Arc<[u8]>) -> Result<Box<dyn Document>> {
        Err(ReaderError::Parse(
            "no PDF engine available in this build".to_string(),
        ))
    }
}

/// The parser this build was compiled with.
pub fn default_parser() -> Arc<dyn DocumentParser> {
    #[cfg(feature = "pdf")]
    {
        Arc::new(super::mupdf_engine::MupdfParser)
    }
    #[cfg(not(feature = "pdf"))]
    {
        Arc::new(NoDocumentEngine)
    }
}
