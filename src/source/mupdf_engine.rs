//! MuPDF-backed document engine

use std::sync::Arc;

use log::debug;
use mupdf::{Colorspace, Matrix, Pixmap};

use super::document::{Bitmap, Document, DocumentPage, DocumentParser};
use crate::error::{ReaderError, Result};
use crate::input::PDF_MIME;

#[derive(Debug, Default, Clone, Copy)]
pub struct MupdfParser;

impl DocumentParser for MupdfParser {
    fn parse(&self, bytes: Arc<[u8]>) -> Result<Box<dyn Document>> {
        let doc = mupdf::Document::from_bytes(&bytes, PDF_MIME)
            .map_err(|e| ReaderError::Parse(e.to_string()))?;
        let page_count = doc
            .page_count()
            .map_err(|e| ReaderError::Parse(e.to_string()))?;
        if page_count <= 0 {
            return Err(ReaderError::Parse("document has no pages".to_string()));
        }
        debug!("mupdf opened document with {page_count} pages");
        Ok(Box::new(MupdfDocument {
            doc: Some(doc),
            page_count: page_count as usize,
        }))
    }
}

struct MupdfDocument {
    doc: Option<mupdf::Document>,
    page_count: usize,
}

impl Document for MupdfDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page(&self, number: usize) -> Result<Box<dyn DocumentPage + '_>> {
        if number == 0 || number > self.page_count {
            return Err(ReaderError::render(format!(
                "page {number} is outside 1..={}",
                self.page_count
            )));
        }
        let doc = self
            .doc
            .as_ref()
            .ok_or_else(|| ReaderError::render("document has been released"))?;
        let page = doc
            .load_page((number - 1) as i32)
            .map_err(ReaderError::render)?;
        let bounds = page.bounds().map_err(ReaderError::render)?;
        let size = (bounds.x1 - bounds.x0, bounds.y1 - bounds.y0);
        Ok(Box::new(MupdfPage { page, size }))
    }

    fn release(&mut self) {
        if self.doc.take().is_some() {
            debug!("mupdf document released");
        }
    }
}

struct MupdfPage {
    page: mupdf::Page,
    size: (f32, f32),
}

impl DocumentPage for MupdfPage {
    fn size(&self) -> (f32, f32) {
        self.size
    }

    fn rasterize(&self, scale: f32) -> Result<Bitmap> {
        let transform = Matrix::new_scale(scale, scale);
        let pixmap = self
            .page
            .to_pixmap(&transform, &Colorspace::device_rgb(), false, false)
            .map_err(ReaderError::render)?;
        let pixels = pixmap_to_rgb(&pixmap)?;
        Bitmap::new(pixmap.width(), pixmap.height(), pixels)
    }
}

fn pixmap_to_rgb(pixmap: &Pixmap) -> Result<Vec<u8>> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(ReaderError::render(format!(
            "unsupported pixmap format: {n} channels"
        )));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
        return Err(ReaderError::render("pixmap buffer size mismatch"));
    }

    let mut out = Vec::with_capacity(width * height * 3);
    for row in samples.chunks(stride).take(height) {
        let row = &row[..row_bytes];
        if n == 3 {
            out.extend_from_slice(row);
        } else {
            out.extend(row.chunks_exact(n).flat_map(|px| px[..3].iter().copied()));
        }
    }
    Ok(out)
}
