//! Rendering strategies
//!
//! Three views share one surface: the single-page view, the vertical view and
//! the fallback view, which overrides both while a degraded document preview
//! is active. Every render starts by clearing the surface.

pub mod cache;
pub mod raster;
pub mod surface;
pub mod vertical;

pub use cache::{RasterCache, RasterKey};
pub use raster::{MAX_BACKING_DIMENSION, RasterPlan};
pub use surface::{Block, DisplaySurface, FrameSurface, PageTag, SurfaceLayout};
pub use vertical::VerticalPass;

use std::sync::Arc;

use log::debug;

use crate::error::{ReaderError, Result};
use crate::i18n::{self, Language, MessageKey};
use crate::pager::FALLBACK_LABEL;
use crate::resource::{BlobStore, Page};
use crate::settings::ViewMode;
use crate::source::{Document, FallbackDocument, PageRef, PageSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Single,
    Vertical,
    Fallback,
}

pub fn select_strategy(mode: ViewMode, using_fallback: bool) -> Strategy {
    match (using_fallback, mode) {
        (true, _) => Strategy::Fallback,
        (false, ViewMode::Single) => Strategy::Single,
        (false, ViewMode::Vertical) => Strategy::Vertical,
    }
}

/// What a render pass reads from the reader state
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub source: Option<&'a PageSource>,
    pub fallback: Option<&'a FallbackDocument>,
    pub current_index: usize,
    pub store: &'a BlobStore,
}

impl RenderContext<'_> {
    fn total(&self) -> usize {
        self.source.map_or(0, PageSource::total_count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderReport {
    pub strategy: Strategy,
    pub blocks: usize,
}

pub struct Renderer {
    cache: RasterCache,
    language: Language,
    show_vertical_spacing: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            cache: RasterCache::default(),
            language: Language::default(),
            show_vertical_spacing: true,
        }
    }
}

impl Renderer {
    pub fn new(language: Language, show_vertical_spacing: bool) -> Self {
        Self {
            language,
            show_vertical_spacing,
            ..Self::default()
        }
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn set_vertical_spacing(&mut self, shown: bool) {
        self.show_vertical_spacing = shown;
    }

    pub fn vertical_spacing(&self) -> bool {
        self.show_vertical_spacing
    }

    /// Drops cached rasters. Called whenever the source changes.
    pub fn invalidate(&mut self) {
        self.cache.invalidate_all();
    }

    pub fn cached_rasters(&self) -> usize {
        self.cache.len()
    }

    /// Clears `surface` and renders `strategy` onto it.
    ///
    /// On error the surface keeps whatever was pushed before the failure.
    pub fn render(
        &mut self,
        surface: &mut dyn DisplaySurface,
        strategy: Strategy,
        ctx: &RenderContext<'_>,
    ) -> Result<RenderReport> {
        surface.clear();
        let blocks = match strategy {
            Strategy::Fallback => Self::render_fallback(surface, ctx)?,
            Strategy::Single => self.render_single(surface, ctx)?,
            Strategy::Vertical => self.render_vertical(surface, ctx)?,
        };
        debug!("rendered {strategy:?} view with {blocks} blocks");
        Ok(RenderReport { strategy, blocks })
    }

    fn render_fallback(surface: &mut dyn DisplaySurface, ctx: &RenderContext<'_>) -> Result<usize> {
        let fallback = ctx
            .fallback
            .ok_or_else(|| ReaderError::render("fallback view without a fallback document"))?;
        surface.push(Block::Embed {
            handle: fallback.handle().clone(),
            title: FALLBACK_LABEL.to_string(),
        });
        Ok(1)
    }

    fn placeholder(&self, surface: &mut dyn DisplaySurface, key: MessageKey) -> usize {
        surface.push(Block::Placeholder {
            message: i18n::text(self.language, key),
        });
        1
    }

    fn render_single(
        &mut self,
        surface: &mut dyn DisplaySurface,
        ctx: &RenderContext<'_>,
    ) -> Result<usize> {
        let Some(source) = ctx.source.filter(|_| ctx.total() > 0) else {
            return Ok(self.placeholder(surface, MessageKey::SinglePlaceholder));
        };

        let block = match source.page_at(ctx.current_index) {
            Some(PageRef::Document { number, document }) => document_block(
                document,
                number,
                &surface.layout(),
                None,
                Some(&mut self.cache),
            )?,
            Some(PageRef::Image(page)) => {
                image_block(page, ctx.store, ctx.current_index + 1, None)?
            }
            None => {
                return Err(ReaderError::render(format!(
                    "page index {} is outside 0..{}",
                    ctx.current_index,
                    ctx.total()
                )));
            }
        };
        surface.push(block);
        Ok(1)
    }

    fn render_vertical(
        &mut self,
        surface: &mut dyn DisplaySurface,
        ctx: &RenderContext<'_>,
    ) -> Result<usize> {
        let Some(source) = ctx.source.filter(|_| ctx.total() > 0) else {
            return Ok(self.placeholder(surface, MessageKey::VerticalPlaceholder));
        };

        let compact = !self.show_vertical_spacing;
        let pass = VerticalPass::new(source, ctx.store, surface.layout(), compact);
        let mut pushed = 0;
        for block in pass {
            surface.push(block?);
            pushed += 1;
        }
        Ok(pushed)
    }
}

fn page_alt(number: usize) -> String {
    format!("Page {number}")
}

/// Resolves an image page and reads its natural size from the header.
pub(crate) fn image_block(
    page: &Page,
    store: &BlobStore,
    number: usize,
    tag: Option<PageTag>,
) -> Result<Block> {
    let handle = page.resolve()?;
    let natural_size = store
        .get(&handle)
        .and_then(|blob| imagesize::blob_size(&blob.bytes).ok())
        .map(|size| (size.width as u32, size.height as u32));
    Ok(Block::Image {
        handle,
        alt: page_alt(number),
        natural_size,
        tag,
    })
}

/// Rasterizes a document page to fit the layout width.
pub(crate) fn document_block(
    document: &dyn Document,
    number: usize,
    layout: &SurfaceLayout,
    tag: Option<PageTag>,
    cache: Option<&mut RasterCache>,
) -> Result<Block> {
    let page = document.page(number)?;
    let plan = RasterPlan::compute(layout, page.size());

    let bitmap = match cache {
        Some(cache) => {
            let key = RasterKey::from_plan(number, &plan);
            match cache.get(&key) {
                Some(bitmap) => bitmap,
                None => cache.insert(key, page.rasterize(plan.backing_scale)?),
            }
        }
        None => Arc::new(page.rasterize(plan.backing_scale)?),
    };
    debug!(
        "page {number}: {}x{} backing for {:.0}x{:.0} display",
        bitmap.width, bitmap.height, plan.display_width, plan.display_height
    );

    Ok(Block::Raster {
        bitmap,
        display_width: plan.display_width,
        display_height: plan.display_height,
        alt: page_alt(number),
        tag,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputFile;
    use crate::source::{DocumentParser, ImageSetSource, PdfSource};
    use crate::test_utils::FakeParser;

    fn pdf_source(parser: &FakeParser) -> PageSource {
        let document = parser.parse(Arc::from(&b"%PDF"[..])).unwrap();
        PageSource::Pdf(PdfSource::new("book.pdf", document))
    }

    fn ctx<'a>(
        source: Option<&'a PageSource>,
        store: &'a BlobStore,
        index: usize,
    ) -> RenderContext<'a> {
        RenderContext {
            source,
            fallback: None,
            current_index: index,
            store,
        }
    }

    #[test]
    fn strategy_selection() {
        assert_eq!(select_strategy(ViewMode::Single, false), Strategy::Single);
        assert_eq!(select_strategy(ViewMode::Vertical, false), Strategy::Vertical);
        assert_eq!(select_strategy(ViewMode::Vertical, true), Strategy::Fallback);
        assert_eq!(select_strategy(ViewMode::Single, true), Strategy::Fallback);
    }

    #[test]
    fn empty_reader_shows_placeholders() {
        let store = BlobStore::new();
        let mut surface = FrameSurface::default();
        let mut renderer = Renderer::new(Language::En, true);

        renderer.render(&mut surface, Strategy::Vertical, &ctx(None, &store, 0)).unwrap();
        assert!(matches!(
            &surface.blocks()[..],
            [Block::Placeholder { message }] if message.starts_with("Load a PDF")
        ));

        renderer.render(&mut surface, Strategy::Single, &ctx(None, &store, 0)).unwrap();
        assert_eq!(surface.blocks().len(), 1);
        assert_eq!(surface.clear_count(), 2);
    }

    #[test]
    fn single_view_rasterizes_requested_page_at_layout_width() {
        let parser = FakeParser::with_sizes(vec![(100.0, 150.0), (200.0, 100.0)]);
        let source = pdf_source(&parser);
        let store = BlobStore::new();
        let mut surface = FrameSurface::new(SurfaceLayout {
            container_width: Some(400.0),
            device_pixel_ratio: 2.0,
            ..SurfaceLayout::default()
        });
        let mut renderer = Renderer::default();

        renderer
            .render(&mut surface, Strategy::Single, &ctx(Some(&source), &store, 1))
            .unwrap();

        assert_eq!(parser.rasterized(), vec![(2, 4.0)]);
        match &surface.blocks()[..] {
            [Block::Raster { bitmap, display_width, display_height, alt, tag: None }] => {
                assert_eq!((bitmap.width, bitmap.height), (800, 400));
                assert_eq!((*display_width, *display_height), (400.0, 200.0));
                assert_eq!(alt, "Page 2");
            }
            other => panic!("unexpected blocks {other:?}"),
        }
    }

    #[test]
    fn single_view_reuses_cached_raster() {
        let parser = FakeParser::with_pages(2);
        let source = pdf_source(&parser);
        let store = BlobStore::new();
        let mut surface = FrameSurface::new(SurfaceLayout::with_container_width(300.0));
        let mut renderer = Renderer::default();

        for _ in 0..3 {
            renderer
                .render(&mut surface, Strategy::Single, &ctx(Some(&source), &store, 0))
                .unwrap();
        }
        assert_eq!(parser.rasterized().len(), 1);
        assert_eq!(renderer.cached_rasters(), 1);

        renderer.invalidate();
        renderer
            .render(&mut surface, Strategy::Single, &ctx(Some(&source), &store, 0))
            .unwrap();
        assert_eq!(parser.rasterized().len(), 2);
    }

    #[test]
    fn vertical_view_tags_every_page() {
        let parser = FakeParser::with_pages(3);
        let source = pdf_source(&parser);
        let store = BlobStore::new();
        let mut surface = FrameSurface::new(SurfaceLayout::with_container_width(300.0));
        let mut renderer = Renderer::default();

        let report = renderer
            .render(&mut surface, Strategy::Vertical, &ctx(Some(&source), &store, 0))
            .unwrap();
        assert_eq!(report.blocks, 3);
        assert_eq!(surface.tags(), vec!["1/3", "2/3", "3/3"]);
        assert_eq!(renderer.cached_rasters(), 0, "vertical pass bypasses the cache");
    }

    #[test]
    fn vertical_failure_keeps_partial_view() {
        let parser = FakeParser::with_pages(4).fail_rasterizing(3);
        let source = pdf_source(&parser);
        let store = BlobStore::new();
        let mut surface = FrameSurface::default();
        let mut renderer = Renderer::default();

        let context = ctx(Some(&source), &store, 0);
        let result = renderer.render(&mut surface, Strategy::Vertical, &context);
        assert!(matches!(result, Err(ReaderError::Render(_))));
        assert_eq!(surface.tags(), vec!["1/4", "2/4"]);
        assert_eq!(parser.rasterized().len(), 3, "page 4 is never attempted");
    }

    #[test]
    fn image_single_view_resolves_only_current_page() {
        let store = BlobStore::new();
        let files = (1..=3)
            .map(|i| InputFile::from_bytes(format!("{i}.png"), vec![0u8; 4]))
            .collect();
        let source = PageSource::Images(ImageSetSource::from_files(files, &store).unwrap());
        let mut surface = FrameSurface::default();

        Renderer::default()
            .render(&mut surface, Strategy::Single, &ctx(Some(&source), &store, 1))
            .unwrap();

        let resolved: Vec<_> = source.pages().iter().map(Page::is_resolved).collect();
        assert_eq!(resolved, vec![false, true, false]);
        assert!(matches!(
            &surface.blocks()[..],
            [Block::Image { natural_size: None, tag: None, .. }]
        ));
    }
}
