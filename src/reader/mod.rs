//! The reader: load pipeline, navigation and status
//!
//! A load resets the state before anything else, so a failed load always
//! leaves an empty reader behind. Classification and source construction
//! failures abort the load. Render failures after a successful load only
//! change the status line.

pub mod state;

pub use state::{Command, Effect, ReaderState};

use std::sync::Arc;

use log::{error, info, warn};

use crate::enumerate::{DroppedEntry, collect_all};
use crate::error::{ReaderError, Result};
use crate::i18n::{self, Language, MessageKey};
use crate::input::{InputFile, InputKind, classify};
use crate::pager::PagerView;
use crate::render::{
    DisplaySurface, RenderContext, RenderReport, Renderer, Strategy, select_strategy,
};
use crate::resource::BlobStore;
use crate::settings::ViewMode;
use crate::source::{
    ArchiveDecoder, ArchiveSource, DocumentParser, ImageSetSource, PageSource, PdfOutcome,
    ZipDecoder, default_parser,
};
use crate::status::Status;

/// Outcome of a successful load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub kind: InputKind,
    pub total: usize,
    pub using_fallback: bool,
    /// False when the first render failed; the status line says why
    pub rendered: bool,
}

pub struct Reader<S: DisplaySurface> {
    state: ReaderState,
    surface: S,
    renderer: Renderer,
    store: BlobStore,
    parser: Arc<dyn DocumentParser>,
    decoder: Arc<dyn ArchiveDecoder>,
    language: Language,
    status: Status,
}

impl<S: DisplaySurface> Reader<S> {
    pub fn new(surface: S) -> Self {
        let language = Language::default();
        Self {
            state: ReaderState::default(),
            surface,
            renderer: Renderer::new(language, true),
            store: BlobStore::new(),
            parser: default_parser(),
            decoder: Arc::new(ZipDecoder),
            language,
            status: Status::ready(language),
        }
    }

    pub fn with_parser(mut self, parser: Arc<dyn DocumentParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn ArchiveDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self.renderer.set_language(language);
        self.status = Status::ready(language);
        self
    }

    pub fn with_mode(mut self, mode: ViewMode) -> Self {
        self.state.apply(Command::SetMode(mode));
        self
    }

    pub fn with_vertical_spacing(mut self, shown: bool) -> Self {
        self.renderer.set_vertical_spacing(shown);
        self
    }

    fn message(&self, key: MessageKey) -> String {
        i18n::text(self.language, key)
    }

    /// Loads a picked or dropped file list and renders the current mode.
    ///
    /// An empty list is rejected without touching the current state.
    pub fn load_input(&mut self, files: Vec<InputFile>) -> Result<LoadSummary> {
        if files.is_empty() {
            return Err(ReaderError::EmptyInput);
        }

        info!("loading {} input files", files.len());
        self.status = Status::info(self.message(MessageKey::Loading));
        self.reset();

        let kind = match self.build_source(files) {
            Ok(kind) => kind,
            Err(err) => {
                error!("load failed: {err}");
                self.reset();
                self.status = Status::error(self.message(MessageKey::LoadError))
                    .with_detail(err.to_string());
                return Err(err);
            }
        };

        let total = self.state.total();
        let using_fallback = self.state.using_fallback();
        if using_fallback {
            self.status = Status::warning(self.message(MessageKey::PdfFallback));
        } else {
            let count = total.to_string();
            self.status = Status::info(i18n::format(
                self.language,
                MessageKey::Loaded,
                &[("count", count.as_str())],
            ));
        }
        info!("loaded {} source with {total} pages", kind.as_str());

        let rendered = self.render_current_mode().is_ok();
        Ok(LoadSummary {
            kind,
            total,
            using_fallback,
            rendered,
        })
    }

    fn build_source(&mut self, files: Vec<InputFile>) -> Result<InputKind> {
        let kind = classify(&files).ok_or(ReaderError::EmptyInput)?;
        match kind {
            InputKind::Pdf => {
                let outcome =
                    self.state
                        .controller_mut()
                        .attempt(&files[0], self.parser.as_ref(), &self.store)?;
                match outcome {
                    PdfOutcome::Parsed(source) => {
                        self.state.install_source(PageSource::Pdf(source))
                    }
                    PdfOutcome::Fallback(fallback) => self.state.install_fallback(fallback),
                }
            }
            InputKind::Archive => {
                let source = ArchiveSource::open(&files[0], self.decoder.as_ref(), &self.store)?;
                self.state.install_source(PageSource::Archive(source));
            }
            InputKind::Images => {
                let source = ImageSetSource::from_files(files, &self.store)?;
                self.state.install_source(PageSource::Images(source));
            }
        }
        Ok(kind)
    }

    /// Collects dropped files and folders, then loads them.
    pub fn accept_drop(&mut self, entries: Vec<Box<dyn DroppedEntry>>) -> Result<LoadSummary> {
        let files = match collect_all(&entries) {
            Ok(files) => files,
            Err(err) => {
                warn!("could not read dropped items: {err}");
                self.status = Status::error(self.message(MessageKey::DropError))
                    .with_detail(err.to_string());
                return Err(err);
            }
        };
        self.load_input(files)
    }

    pub fn set_mode(&mut self, mode: ViewMode) -> Result<RenderReport> {
        let effects = self.state.apply(Command::SetMode(mode));
        match self.run(effects)? {
            Some(report) => Ok(report),
            None => self.render_current_mode(),
        }
    }

    /// Moves by `delta` pages. Returns `Ok(false)` when the target is out of
    /// range, in which case nothing changes and nothing is re-rendered.
    pub fn step_page(&mut self, delta: isize) -> Result<bool> {
        let effects = self.state.apply(Command::Step(delta));
        if effects.is_empty() {
            return Ok(false);
        }
        self.run(effects)?;
        Ok(true)
    }

    /// Releases every page handle and the open document or fallback, leaving
    /// the placeholder for the current mode on the surface.
    pub fn reset(&mut self) {
        let effects = self.state.apply(Command::Reset);
        if let Err(err) = self.run(effects) {
            warn!("reset failed: {err}");
        }
    }

    pub fn set_vertical_spacing(&mut self, shown: bool) -> Result<()> {
        self.renderer.set_vertical_spacing(shown);
        if self.state.mode() == ViewMode::Vertical {
            self.render_current_mode()?;
        }
        Ok(())
    }

    /// Switches language. An empty reader is re-rendered so its placeholder follows.
    pub fn set_language(&mut self, language: Language) -> Result<()> {
        let was_ready = self.status == Status::ready(self.language);
        self.language = language;
        self.renderer.set_language(language);
        if was_ready {
            self.status = Status::ready(language);
        }
        if self.state.total() == 0 && !self.state.using_fallback() {
            self.render_current_mode()?;
        }
        Ok(())
    }

    /// Reports a failure from outside the pipeline on the status line.
    pub fn report_failure(&mut self, message: &str) {
        error!("{message}");
        self.status = Status::error(i18n::format(
            self.language,
            MessageKey::Error,
            &[("message", message)],
        ));
    }

    pub fn render_current_mode(&mut self) -> Result<RenderReport> {
        self.render(select_strategy(self.state.mode(), self.state.using_fallback()))
    }

    fn run(&mut self, effects: Vec<Effect>) -> Result<Option<RenderReport>> {
        let mut report = None;
        for effect in effects {
            match effect {
                Effect::InvalidateCache => self.renderer.invalidate(),
                Effect::RenderSingle => {
                    let strategy = select_strategy(ViewMode::Single, self.state.using_fallback());
                    report = Some(self.render(strategy)?);
                }
                Effect::RenderCurrentMode => report = Some(self.render_current_mode()?),
            }
        }
        Ok(report)
    }

    fn render(&mut self, strategy: Strategy) -> Result<RenderReport> {
        let ctx = RenderContext {
            source: self.state.source(),
            fallback: self.state.fallback(),
            current_index: self.state.current_index(),
            store: &self.store,
        };
        let result = self.renderer.render(&mut self.surface, strategy, &ctx);
        if let Err(err) = &result {
            warn!("render failed: {err}");
            self.status = Status::error(i18n::text(self.language, MessageKey::RenderError))
                .with_detail(err.to_string());
        }
        result
    }

    pub fn pager(&self) -> PagerView {
        self.state.pager()
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn state(&self) -> &ReaderState {
        &self.state
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn vertical_spacing(&self) -> bool {
        self.renderer.vertical_spacing()
    }

    pub fn blob_store(&self) -> &BlobStore {
        &self.store
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}
