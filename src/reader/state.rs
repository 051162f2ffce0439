//! Reader state machine
//!
//! [`ReaderState`] is the one context object the load pipeline, the pager and
//! the renderer share. Navigation goes through [`ReaderState::apply`], which
//! mutates the state and returns the effects the owner has to carry out.

use log::debug;

use crate::pager::{PagerView, step_target};
use crate::resource::Page;
use crate::settings::ViewMode;
use crate::source::{
    Document, FallbackController, FallbackDocument, FallbackState, PageSource,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    SetMode(ViewMode),
    /// Move by a signed number of pages
    Step(isize),
    /// Release every resource and return to the empty view
    Reset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    InvalidateCache,
    /// Render the current page with the single-page view
    RenderSingle,
    /// Render whichever view the current mode selects
    RenderCurrentMode,
}

#[derive(Debug, Default)]
pub struct ReaderState {
    mode: ViewMode,
    current_index: usize,
    source: Option<PageSource>,
    fallback: Option<FallbackDocument>,
    controller: FallbackController,
}

impl ReaderState {
    pub fn new(mode: ViewMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::SetMode(mode) => {
                self.mode = mode;
                vec![Effect::RenderCurrentMode]
            }

            Command::Step(delta) => match step_target(self.current_index, delta, self.total()) {
                Some(next) => {
                    self.current_index = next;
                    vec![Effect::RenderSingle]
                }
                None => vec![],
            },

            Command::Reset => {
                self.clear();
                vec![Effect::InvalidateCache, Effect::RenderCurrentMode]
            }
        }
    }

    fn release_resources(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.teardown();
        }
        if let Some(mut fallback) = self.fallback.take() {
            fallback.release();
        }
    }

    fn clear(&mut self) {
        self.release_resources();
        self.controller.reset();
        self.current_index = 0;
        debug!("reader state reset");
    }

    /// Installs a freshly built source, tearing down anything still live.
    pub fn install_source(&mut self, source: PageSource) {
        self.release_resources();
        self.current_index = 0;
        self.source = Some(source);
    }

    pub fn install_fallback(&mut self, fallback: FallbackDocument) {
        self.release_resources();
        self.current_index = 0;
        self.fallback = Some(fallback);
    }

    pub fn controller_mut(&mut self) -> &mut FallbackController {
        &mut self.controller
    }

    pub fn fallback_state(&self) -> FallbackState {
        self.controller.state()
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn source(&self) -> Option<&PageSource> {
        self.source.as_ref()
    }

    pub fn fallback(&self) -> Option<&FallbackDocument> {
        self.fallback.as_ref()
    }

    /// Image-backed pages; empty while a document is open.
    pub fn pages(&self) -> &[Page] {
        self.source.as_ref().map(PageSource::pages).unwrap_or_default()
    }

    pub fn pdf_document(&self) -> Option<&dyn Document> {
        self.source.as_ref().and_then(PageSource::document)
    }

    pub fn total(&self) -> usize {
        self.source.as_ref().map_or(0, PageSource::total_count)
    }

    pub fn using_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn pager(&self) -> PagerView {
        PagerView::derive(self.mode, self.total(), self.current_index, self.using_fallback())
    }
}
