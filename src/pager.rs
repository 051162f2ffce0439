//! Pager display fields
//!
//! Everything here is a pure function of mode, page count, position and
//! fallback state. The reader recomputes the view after every transition.

use crate::settings::ViewMode;

/// Indicator label while the degraded document preview is shown
pub const FALLBACK_LABEL: &str = "PDF preview";
pub const EMPTY_INDICATOR: &str = "0 / 0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerView {
    pub indicator: String,
    pub prev_enabled: bool,
    pub next_enabled: bool,
    /// Pagination controls are only shown in single-page mode
    pub controls_visible: bool,
}

impl PagerView {
    pub fn derive(mode: ViewMode, total: usize, current: usize, using_fallback: bool) -> Self {
        let controls_visible = mode == ViewMode::Single;

        if using_fallback {
            return Self {
                indicator: FALLBACK_LABEL.to_string(),
                prev_enabled: false,
                next_enabled: false,
                controls_visible,
            };
        }

        if total == 0 {
            return Self {
                indicator: EMPTY_INDICATOR.to_string(),
                prev_enabled: false,
                next_enabled: false,
                controls_visible,
            };
        }

        Self {
            indicator: format!("{} / {}", current + 1, total),
            prev_enabled: current > 0,
            next_enabled: current + 1 < total,
            controls_visible,
        }
    }
}

/// Index reached by moving `delta` pages, or `None` when that leaves
/// `[0, total)`. Never wraps and never clamps.
pub fn step_target(current: usize, delta: isize, total: usize) -> Option<usize> {
    current
        .checked_add_signed(delta)
        .filter(|&next| next < total)
}
