//! Display surface seam
//!
//! Renderers never draw directly; they clear a [`DisplaySurface`] and push
//! [`Block`]s onto it in display order. [`FrameSurface`] keeps the blocks in
//! memory, which is what the CLI exports and what tests inspect.

use std::fmt;
use std::sync::Arc;

use crate::resource::BlobUrl;
use crate::source::Bitmap;

/// Layout measurements the surface reports to the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceLayout {
    /// Laid-out width of the page container, if it has been laid out
    pub container_width: Option<f32>,
    pub padding_left: f32,
    pub padding_right: f32,
    /// Width of the whole viewport, if known
    pub viewport_width: Option<f32>,
    pub device_pixel_ratio: f32,
}

impl Default for SurfaceLayout {
    fn default() -> Self {
        Self {
            container_width: None,
            padding_left: 0.0,
            padding_right: 0.0,
            viewport_width: None,
            device_pixel_ratio: 1.0,
        }
    }
}

fn usable(width: Option<f32>) -> Option<f32> {
    width.filter(|w| w.is_finite() && *w > 0.0)
}

impl SurfaceLayout {
    pub fn with_container_width(width: f32) -> Self {
        Self {
            container_width: Some(width),
            ..Self::default()
        }
    }

    /// Container width minus horizontal padding, if positive.
    pub fn inner_width(&self) -> Option<f32> {
        usable(self.container_width)
            .map(|w| w - self.padding_left.max(0.0) - self.padding_right.max(0.0))
            .filter(|w| *w > 0.0)
    }

    /// Width a page should be displayed at: the inner container width, else
    /// the viewport width, else the page's own width. Never below 1.
    pub fn available_width(&self, intrinsic_width: f32) -> f32 {
        self.inner_width()
            .or_else(|| usable(self.viewport_width))
            .or_else(|| usable(Some(intrinsic_width)))
            .unwrap_or(1.0)
            .max(1.0)
    }

    /// Device pixel ratio, with nonsense values treated as 1.
    pub fn pixel_ratio(&self) -> f32 {
        if self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio
        } else {
            1.0
        }
    }
}

/// Running page tag shown in vertical mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTag {
    pub number: usize,
    pub total: usize,
    /// Compact layout: no gap between pages and the tag is hidden
    pub compact: bool,
}

impl fmt::Display for PageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.number, self.total)
    }
}

#[derive(Debug, Clone)]
pub enum Block {
    Placeholder {
        message: String,
    },
    /// Whole-document embed used by the fallback view
    Embed {
        handle: BlobUrl,
        title: String,
    },
    Image {
        handle: BlobUrl,
        alt: String,
        natural_size: Option<(u32, u32)>,
        tag: Option<PageTag>,
    },
    Raster {
        bitmap: Arc<Bitmap>,
        display_width: f32,
        display_height: f32,
        alt: String,
        tag: Option<PageTag>,
    },
}

impl Block {
    pub fn tag(&self) -> Option<&PageTag> {
        match self {
            Block::Image { tag, .. } | Block::Raster { tag, .. } => tag.as_ref(),
            Block::Placeholder { .. } | Block::Embed { .. } => None,
        }
    }
}

pub trait DisplaySurface {
    fn layout(&self) -> SurfaceLayout;

    /// Removes everything previously pushed.
    fn clear(&mut self);

    fn push(&mut self, block: Block);
}

/// In-memory surface
#[derive(Debug, Default)]
pub struct FrameSurface {
    layout: SurfaceLayout,
    blocks: Vec<Block>,
    clears: usize,
}

impl FrameSurface {
    pub fn new(layout: SurfaceLayout) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    pub fn set_layout(&mut self, layout: SurfaceLayout) {
        self.layout = layout;
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn clear_count(&self) -> usize {
        self.clears
    }

    /// Tag labels in display order, e.g. `["1/3", "2/3", "3/3"]`.
    pub fn tags(&self) -> Vec<String> {
        self.blocks
            .iter()
            .filter_map(Block::tag)
            .map(ToString::to_string)
            .collect()
    }
}

impl DisplaySurface for FrameSurface {
    fn layout(&self) -> SurfaceLayout {
        self.layout
    }

    fn clear(&mut self) {
        self.blocks.clear();
        self.clears += 1;
    }

    fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_width_prefers_inner_container() {
        let layout = SurfaceLayout {
            container_width: Some(820.0),
            padding_left: 10.0,
            padding_right: 10.0,
            viewport_width: Some(1280.0),
            device_pixel_ratio: 2.0,
        };
        assert_eq!(layout.available_width(612.0), 800.0);
    }

    #[test]
    fn available_width_falls_back_in_order() {
        let viewport_only = SurfaceLayout {
            container_width: Some(0.0),
            viewport_width: Some(1024.0),
            ..SurfaceLayout::default()
        };
        assert_eq!(viewport_only.available_width(612.0), 1024.0);

        let nothing = SurfaceLayout::default();
        assert_eq!(nothing.available_width(612.0), 612.0);
        assert_eq!(nothing.available_width(0.0), 1.0);
        assert_eq!(nothing.available_width(f32::NAN), 1.0);
    }

    #[test]
    fn padding_wider_than_container_is_ignored() {
        let layout = SurfaceLayout {
            container_width: Some(20.0),
            padding_left: 15.0,
            padding_right: 15.0,
            viewport_width: Some(300.0),
            ..SurfaceLayout::default()
        };
        assert_eq!(layout.available_width(100.0), 300.0);
    }

    #[test]
    fn bad_pixel_ratio_is_one() {
        for dpr in [0.0, -2.0, f32::INFINITY, f32::NAN] {
            let layout = SurfaceLayout {
                device_pixel_ratio: dpr,
                ..SurfaceLayout::default()
            };
            assert_eq!(layout.pixel_ratio(), 1.0);
        }
    }

    #[test]
    fn frame_surface_counts_clears() {
        let mut surface = FrameSurface::default();
        surface.push(Block::Placeholder {
            message: "hello".into(),
        });
        surface.clear();
        assert!(surface.blocks().is_empty());
        assert_eq!(surface.clear_count(), 1);
    }
}
