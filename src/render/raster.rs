//! Responsive raster sizing for document pages

use super::surface::SurfaceLayout;

/// Largest backing raster dimension, in device pixels
pub const MAX_BACKING_DIMENSION: f32 = 8192.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterPlan {
    /// Size the page is shown at, in layout pixels
    pub display_width: f32,
    pub display_height: f32,
    /// Scale handed to the rasterizer (layout fit times device pixels)
    pub backing_scale: f32,
    /// Effective device pixel ratio after the backing cap
    pub pixel_ratio: f32,
}

impl RasterPlan {
    /// Fits a page of `intrinsic` points to the layout's available width.
    pub fn compute(layout: &SurfaceLayout, intrinsic: (f32, f32)) -> Self {
        let page_width = if intrinsic.0.is_finite() && intrinsic.0 > 0.0 {
            intrinsic.0
        } else {
            1.0
        };
        let page_height = if intrinsic.1.is_finite() && intrinsic.1 > 0.0 {
            intrinsic.1
        } else {
            page_width
        };

        let display_width = layout.available_width(page_width);
        let fit = display_width / page_width;
        let display_height = page_height * fit;

        let mut pixel_ratio = layout.pixel_ratio();
        let backing_max = display_width.max(display_height) * pixel_ratio;
        if backing_max > MAX_BACKING_DIMENSION {
            pixel_ratio *= MAX_BACKING_DIMENSION / backing_max;
        }

        Self {
            display_width,
            display_height,
            backing_scale: fit * pixel_ratio,
            pixel_ratio,
        }
    }

    /// Expected backing raster size in device pixels.
    pub fn backing_size(&self) -> (u32, u32) {
        (
            ((self.display_width * self.pixel_ratio).floor() as u32).max(1),
            ((self.display_height * self.pixel_ratio).floor() as u32).max(1),
        )
    }
}
