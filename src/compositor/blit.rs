//! Rectangular pixel copies between rasters

use image::{RgbaImage, imageops};

use crate::resample::{ResampleFilter, resize_rgba};

/// Integer pixel rectangle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Build from edge coordinates, clamped to `[0, max_w] x [0, max_h]`
    pub fn from_edges(x0: f64, y0: f64, x1: f64, y1: f64, max_w: u32, max_h: u32) -> Self {
        let clamp = |v: f64, max: u32| v.round().clamp(0.0, f64::from(max)) as u32;
        let (x0, x1) = (clamp(x0, max_w), clamp(x1, max_w));
        let (y0, y1) = (clamp(y0, max_h), clamp(y1, max_h));
        Self::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }
}

/// The drawing-surface primitive: copy `src_rect` of `src` into `dst_rect`
/// of `dst`, resampling when the sizes differ. Rectangles are axis-aligned.
pub trait Blit: Sync {
    fn blit(&self, src: &RgbaImage, src_rect: PixelRect, dst: &mut RgbaImage, dst_rect: PixelRect);
}

/// [`Blit`] built on [`resize_rgba`]
#[derive(Clone, Copy, Debug, Default)]
pub struct ResampleBlit {
    pub filter: ResampleFilter,
}

impl ResampleBlit {
    pub const fn new(filter: ResampleFilter) -> Self {
        Self { filter }
    }
}

impl Blit for ResampleBlit {
    fn blit(&self, src: &RgbaImage, src_rect: PixelRect, dst: &mut RgbaImage, dst_rect: PixelRect) {
        if src_rect.is_empty() || dst_rect.is_empty() {
            return;
        }
        let cropped =
            imageops::crop_imm(src, src_rect.x, src_rect.y, src_rect.w, src_rect.h).to_image();
        let scaled = resize_rgba(&cropped, dst_rect.w, dst_rect.h, self.filter);
        imageops::replace(dst, &scaled, i64::from(dst_rect.x), i64::from(dst_rect.y));
    }
}
