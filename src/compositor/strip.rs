//! The horizontal strip of composited snippets

use std::path::Path;

use image::{Rgba, RgbaImage, imageops};

/// One composited region
#[derive(Clone, Debug)]
pub struct OutputTile {
    /// Position of the source region in the region store
    pub region_index: usize,
    pub logical_width: u32,
    pub logical_height: u32,
    pub raster: RgbaImage,
}

/// Left edge and width of a tile inside the strip, in logical pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StripSlot {
    pub x: u32,
    pub width: u32,
}

/// Output tiles in region order, all of the same logical height
#[derive(Clone, Debug, Default)]
pub struct Strip {
    pub tiles: Vec<OutputTile>,
    pub target_height: u32,
    pub density: f64,
}

impl Strip {
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn layout(&self, gap: u32) -> Vec<StripSlot> {
        let mut x = 0;
        self.tiles
            .iter()
            .map(|tile| {
                let slot = StripSlot {
                    x,
                    width: tile.logical_width,
                };
                x += tile.logical_width + gap;
                slot
            })
            .collect()
    }

    pub fn total_width(&self, gap: u32) -> u32 {
        let widths: u32 = self.tiles.iter().map(|t| t.logical_width).sum();
        widths + gap * (self.tiles.len().saturating_sub(1) as u32)
    }

    /// Paint every tile side by side on one raster at the strip's density
    pub fn flatten(&self, gap: u32, background: Rgba<u8>) -> RgbaImage {
        let gap_px = (f64::from(gap) * self.density).round() as u32;
        let height = self
            .tiles
            .iter()
            .map(|t| t.raster.height())
            .max()
            .unwrap_or(0)
            .max(1);
        let width = self.tiles.iter().map(|t| t.raster.width()).sum::<u32>()
            + gap_px * (self.tiles.len().saturating_sub(1) as u32);

        let mut out = RgbaImage::from_pixel(width.max(1), height, background);
        let mut x = 0i64;
        for tile in &self.tiles {
            imageops::replace(&mut out, &tile.raster, x, 0);
            x += i64::from(tile.raster.width() + gap_px);
        }
        out
    }

    pub fn save_png(&self, path: &Path, gap: u32, background: Rgba<u8>) -> image::ImageResult<()> {
        self.flatten(gap, background)
            .save_with_format(path, image::ImageFormat::Png)
    }
}
