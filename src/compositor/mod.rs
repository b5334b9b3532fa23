//! Stitching regions out of page tiles
//!
//! Every region becomes one output tile of a fixed height. A region that
//! spans several pages is rebuilt from the per-page intersections, each
//! mapped into source pixels with the page's density and into destination
//! pixels with the region's scale factor.

pub mod blit;
pub mod strip;

use image::{Rgba, RgbaImage};
use log::{debug, warn};
use rayon::prelude::*;

use crate::regions::Region;
use crate::render::SourceTile;
use crate::resample::ResampleFilter;

pub use blit::{Blit, PixelRect, ResampleBlit};
pub use strip::{OutputTile, Strip, StripSlot};

/// Parameters shared by every tile of a strip
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositeOptions {
    /// Output height in logical pixels
    pub target_height: u32,
    /// Device pixels per logical pixel of the output
    pub density: f64,
    pub background: Rgba<u8>,
    pub filter: ResampleFilter,
    /// Largest raster side, in device pixels, a single tile may have
    pub max_tile_pixels: u32,
}

/// Default cap on either side of an output raster
pub const DEFAULT_MAX_TILE_PIXELS: u32 = 16_384;

impl Default for CompositeOptions {
    fn default() -> Self {
        Self {
            target_height: 160,
            density: 1.0,
            background: Rgba([255, 255, 255, 255]),
            filter: ResampleFilter::default(),
            max_tile_pixels: DEFAULT_MAX_TILE_PIXELS,
        }
    }
}

impl CompositeOptions {
    fn density(&self) -> f64 {
        if self.density.is_finite() && self.density > 0.0 {
            self.density
        } else {
            1.0
        }
    }
}

fn to_pixels(logical: u32, density: f64, max: u32) -> u32 {
    (f64::from(logical) * density).round().clamp(1.0, f64::from(max)) as u32
}

/// Logical width of a region scaled to `target_height`, never zero
pub fn output_width(region: &Region, target_height: u32) -> u32 {
    if !region.is_valid() {
        return 1;
    }
    let k = f64::from(target_height) / region.h;
    (region.w * k).round().clamp(1.0, f64::from(u32::MAX)) as u32
}

/// Composite one region using the default blitter
pub fn composite(
    region: &Region,
    region_index: usize,
    tiles: &[SourceTile],
    options: &CompositeOptions,
) -> OutputTile {
    composite_with(&ResampleBlit::new(options.filter), region, region_index, tiles, options)
}

/// Composite one region with an explicit blitter
pub fn composite_with(
    blitter: &dyn Blit,
    region: &Region,
    region_index: usize,
    tiles: &[SourceTile],
    options: &CompositeOptions,
) -> OutputTile {
    let max = options.max_tile_pixels.max(1);
    let wanted_width = output_width(region, options.target_height.max(1));
    let target_height = options.target_height.clamp(1, max);
    let logical_width = wanted_width.min(max);
    let density = options.density();
    let px_w = to_pixels(logical_width, density, max);
    let px_h = to_pixels(target_height, density, max);
    let clamped = wanted_width > max
        || target_height < options.target_height
        || f64::from(px_w) < (f64::from(logical_width) * density).round()
        || f64::from(px_h) < (f64::from(target_height) * density).round();
    if clamped {
        warn!("Region {region:?} is {wanted_width} units wide; clamping tile to {px_w}x{px_h} px");
    }

    let mut raster = RgbaImage::from_pixel(px_w, px_h, options.background);

    if !region.is_valid() {
        warn!("Compositing degenerate region {region:?} as a blank tile");
    } else {
        // Content units to destination pixels
        let sx = f64::from(px_w) / region.w;
        let sy = f64::from(px_h) / region.h;

        for tile in tiles {
            let Some(inter) = region.intersect(&tile.placement) else {
                continue;
            };

            // Destination edges are computed relative to the region so that
            // neighbouring intersections share their boundary pixel exactly
            let dst = PixelRect::from_edges(
                (inter.x - region.x) * sx,
                (inter.y - region.y) * sy,
                (inter.right() - region.x) * sx,
                (inter.bottom() - region.y) * sy,
                px_w,
                px_h,
            );
            let src = PixelRect::from_edges(
                (inter.x - tile.placement.x) * tile.density,
                (inter.y - tile.placement.y) * tile.density,
                (inter.right() - tile.placement.x) * tile.density,
                (inter.bottom() - tile.placement.y) * tile.density,
                tile.raster.width(),
                tile.raster.height(),
            );
            if dst.is_empty() || src.is_empty() {
                continue;
            }
            blitter.blit(&tile.raster, src, &mut raster, dst);
        }
    }

    OutputTile {
        region_index,
        logical_width,
        logical_height: target_height,
        raster,
    }
}

/// Composite every region, in parallel, keeping region order
pub fn composite_strip(regions: &[Region], tiles: &[SourceTile], options: &CompositeOptions) -> Strip {
    let output: Vec<OutputTile> = regions
        .par_iter()
        .enumerate()
        .map(|(i, region)| composite(region, i, tiles, options))
        .collect();
    debug!(
        "Composited {} regions at height {}",
        output.len(),
        options.target_height
    );

    Strip {
        tiles: output,
        target_height: options.target_height.max(1),
        density: options.density(),
    }
}
