//! Page and tile types shared by renderers and the compositor

use std::sync::Arc;

use image::RgbaImage;

use crate::geometry::{Rect, Size};

/// A decoded page, before rasterization
#[derive(Clone, Debug, PartialEq)]
pub struct PageHandle {
    /// Zero-based position inside the document
    pub page_num: usize,
    /// Page extent in content units at scale 1
    pub size: Size,
}

/// Pixels produced for one page
#[derive(Clone, Debug)]
pub struct RenderedPage {
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub raster: Arc<RgbaImage>,
}

impl RenderedPage {
    pub fn new(raster: RgbaImage) -> Self {
        Self {
            pixel_width: raster.width(),
            pixel_height: raster.height(),
            raster: Arc::new(raster),
        }
    }
}

/// One rendered page placed in content space
#[derive(Clone, Debug)]
pub struct SourceTile {
    /// 1-based page ordinal
    pub index: usize,
    pub placement: Rect,
    /// Raster pixels per content unit
    pub density: f64,
    pub raster: Arc<RgbaImage>,
}

/// Everything a finished load hands back to the session
#[derive(Clone, Debug)]
pub struct LoadedDocument {
    pub tiles: Vec<SourceTile>,
    pub content_size: Size,
}

impl LoadedDocument {
    pub fn page_count(&self) -> usize {
        self.tiles.len()
    }
}
