//! Turning decoded pages into placed source tiles

use log::debug;

use crate::document::DocumentSource;
use crate::geometry::{Rect, Size};

use super::PageRenderer;
use super::request::{LoadOptions, RenderFault};
use super::types::{LoadedDocument, PageHandle, SourceTile};

/// Placement of each page when stacked top to bottom, left-aligned
pub fn stack_pages(pages: &[PageHandle], page_gap: f64) -> (Vec<Rect>, Size) {
    let gap = page_gap.max(0.0);
    let mut top = 0.0;
    let mut width: f64 = 0.0;
    let mut placements = Vec::with_capacity(pages.len());

    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            top += gap;
        }
        placements.push(Rect::new(0.0, top, page.size.width, page.size.height));
        top += page.size.height;
        width = width.max(page.size.width);
    }

    (placements, Size::new(width, top))
}

/// Decode `source` and rasterize every page at scale 1
pub fn load_document(
    renderer: &mut dyn PageRenderer,
    source: &DocumentSource,
    options: LoadOptions,
) -> Result<LoadedDocument, RenderFault> {
    let pages = renderer.decode(source)?;
    if pages.is_empty() {
        return Err(RenderFault::EmptyDocument);
    }

    let density = if options.density.is_finite() && options.density > 0.0 {
        options.density
    } else {
        1.0
    };
    let (placements, content_size) = stack_pages(&pages, options.page_gap);

    let mut tiles = Vec::with_capacity(pages.len());
    for (page, placement) in pages.iter().zip(placements) {
        let rendered = renderer.render_page(page, 1.0, density)?;
        // Effective density from the raster, since renderers round pixel sizes
        let tile_density = if placement.w > 0.0 {
            f64::from(rendered.pixel_width) / placement.w
        } else {
            density
        };
        tiles.push(SourceTile {
            index: page.page_num + 1,
            placement,
            density: tile_density,
            raster: rendered.raster,
        });
    }

    debug!(
        "Loaded {} with {} pages, content {}x{}",
        source.name,
        tiles.len(),
        content_size.width,
        content_size.height
    );

    Ok(LoadedDocument {
        tiles,
        content_size,
    })
}
