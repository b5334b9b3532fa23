//! Screen-space outlines of stored regions

use crate::geometry::Rect;
use crate::regions::Region;
use crate::viewport::Viewport;

/// Region outlines projected onto the screen.
///
/// Regions stay in content space; outlines are recomputed from them after
/// every viewport or region change, never adjusted in place.
#[derive(Clone, Debug, Default)]
pub struct OverlayLayer {
    outlines: Vec<Rect>,
    visible: bool,
}

impl OverlayLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reproject every region with the viewport's current scale and scroll
    pub fn rebuild(&mut self, regions: &[Region], viewport: &Viewport) {
        let coords = viewport.coords();
        self.outlines = regions
            .iter()
            .map(|r| coords.content_rect_to_screen(r))
            .collect();
        self.visible = true;
    }

    pub fn clear(&mut self) {
        self.outlines.clear();
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn outlines(&self) -> &[Rect] {
        &self.outlines
    }
}
