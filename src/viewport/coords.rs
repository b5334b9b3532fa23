//! Conversions between screen, scroll and content space
//!
//! - Screen space: device-independent pixels relative to the window.
//! - Scroll space: content space multiplied by the current scale; the scroll
//!   offset is expressed here.
//! - Content space: the unscaled layout of the whole document.

use crate::geometry::{Point, Rect, Size};

/// Snapshot of the parameters needed to move points between spaces.
///
/// Cheap to copy; take a fresh one after every viewport mutation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateSpace {
    /// Top-left of the viewport on screen
    pub viewport_origin: Point,
    /// Scroll offset in scroll space
    pub scroll: Point,
    /// Content-to-scroll scale factor
    pub scale: f64,
}

impl CoordinateSpace {
    #[must_use]
    pub const fn new(viewport_origin: Point, scroll: Point, scale: f64) -> Self {
        Self {
            viewport_origin,
            scroll,
            scale,
        }
    }

    #[must_use]
    pub fn screen_to_scroll(&self, p: Point) -> Point {
        Point::new(
            p.x - self.viewport_origin.x + self.scroll.x,
            p.y - self.viewport_origin.y + self.scroll.y,
        )
    }

    #[must_use]
    pub fn scroll_to_screen(&self, p: Point) -> Point {
        Point::new(
            p.x - self.scroll.x + self.viewport_origin.x,
            p.y - self.scroll.y + self.viewport_origin.y,
        )
    }

    #[must_use]
    pub fn scroll_to_content(&self, p: Point) -> Point {
        p.scaled(1.0 / self.scale)
    }

    #[must_use]
    pub fn content_to_scroll(&self, p: Point) -> Point {
        p.scaled(self.scale)
    }

    /// `(screen - viewport_origin + scroll) / scale`
    #[must_use]
    pub fn screen_to_content(&self, p: Point) -> Point {
        self.scroll_to_content(self.screen_to_scroll(p))
    }

    #[must_use]
    pub fn content_to_screen(&self, p: Point) -> Point {
        self.scroll_to_screen(self.content_to_scroll(p))
    }

    /// Screen-space rectangle covering a content-space rectangle
    #[must_use]
    pub fn content_rect_to_screen(&self, r: &Rect) -> Rect {
        let origin = self.content_to_screen(r.origin());
        Rect::from_origin_size(origin, r.size().scaled(self.scale))
    }

    /// The part of the content currently visible through a viewport of the
    /// given on-screen size
    #[must_use]
    pub fn visible_content_rect(&self, viewport: Size) -> Rect {
        Rect::new(
            self.scroll.x / self.scale,
            self.scroll.y / self.scale,
            viewport.width / self.scale,
            viewport.height / self.scale,
        )
    }
}
