//! Zoom and scroll state for the document view
//!
//! Owns the current scale and scroll offset, keeps the scrollable extent in
//! sync with the scale, and drives pinch-to-zoom from a fixed baseline.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::coords::CoordinateSpace;
use crate::geometry::{Point, Rect, Size};

/// Scale bounds and starting scale
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    pub initial_scale: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_scale: Viewport::MIN_SCALE,
            max_scale: Viewport::MAX_SCALE,
            initial_scale: 1.0,
        }
    }
}

impl ViewportConfig {
    /// Bounds confined to `[Viewport::MIN_SCALE, Viewport::MAX_SCALE]`.
    ///
    /// Inverted or non-finite bounds fall back to the defaults.
    #[must_use]
    pub fn validated(self) -> Self {
        let defaults = Self::default();
        let usable = self.min_scale.is_finite()
            && self.max_scale.is_finite()
            && self.min_scale <= self.max_scale;
        let (min_scale, max_scale) = if usable {
            (
                self.min_scale.clamp(Viewport::MIN_SCALE, Viewport::MAX_SCALE),
                self.max_scale.clamp(Viewport::MIN_SCALE, Viewport::MAX_SCALE),
            )
        } else {
            warn!(
                "Invalid zoom bounds {}..{}, using {}..{}",
                self.min_scale, self.max_scale, defaults.min_scale, defaults.max_scale
            );
            (defaults.min_scale, defaults.max_scale)
        };
        if usable && (min_scale != self.min_scale || max_scale != self.max_scale) {
            warn!(
                "Zoom bounds {}..{} confined to {min_scale}..{max_scale}",
                self.min_scale, self.max_scale
            );
        }

        let initial = if self.initial_scale.is_finite() {
            self.initial_scale
        } else {
            defaults.initial_scale
        };
        Self {
            min_scale,
            max_scale,
            initial_scale: initial.clamp(min_scale, max_scale),
        }
    }
}

/// Values captured when a two-contact pinch starts.
///
/// Every update is computed from this snapshot, never incrementally.
#[derive(Clone, Copy, Debug)]
struct PinchBaseline {
    scale: f64,
    distance: f64,
    /// Content point that was under the contacts' midpoint
    anchor: Point,
}

/// Viewport over the laid-out document
#[derive(Debug)]
pub struct Viewport {
    config: ViewportConfig,
    /// Top-left of the viewport on screen
    origin: Point,
    /// On-screen size of the viewport
    size: Size,
    /// Unscaled size of the whole document
    content_size: Size,
    scale: f64,
    /// Scroll offset in scroll space
    scroll: Point,
    /// Scroll space extent (`content_size * scale`)
    extent: Size,
    pinch: Option<PinchBaseline>,
}

impl Viewport {
    /// Smallest allowed scale
    pub const MIN_SCALE: f64 = 0.6;
    /// Largest allowed scale
    pub const MAX_SCALE: f64 = 3.0;

    #[must_use]
    pub fn new(config: ViewportConfig, origin: Point, size: Size) -> Self {
        let config = config.validated();
        let mut viewport = Self {
            config,
            origin,
            size,
            content_size: Size::ZERO,
            scale: 1.0,
            scroll: Point::ORIGIN,
            extent: Size::ZERO,
            pinch: None,
        };
        viewport.scale = viewport.clamp_scale(config.initial_scale);
        viewport
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[must_use]
    pub fn scroll(&self) -> Point {
        self.scroll
    }

    #[must_use]
    pub fn size(&self) -> Size {
        self.size
    }

    #[must_use]
    pub fn origin(&self) -> Point {
        self.origin
    }

    #[must_use]
    pub fn content_size(&self) -> Size {
        self.content_size
    }

    /// Size of the scrollable area (content size times scale)
    #[must_use]
    pub fn scroll_extent(&self) -> Size {
        self.extent
    }

    #[must_use]
    pub fn is_pinching(&self) -> bool {
        self.pinch.is_some()
    }

    /// Clamp a requested scale to the configured range.
    ///
    /// Non-finite requests keep the current scale.
    #[must_use]
    pub fn clamp_scale(&self, requested: f64) -> f64 {
        if requested.is_finite() {
            requested.clamp(self.config.min_scale, self.config.max_scale)
        } else {
            self.scale
        }
    }

    /// Move or resize the viewport on screen
    pub fn set_frame(&mut self, origin: Point, size: Size) {
        self.origin = origin;
        self.size = size;
        self.clamp_scroll();
    }

    /// Set the document size (unscaled) and recompute the scroll extent
    pub fn set_content_size(&mut self, content_size: Size) {
        self.content_size = content_size;
        self.recompute_extent();
    }

    /// Set the scale, keeping the content point at the viewport's top-left
    /// in place. Returns the effective (clamped) scale.
    pub fn set_scale(&mut self, requested: f64) -> f64 {
        let anchor = self.coords().screen_to_content(self.origin);
        self.apply_scale(self.clamp_scale(requested), anchor, self.origin);
        self.scale
    }

    /// Set the scroll offset (scroll space), clamped to the extent
    pub fn set_scroll(&mut self, scroll: Point) {
        self.scroll = scroll;
        self.clamp_scroll();
    }

    pub fn scroll_by(&mut self, dx: f64, dy: f64) {
        self.set_scroll(self.scroll.offset(dx, dy));
    }

    /// Snapshot of the current mapping between spaces
    #[must_use]
    pub fn coords(&self) -> CoordinateSpace {
        CoordinateSpace::new(self.origin, self.scroll, self.scale)
    }

    #[must_use]
    pub fn screen_to_content(&self, p: Point) -> Point {
        self.coords().screen_to_content(p)
    }

    #[must_use]
    pub fn content_to_screen(&self, p: Point) -> Point {
        self.coords().content_to_screen(p)
    }

    /// Content rectangle currently visible in the viewport
    #[must_use]
    pub fn visible_content_rect(&self) -> Rect {
        self.coords().visible_content_rect(self.size)
    }

    /// Record the pinch baseline: current scale, start distance and the
    /// content point under the start midpoint
    pub fn begin_pinch(&mut self, distance: f64, midpoint: Point) {
        let anchor = self.screen_to_content(midpoint);
        debug!(
            "Pinch start: scale={:.3} distance={distance:.1} anchor=({:.1}, {:.1})",
            self.scale, anchor.x, anchor.y
        );
        self.pinch = Some(PinchBaseline {
            scale: self.scale,
            distance,
            anchor,
        });
    }

    /// Apply a pinch update. Returns the effective scale.
    ///
    /// `scale = baseline_scale * distance / baseline_distance`; the scroll
    /// offset follows so the anchor stays under the current midpoint.
    pub fn update_pinch(&mut self, distance: f64, midpoint: Point) -> f64 {
        let Some(baseline) = self.pinch else {
            return self.scale;
        };
        if baseline.distance <= f64::EPSILON || !distance.is_finite() {
            return self.scale;
        }
        let target = self.clamp_scale(baseline.scale * distance / baseline.distance);
        self.apply_scale(target, baseline.anchor, midpoint);
        self.scale
    }

    pub fn end_pinch(&mut self) {
        if self.pinch.take().is_some() {
            debug!("Pinch end: scale={:.3}", self.scale);
        }
    }

    fn apply_scale(&mut self, scale: f64, content_anchor: Point, screen_anchor: Point) {
        self.scale = scale;
        self.recompute_extent();
        self.scroll = Point::new(
            content_anchor.x * scale - (screen_anchor.x - self.origin.x),
            content_anchor.y * scale - (screen_anchor.y - self.origin.y),
        );
        self.clamp_scroll();
    }

    fn recompute_extent(&mut self) {
        self.extent = self.content_size.scaled(self.scale);
        self.clamp_scroll();
    }

    fn clamp_scroll(&mut self) {
        let max_x = (self.extent.width - self.size.width).max(0.0);
        let max_y = (self.extent.height - self.size.height).max(0.0);
        let x = if self.scroll.x.is_finite() {
            self.scroll.x.clamp(0.0, max_x)
        } else {
            0.0
        };
        let y = if self.scroll.y.is_finite() {
            self.scroll.y.clamp(0.0, max_y)
        } else {
            0.0
        };
        self.scroll = Point::new(x, y);
    }
}
