//! Static screen zones used to pick a candidate gesture

use crate::geometry::{Point, Size};

/// Named area of the screen a gesture started in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Zone {
    /// Circle around the screen center
    Center,
    TopLeft,
    TopRight,
    Elsewhere,
}

/// Partition of the screen into zones
#[derive(Clone, Copy, Debug)]
pub struct ZoneMap {
    screen: Size,
    center_radius: f64,
    corner_size: f64,
}

impl ZoneMap {
    #[must_use]
    pub fn new(screen: Size, center_radius: f64, corner_size: f64) -> Self {
        Self {
            screen,
            center_radius,
            corner_size,
        }
    }

    pub fn set_screen(&mut self, screen: Size) {
        self.screen = screen;
    }

    #[must_use]
    pub fn screen(&self) -> Size {
        self.screen
    }

    /// Classify a screen point. Corners win over the center when they overlap.
    #[must_use]
    pub fn classify(&self, p: Point) -> Zone {
        let in_top_band = p.y >= 0.0 && p.y <= self.corner_size;
        if in_top_band && p.x >= 0.0 && p.x <= self.corner_size {
            return Zone::TopLeft;
        }
        if in_top_band && p.x >= self.screen.width - self.corner_size && p.x <= self.screen.width {
            return Zone::TopRight;
        }

        let center = Point::new(self.screen.width / 2.0, self.screen.height / 2.0);
        if p.distance(center) <= self.center_radius {
            Zone::Center
        } else {
            Zone::Elsewhere
        }
    }
}
