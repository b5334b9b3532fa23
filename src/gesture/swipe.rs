//! Three-contact vertical swipe, resolved on release

use std::time::{Duration, Instant};

use super::contacts::{ContactId, ContactTracker};
use crate::geometry::Point;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwipeDirection {
    Up,
    Down,
}

#[derive(Debug)]
pub(crate) struct SwipeCandidate {
    tracked: ContactId,
    start: Point,
    last: Point,
    started_at: Instant,
}

impl SwipeCandidate {
    pub fn arm(tracked: ContactId, start: Point, started_at: Instant) -> Self {
        Self {
            tracked,
            start,
            last: start,
            started_at,
        }
    }

    /// Remember the tracked contact's latest position. Its last known
    /// position is kept once it lifts.
    pub fn track(&mut self, contacts: &ContactTracker) {
        if let Some(tracked) = contacts.get(self.tracked) {
            self.last = tracked.current;
        }
    }

    pub fn vertical_travel(&self) -> f64 {
        self.last.y - self.start.y
    }

    /// Direction of a valid swipe released at `now`
    pub fn resolve(&self, now: Instant, budget: Duration, distance: f64) -> Option<SwipeDirection> {
        let elapsed = now.saturating_duration_since(self.started_at);
        if elapsed >= budget {
            return None;
        }
        let dy = self.vertical_travel();
        if dy > distance {
            Some(SwipeDirection::Down)
        } else if dy < -distance {
            Some(SwipeDirection::Up)
        } else {
            None
        }
    }
}
