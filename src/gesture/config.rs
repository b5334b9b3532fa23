//! Thresholds and timings for gesture recognition

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for the recognizer. Distances are in screen pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Radius of the circular center zone
    pub center_radius: f64,
    /// Side length of the square corner zones
    pub corner_size: f64,
    /// How far any contact may drift from its start before a hold is cancelled
    pub movement_tolerance: f64,
    pub capture_hold_ms: u64,
    pub open_file_hold_ms: u64,
    pub toggle_hold_ms: u64,
    /// A three-contact swipe must be released within this time
    pub swipe_time_budget_ms: u64,
    /// Minimum vertical travel of a three-contact swipe
    pub swipe_distance: f64,
    /// Pinches starting with the contacts closer than this are ignored
    pub min_pinch_distance: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            center_radius: 110.0,
            corner_size: 90.0,
            movement_tolerance: 14.0,
            capture_hold_ms: 550,
            open_file_hold_ms: 800,
            toggle_hold_ms: 650,
            swipe_time_budget_ms: 650,
            swipe_distance: 80.0,
            min_pinch_distance: 10.0,
        }
    }
}

impl GestureConfig {
    #[must_use]
    pub fn capture_hold(&self) -> Duration {
        Duration::from_millis(self.capture_hold_ms)
    }

    #[must_use]
    pub fn open_file_hold(&self) -> Duration {
        Duration::from_millis(self.open_file_hold_ms)
    }

    #[must_use]
    pub fn toggle_hold(&self) -> Duration {
        Duration::from_millis(self.toggle_hold_ms)
    }

    #[must_use]
    pub fn swipe_time_budget(&self) -> Duration {
        Duration::from_millis(self.swipe_time_budget_ms)
    }
}
