//! Two-contact pinch tracking

use super::contacts::{ContactId, ContactTracker};
use crate::geometry::Point;

/// Distance between two contacts and their midpoint
pub(crate) fn two_contact_geometry(
    contacts: &ContactTracker,
    pair: (ContactId, ContactId),
) -> Option<(f64, Point)> {
    let a = contacts.get(pair.0)?.current;
    let b = contacts.get(pair.1)?.current;
    Some((a.distance(b), a.midpoint(b)))
}

/// A pinch on a fixed pair of contacts.
///
/// Starts out tentative: no effect is reported until the distance has
/// changed by more than the movement tolerance. That lets contacts landing
/// one after another (on the way to three) pass through two without zooming.
#[derive(Debug)]
pub(crate) struct PinchCandidate {
    pub pair: (ContactId, ContactId),
    pub start_distance: f64,
    pub start_midpoint: Point,
    pub claimed: bool,
}

impl PinchCandidate {
    pub fn begin(contacts: &ContactTracker, min_distance: f64) -> Option<Self> {
        let mut ids = contacts.ids();
        let pair = (ids.next()?, ids.next()?);
        let (distance, midpoint) = two_contact_geometry(contacts, pair)?;
        if distance < min_distance {
            return None;
        }
        Some(Self {
            pair,
            start_distance: distance,
            start_midpoint: midpoint,
            claimed: false,
        })
    }

    /// Whether the pinch has moved enough to take over the lifecycle
    pub fn should_claim(&self, distance: f64, tolerance: f64) -> bool {
        (distance - self.start_distance).abs() > tolerance
    }
}
