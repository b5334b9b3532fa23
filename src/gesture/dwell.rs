//! Hold-to-commit gesture candidates

use std::collections::BTreeMap;
use std::time::Instant;

use super::contacts::{ContactId, ContactTracker};
use super::zones::Zone;
use crate::geometry::Point;

/// What a hold commits to once its timer elapses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DwellIntent {
    CaptureOrDelete,
    OpenFile,
    ToggleMode,
}

/// An armed hold: a deadline plus the start position of every contact
/// involved, keyed by contact id.
#[derive(Debug)]
pub(crate) struct DwellCandidate {
    pub intent: DwellIntent,
    pub zone: Zone,
    /// Start position of the contact that selected the zone
    pub origin: Point,
    starts: BTreeMap<ContactId, Point>,
    pub deadline: Instant,
}

impl DwellCandidate {
    pub fn arm(
        intent: DwellIntent,
        zone: Zone,
        origin: Point,
        starts: BTreeMap<ContactId, Point>,
        deadline: Instant,
    ) -> Self {
        Self {
            intent,
            zone,
            origin,
            starts,
            deadline,
        }
    }

    /// Number of contacts that must stay down
    pub fn contact_count(&self) -> usize {
        self.starts.len()
    }

    /// Why the candidate can no longer commit, if it can't.
    ///
    /// The tracked set must hold exactly the same ids, each within
    /// `tolerance` of its own start.
    pub fn violation(&self, contacts: &ContactTracker, tolerance: f64) -> Option<&'static str> {
        if contacts.len() != self.starts.len() {
            return Some("contact count changed");
        }
        for (id, start) in &self.starts {
            match contacts.get(*id) {
                None => return Some("contact identity changed"),
                Some(tracked) if tracked.current.distance(*start) > tolerance => {
                    return Some("moved beyond tolerance");
                }
                Some(_) => {}
            }
        }
        None
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::gesture::contacts::Contact;

    fn candidate(tracker: &ContactTracker) -> DwellCandidate {
        DwellCandidate::arm(
            DwellIntent::CaptureOrDelete,
            Zone::Center,
            Point::new(100.0, 100.0),
            tracker.current_positions(),
            Instant::now() + Duration::from_millis(550),
        )
    }

    #[test]
    fn small_jitter_is_tolerated() {
        let mut tracker = ContactTracker::default();
        tracker.sync(&[Contact::new(1, 100.0, 100.0)]);
        let dwell = candidate(&tracker);
        tracker.sync(&[Contact::new(1, 108.0, 106.0)]);
        assert_eq!(dwell.violation(&tracker, 14.0), None);
    }

    #[test]
    fn movement_beyond_tolerance_is_a_violation() {
        let mut tracker = ContactTracker::default();
        tracker.sync(&[Contact::new(1, 100.0, 100.0)]);
        let dwell = candidate(&tracker);
        tracker.sync(&[Contact::new(1, 115.0, 100.0)]);
        assert!(dwell.violation(&tracker, 14.0).is_some());
    }

    #[test]
    fn swapped_identity_is_a_violation() {
        let mut tracker = ContactTracker::default();
        tracker.sync(&[Contact::new(1, 100.0, 100.0)]);
        let dwell = candidate(&tracker);
        tracker.sync(&[Contact::new(2, 100.0, 100.0)]);
        assert_eq!(
            dwell.violation(&tracker, 14.0),
            Some("contact identity changed")
        );
    }
}
