//! Pointer contacts and per-identity tracking

use std::collections::BTreeMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Stable identifier the platform assigns to a contact for its lifetime
pub type ContactId = u64;

/// One pointer contact currently on the surface
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub x: f64,
    pub y: f64,
}

impl Contact {
    #[must_use]
    pub const fn new(id: ContactId, x: f64, y: f64) -> Self {
        Self { id, x, y }
    }

    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Lifecycle phase of a contact event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactPhase {
    Start,
    Move,
    End,
    Cancel,
}

/// A change in the set of contacts.
///
/// `contacts` is the full set still down after the change.
#[derive(Clone, Debug)]
pub struct ContactEvent {
    pub phase: ContactPhase,
    pub contacts: Vec<Contact>,
    pub at: Instant,
}

impl ContactEvent {
    #[must_use]
    pub fn new(phase: ContactPhase, contacts: Vec<Contact>, at: Instant) -> Self {
        Self {
            phase,
            contacts,
            at,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct TrackedContact {
    pub start: Point,
    pub current: Point,
    /// Arrival order within the lifecycle
    pub arrival: u64,
}

/// Contacts keyed by identity, never by array position.
///
/// Contacts may arrive or leave in any order between events, so each one is
/// correlated with its own start position through its id.
#[derive(Debug, Default)]
pub(crate) struct ContactTracker {
    contacts: BTreeMap<ContactId, TrackedContact>,
    next_arrival: u64,
}

impl ContactTracker {
    /// Bring the tracked set in line with the contacts reported by an event.
    ///
    /// New ids start at their reported position, known ids move, and ids
    /// missing from the report are dropped.
    pub fn sync(&mut self, reported: &[Contact]) {
        self.contacts
            .retain(|id, _| reported.iter().any(|c| c.id == *id));
        for contact in reported {
            let position = contact.position();
            match self.contacts.get_mut(&contact.id) {
                Some(tracked) => tracked.current = position,
                None => {
                    self.contacts.insert(
                        contact.id,
                        TrackedContact {
                            start: position,
                            current: position,
                            arrival: self.next_arrival,
                        },
                    );
                    self.next_arrival += 1;
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.contacts.clear();
        self.next_arrival = 0;
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn get(&self, id: ContactId) -> Option<&TrackedContact> {
        self.contacts.get(&id)
    }

    /// The earliest-arrived contact still down
    pub fn earliest(&self) -> Option<(ContactId, TrackedContact)> {
        self.contacts
            .iter()
            .min_by_key(|(_, tracked)| tracked.arrival)
            .map(|(id, tracked)| (*id, *tracked))
    }

    /// Current positions of all contacts, by id
    pub fn current_positions(&self) -> BTreeMap<ContactId, Point> {
        self.contacts
            .iter()
            .map(|(id, tracked)| (*id, tracked.current))
            .collect()
    }

    pub fn ids(&self) -> impl Iterator<Item = ContactId> + '_ {
        self.contacts.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_survives_reordering() {
        let mut tracker = ContactTracker::default();
        tracker.sync(&[Contact::new(7, 10.0, 10.0)]);
        tracker.sync(&[Contact::new(7, 11.0, 10.0), Contact::new(3, 300.0, 300.0)]);
        // Reported in a different order; positions still follow ids
        tracker.sync(&[Contact::new(3, 305.0, 300.0), Contact::new(7, 12.0, 10.0)]);

        let seven = tracker.get(7).unwrap();
        assert_eq!(seven.start, Point::new(10.0, 10.0));
        assert_eq!(seven.current, Point::new(12.0, 10.0));
        let three = tracker.get(3).unwrap();
        assert_eq!(three.start, Point::new(300.0, 300.0));
        assert_eq!(three.current, Point::new(305.0, 300.0));
    }

    #[test]
    fn earliest_follows_arrival_not_id() {
        let mut tracker = ContactTracker::default();
        tracker.sync(&[Contact::new(9, 0.0, 0.0)]);
        tracker.sync(&[Contact::new(9, 0.0, 0.0), Contact::new(1, 5.0, 5.0)]);
        assert_eq!(tracker.earliest().map(|(id, _)| id), Some(9));

        tracker.sync(&[Contact::new(1, 5.0, 5.0)]);
        assert_eq!(tracker.earliest().map(|(id, _)| id), Some(1));
    }

    #[test]
    fn missing_ids_are_dropped() {
        let mut tracker = ContactTracker::default();
        tracker.sync(&[Contact::new(1, 0.0, 0.0), Contact::new(2, 1.0, 1.0)]);
        tracker.sync(&[Contact::new(2, 1.0, 1.0)]);
        assert_eq!(tracker.len(), 1);
        assert!(tracker.get(1).is_none());
        tracker.sync(&[]);
        assert!(tracker.is_empty());
    }
}
