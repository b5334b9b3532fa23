//! Turns contact lifecycles into at most one committed intent
//!
//! Three independent candidates observe the same contact stream:
//! - a hold ([`DwellCandidate`]) armed by zone and contact count,
//! - a three-contact swipe ([`SwipeCandidate`]) resolved on release,
//! - a two-contact pinch ([`PinchCandidate`]) that streams zoom updates.
//!
//! Only one of them may take effect per lifecycle. The [`Arbitration`] flag
//! records which one did; once set, the others are dropped and nothing new
//! arms until every contact is released.

use std::time::Instant;

use log::debug;

use super::config::GestureConfig;
use super::contacts::{ContactEvent, ContactPhase, ContactTracker};
use super::dwell::{DwellCandidate, DwellIntent};
use super::pinch::{PinchCandidate, two_contact_geometry};
use super::swipe::{SwipeCandidate, SwipeDirection};
use super::zones::{Zone, ZoneMap};
use crate::geometry::{Point, Size};

/// A committed, semantic gesture
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Intent {
    /// Long press in the center: delete the region under `at` or capture
    /// the visible rectangle. `at` is the screen position where the press
    /// started.
    CaptureOrDelete { at: Point },
    OpenFile,
    ToggleMode,
    /// Three-contact swipe down
    ShowUi,
    /// Three-contact swipe up
    HideUi,
}

/// Everything the recognizer reports
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureOutput {
    Intent(Intent),
    /// A pinch took over the lifecycle; baseline values at its start
    PinchStarted { distance: f64, midpoint: Point },
    PinchMoved { distance: f64, midpoint: Point },
    PinchEnded,
}

/// Which candidate, if any, owns the current lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arbitration {
    Open,
    Pinching,
    Committed,
}

/// Gesture state machine fed with contact events
#[derive(Debug)]
pub struct GestureRecognizer {
    config: GestureConfig,
    zones: ZoneMap,
    contacts: ContactTracker,
    dwell: Option<DwellCandidate>,
    swipe: Option<SwipeCandidate>,
    pinch: Option<PinchCandidate>,
    arbitration: Arbitration,
    /// Set once three contacts were down together; disables pinch
    reached_three: bool,
}

impl GestureRecognizer {
    #[must_use]
    pub fn new(config: GestureConfig, screen: Size) -> Self {
        Self {
            zones: ZoneMap::new(screen, config.center_radius, config.corner_size),
            config,
            contacts: ContactTracker::default(),
            dwell: None,
            swipe: None,
            pinch: None,
            arbitration: Arbitration::Open,
            reached_three: false,
        }
    }

    #[must_use]
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Update the screen size the zones are derived from
    pub fn set_screen_size(&mut self, screen: Size) {
        self.zones.set_screen(screen);
    }

    #[must_use]
    pub fn arbitration(&self) -> Arbitration {
        self.arbitration
    }

    /// No contacts down and no candidate armed
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.contacts.is_empty() && self.dwell.is_none() && self.swipe.is_none()
    }

    /// When the armed hold will commit, if one is armed.
    ///
    /// Hosts sleep until this instant and then call [`Self::poll`].
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.dwell.as_ref().map(|d| d.deadline)
    }

    /// Fire the armed hold if its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<Intent> {
        if !self.dwell.as_ref().is_some_and(|d| d.is_due(now)) {
            return None;
        }
        let dwell = self.dwell.take()?;
        self.swipe = None;
        self.pinch = None;
        self.arbitration = Arbitration::Committed;

        let intent = match dwell.intent {
            DwellIntent::CaptureOrDelete => Intent::CaptureOrDelete { at: dwell.origin },
            DwellIntent::OpenFile => Intent::OpenFile,
            DwellIntent::ToggleMode => Intent::ToggleMode,
        };
        debug!("Hold committed: {intent:?} (zone {:?})", dwell.zone);
        Some(intent)
    }

    /// Feed one contact event. Returns what happened, in order.
    ///
    /// A hold whose deadline passed before this event commits first, since
    /// in real time its timer would already have fired.
    pub fn on_contacts_changed(&mut self, event: &ContactEvent) -> Vec<GestureOutput> {
        let mut out = Vec::new();
        if let Some(intent) = self.poll(event.at) {
            out.push(GestureOutput::Intent(intent));
        }

        if event.phase == ContactPhase::Cancel {
            if self.dwell.is_some() || self.swipe.is_some() {
                debug!("Gesture cancelled by platform");
            }
            if self.pinch.take().is_some_and(|p| p.claimed) {
                out.push(GestureOutput::PinchEnded);
            }
            self.end_lifecycle();
            return out;
        }

        let before = self.contacts.len();
        self.contacts.sync(&event.contacts);
        let after = self.contacts.len();
        if before == 0 && after > 0 {
            self.arbitration = Arbitration::Open;
            self.reached_three = false;
        }

        self.check_dwell();
        self.track_swipe(after);
        self.track_pinch(after, &mut out);

        if after > before && self.arbitration == Arbitration::Open {
            self.arm_candidates(before, after, event.at);
        }

        if after == 0 {
            if let Some(intent) = self.resolve_swipe(event.at) {
                out.push(GestureOutput::Intent(intent));
            }
            self.end_lifecycle();
        }

        out
    }

    /// Drop every candidate and forget all contacts
    pub fn reset(&mut self) {
        self.pinch = None;
        self.end_lifecycle();
    }

    fn check_dwell(&mut self) {
        let Some(dwell) = &self.dwell else {
            return;
        };
        if let Some(reason) = dwell.violation(&self.contacts, self.config.movement_tolerance) {
            debug!("Hold {:?} cancelled: {reason}", dwell.intent);
            self.dwell = None;
        }
    }

    fn track_swipe(&mut self, count: usize) {
        let Some(swipe) = &mut self.swipe else {
            return;
        };
        if count > 3 {
            debug!("Swipe cancelled: more than three contacts");
            self.swipe = None;
        } else {
            swipe.track(&self.contacts);
        }
    }

    fn track_pinch(&mut self, count: usize, out: &mut Vec<GestureOutput>) {
        if let Some(pinch) = &mut self.pinch {
            let geometry = two_contact_geometry(&self.contacts, pinch.pair);
            let (distance, midpoint) = match geometry {
                Some(g) if count == 2 => g,
                _ => {
                    if pinch.claimed {
                        out.push(GestureOutput::PinchEnded);
                    }
                    self.pinch = None;
                    return;
                }
            };

            if !pinch.claimed {
                if self.arbitration != Arbitration::Open
                    || !pinch.should_claim(distance, self.config.movement_tolerance)
                {
                    return;
                }
                pinch.claimed = true;
                self.arbitration = Arbitration::Pinching;
                self.dwell = None;
                self.swipe = None;
                out.push(GestureOutput::PinchStarted {
                    distance: pinch.start_distance,
                    midpoint: pinch.start_midpoint,
                });
            }
            out.push(GestureOutput::PinchMoved { distance, midpoint });
            return;
        }

        let may_pinch = count == 2
            && !self.reached_three
            && matches!(self.arbitration, Arbitration::Open | Arbitration::Pinching);
        if may_pinch {
            self.pinch = PinchCandidate::begin(&self.contacts, self.config.min_pinch_distance);
        }
    }

    fn arm_candidates(&mut self, before: usize, after: usize, now: Instant) {
        match after {
            1 if before == 0 => self.arm_single_contact(now),
            3 => self.arm_three_contacts(now),
            _ => {}
        }
    }

    fn arm_single_contact(&mut self, now: Instant) {
        let Some((_, first)) = self.contacts.earliest() else {
            return;
        };
        let zone = self.zones.classify(first.start);
        let (intent, hold) = match zone {
            Zone::Center => (DwellIntent::CaptureOrDelete, self.config.capture_hold()),
            Zone::TopLeft => (DwellIntent::OpenFile, self.config.open_file_hold()),
            Zone::TopRight => (DwellIntent::ToggleMode, self.config.toggle_hold()),
            Zone::Elsewhere => return,
        };
        debug!("Hold armed: {intent:?} in {zone:?}");
        self.dwell = Some(DwellCandidate::arm(
            intent,
            zone,
            first.start,
            self.contacts.current_positions(),
            now + hold,
        ));
    }

    fn arm_three_contacts(&mut self, now: Instant) {
        self.reached_three = true;
        let Some((first_id, first)) = self.contacts.earliest() else {
            return;
        };

        let zone = self.zones.classify(first.start);
        if zone == Zone::Center {
            debug!("Hold armed: ToggleMode with three contacts");
            self.dwell = Some(DwellCandidate::arm(
                DwellIntent::ToggleMode,
                zone,
                first.start,
                self.contacts.current_positions(),
                now + self.config.toggle_hold(),
            ));
        }
        self.swipe = Some(SwipeCandidate::arm(first_id, first.current, now));
    }

    fn resolve_swipe(&mut self, now: Instant) -> Option<Intent> {
        let swipe = self.swipe.take()?;
        if self.arbitration != Arbitration::Open {
            return None;
        }
        let direction = swipe.resolve(
            now,
            self.config.swipe_time_budget(),
            self.config.swipe_distance,
        )?;
        self.dwell = None;
        self.arbitration = Arbitration::Committed;
        let intent = match direction {
            SwipeDirection::Down => Intent::ShowUi,
            SwipeDirection::Up => Intent::HideUi,
        };
        debug!(
            "Swipe committed: {intent:?} ({:.0} px)",
            swipe.vertical_travel()
        );
        Some(intent)
    }

    fn end_lifecycle(&mut self) {
        self.contacts.clear();
        self.dwell = None;
        self.swipe = None;
        self.pinch = None;
        self.reached_three = false;
    }
}
