//! Viewing / Strip mode state machine
//!
//! Transitions are two-phase: a command starts one and returns the effects
//! the session has to carry out, and a completion command finishes it. At
//! most one transition is in flight; toggles arriving meanwhile are dropped.

use log::{debug, info};

use crate::gesture::Intent;

/// Which view the session shows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Viewing,
    Strip,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Viewing => "viewing",
            Mode::Strip => "strip",
        }
    }
}

/// Commands that drive mode changes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// User asked to switch modes
    Toggle,
    /// A freshly loaded document already has regions
    EnterStripRestored,
    /// Compositing finished
    StripReady,
    /// Page tiles are back
    ViewingReady,
    /// The in-flight transition's async work failed
    TransitionFailed,
    /// A new document is loading
    Reset,
}

/// Work the session performs for a transition, in order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Save the current regions
    PersistRegions,
    /// Remember the current regions for the way back
    SnapshotRegions,
    /// Drop region outlines
    DiscardOverlays,
    /// Start compositing the regions
    CompositeStrip,
    /// Start rendering the document's pages again
    RerenderDocument,
    /// Rebuild region outlines from the snapshot
    RestoreOverlays,
    /// Hand the finished strip to the host
    ShowStrip,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ModeController {
    mode: Mode,
    in_flight: Option<Mode>,
}

impl ModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Target mode of the transition in progress
    pub fn in_flight(&self) -> Option<Mode> {
        self.in_flight
    }

    pub fn is_transitioning(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether `intent` may take effect right now
    pub fn permits(&self, intent: &Intent) -> bool {
        match intent {
            Intent::CaptureOrDelete { .. } => self.mode == Mode::Viewing && self.in_flight.is_none(),
            Intent::ToggleMode | Intent::OpenFile | Intent::ShowUi | Intent::HideUi => true,
        }
    }

    /// Whether pinch-zoom drives the viewport
    pub fn permits_zoom(&self) -> bool {
        self.mode == Mode::Viewing && self.in_flight.is_none()
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::Toggle => {
                if let Some(target) = self.in_flight {
                    debug!("Ignoring toggle while entering {}", target.as_str());
                    return vec![];
                }
                match self.mode {
                    Mode::Viewing => {
                        info!("Entering strip mode");
                        self.in_flight = Some(Mode::Strip);
                        vec![
                            Effect::PersistRegions,
                            Effect::SnapshotRegions,
                            Effect::DiscardOverlays,
                            Effect::CompositeStrip,
                        ]
                    }
                    Mode::Strip => {
                        info!("Returning to viewing mode");
                        self.in_flight = Some(Mode::Viewing);
                        vec![Effect::RerenderDocument]
                    }
                }
            }

            Command::EnterStripRestored => {
                if self.mode != Mode::Viewing || self.in_flight.is_some() {
                    return vec![];
                }
                info!("Entering strip mode with restored regions");
                self.in_flight = Some(Mode::Strip);
                vec![
                    Effect::SnapshotRegions,
                    Effect::DiscardOverlays,
                    Effect::CompositeStrip,
                ]
            }

            Command::StripReady => {
                if self.in_flight != Some(Mode::Strip) {
                    return vec![];
                }
                self.in_flight = None;
                self.mode = Mode::Strip;
                vec![Effect::ShowStrip]
            }

            Command::ViewingReady => {
                if self.in_flight != Some(Mode::Viewing) {
                    return vec![];
                }
                self.in_flight = None;
                self.mode = Mode::Viewing;
                vec![Effect::RestoreOverlays]
            }

            Command::TransitionFailed => {
                let Some(target) = self.in_flight.take() else {
                    return vec![];
                };
                info!("Entering {} failed, staying in {}", target.as_str(), self.mode.as_str());
                if self.mode == Mode::Viewing {
                    vec![Effect::RestoreOverlays]
                } else {
                    vec![]
                }
            }

            Command::Reset => {
                self.mode = Mode::Viewing;
                self.in_flight = None;
                vec![]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn user_toggle_persists_then_composites() {
        let mut mode = ModeController::new();
        assert_eq!(
            mode.apply(Command::Toggle),
            vec![
                Effect::PersistRegions,
                Effect::SnapshotRegions,
                Effect::DiscardOverlays,
                Effect::CompositeStrip,
            ]
        );
        assert_eq!(mode.mode(), Mode::Viewing);
        assert_eq!(mode.in_flight(), Some(Mode::Strip));

        assert_eq!(mode.apply(Command::StripReady), vec![Effect::ShowStrip]);
        assert_eq!(mode.mode(), Mode::Strip);
        assert!(!mode.is_transitioning());
    }

    #[test]
    fn restored_entry_does_not_persist() {
        let mut mode = ModeController::new();
        let effects = mode.apply(Command::EnterStripRestored);
        assert!(!effects.contains(&Effect::PersistRegions));
        assert!(effects.contains(&Effect::CompositeStrip));
    }

    #[test]
    fn toggle_during_transition_is_ignored() {
        let mut mode = ModeController::new();
        let _ = mode.apply(Command::Toggle);
        assert!(mode.apply(Command::Toggle).is_empty());
        assert!(mode.apply(Command::EnterStripRestored).is_empty());
        assert_eq!(mode.in_flight(), Some(Mode::Strip));
    }

    #[test]
    fn round_trip_back_to_viewing() {
        let mut mode = ModeController::new();
        let _ = mode.apply(Command::Toggle);
        let _ = mode.apply(Command::StripReady);

        assert_eq!(mode.apply(Command::Toggle), vec![Effect::RerenderDocument]);
        // Stale completion of the wrong kind does nothing
        assert!(mode.apply(Command::StripReady).is_empty());
        assert_eq!(mode.apply(Command::ViewingReady), vec![Effect::RestoreOverlays]);
        assert_eq!(mode.mode(), Mode::Viewing);
    }

    #[test]
    fn failed_strip_entry_restores_overlays() {
        let mut mode = ModeController::new();
        let _ = mode.apply(Command::Toggle);
        assert_eq!(mode.apply(Command::TransitionFailed), vec![Effect::RestoreOverlays]);
        assert_eq!(mode.mode(), Mode::Viewing);
        assert!(mode.apply(Command::TransitionFailed).is_empty());
    }

    #[test]
    fn capture_only_while_viewing() {
        let mut mode = ModeController::new();
        let capture = Intent::CaptureOrDelete {
            at: Point::new(1.0, 1.0),
        };
        assert!(mode.permits(&capture));
        let _ = mode.apply(Command::Toggle);
        assert!(!mode.permits(&capture));
        assert!(!mode.permits_zoom());
        let _ = mode.apply(Command::StripReady);
        assert!(!mode.permits(&capture));
        assert!(mode.permits(&Intent::ToggleMode));
        assert!(mode.permits(&Intent::OpenFile));

        let _ = mode.apply(Command::Reset);
        assert_eq!(mode.mode(), Mode::Viewing);
        assert!(mode.permits(&capture));
    }
}
