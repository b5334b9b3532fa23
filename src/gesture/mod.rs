//! Multi-contact gesture recognition
//!
//! Raw contact lifecycles go in, semantic intents and pinch updates come out.
//! Timers are explicit deadlines checked with [`GestureRecognizer::poll`], so
//! a cancelled candidate takes its deadline with it and can never fire late.

mod config;
mod contacts;
mod dwell;
mod pinch;
mod recognizer;
mod swipe;
mod zones;

pub use config::GestureConfig;
pub use contacts::{Contact, ContactEvent, ContactId, ContactPhase};
pub use dwell::DwellIntent;
pub use recognizer::{Arbitration, GestureOutput, GestureRecognizer, Intent};
pub use swipe::SwipeDirection;
pub use zones::{Zone, ZoneMap};
