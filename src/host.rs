//! Side effects the embedding UI provides

use crate::compositor::Strip;

/// Feedback patterns for committed gestures
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HapticPattern {
    Capture,
    Delete,
    Toggle,
    Open,
}

/// Fire-and-forget capabilities of the surrounding UI.
///
/// Every method defaults to a no-op; a host without haptics or chrome
/// simply leaves them out.
pub trait Host {
    fn pulse(&mut self, _pattern: HapticPattern) {}

    fn open_file_chooser(&mut self) {}

    fn set_chrome_visible(&mut self, _visible: bool) {}

    fn show_strip(&mut self, _strip: &Strip) {}
}

/// Host that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl Host for NullHost {}

/// Host that only logs what it was asked to do
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHost;

impl Host for LoggingHost {
    fn pulse(&mut self, pattern: HapticPattern) {
        log::debug!("pulse {pattern:?}");
    }

    fn open_file_chooser(&mut self) {
        log::info!("File chooser requested");
    }

    fn set_chrome_visible(&mut self, visible: bool) {
        log::info!("Chrome {}", if visible { "shown" } else { "hidden" });
    }

    fn show_strip(&mut self, strip: &Strip) {
        log::info!("Showing strip of {} tiles", strip.len());
    }
}
