use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::gesture::{Contact, ContactEvent, ContactPhase};

/// Trait for abstracting contact sources to enable testing
pub trait ContactSource {
    /// Whether another event is available within `timeout`
    fn poll(&mut self, timeout: Duration) -> Result<bool>;

    /// Read the next event
    fn read(&mut self) -> Result<ContactEvent>;
}

/// One entry of a contact script
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScriptedEvent {
    /// Milliseconds since the start of the script
    pub at_ms: u64,
    pub phase: ContactPhase,
    /// Contacts still down after the change
    #[serde(default)]
    pub contacts: Vec<Contact>,
}

/// Replays a recorded contact script.
///
/// Timestamps are `start + at_ms`, not wall-clock time, so a replay is
/// deterministic no matter how fast it is consumed.
pub struct ScriptedContactSource {
    pub(crate) events: Vec<ScriptedEvent>,
    current_index: usize,
    start: Instant,
}

impl ScriptedContactSource {
    pub fn new(mut events: Vec<ScriptedEvent>, start: Instant) -> Self {
        events.sort_by_key(|e| e.at_ms);
        Self {
            events,
            current_index: 0,
            start,
        }
    }

    pub fn from_json(json: &str, start: Instant) -> Result<Self> {
        let events: Vec<ScriptedEvent> =
            serde_json::from_str(json).context("Contact script is not a list of events")?;
        Ok(Self::new(events, start))
    }

    pub fn from_path(path: &Path, start: Instant) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read contact script {path:?}"))?;
        Self::from_json(&json, start).with_context(|| format!("Invalid contact script {path:?}"))
    }

    /// Instant of the last scripted event
    pub fn end(&self) -> Instant {
        self.events
            .last()
            .map_or(self.start, |e| self.start + Duration::from_millis(e.at_ms))
    }

    pub fn remaining(&self) -> usize {
        self.events.len() - self.current_index
    }
}

impl ContactSource for ScriptedContactSource {
    fn poll(&mut self, _timeout: Duration) -> Result<bool> {
        Ok(self.current_index < self.events.len())
    }

    fn read(&mut self) -> Result<ContactEvent> {
        let event = self
            .events
            .get(self.current_index)
            .context("Contact script exhausted")?;
        self.current_index += 1;
        Ok(ContactEvent::new(
            event.phase,
            event.contacts.clone(),
            self.start + Duration::from_millis(event.at_ms),
        ))
    }
}
