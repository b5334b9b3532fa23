//! Event-loop orchestration
//!
//! `App` receives contact events, timer ticks and render completions on one
//! thread and routes them to the recognizer, the current document session,
//! persistence and the host. Decode and composite work goes to the render
//! service; at most one load and one composite are tracked at a time and
//! completions for anything else are dropped as stale.

use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::compositor::CompositeOptions;
use crate::document::DocumentSource;
use crate::geometry::{Point, Size};
use crate::gesture::{ContactEvent, GestureConfig, GestureOutput, GestureRecognizer, Intent};
use crate::host::{HapticPattern, Host};
use crate::mode::{Command, Effect, Mode};
use crate::regions::{Region, RegionPersistence, identify};
use crate::render::{LoadOptions, LoadedDocument, RenderFault, RenderResponse, RenderService, RequestId};
use crate::session::{CaptureOutcome, DocumentSession};
use crate::settings::Settings;
use crate::viewport::{Viewport, ViewportConfig};

/// Everything the orchestrator needs from configuration
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub gesture: GestureConfig,
    pub viewport: ViewportConfig,
    pub composite: CompositeOptions,
    pub load: LoadOptions,
    /// Where the document view sits on screen
    pub frame_origin: Point,
    pub frame_size: Size,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gesture: GestureConfig::default(),
            viewport: ViewportConfig::default(),
            composite: CompositeOptions::default(),
            load: LoadOptions::default(),
            frame_origin: Point::ORIGIN,
            frame_size: Size::new(800.0, 600.0),
        }
    }
}

impl AppConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            gesture: settings.gesture,
            viewport: settings.viewport,
            composite: settings.composite_options(),
            load: settings.load_options(),
            ..Self::default()
        }
    }
}

/// What happened, for the caller to present
#[derive(Clone, Debug, PartialEq)]
pub enum AppEvent {
    DocumentLoaded { name: String, pages: usize },
    LoadFailed { name: String, reason: String },
    RegionCaptured { index: usize, region: Region },
    RegionDeleted { index: usize, region: Region },
    ModeChanged(Mode),
    StripReady { tiles: usize },
    Zoomed { scale: f64 },
    FileChooserRequested,
    ChromeVisibility(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadPurpose {
    /// A new document replaces the session
    Open,
    /// The current document's tiles come back after the strip
    Rerender,
}

#[derive(Debug)]
struct PendingLoad {
    id: RequestId,
    purpose: LoadPurpose,
    source: DocumentSource,
}

pub struct App {
    config: AppConfig,
    recognizer: GestureRecognizer,
    persistence: RegionPersistence,
    render: RenderService,
    host: Box<dyn Host>,
    session: Option<DocumentSession>,
    pending_load: Option<PendingLoad>,
    pending_composite: Option<RequestId>,
}

impl App {
    pub fn new(
        config: AppConfig,
        persistence: RegionPersistence,
        render: RenderService,
        host: Box<dyn Host>,
    ) -> Self {
        let recognizer = GestureRecognizer::new(config.gesture, config.frame_size);
        Self {
            config,
            recognizer,
            persistence,
            render,
            host,
            session: None,
            pending_load: None,
            pending_composite: None,
        }
    }

    pub fn session(&self) -> Option<&DocumentSession> {
        self.session.as_ref()
    }

    pub fn mode(&self) -> Mode {
        self.session
            .as_ref()
            .map_or(Mode::Viewing, |s| s.mode().mode())
    }

    pub fn regions(&self) -> &[Region] {
        self.session
            .as_ref()
            .map(|s| s.regions())
            .unwrap_or_default()
    }

    pub fn recognizer(&self) -> &GestureRecognizer {
        &self.recognizer
    }

    /// No load or composite outstanding
    pub fn is_idle(&self) -> bool {
        self.pending_load.is_none() && self.pending_composite.is_none()
    }

    /// Start loading a document. The current session stays until the load
    /// succeeds; a failed load leaves it untouched.
    pub fn open_document(&mut self, source: DocumentSource) -> RequestId {
        if let Some(previous) = self.pending_load.take() {
            debug!("Superseding load request {}", previous.id.0);
            if previous.purpose == LoadPurpose::Rerender {
                self.apply_mode(Command::TransitionFailed);
            }
        }
        let id = self.render.load(source.clone(), self.config.load);
        self.pending_load = Some(PendingLoad {
            id,
            purpose: LoadPurpose::Open,
            source,
        });
        id
    }

    /// Feed one contact event
    pub fn handle_contacts(&mut self, event: &ContactEvent) -> Vec<AppEvent> {
        let outputs = self.recognizer.on_contacts_changed(event);
        let mut events = Vec::new();
        for output in outputs {
            events.extend(self.handle_gesture(output));
        }
        events
    }

    /// Fire due gesture timers and collect finished render work
    pub fn tick(&mut self, now: Instant) -> Vec<AppEvent> {
        let mut events = Vec::new();
        if let Some(intent) = self.recognizer.poll(now) {
            events.extend(self.handle_intent(intent));
        }
        for response in self.render.poll_responses() {
            events.extend(self.handle_response(response));
        }
        if !self.is_idle() && self.render.is_disconnected() {
            events.extend(self.on_worker_stopped());
        }
        events
    }

    /// Earliest instant `tick` has gesture work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        self.recognizer.next_deadline()
    }

    /// Block until no load or composite is outstanding, or `timeout` passes
    pub fn wait_idle(&mut self, timeout: Duration) -> Vec<AppEvent> {
        let deadline = Instant::now() + timeout;
        let mut events = Vec::new();
        while !self.is_idle() {
            match self.render.wait_response(deadline) {
                Some(response) => events.extend(self.handle_response(response)),
                None if self.render.is_disconnected() => {
                    events.extend(self.on_worker_stopped());
                    break;
                }
                None => {
                    warn!("Timed out waiting for render work");
                    break;
                }
            }
        }
        events
    }

    /// Move or resize the document view
    pub fn set_viewport(&mut self, origin: Point, size: Size) {
        self.config.frame_origin = origin;
        self.config.frame_size = size;
        self.recognizer.set_screen_size(size);
        if let Some(session) = &mut self.session {
            session.viewport.set_frame(origin, size);
            session.refresh_overlays();
        }
    }

    /// Returns the effective scale
    pub fn set_scale(&mut self, scale: f64) -> Option<f64> {
        let session = self.session.as_mut()?;
        let effective = session.viewport.set_scale(scale);
        session.refresh_overlays();
        Some(effective)
    }

    pub fn set_scroll(&mut self, scroll: Point) {
        if let Some(session) = &mut self.session {
            session.viewport.set_scroll(scroll);
            session.refresh_overlays();
        }
    }

    pub fn scroll_by(&mut self, dx: f64, dy: f64) {
        if let Some(session) = &mut self.session {
            session.viewport.scroll_by(dx, dy);
            session.refresh_overlays();
        }
    }

    fn handle_gesture(&mut self, output: GestureOutput) -> Vec<AppEvent> {
        match output {
            GestureOutput::Intent(intent) => self.handle_intent(intent),
            GestureOutput::PinchStarted { distance, midpoint } => {
                if let Some(session) = self.zoomable_session() {
                    session.viewport.begin_pinch(distance, midpoint);
                }
                vec![]
            }
            GestureOutput::PinchMoved { distance, midpoint } => {
                let Some(session) = self.zoomable_session() else {
                    return vec![];
                };
                if !session.viewport.is_pinching() {
                    return vec![];
                }
                let scale = session.viewport.update_pinch(distance, midpoint);
                session.refresh_overlays();
                vec![AppEvent::Zoomed { scale }]
            }
            GestureOutput::PinchEnded => {
                if let Some(session) = &mut self.session {
                    session.viewport.end_pinch();
                }
                vec![]
            }
        }
    }

    fn zoomable_session(&mut self) -> Option<&mut DocumentSession> {
        self.session
            .as_mut()
            .filter(|s| s.mode().permits_zoom())
    }

    fn handle_intent(&mut self, intent: Intent) -> Vec<AppEvent> {
        if let Some(session) = &self.session {
            if !session.mode().permits(&intent) {
                debug!("Dropping {intent:?} in {} mode", session.mode().mode().as_str());
                return vec![];
            }
        }

        match intent {
            Intent::CaptureOrDelete { at } => self.capture_or_delete(at),
            Intent::ToggleMode => {
                if self.session.is_none() {
                    return vec![];
                }
                let in_flight = |app: &Self| app.session.as_ref().and_then(|s| s.mode().in_flight());
                let before = in_flight(self);
                let events = self.apply_mode(Command::Toggle);
                if in_flight(self) != before {
                    self.host.pulse(HapticPattern::Toggle);
                }
                events
            }
            Intent::OpenFile => {
                self.host.pulse(HapticPattern::Open);
                self.host.open_file_chooser();
                vec![AppEvent::FileChooserRequested]
            }
            Intent::ShowUi => {
                self.host.set_chrome_visible(true);
                vec![AppEvent::ChromeVisibility(true)]
            }
            Intent::HideUi => {
                self.host.set_chrome_visible(false);
                vec![AppEvent::ChromeVisibility(false)]
            }
        }
    }

    fn capture_or_delete(&mut self, at: Point) -> Vec<AppEvent> {
        let Some(session) = &mut self.session else {
            return vec![];
        };
        let (event, pattern) = match session.capture_or_delete(at) {
            CaptureOutcome::Captured { index, region } => {
                (AppEvent::RegionCaptured { index, region }, HapticPattern::Capture)
            }
            CaptureOutcome::Deleted { index, region } => {
                (AppEvent::RegionDeleted { index, region }, HapticPattern::Delete)
            }
            CaptureOutcome::Rejected => return vec![],
        };
        self.persistence
            .save(session.identity(), session.regions());
        self.host.pulse(pattern);
        vec![event]
    }

    fn handle_response(&mut self, response: RenderResponse) -> Vec<AppEvent> {
        match response {
            RenderResponse::Loaded { id, document } => match self.take_pending_load(id) {
                Some(pending) => self.on_loaded(pending, document),
                None => vec![],
            },
            RenderResponse::Failed { id, fault } => match self.take_pending_load(id) {
                Some(pending) => self.on_load_failed(pending, fault),
                None => vec![],
            },
            RenderResponse::Composited { id, strip } => {
                if self.pending_composite != Some(id) {
                    debug!("Dropping stale composite {}", id.0);
                    return vec![];
                }
                self.pending_composite = None;
                let Some(session) = &mut self.session else {
                    return vec![];
                };
                session.strip = Some(strip);
                self.apply_mode(Command::StripReady)
            }
        }
    }

    fn take_pending_load(&mut self, id: RequestId) -> Option<PendingLoad> {
        if self.pending_load.as_ref().is_some_and(|p| p.id == id) {
            self.pending_load.take()
        } else {
            debug!("Dropping stale load {}", id.0);
            None
        }
    }

    fn on_loaded(&mut self, pending: PendingLoad, document: LoadedDocument) -> Vec<AppEvent> {
        match pending.purpose {
            LoadPurpose::Open => {
                let name = pending.source.name.clone();
                let pages = document.page_count();
                let identity = identify(&pending.source);
                info!("Opened {name} ({pages} pages) as {identity}");

                // Anything in flight belonged to the previous document
                self.pending_composite = None;
                self.recognizer.reset();

                let viewport = Viewport::new(
                    self.config.viewport,
                    self.config.frame_origin,
                    self.config.frame_size,
                );
                let mut session = DocumentSession::new(pending.source, identity, document, viewport);
                let restored = self
                    .persistence
                    .load(session.identity())
                    .filter(|regions| !regions.is_empty());
                if let Some(regions) = &restored {
                    info!("Restored {} regions", regions.len());
                    session.store.replace_all(regions.clone());
                }
                session.show_overlays();
                self.session = Some(session);

                let mut events = vec![AppEvent::DocumentLoaded { name, pages }];
                if restored.is_some() {
                    events.extend(self.apply_mode(Command::EnterStripRestored));
                }
                events
            }
            LoadPurpose::Rerender => {
                let Some(session) = &mut self.session else {
                    return vec![];
                };
                session.install_tiles(document);
                self.apply_mode(Command::ViewingReady)
            }
        }
    }

    fn on_load_failed(&mut self, pending: PendingLoad, fault: RenderFault) -> Vec<AppEvent> {
        error!("Loading {} failed: {fault}", pending.source.name);
        match pending.purpose {
            LoadPurpose::Open => vec![AppEvent::LoadFailed {
                name: pending.source.name,
                reason: fault.to_string(),
            }],
            LoadPurpose::Rerender => self.apply_mode(Command::TransitionFailed),
        }
    }

    /// Fail whatever was waiting on a render worker that has exited
    fn on_worker_stopped(&mut self) -> Vec<AppEvent> {
        error!("Render worker stopped with work outstanding");
        self.render.abandon_pending();
        let mut events = Vec::new();

        if let Some(pending) = self.pending_load.take() {
            let name = pending.source.name.clone();
            let purpose = pending.purpose;
            events.extend(self.on_load_failed(pending, RenderFault::WorkerStopped));
            // An open failure already reports itself
            if purpose == LoadPurpose::Rerender {
                events.push(AppEvent::LoadFailed {
                    name,
                    reason: RenderFault::WorkerStopped.to_string(),
                });
            }
        }
        if self.pending_composite.take().is_some() {
            events.extend(self.apply_mode(Command::TransitionFailed));
            if let Some(session) = &self.session {
                events.push(AppEvent::LoadFailed {
                    name: session.source().name.clone(),
                    reason: RenderFault::WorkerStopped.to_string(),
                });
            }
        }
        events
    }

    /// Run a mode command and carry out its effects
    fn apply_mode(&mut self, cmd: Command) -> Vec<AppEvent> {
        let Some(session) = &mut self.session else {
            return vec![];
        };
        let before = session.mode().mode();
        let effects = session.mode.apply(cmd);
        self.execute_effects(effects);

        let mut events = Vec::new();
        let after = self.mode();
        if after != before {
            events.push(AppEvent::ModeChanged(after));
            if after == Mode::Strip {
                let tiles = self.session.as_ref().and_then(|s| s.strip()).map_or(0, |s| s.len());
                events.push(AppEvent::StripReady { tiles });
            }
        }
        events
    }

    fn execute_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            let Some(session) = &mut self.session else {
                return;
            };
            match effect {
                Effect::PersistRegions => {
                    self.persistence
                        .save(session.identity(), session.regions());
                }

                Effect::SnapshotRegions => {
                    session.snapshot = session.regions().to_vec();
                }

                Effect::DiscardOverlays => {
                    session.overlays.clear();
                }

                Effect::CompositeStrip => {
                    let tiles = session.take_tiles();
                    let id = self.render.composite(
                        session.snapshot.clone(),
                        tiles,
                        self.config.composite,
                    );
                    self.pending_composite = Some(id);
                }

                Effect::RerenderDocument => {
                    // The strip stays up until the tiles are back
                    let source = session.source().clone();
                    let id = self.render.load(source.clone(), self.config.load);
                    self.pending_load = Some(PendingLoad {
                        id,
                        purpose: LoadPurpose::Rerender,
                        source,
                    });
                }

                Effect::RestoreOverlays => {
                    session.strip = None;
                    if session.snapshot.is_empty() && session.store.is_empty() {
                        if let Some(regions) = self.persistence.load(session.identity()) {
                            session.store.replace_all(regions);
                        }
                    } else if !session.snapshot.is_empty() {
                        session.store.replace_all(session.snapshot.clone());
                    }
                    session.show_overlays();
                }

                Effect::ShowStrip => {
                    if let Some(strip) = session.strip() {
                        self.host.show_strip(strip);
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("mode", &self.mode())
            .field("regions", &self.regions().len())
            .field("pending_load", &self.pending_load.as_ref().map(|p| p.id))
            .field("pending_composite", &self.pending_composite)
            .finish_non_exhaustive()
    }
}
