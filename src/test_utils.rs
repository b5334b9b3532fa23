//! Builders and fakes shared by unit and integration tests

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use image::{Rgba, RgbaImage};

use crate::compositor::Strip;
use crate::document::DocumentSource;
use crate::event_source::ScriptedEvent;
use crate::geometry::{Rect, Size};
use crate::gesture::{Contact, ContactEvent, ContactId, ContactPhase};
use crate::host::{HapticPattern, Host};
use crate::render::{PageHandle, PageRenderer, RenderFault, RenderedPage, SourceTile};
use crate::resample::{ResampleFilter, resize_rgba};

/// Builder for timestamped contact sequences
pub struct ContactScenarioBuilder {
    start: Instant,
    now_ms: u64,
    down: BTreeMap<ContactId, Contact>,
    events: Vec<(u64, ContactPhase, Vec<Contact>)>,
}

impl ContactScenarioBuilder {
    pub fn new(start: Instant) -> Self {
        Self {
            start,
            now_ms: 0,
            down: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// Jump to `ms` after the start
    pub fn at(mut self, ms: u64) -> Self {
        self.now_ms = ms;
        self
    }

    /// Advance the clock by `ms`
    pub fn wait(mut self, ms: u64) -> Self {
        self.now_ms += ms;
        self
    }

    /// Put a contact down
    pub fn press(mut self, id: ContactId, x: f64, y: f64) -> Self {
        self.down.insert(id, Contact::new(id, x, y));
        self.push(ContactPhase::Start);
        self
    }

    /// Move a contact that is already down
    pub fn move_to(mut self, id: ContactId, x: f64, y: f64) -> Self {
        self.down.insert(id, Contact::new(id, x, y));
        self.push(ContactPhase::Move);
        self
    }

    /// Move every contact by the same offset in one event
    pub fn move_all_by(mut self, dx: f64, dy: f64) -> Self {
        for contact in self.down.values_mut() {
            contact.x += dx;
            contact.y += dy;
        }
        self.push(ContactPhase::Move);
        self
    }

    /// Lift one contact
    pub fn release(mut self, id: ContactId) -> Self {
        self.down.remove(&id);
        self.push(ContactPhase::End);
        self
    }

    /// Lift every contact at once
    pub fn release_all(mut self) -> Self {
        self.down.clear();
        self.push(ContactPhase::End);
        self
    }

    /// The platform took the contacts away
    pub fn cancel(mut self) -> Self {
        self.down.clear();
        self.push(ContactPhase::Cancel);
        self
    }

    /// Instant of the builder's current clock
    pub fn now(&self) -> Instant {
        self.start + Duration::from_millis(self.now_ms)
    }

    pub fn build(self) -> Vec<ContactEvent> {
        let start = self.start;
        self.events
            .into_iter()
            .map(|(ms, phase, contacts)| {
                ContactEvent::new(phase, contacts, start + Duration::from_millis(ms))
            })
            .collect()
    }

    /// Same events in the script format
    pub fn build_script(self) -> Vec<ScriptedEvent> {
        self.events
            .into_iter()
            .map(|(at_ms, phase, contacts)| ScriptedEvent {
                at_ms,
                phase,
                contacts,
            })
            .collect()
    }

    fn push(&mut self, phase: ContactPhase) {
        let contacts = self.down.values().copied().collect();
        self.events.push((self.now_ms, phase, contacts));
    }
}

/// A page raster of one colour
pub fn solid_page(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(width, height, color)
}

/// A page whose rows are shaded by `y % 256` in one colour channel, so a
/// composited row can be traced back to its source row
pub fn row_gradient_page(width: u32, height: u32, channel: usize) -> RgbaImage {
    RgbaImage::from_fn(width, height, |_, y| {
        let mut px = Rgba([0, 0, 0, 255]);
        px.0[channel.min(2)] = (y % 256) as u8;
        px
    })
}

pub fn source_tile(index: usize, placement: Rect, density: f64, raster: RgbaImage) -> SourceTile {
    SourceTile {
        index,
        placement,
        density,
        raster: Arc::new(raster),
    }
}

/// Renderer that ignores document bytes and serves fixed page rasters.
///
/// Content units equal raster pixels. An empty document fails to decode.
pub struct FixedPageRenderer {
    pages: Vec<Arc<RgbaImage>>,
}

impl FixedPageRenderer {
    pub fn new(pages: Vec<RgbaImage>) -> Self {
        Self {
            pages: pages.into_iter().map(Arc::new).collect(),
        }
    }
}

impl PageRenderer for FixedPageRenderer {
    fn decode(&mut self, source: &DocumentSource) -> Result<Vec<PageHandle>, RenderFault> {
        if source.is_empty() {
            return Err(RenderFault::decode(format!("{} is empty", source.name)));
        }
        if self.pages.is_empty() {
            return Err(RenderFault::EmptyDocument);
        }
        Ok(self
            .pages
            .iter()
            .enumerate()
            .map(|(page_num, img)| PageHandle {
                page_num,
                size: Size::new(f64::from(img.width()), f64::from(img.height())),
            })
            .collect())
    }

    fn render_page(
        &self,
        page: &PageHandle,
        scale: f64,
        density: f64,
    ) -> Result<RenderedPage, RenderFault> {
        let img = self
            .pages
            .get(page.page_num)
            .ok_or_else(|| RenderFault::decode("page out of range"))?;
        let factor = scale * density;
        let width = (f64::from(img.width()) * factor).round() as u32;
        let height = (f64::from(img.height()) * factor).round() as u32;
        if (width, height) == img.dimensions() {
            return Ok(RenderedPage {
                pixel_width: width,
                pixel_height: height,
                raster: Arc::clone(img),
            });
        }
        Ok(RenderedPage::new(resize_rgba(
            img,
            width,
            height,
            ResampleFilter::Nearest,
        )))
    }
}

/// [`FixedPageRenderer`] whose thread panics once it has decoded
/// `decodes` documents
pub struct CrashingRenderer {
    inner: FixedPageRenderer,
    decodes_left: usize,
}

impl CrashingRenderer {
    pub fn after(decodes: usize, pages: Vec<RgbaImage>) -> Self {
        Self {
            inner: FixedPageRenderer::new(pages),
            decodes_left: decodes,
        }
    }
}

impl PageRenderer for CrashingRenderer {
    fn decode(&mut self, source: &DocumentSource) -> Result<Vec<PageHandle>, RenderFault> {
        if self.decodes_left == 0 {
            panic!("renderer crashed decoding {}", source.name);
        }
        self.decodes_left -= 1;
        self.inner.decode(source)
    }

    fn render_page(
        &self,
        page: &PageHandle,
        scale: f64,
        density: f64,
    ) -> Result<RenderedPage, RenderFault> {
        self.inner.render_page(page, scale, density)
    }
}

/// What a [`RecordingHost`] was asked to do
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostCall {
    Pulse(HapticPattern),
    OpenFileChooser,
    ChromeVisible(bool),
    ShowStrip { tiles: usize },
}

/// Host that records calls into a shared log the test keeps a handle to
#[derive(Clone, Default)]
pub struct RecordingHost {
    calls: Arc<Mutex<Vec<HostCall>>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: HostCall) {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(call);
    }
}

impl Host for RecordingHost {
    fn pulse(&mut self, pattern: HapticPattern) {
        self.record(HostCall::Pulse(pattern));
    }

    fn open_file_chooser(&mut self) {
        self.record(HostCall::OpenFileChooser);
    }

    fn set_chrome_visible(&mut self, visible: bool) {
        self.record(HostCall::ChromeVisible(visible));
    }

    fn show_strip(&mut self, strip: &Strip) {
        self.record(HostCall::ShowStrip { tiles: strip.len() });
    }
}
