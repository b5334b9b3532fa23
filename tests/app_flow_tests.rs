use std::path::Path;
use std::time::{Duration, Instant};

use image::{Rgba, RgbaImage};
use tempfile::TempDir;

use passage_strip::compositor::CompositeOptions;
use passage_strip::geometry::{Point, Rect, Size};
use passage_strip::gesture::ContactEvent;
use passage_strip::host::{HapticPattern, Host, NullHost};
use passage_strip::regions::{
    JsonFileStore, KeyValueStore, MemoryStore, RegionPersistence, identify,
};
use passage_strip::render::{PageRenderer, RenderService};
use passage_strip::test_utils::{
    ContactScenarioBuilder, CrashingRenderer, FixedPageRenderer, HostCall, RecordingHost,
    solid_page,
};
use passage_strip::{App, AppConfig, AppEvent, DocumentSource, Mode};

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
const WAIT: Duration = Duration::from_secs(10);

/// Screen center of a 1200x400 frame: capture/delete zone
const CENTER: (f64, f64) = (600.0, 200.0);
/// Top-right corner of a 1200x400 frame: toggle zone
const TOP_RIGHT: (f64, f64) = (1190.0, 10.0);

fn two_pages() -> Vec<RgbaImage> {
    vec![solid_page(1200, 1000, RED), solid_page(1200, 1000, BLUE)]
}

fn document() -> DocumentSource {
    DocumentSource::from_bytes("two-pages.cbz", b"two page fixture".to_vec())
}

fn config() -> AppConfig {
    AppConfig {
        composite: CompositeOptions {
            target_height: 400,
            ..CompositeOptions::default()
        },
        frame_size: Size::new(1200.0, 400.0),
        ..AppConfig::default()
    }
}

fn app_with(store: Box<dyn KeyValueStore>, host: impl Host + 'static) -> App {
    app_rendering_with(
        || Box::new(FixedPageRenderer::new(two_pages())),
        store,
        host,
    )
}

fn app_rendering_with(
    make_renderer: impl FnOnce() -> Box<dyn PageRenderer> + Send + 'static,
    store: Box<dyn KeyValueStore>,
    host: impl Host + 'static,
) -> App {
    let render = RenderService::spawn(make_renderer, 1);
    App::new(config(), RegionPersistence::new(store), render, Box::new(host))
}

fn open(app: &mut App, source: DocumentSource) -> Vec<AppEvent> {
    app.open_document(source);
    app.wait_idle(WAIT)
}

/// Hold one contact at `at` for `hold_ms`, then lift it
fn hold(app: &mut App, at: (f64, f64), hold_ms: u64) -> Vec<AppEvent> {
    let mut out = hold_without_waiting(app, at, hold_ms);
    out.extend(app.wait_idle(WAIT));
    out
}

/// Like [`hold`], but leaves any render work it started outstanding
fn hold_without_waiting(app: &mut App, at: (f64, f64), hold_ms: u64) -> Vec<AppEvent> {
    let events = ContactScenarioBuilder::new(Instant::now())
        .press(1, at.0, at.1)
        .wait(hold_ms)
        .release(1)
        .build();
    feed(app, &events)
}

fn feed(app: &mut App, events: &[ContactEvent]) -> Vec<AppEvent> {
    let mut out = Vec::new();
    for event in events {
        out.extend(app.handle_contacts(event));
    }
    out
}

/// Two contacts 400 apart that spread to 500, then 600
fn spread_pinch() -> Vec<ContactEvent> {
    ContactScenarioBuilder::new(Instant::now())
        .press(1, 400.0, 300.0)
        .press(2, 800.0, 300.0)
        .wait(50)
        .move_to(1, 300.0, 300.0)
        .wait(50)
        .move_to(2, 900.0, 300.0)
        .wait(50)
        .release_all()
        .build()
}

fn capture_straddling_region(app: &mut App) -> Vec<AppEvent> {
    app.set_scroll(Point::new(0.0, 800.0));
    hold(app, CENTER, 600)
}

#[test]
fn straddling_region_composites_into_one_tile() {
    let host = RecordingHost::new();
    let mut app = app_with(Box::new(MemoryStore::new()), host.clone());

    let events = open(&mut app, document());
    assert_eq!(
        events,
        vec![AppEvent::DocumentLoaded {
            name: "two-pages.cbz".to_string(),
            pages: 2
        }]
    );

    let events = capture_straddling_region(&mut app);
    let region = Rect::new(0.0, 800.0, 1200.0, 400.0);
    assert_eq!(events, vec![AppEvent::RegionCaptured { index: 0, region }]);

    let events = hold(&mut app, TOP_RIGHT, 700);
    assert_eq!(
        events,
        vec![
            AppEvent::ModeChanged(Mode::Strip),
            AppEvent::StripReady { tiles: 1 }
        ]
    );
    assert_eq!(app.mode(), Mode::Strip);

    let session = app.session().unwrap();
    let strip = session.strip().unwrap();
    let tile = &strip.tiles[0];
    assert_eq!(tile.logical_width, 1200);
    assert_eq!(tile.raster.dimensions(), (1200, 400));
    // Page one fills the top half, page two the bottom, meeting exactly
    assert_eq!(*tile.raster.get_pixel(600, 0), RED);
    assert_eq!(*tile.raster.get_pixel(600, 199), RED);
    assert_eq!(*tile.raster.get_pixel(600, 200), BLUE);
    assert_eq!(*tile.raster.get_pixel(600, 399), BLUE);

    assert_eq!(
        host.calls(),
        vec![
            HostCall::Pulse(HapticPattern::Capture),
            HostCall::Pulse(HapticPattern::Toggle),
            HostCall::ShowStrip { tiles: 1 },
        ]
    );
}

#[test]
fn second_hold_on_a_region_deletes_it() {
    let host = RecordingHost::new();
    let mut app = app_with(Box::new(MemoryStore::new()), host.clone());
    open(&mut app, document());

    capture_straddling_region(&mut app);
    assert_eq!(app.regions().len(), 1);

    let events = hold(&mut app, CENTER, 600);
    assert_eq!(
        events,
        vec![AppEvent::RegionDeleted {
            index: 0,
            region: Rect::new(0.0, 800.0, 1200.0, 400.0)
        }]
    );
    assert!(app.regions().is_empty());
    assert_eq!(
        host.calls(),
        vec![
            HostCall::Pulse(HapticPattern::Capture),
            HostCall::Pulse(HapticPattern::Delete),
        ]
    );
}

#[test]
fn short_hold_does_nothing() {
    let host = RecordingHost::new();
    let mut app = app_with(Box::new(MemoryStore::new()), host.clone());
    open(&mut app, document());

    let events = hold(&mut app, CENTER, 200);
    assert!(events.is_empty());
    assert!(app.regions().is_empty());
    assert!(host.calls().is_empty());
}

#[test]
fn capture_is_ignored_in_strip_mode() {
    let mut app = app_with(Box::new(MemoryStore::new()), RecordingHost::new());
    open(&mut app, document());
    capture_straddling_region(&mut app);
    hold(&mut app, TOP_RIGHT, 700);
    assert_eq!(app.mode(), Mode::Strip);

    let events = hold(&mut app, CENTER, 600);
    assert!(events.is_empty());
    assert_eq!(app.regions().len(), 1);
}

#[test]
fn toggling_back_restores_the_regions() {
    let mut app = app_with(Box::new(MemoryStore::new()), RecordingHost::new());
    open(&mut app, document());
    capture_straddling_region(&mut app);
    hold(&mut app, TOP_RIGHT, 700);
    assert!(app.session().unwrap().overlays().outlines().is_empty());

    let events = hold(&mut app, TOP_RIGHT, 700);
    assert_eq!(events, vec![AppEvent::ModeChanged(Mode::Viewing)]);

    let session = app.session().unwrap();
    assert_eq!(session.regions(), &[Rect::new(0.0, 800.0, 1200.0, 400.0)]);
    assert!(session.strip().is_none());
    assert_eq!(session.tiles().len(), 2);
    assert!(session.overlays().is_visible());
    assert_eq!(session.overlays().outlines().len(), 1);
}

#[test]
fn strip_stays_when_returning_to_viewing_is_superseded() {
    let mut app = app_with(Box::new(MemoryStore::new()), RecordingHost::new());
    open(&mut app, document());
    capture_straddling_region(&mut app);
    hold(&mut app, TOP_RIGHT, 700);
    assert_eq!(app.mode(), Mode::Strip);

    // Re-render starts, then a failing open replaces it before it lands
    assert!(hold_without_waiting(&mut app, TOP_RIGHT, 700).is_empty());
    assert!(!app.is_idle());
    app.open_document(DocumentSource::from_bytes("broken.pdf", Vec::new()));
    let events = app.wait_idle(WAIT);
    assert!(matches!(
        events.as_slice(),
        [AppEvent::LoadFailed { name, .. }] if name == "broken.pdf"
    ));

    assert_eq!(app.mode(), Mode::Strip);
    let session = app.session().unwrap();
    assert_eq!(session.source().name, "two-pages.cbz");
    assert_eq!(session.strip().map(|s| s.len()), Some(1));

    let events = hold(&mut app, TOP_RIGHT, 700);
    assert_eq!(events, vec![AppEvent::ModeChanged(Mode::Viewing)]);
    assert!(app.session().unwrap().strip().is_none());
}

#[test]
fn crashed_worker_fails_the_pending_load() {
    let mut app = app_rendering_with(
        || Box::new(CrashingRenderer::after(0, two_pages())),
        Box::new(MemoryStore::new()),
        NullHost,
    );
    let events = open(&mut app, document());
    assert_eq!(
        events,
        vec![AppEvent::LoadFailed {
            name: "two-pages.cbz".to_string(),
            reason: "render worker stopped".to_string()
        }]
    );
    assert!(app.is_idle());
    assert!(app.session().is_none());
}

#[test]
fn crashed_worker_during_rerender_keeps_the_strip() {
    let mut app = app_rendering_with(
        || Box::new(CrashingRenderer::after(1, two_pages())),
        Box::new(MemoryStore::new()),
        RecordingHost::new(),
    );
    open(&mut app, document());
    capture_straddling_region(&mut app);
    hold(&mut app, TOP_RIGHT, 700);
    assert_eq!(app.mode(), Mode::Strip);

    // The second decode takes the worker down
    let events = hold(&mut app, TOP_RIGHT, 700);
    assert_eq!(
        events,
        vec![AppEvent::LoadFailed {
            name: "two-pages.cbz".to_string(),
            reason: "render worker stopped".to_string()
        }]
    );
    assert!(app.is_idle());
    assert_eq!(app.mode(), Mode::Strip);
    assert_eq!(app.session().unwrap().strip().map(|s| s.len()), Some(1));

    // Later requests fail instead of waiting forever
    let events = open(&mut app, DocumentSource::from_bytes("next.cbz", vec![1u8]));
    assert!(matches!(
        events.as_slice(),
        [AppEvent::LoadFailed { name, .. }] if name == "next.cbz"
    ));
    assert!(app.is_idle());
    let events = hold(&mut app, TOP_RIGHT, 700);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], AppEvent::LoadFailed { .. }));
    assert_eq!(app.mode(), Mode::Strip);
}

#[test]
fn pinch_zooms_and_moves_the_outlines() {
    let mut app = app_with(Box::new(MemoryStore::new()), NullHost);
    open(&mut app, document());
    hold(&mut app, CENTER, 600);
    let region = app.regions()[0];
    let before = app.session().unwrap().overlays().outlines().to_vec();

    let events = feed(&mut app, &spread_pinch());
    assert_eq!(
        events,
        vec![AppEvent::Zoomed { scale: 1.25 }, AppEvent::Zoomed { scale: 1.5 }]
    );

    let session = app.session().unwrap();
    assert_eq!(session.viewport().scale(), 1.5);
    assert!(!session.viewport().is_pinching());
    let expected = session.viewport().coords().content_rect_to_screen(&region);
    assert_eq!(session.overlays().outlines(), &[expected]);
    assert_ne!(session.overlays().outlines(), before.as_slice());
}

#[test]
fn pinch_is_ignored_in_strip_mode_and_while_toggling() {
    let mut app = app_with(Box::new(MemoryStore::new()), NullHost);
    open(&mut app, document());
    capture_straddling_region(&mut app);

    // Entering strip mode is still in flight
    hold_without_waiting(&mut app, TOP_RIGHT, 700);
    assert!(!app.is_idle());
    assert!(feed(&mut app, &spread_pinch()).is_empty());
    assert_eq!(app.session().unwrap().viewport().scale(), 1.0);

    app.wait_idle(WAIT);
    assert_eq!(app.mode(), Mode::Strip);
    assert!(feed(&mut app, &spread_pinch()).is_empty());
    assert_eq!(app.session().unwrap().viewport().scale(), 1.0);
}

fn regions_file(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("state").join("regions.json")
}

#[test]
fn regions_survive_a_restart_and_reopen_in_strip_mode() {
    let dir = TempDir::new().unwrap();
    let path = regions_file(&dir);

    {
        let mut app = app_with(
            Box::new(JsonFileStore::with_file(&path)),
            RecordingHost::new(),
        );
        open(&mut app, document());
        capture_straddling_region(&mut app);
    }
    assert!(path.exists());

    let host = RecordingHost::new();
    let mut app = app_with(Box::new(JsonFileStore::load_or_empty(&path)), host.clone());
    let events = open(&mut app, document());
    assert_eq!(
        events,
        vec![
            AppEvent::DocumentLoaded {
                name: "two-pages.cbz".to_string(),
                pages: 2
            },
            AppEvent::ModeChanged(Mode::Strip),
            AppEvent::StripReady { tiles: 1 },
        ]
    );
    assert_eq!(app.regions(), &[Rect::new(0.0, 800.0, 1200.0, 400.0)]);
    // Restoring does not pulse
    assert_eq!(host.calls(), vec![HostCall::ShowStrip { tiles: 1 }]);
}

#[test]
fn malformed_persisted_regions_open_in_viewing_mode() {
    let dir = TempDir::new().unwrap();
    let path = regions_file(&dir);

    let mut store = JsonFileStore::with_file(&path);
    let key = format!("regions:{}", identify(&document()));
    store.set(&key, "{not json".to_string()).unwrap();

    let mut app = app_with(Box::new(JsonFileStore::load_or_empty(&path)), NullHost);
    let events = open(&mut app, document());
    assert_eq!(events.len(), 1);
    assert_eq!(app.mode(), Mode::Viewing);
    assert!(app.regions().is_empty());
}

#[test]
fn failed_open_keeps_the_current_document() {
    let mut app = app_with(Box::new(MemoryStore::new()), RecordingHost::new());
    open(&mut app, document());
    capture_straddling_region(&mut app);

    let events = open(&mut app, DocumentSource::from_bytes("broken.pdf", Vec::new()));
    assert!(matches!(
        events.as_slice(),
        [AppEvent::LoadFailed { name, .. }] if name == "broken.pdf"
    ));
    let session = app.session().unwrap();
    assert_eq!(session.source().name, "two-pages.cbz");
    assert_eq!(session.regions().len(), 1);
    assert!(app.is_idle());
}

#[test]
fn strip_is_written_as_png() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("strip.png");

    let mut app = app_with(Box::new(MemoryStore::new()), RecordingHost::new());
    open(&mut app, document());
    capture_straddling_region(&mut app);
    app.set_scroll(Point::new(0.0, 0.0));
    hold(&mut app, CENTER, 600);
    hold(&mut app, TOP_RIGHT, 700);

    let strip = app.session().unwrap().strip().unwrap();
    assert_eq!(strip.len(), 2);
    strip
        .save_png(Path::new(&out), 8, Rgba([255, 255, 255, 255]))
        .unwrap();

    let written = image::open(&out).unwrap().to_rgba8();
    assert_eq!(written.dimensions(), (1200 + 8 + 1200, 400));
    assert_eq!(*written.get_pixel(600, 300), BLUE);
    assert_eq!(*written.get_pixel(1204, 10), Rgba([255, 255, 255, 255]));
    assert_eq!(*written.get_pixel(1800, 300), RED);
}

#[test]
fn recorded_script_replays_through_the_app() {
    use passage_strip::event_source::{ContactSource, ScriptedContactSource};

    let script = ContactScenarioBuilder::new(Instant::now())
        .press(1, CENTER.0, CENTER.1)
        .wait(600)
        .release(1)
        .wait(100)
        .press(2, TOP_RIGHT.0, TOP_RIGHT.1)
        .wait(700)
        .release(2)
        .build_script();
    let json = serde_json::to_string(&script).unwrap();

    let mut app = app_with(Box::new(MemoryStore::new()), RecordingHost::new());
    open(&mut app, document());
    app.set_scroll(Point::new(0.0, 800.0));

    let mut source = ScriptedContactSource::from_json(&json, Instant::now()).unwrap();
    let mut events = Vec::new();
    while source.poll(Duration::ZERO).unwrap() {
        let event = source.read().unwrap();
        events.extend(app.handle_contacts(&event));
        events.extend(app.wait_idle(WAIT));
    }

    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], AppEvent::RegionCaptured { index: 0, .. }));
    assert_eq!(events[2], AppEvent::StripReady { tiles: 1 });
    assert_eq!(app.mode(), Mode::Strip);
}

#[test]
fn top_left_hold_requests_a_file() {
    let host = RecordingHost::new();
    let mut app = app_with(Box::new(MemoryStore::new()), host.clone());
    open(&mut app, document());

    let events = hold(&mut app, (10.0, 10.0), 850);
    assert_eq!(events, vec![AppEvent::FileChooserRequested]);
    assert_eq!(
        host.calls(),
        vec![HostCall::Pulse(HapticPattern::Open), HostCall::OpenFileChooser]
    );
}

#[test]
fn three_contact_swipe_toggles_chrome() {
    let host = RecordingHost::new();
    let mut app = app_with(Box::new(MemoryStore::new()), host.clone());
    open(&mut app, document());

    let swipe = |dy: f64| {
        ContactScenarioBuilder::new(Instant::now())
            .press(1, 300.0, 150.0)
            .press(2, 350.0, 150.0)
            .press(3, 400.0, 150.0)
            .wait(100)
            .move_all_by(0.0, dy)
            .wait(100)
            .release_all()
            .build()
    };

    let mut events = Vec::new();
    for event in swipe(120.0).iter().chain(swipe(-120.0).iter()) {
        events.extend(app.handle_contacts(event));
    }
    assert_eq!(
        events,
        vec![AppEvent::ChromeVisibility(true), AppEvent::ChromeVisibility(false)]
    );
    assert_eq!(
        host.calls(),
        vec![HostCall::ChromeVisible(true), HostCall::ChromeVisible(false)]
    );
}

#[test]
fn resized_viewport_changes_what_a_capture_covers() {
    let mut app = app_with(Box::new(MemoryStore::new()), NullHost);
    open(&mut app, document());
    app.set_viewport(Point::new(0.0, 0.0), Size::new(600.0, 400.0));
    assert_eq!(app.set_scale(2.0), Some(2.0));
    app.scroll_by(0.0, 100.0);

    let events = hold(&mut app, (300.0, 200.0), 600);
    assert_eq!(
        events,
        vec![AppEvent::RegionCaptured {
            index: 0,
            region: Rect::new(0.0, 50.0, 300.0, 200.0)
        }]
    );
}
