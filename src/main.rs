use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{error, info};
use simplelog::{Config, LevelFilter, WriteLogger};

use passage_strip::event_source::{ContactSource, ScriptedContactSource};
use passage_strip::geometry::{Point, Size};
use passage_strip::host::LoggingHost;
use passage_strip::regions::{JsonFileStore, KeyValueStore, MemoryStore, RegionPersistence};
use passage_strip::render::{AutoPageRenderer, PageRenderer, RenderService};
use passage_strip::{App, AppConfig, AppEvent, DocumentSource, Mode, panic_handler, paths, settings};

/// How long to wait for decode or composite work before giving up
const RENDER_TIMEOUT: Duration = Duration::from_secs(60);

/// Mark regions on a document with a contact script and export them as a strip
#[derive(Parser, Debug)]
#[command(name = "passage-strip", version, about)]
struct Cli {
    /// Image, ZIP of images, or PDF (with the `pdf` feature)
    document: PathBuf,

    /// JSON list of `{at_ms, phase, contacts: [{id, x, y}]}` to replay
    #[arg(long)]
    script: Option<PathBuf>,

    /// Viewport size as WIDTHxHEIGHT
    #[arg(long, value_parser = parse_viewport, default_value = "800x600")]
    viewport: Size,

    /// Initial zoom, clamped to the configured range
    #[arg(long)]
    scale: Option<f64>,

    /// Initial scroll offset as X,Y
    #[arg(long, value_parser = parse_scroll)]
    scroll: Option<Point>,

    /// Where to write the strip when the session ends in strip mode
    #[arg(long, default_value = "strip.png")]
    out: PathBuf,

    /// Regions file (defaults to the platform data dir)
    #[arg(long)]
    regions_file: Option<PathBuf>,

    /// Keep regions in memory only
    #[arg(long)]
    no_persist: bool,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn parse_pair(s: &str, sep: char) -> Result<(f64, f64), String> {
    let (a, b) = s
        .split_once(sep)
        .ok_or_else(|| format!("expected two numbers separated by '{sep}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("{v:?}: {e}"))
    };
    Ok((parse(a)?, parse(b)?))
}

fn parse_viewport(s: &str) -> Result<Size, String> {
    let (w, h) = parse_pair(&s.to_ascii_lowercase(), 'x')?;
    if w <= 0.0 || h <= 0.0 {
        return Err("viewport must have a positive size".to_string());
    }
    Ok(Size::new(w, h))
}

fn parse_scroll(s: &str) -> Result<Point, String> {
    let (x, y) = parse_pair(s, ',')?;
    Ok(Point::new(x, y))
}

fn init_logging(level: LevelFilter) -> Result<()> {
    let log_path = paths::resolve_log_path().unwrap_or_else(|_| PathBuf::from("passage-strip.log"));
    WriteLogger::init(
        level,
        Config::default(),
        File::create(&log_path).with_context(|| format!("Failed to create log file {log_path:?}"))?,
    )?;
    Ok(())
}

fn report(events: Vec<AppEvent>) -> Result<()> {
    for event in events {
        info!("{event:?}");
        if let AppEvent::LoadFailed { name, reason } = event {
            bail!("Could not open {name}: {reason}");
        }
    }
    Ok(())
}

/// Fire gesture holds that come due at or before `until`
fn fire_timers(app: &mut App, until: Instant) -> Result<()> {
    while let Some(deadline) = app.next_deadline() {
        if deadline > until {
            break;
        }
        report(app.tick(deadline))?;
        report(app.wait_idle(RENDER_TIMEOUT))?;
    }
    Ok(())
}

fn replay(app: &mut App, script: &Path) -> Result<()> {
    let mut source = ScriptedContactSource::from_path(script, Instant::now())?;
    info!("Replaying {} contact events from {script:?}", source.remaining());

    while source.poll(Duration::ZERO)? {
        let event = source.read()?;
        fire_timers(app, event.at)?;
        report(app.handle_contacts(&event))?;
        report(app.wait_idle(RENDER_TIMEOUT))?;
    }
    // Holds still armed when the script ends play out
    fire_timers(app, Instant::now() + Duration::from_secs(3600))
}

fn run(cli: Cli) -> Result<()> {
    settings::load_settings();
    let settings = settings::get_settings();

    let store: Box<dyn KeyValueStore> = if cli.no_persist {
        Box::new(MemoryStore::new())
    } else {
        let override_path = cli
            .regions_file
            .as_deref()
            .or(settings.storage.regions_file.as_deref());
        let path = paths::resolve_regions_file(override_path)?;
        info!("Regions file: {path:?}");
        Box::new(JsonFileStore::load_or_empty(&path))
    };

    let filter = settings.strip.resample;
    let render = RenderService::spawn(
        move || Box::new(AutoPageRenderer::new(filter)) as Box<dyn PageRenderer>,
        settings.render.workers,
    );

    let config = AppConfig {
        frame_size: cli.viewport,
        ..AppConfig::from_settings(&settings)
    };
    let mut app = App::new(
        config,
        RegionPersistence::new(store),
        render,
        Box::new(LoggingHost),
    );

    let source = DocumentSource::from_path(&cli.document)?;
    app.open_document(source);
    report(app.wait_idle(RENDER_TIMEOUT))?;
    if app.session().is_none() {
        bail!("Timed out loading {:?}", cli.document);
    }

    if let Some(scale) = cli.scale {
        app.set_scale(scale);
    }
    if let Some(scroll) = cli.scroll {
        app.set_scroll(scroll);
    }
    if let Some(script) = &cli.script {
        replay(&mut app, script)?;
    }
    report(app.wait_idle(RENDER_TIMEOUT))?;

    println!(
        "{} regions, {} mode",
        app.regions().len(),
        app.mode().as_str()
    );

    if app.mode() == Mode::Strip {
        if let Some(strip) = app.session().and_then(|s| s.strip()) {
            strip
                .save_png(&cli.out, settings.strip.gap, settings.strip.background_rgba())
                .with_context(|| format!("Failed to write strip to {:?}", cli.out))?;
            println!("Wrote {} snippets to {}", strip.len(), cli.out.display());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level)?;
    panic_handler::initialize_panic_handler();

    info!("Starting passage-strip");
    let result = run(cli);
    if let Err(err) = &result {
        error!("Application error: {err:?}");
    }
    info!("Shutting down passage-strip");
    result
}
