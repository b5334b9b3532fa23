use image::Rgba;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

use crate::compositor::{CompositeOptions, DEFAULT_MAX_TILE_PIXELS};
use crate::gesture::GestureConfig;
use crate::render::LoadOptions;
use crate::resample::ResampleFilter;
use crate::viewport::ViewportConfig;

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
pub const APP_NAME: &str = "passage-strip";

const DEFAULT_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripSettings {
    /// Height of every snippet, in logical pixels
    pub target_height: u32,
    /// `#rrggbb` or `#rrggbbaa`
    pub background: String,
    pub resample: ResampleFilter,
    /// Space between snippets when the strip is flattened
    pub gap: u32,
    /// Largest side of one snippet raster, in device pixels
    pub max_tile_pixels: u32,
}

impl Default for StripSettings {
    fn default() -> Self {
        Self {
            target_height: 160,
            background: "#ffffff".to_string(),
            resample: ResampleFilter::default(),
            gap: 8,
            max_tile_pixels: DEFAULT_MAX_TILE_PIXELS,
        }
    }
}

impl StripSettings {
    /// Parsed background colour; unparsable values fall back to white
    pub fn background_rgba(&self) -> Rgba<u8> {
        parse_hex_color(&self.background).unwrap_or_else(|| {
            warn!("Invalid strip background {:?}, using white", self.background);
            DEFAULT_BACKGROUND
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub device_pixel_density: f64,
    /// Content units between stacked pages
    pub page_gap: f64,
    /// Threads used for compositing
    pub workers: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            device_pixel_density: 1.0,
            page_gap: 0.0,
            workers: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Overrides the default regions file location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regions_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub gesture: GestureConfig,

    #[serde(default)]
    pub viewport: ViewportConfig,

    #[serde(default)]
    pub strip: StripSettings,

    #[serde(default)]
    pub render: RenderSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            gesture: GestureConfig::default(),
            viewport: ViewportConfig::default(),
            strip: StripSettings::default(),
            render: RenderSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl Settings {
    pub fn composite_options(&self) -> CompositeOptions {
        CompositeOptions {
            target_height: self.strip.target_height.max(1),
            density: self.render.device_pixel_density,
            background: self.strip.background_rgba(),
            filter: self.strip.resample,
            max_tile_pixels: self.strip.max_tile_pixels,
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            density: self.render.device_pixel_density,
            page_gap: self.render.page_gap,
        }
    }
}

fn parse_hex_color(s: &str) -> Option<Rgba<u8>> {
    let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
    if !hex.is_ascii() || !(hex.len() == 6 || hex.len() == 8) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
    Some(Rgba([channel(0)?, channel(2)?, channel(4)?, alpha]))
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

pub fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from the platform config dir, writing defaults if absent
pub fn load_settings() {
    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };
    load_settings_from(&path);
}

/// Load settings from `path`, creating it with defaults if it does not exist
pub fn load_settings_from(path: &Path) {
    if !path.exists() {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, path);
        }
        return;
    }

    match fs::read_to_string(path) {
        Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");

                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    save_settings_to_file(&settings, path);
                }
                settings.viewport = settings.viewport.validated();

                if let Ok(mut global) = SETTINGS.write() {
                    *global = settings;
                }
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    settings.version = CURRENT_VERSION;
}

fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = match serde_yaml::to_string(settings) {
        Ok(body) => format!("{SETTINGS_HEADER}{body}"),
        Err(e) => {
            error!("Failed to encode settings: {e}");
            return;
        }
    };

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

const SETTINGS_HEADER: &str = r#"# passage-strip settings
#
# gesture:   distances in screen pixels, holds in milliseconds
# viewport:  zoom bounds, kept within 0.6..3.0
# strip:     resample is one of nearest | bilinear | lanczos3;
#            max_tile_pixels caps either side of one snippet
# render:    device_pixel_density multiplies page and strip rasters
# storage:   regions_file overrides where regions are kept

"#;

// Public API for accessing/modifying settings

pub fn get_settings() -> Settings {
    SETTINGS
        .read()
        .map(|s| s.clone())
        .unwrap_or_default()
}

/// Replace the process-wide settings without saving them
pub fn set_settings(settings: Settings) {
    if let Ok(mut global) = SETTINGS.write() {
        *global = settings;
    }
}

pub fn get_gesture_config() -> GestureConfig {
    SETTINGS.read().map(|s| s.gesture).unwrap_or_default()
}
