use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::settings::APP_NAME;

const LOG_FILENAME: &str = "passage-strip.log";
const REGIONS_FILENAME: &str = "regions.json";

/// Compute the XDG-compliant log file path.
/// Uses `state_dir` on platforms that have it, falls back to `cache_dir`.
pub fn resolve_log_path() -> Result<PathBuf> {
    let base = dirs::state_dir()
        .or_else(dirs::cache_dir)
        .context("Could not determine state or cache directory")?;

    let log_dir = base.join(APP_NAME);
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {log_dir:?}"))?;

    Ok(log_dir.join(LOG_FILENAME))
}

/// Where regions are stored: the override if given, else the platform data dir
pub fn resolve_regions_file(override_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        return Ok(path.to_path_buf());
    }
    let data_dir = dirs::data_dir()
        .context("Could not determine data directory")?
        .join(APP_NAME);
    Ok(data_dir.join(REGIONS_FILENAME))
}
