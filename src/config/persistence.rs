//! Configuration file persistence for Kio
//!
//! This module handles loading and saving the settings record to the
//! platform-specific configuration directory, with graceful fallback to
//! defaults when the file is missing or unreadable.

use crate::config::Settings;
use crate::error::{Error, Result, ResultExt};
use log::{debug, info, warn};
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Application name used for the config directory
const APP_NAME: &str = "kio";

/// Configuration file name
const CONFIG_FILE_NAME: &str = "config.json";

/// Suffix of the staging file written before the rename
const STAGING_SUFFIX: &str = ".tmp";

// ─────────────────────────────────────────────────────────────────────────────
// Platform-Specific Directory Resolution
// ─────────────────────────────────────────────────────────────────────────────

/// Get the platform-specific configuration directory for the application.
///
/// - **Windows**: `%APPDATA%\kio\`
/// - **macOS**: `~/Library/Application Support/kio/`
/// - **Linux**: `~/.config/kio/`
///
/// # Errors
///
/// Returns `Error::ConfigDirNotFound` if the config directory cannot be determined
/// (e.g., if the HOME environment variable is not set).
pub fn get_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|base| base.join(APP_NAME))
        .ok_or(Error::ConfigDirNotFound)
}

/// Get the full path to the configuration file.
pub fn get_config_file_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE_NAME))
}

fn staging_path_for(config_path: &Path) -> PathBuf {
    let mut name = config_path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from(CONFIG_FILE_NAME));
    name.push(STAGING_SUFFIX);
    config_path.with_file_name(name)
}

// ─────────────────────────────────────────────────────────────────────────────
// Load Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Load settings from `config_path`.
///
/// Never fails: a missing, empty, unreadable or corrupted file yields the
/// default settings (corruption is logged as a warning).
pub fn load_config(config_path: &Path) -> Settings {
    load_config_internal(config_path)
        .unwrap_or_warn_default(Settings::default(), "Failed to load configuration")
}

fn load_config_internal(config_path: &Path) -> Result<Settings> {
    if !config_path.exists() {
        debug!(
            "Config file not found at {}, using defaults",
            config_path.display()
        );
        return Ok(Settings::default());
    }

    debug!("Loading config from: {}", config_path.display());

    let contents = fs::read_to_string(config_path).map_err(|e| Error::ConfigLoad {
        path: config_path.to_path_buf(),
        source: Box::new(e),
    })?;

    if contents.trim().is_empty() {
        debug!("Config file is empty, using defaults");
        return Ok(Settings::default());
    }

    let settings = Settings::from_json_sanitized(&contents).map_err(|e| {
        warn!(
            "Config file at {} contains invalid JSON: {}",
            config_path.display(),
            e
        );
        Error::ConfigParse {
            message: format!("Failed to parse config file: {}", e),
            source: Some(Box::new(e)),
        }
    })?;

    info!(
        "Configuration loaded successfully from {}",
        config_path.display()
    );
    Ok(settings)
}

// ─────────────────────────────────────────────────────────────────────────────
// Save Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Save settings to `config_path`.
///
/// Writes the full record to `<config>.tmp`, syncs it to disk and renames it
/// over the config file, so a crash mid-write leaves the previous file
/// intact. The parent directory is created if needed.
///
/// # Errors
///
/// Returns `Error::ConfigSave` if the directory, the staging file or the
/// rename fails.
pub fn save_config(config_path: &Path, settings: &Settings) -> Result<()> {
    if let Some(config_dir) = config_path.parent() {
        if !config_dir.as_os_str().is_empty() && !config_dir.exists() {
            debug!("Creating config directory: {}", config_dir.display());
            fs::create_dir_all(config_dir).map_err(|e| Error::ConfigSave {
                path: config_dir.to_path_buf(),
                source: Box::new(e),
            })?;
        }
    }

    let staging_path = staging_path_for(config_path);

    let json = serde_json::to_string_pretty(settings).map_err(|e| Error::ConfigSave {
        path: config_path.to_path_buf(),
        source: Box::new(e),
    })?;

    write_synced(&staging_path, json.as_bytes()).map_err(|e| Error::ConfigSave {
        path: staging_path.clone(),
        source: Box::new(e),
    })?;

    fs::rename(&staging_path, config_path).map_err(|e| Error::ConfigSave {
        path: config_path.to_path_buf(),
        source: Box::new(e),
    })?;

    debug!("Configuration saved to {}", config_path.display());
    Ok(())
}

fn write_synced(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

/// Save settings, logging instead of returning errors.
///
/// Settings are best-effort durability: the in-memory copy stays
/// authoritative for the session when this fails.
///
/// Returns `true` if the save was successful, `false` otherwise.
pub fn save_config_silent(config_path: &Path, settings: &Settings) -> bool {
    match save_config(config_path, settings) {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to save configuration: {}", e);
            false
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
