//! Shared, persisted settings state.
//!
//! `SettingsStore` owns the in-memory `Settings` behind a mutex. Every
//! mutation (`patch`, `record_opened`) runs as one critical section: merge,
//! then flush the full record to disk before the lock is released, so two
//! concurrent updates can never lose each other's keys.

use crate::config::{load_config, save_config_silent, RecentFileEntry, Settings, SettingsPatch};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
pub struct SettingsStore {
    config_path: PathBuf,
    settings: Mutex<Settings>,
}

impl SettingsStore {
    /// Load the store from `config_path`, falling back to defaults.
    pub fn load(config_path: impl Into<PathBuf>) -> Self {
        let config_path = config_path.into();
        let settings = load_config(&config_path);
        info!(
            "Settings store ready ({} recent files)",
            settings.recent_files.len()
        );
        Self::with_settings(config_path, settings)
    }

    /// Build a store around already-loaded settings.
    pub fn with_settings(config_path: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Mutex::new(settings),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Snapshot of the current settings.
    pub fn get_all(&self) -> Settings {
        self.lock().clone()
    }

    /// Merge `patch` into the current settings and persist the result.
    ///
    /// Persistence failures are logged; the merged state is kept in memory
    /// either way.
    pub fn patch(&self, patch: SettingsPatch) {
        self.mutate(|settings| settings.apply_patch(patch));
    }

    /// Move `path` to the front of the recent-files list and persist.
    pub fn record_opened(&self, path: &Path) {
        debug!("Recording recent file: {}", path.display());
        let path = path.to_path_buf();
        self.mutate(move |settings| settings.add_recent_file(path));
    }

    /// Recent files labelled for menu presentation, most recent first.
    ///
    /// Entries are not checked for existence here; callers validate a path
    /// when the user picks it.
    pub fn recent_files_for_menu(&self) -> Vec<RecentFileEntry> {
        self.lock().recent_file_entries()
    }

    fn mutate<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.lock();
        f(&mut settings);
        save_config_silent(&self.config_path, &settings);
    }

    fn lock(&self) -> MutexGuard<'_, Settings> {
        // A panic while holding the lock leaves a fully merged or untouched
        // record behind, never a torn one, so the poisoned value is usable.
        self.settings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
