//! User settings and preferences for Kio
//!
//! This module defines the `Settings` record that holds every user-configurable
//! option, the `SettingsPatch` used to merge partial updates into it, and the
//! recent-files list that lives inside it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Maximum number of entries kept in the recent-files list.
pub const RECENT_FILES_CAPACITY: usize = 10;

// ─────────────────────────────────────────────────────────────────────────────
// Main Settings Struct
// ─────────────────────────────────────────────────────────────────────────────

/// User preferences persisted between sessions.
///
/// Serialized with camelCase keys, which is the shape the UI surface reads.
/// Every field has a default via `Default` and `#[serde(default)]`, so a
/// persisted record with missing keys still loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    // ─────────────────────────────────────────────────────────────────────────
    // Appearance
    // ─────────────────────────────────────────────────────────────────────────
    /// Editor color theme name
    pub theme: String,

    /// Font size for the editor (in points)
    pub font_size: f32,

    /// CSS font-family stack for the editor
    pub font_family: String,

    /// Whether to render the minimap
    pub minimap: bool,

    /// Whether to show line numbers in the gutter
    pub line_numbers: bool,

    // ─────────────────────────────────────────────────────────────────────────
    // Editor Behavior
    // ─────────────────────────────────────────────────────────────────────────
    /// Tab width (number of columns)
    pub tab_size: u32,

    /// Whether to insert spaces instead of tab characters
    pub insert_spaces: bool,

    /// Whether to enable word wrap
    pub word_wrap: bool,

    /// Whether to auto-save files
    pub auto_save: bool,

    // ─────────────────────────────────────────────────────────────────────────
    // Session & Workspace
    // ─────────────────────────────────────────────────────────────────────────
    /// Recently opened files (most recent first)
    pub recent_files: Vec<PathBuf>,

    /// Root folder of the open workspace (empty when none)
    pub workspace: PathBuf,

    // ─────────────────────────────────────────────────────────────────────────
    // Panels
    // ─────────────────────────────────────────────────────────────────────────
    /// Whether the sidebar is visible
    pub sidebar_visible: bool,

    /// Whether the status bar is visible
    pub status_bar_visible: bool,

    /// Whether distraction-free mode is on
    pub zen_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Appearance
            theme: String::from("vs-dark"),
            font_size: 14.0,
            font_family: String::from("Consolas, \"Courier New\", monospace"),
            minimap: true,
            line_numbers: true,

            // Editor Behavior
            tab_size: 2,
            insert_spaces: true,
            word_wrap: false,
            auto_save: true,

            // Session & Workspace
            recent_files: Vec::new(),
            workspace: PathBuf::new(),

            // Panels
            sidebar_visible: true,
            status_bar_visible: true,
            zen_mode: false,
        }
    }
}

impl Settings {
    /// Add a file to the recent files list.
    ///
    /// If the file already exists in the list, it's moved to the front.
    /// The list is trimmed to `RECENT_FILES_CAPACITY`.
    pub fn add_recent_file(&mut self, path: PathBuf) {
        // Remove if already exists
        self.recent_files.retain(|p| p != &path);
        // Add to front
        self.recent_files.insert(0, path);
        // Trim to max
        self.recent_files.truncate(RECENT_FILES_CAPACITY);
    }

    /// Recent files as labelled entries, in list order.
    pub fn recent_file_entries(&self) -> Vec<RecentFileEntry> {
        self.recent_files
            .iter()
            .map(|path| RecentFileEntry::for_path(path))
            .collect()
    }

    /// Overlay every key present in `patch`, leaving the others untouched.
    pub fn apply_patch(&mut self, patch: SettingsPatch) {
        let SettingsPatch {
            theme,
            font_size,
            font_family,
            minimap,
            line_numbers,
            tab_size,
            insert_spaces,
            word_wrap,
            auto_save,
            recent_files,
            workspace,
            sidebar_visible,
            status_bar_visible,
            zen_mode,
        } = patch;

        merge(&mut self.theme, theme);
        merge(&mut self.font_size, font_size);
        merge(&mut self.font_family, font_family);
        merge(&mut self.minimap, minimap);
        merge(&mut self.line_numbers, line_numbers);
        merge(&mut self.tab_size, tab_size);
        merge(&mut self.insert_spaces, insert_spaces);
        merge(&mut self.word_wrap, word_wrap);
        merge(&mut self.auto_save, auto_save);
        merge(&mut self.recent_files, recent_files);
        merge(&mut self.workspace, workspace);
        merge(&mut self.sidebar_visible, sidebar_visible);
        merge(&mut self.status_bar_visible, status_bar_visible);
        merge(&mut self.zen_mode, zen_mode);

        self.sanitize();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Validation Constants and Sanitization
    // ─────────────────────────────────────────────────────────────────────────

    /// Minimum allowed font size.
    pub const MIN_FONT_SIZE: f32 = 6.0;
    /// Maximum allowed font size.
    pub const MAX_FONT_SIZE: f32 = 72.0;
    /// Minimum allowed tab size.
    pub const MIN_TAB_SIZE: u32 = 1;
    /// Maximum allowed tab size.
    pub const MAX_TAB_SIZE: u32 = 16;

    /// Sanitize settings by clamping values to valid ranges.
    ///
    /// Applied after loading (the file may have been edited by hand) and after
    /// every patch, so the recent-files invariants hold whatever the source.
    pub fn sanitize(&mut self) {
        if self.font_size.is_nan() {
            self.font_size = Self::default().font_size;
        }
        self.font_size = self
            .font_size
            .clamp(Self::MIN_FONT_SIZE, Self::MAX_FONT_SIZE);

        self.tab_size = self.tab_size.clamp(Self::MIN_TAB_SIZE, Self::MAX_TAB_SIZE);

        // Drop duplicates, keeping the most recent occurrence
        let mut seen: Vec<PathBuf> = Vec::with_capacity(self.recent_files.len());
        self.recent_files.retain(|p| {
            if seen.contains(p) {
                false
            } else {
                seen.push(p.clone());
                true
            }
        });
        self.recent_files.truncate(RECENT_FILES_CAPACITY);
    }

    /// Load settings and sanitize them to ensure validity.
    pub fn from_json_sanitized(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }
}

fn merge<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Partial Updates
// ─────────────────────────────────────────────────────────────────────────────

/// A partial settings update. `None` (or an absent/null key) leaves the
/// current value alone.
///
/// Unknown keys are rejected so a misspelled option fails loudly instead of
/// being dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimap: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_numbers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_spaces: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_wrap: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_save: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_files: Option<Vec<PathBuf>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sidebar_visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_bar_visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zen_mode: Option<bool>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Recent File Entries
// ─────────────────────────────────────────────────────────────────────────────

/// A recent file as presented in the "Recent Files" menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFileEntry {
    /// Final path segment, or the whole path when there is none
    pub display_label: String,
    pub path: PathBuf,
}

impl RecentFileEntry {
    pub fn for_path(path: &Path) -> Self {
        let display_label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| path.display().to_string());

        Self {
            display_label,
            path: path.to_path_buf(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
