//! Native file dialog integration using the rfd crate
//!
//! Dialogs are an external collaborator of the bridge: the dispatch boundary
//! only depends on the `DialogProvider` trait, and `NativeDialogs` is the
//! implementation backed by the platform pickers.

use rfd::FileDialog;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File extension filters offered by the open and save dialogs.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md"];
const CODE_EXTENSIONS: &[&str] = &[
    "js", "ts", "jsx", "tsx", "html", "css", "json", "xml", "py", "java", "cpp", "c", "php",
    "rb", "go", "rs", "swift", "kt",
];

/// Outcome of a dialog: either cancelled or the chosen paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogSelection {
    pub canceled: bool,
    pub file_paths: Vec<PathBuf>,
}

impl DialogSelection {
    pub fn cancelled() -> Self {
        Self {
            canceled: true,
            file_paths: Vec::new(),
        }
    }

    pub fn from_pick(picked: Option<PathBuf>) -> Self {
        match picked {
            Some(path) => Self {
                canceled: false,
                file_paths: vec![path],
            },
            None => Self::cancelled(),
        }
    }
}

/// Source of user file/folder choices.
///
/// Calls block until the user answers; the boundary runs them on the
/// blocking thread pool.
pub trait DialogProvider: Send + Sync {
    /// Ask for a single file to open.
    fn pick_file(&self) -> Option<PathBuf>;

    /// Ask for a folder to open as the workspace.
    fn pick_folder(&self) -> Option<PathBuf>;

    /// Ask where to save, optionally pre-filled with `default_path`.
    fn save_file(&self, default_path: Option<&Path>) -> Option<PathBuf>;
}

/// Platform-native dialogs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeDialogs;

fn with_filters(dialog: FileDialog) -> FileDialog {
    dialog
        .add_filter("All Files", &["*"])
        .add_filter("Text Files", TEXT_EXTENSIONS)
        .add_filter("Code Files", CODE_EXTENSIONS)
}

impl DialogProvider for NativeDialogs {
    fn pick_file(&self) -> Option<PathBuf> {
        with_filters(FileDialog::new().set_title("Open File")).pick_file()
    }

    fn pick_folder(&self) -> Option<PathBuf> {
        FileDialog::new().set_title("Open Folder").pick_folder()
    }

    fn save_file(&self, default_path: Option<&Path>) -> Option<PathBuf> {
        let mut dialog = with_filters(FileDialog::new().set_title("Save File"));

        if let Some(path) = default_path {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                dialog = dialog.set_directory(dir);
            }
            if let Some(name) = path.file_name() {
                dialog = dialog.set_file_name(name.to_string_lossy());
            }
        }

        dialog.save_file()
    }
}
