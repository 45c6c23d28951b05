//! Handing paths and links to the desktop shell
//!
//! Folders open in the system file manager and links in the default
//! browser or mail client, through the `open` crate. The dispatch boundary
//! only sees the `Launcher` trait.

use crate::error::{Error, Result};
use std::io;
use std::path::{Path, PathBuf};

/// URL schemes `openExternal` will hand to the shell.
const EXTERNAL_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Opens things outside the editor.
///
/// Calls may block while the platform launcher starts; the boundary runs
/// them on the blocking thread pool.
pub trait Launcher: Send + Sync {
    /// Show `folder` in the system file manager.
    fn open_folder(&self, folder: &Path) -> io::Result<()>;

    /// Open `url` with its default handler.
    fn open_url(&self, url: &str) -> io::Result<()>;
}

/// Launcher backed by the platform's `open` / `xdg-open` / `start`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn open_folder(&self, folder: &Path) -> io::Result<()> {
        open::that(folder)
    }

    fn open_url(&self, url: &str) -> io::Result<()> {
        open::that(url)
    }
}

/// The folder to show for `path`: the path itself when it is a directory,
/// otherwise its parent.
pub async fn containing_folder(path: &Path) -> Result<PathBuf> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|_| Error::Application(format!("File not found: {}", path.display())))?;

    if metadata.is_dir() {
        return Ok(path.to_path_buf());
    }
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => Ok(parent.to_path_buf()),
        None => Ok(PathBuf::from(".")),
    }
}

/// Check that `url` uses a scheme the shell may open.
pub fn validate_external_url(url: &str) -> Result<()> {
    let scheme = url
        .split_once(':')
        .map(|(scheme, _)| scheme.to_ascii_lowercase())
        .filter(|scheme| !scheme.is_empty());

    match scheme {
        Some(scheme) if EXTERNAL_SCHEMES.contains(&scheme.as_str()) => Ok(()),
        _ => Err(Error::InvalidRequest(format!(
            "`openExternal` only opens {} links, got `{}`",
            EXTERNAL_SCHEMES.join("/"),
            url
        ))),
    }
}
