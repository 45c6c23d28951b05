//! Filesystem operations exposed to the UI surface.
//!
//! Every operation returns a crate `Result`; the dispatch boundary turns
//! failures into their display text, so nothing here panics or aborts the
//! caller. Reads and writes of user documents record the path in the
//! recent-files list.

use crate::config::SettingsStore;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Counter that keeps concurrent staging files for the same target apart.
static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

// ─────────────────────────────────────────────────────────────────────────────
// Directory Entry
// ─────────────────────────────────────────────────────────────────────────────

/// One immediate child of a listed directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    /// File or folder name
    pub name: String,
    /// Full path to the child
    pub path: PathBuf,
    /// Whether the child (after following symlinks) is a directory
    pub is_directory: bool,
    /// Size in bytes as reported by the OS
    pub size: u64,
    /// Last modification time
    pub modified: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// File Gateway
// ─────────────────────────────────────────────────────────────────────────────

/// Reads, writes and lists files on behalf of the UI surface.
#[derive(Debug, Clone)]
pub struct FileGateway {
    settings: Arc<SettingsStore>,
}

impl FileGateway {
    pub fn new(settings: Arc<SettingsStore>) -> Self {
        Self { settings }
    }

    /// Read a whole file as UTF-8 text and record it as recently opened.
    ///
    /// Missing files, permission problems and non-UTF-8 content all surface
    /// as `Error::FileRead`.
    pub async fn read_file(&self, path: &Path) -> Result<String> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|source| Error::FileRead {
                path: path.to_path_buf(),
                source,
            })?;

        debug!("Read {} bytes from {}", content.len(), path.display());
        self.record_opened(path).await;
        Ok(content)
    }

    /// Replace the contents of `path` (creating it if needed) and record it
    /// as recently opened.
    ///
    /// The content goes to a hidden staging file next to the target, is
    /// synced, and is then renamed over the target. Readers see either the
    /// old file or the complete new one, never a truncated file. A symlink
    /// target is written through: the file it points at is replaced and the
    /// link stays.
    pub async fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        let target = resolve_link(path).await;
        let staging = staging_path_for(&target);

        if let Err(source) = write_staged(&target, &staging, content).await {
            if let Err(e) = fs::remove_file(&staging).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(
                        "Failed to clean up staging file {}: {}",
                        staging.display(),
                        e
                    );
                }
            }
            return Err(Error::FileWrite {
                path: path.to_path_buf(),
                source,
            });
        }

        debug!("Wrote {} bytes to {}", content.len(), path.display());
        self.record_opened(path).await;
        Ok(())
    }

    /// List the immediate children of `path` in enumeration order.
    ///
    /// Children that cannot be stat'ed (broken symlinks, entries removed
    /// while listing) or whose path is not valid UTF-8 are left out. Only a
    /// failure to open or walk the directory itself fails the call.
    pub async fn list_directory(&self, path: &Path) -> Result<Vec<DirectoryEntry>> {
        let list_err = |source: std::io::Error| Error::DirectoryList {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = fs::read_dir(path).await.map_err(list_err)?;
        let mut entries = Vec::new();

        while let Some(child) = reader.next_entry().await.map_err(list_err)? {
            let child_path = child.path();
            if child_path.to_str().is_none() {
                debug!("Skipping non-UTF-8 path {}", child_path.display());
                continue;
            }
            match stat_entry(child.file_name(), &child_path).await {
                Ok(entry) => entries.push(entry),
                Err(e) => debug!("Skipping {}: {}", child_path.display(), e),
            }
        }

        Ok(entries)
    }

    /// Whether anything exists at `path`. Errors while checking count as
    /// "does not exist".
    pub async fn path_exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    async fn record_opened(&self, path: &Path) {
        let settings = Arc::clone(&self.settings);
        let path = path.to_path_buf();
        if let Err(e) = tokio::task::spawn_blocking(move || settings.record_opened(&path)).await {
            warn!("Recording recent file failed: {}", e);
        }
    }
}

async fn stat_entry(name: OsString, path: &Path) -> std::io::Result<DirectoryEntry> {
    let metadata = fs::metadata(path).await?;
    let modified = metadata.modified()?;

    Ok(DirectoryEntry {
        name: name.to_string_lossy().into_owned(),
        path: path.to_path_buf(),
        is_directory: metadata.is_dir(),
        size: metadata.len(),
        modified: DateTime::<Utc>::from(modified),
    })
}

/// The file a write to `path` should land in: the final destination when
/// `path` is a symlink (even a dangling one), `path` itself otherwise.
async fn resolve_link(path: &Path) -> PathBuf {
    match fs::symlink_metadata(path).await {
        Ok(metadata) if metadata.file_type().is_symlink() => {
            if let Ok(real) = fs::canonicalize(path).await {
                return real;
            }
            match fs::read_link(path).await {
                Ok(dest) => match path.parent() {
                    Some(parent) => parent.join(dest),
                    None => dest,
                },
                Err(e) => {
                    warn!("Failed to read link {}: {}", path.display(), e);
                    path.to_path_buf()
                }
            }
        }
        _ => path.to_path_buf(),
    }
}

/// Hidden sibling of `target` used to stage a write.
///
/// The leading dot keeps the staging file out of directory watch events.
fn staging_path_for(target: &Path) -> PathBuf {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let n = STAGING_COUNTER.fetch_add(1, Ordering::Relaxed);
    target.with_file_name(format!(".{}.kio-{}-{}.tmp", file_name, std::process::id(), n))
}

async fn write_staged(target: &Path, staging: &Path, content: &str) -> std::io::Result<()> {
    let mut file = fs::File::create(staging).await?;
    file.write_all(content.as_bytes()).await?;
    file.sync_all().await?;
    drop(file);

    // Keep the mode of the file being replaced
    if let Ok(existing) = fs::metadata(target).await {
        fs::set_permissions(staging, existing.permissions()).await?;
    }

    fs::rename(staging, target).await
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
