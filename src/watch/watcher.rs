//! A single live directory watch.
//!
//! Wraps a recursive notify watcher on one directory and forwards the
//! changes it sees straight to an `EventSink`. The notify backend calls the
//! handler from one thread per watcher, so events of a single watch reach
//! the sink in OS order.

use crate::error::{Error, Result};
use crate::events::{BridgeEvent, EventSink, FileChangeKind};
use log::{debug, warn};
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Handle for one active OS-level watch.
///
/// Closing (explicitly or on drop) clears the liveness flag before the
/// underlying watcher is released; the event handler checks the flag before
/// every push, so nothing is delivered for a closed watch.
pub struct DirectoryWatch {
    root: PathBuf,
    live: Arc<AtomicBool>,
    watcher: Option<RecommendedWatcher>,
}

impl std::fmt::Debug for DirectoryWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryWatch")
            .field("root", &self.root)
            .field("active", &self.is_active())
            .finish()
    }
}

impl DirectoryWatch {
    /// Start a recursive watch on `root`, pushing events into `sink`.
    ///
    /// Fails if the watcher cannot be created or `root` cannot be watched
    /// (missing, not accessible). In that case nothing is ever pushed.
    pub fn open(root: PathBuf, sink: Arc<dyn EventSink>) -> Result<Self> {
        let live = Arc::new(AtomicBool::new(true));
        let filter = HiddenFilter::new(&root);

        let handler_live = Arc::clone(&live);
        let handler_root = root.clone();
        let mut watcher = RecommendedWatcher::new(
            move |result: notify::Result<Event>| {
                forward(result, &handler_root, &filter, &handler_live, sink.as_ref());
            },
            Config::default(),
        )
        .map_err(|source| Error::WatchSetup {
            path: root.clone(),
            source,
        })?;

        if let Err(source) = watcher.watch(&root, RecursiveMode::Recursive) {
            live.store(false, Ordering::SeqCst);
            return Err(Error::WatchSetup { path: root, source });
        }

        debug!("Watching {}", root.display());
        Ok(Self {
            root,
            live,
            watcher: Some(watcher),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_active(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Stop delivering events and release the OS watch. Idempotent.
    pub fn close(&mut self) {
        self.live.store(false, Ordering::SeqCst);
        if let Some(watcher) = self.watcher.take() {
            drop(watcher);
            debug!("Closed watch on {}", self.root.display());
        }
    }
}

impl Drop for DirectoryWatch {
    fn drop(&mut self) {
        self.close();
    }
}

/// Handle one raw notify result for the watch rooted at `root`.
fn forward(
    result: notify::Result<Event>,
    root: &Path,
    filter: &HiddenFilter,
    live: &AtomicBool,
    sink: &dyn EventSink,
) {
    match result {
        Ok(event) => {
            for (kind, path) in classify(&event) {
                if filter.is_hidden(&path) {
                    continue;
                }
                // Event paths travel as JSON strings
                if path.to_str().is_none() {
                    debug!("Skipping non-UTF-8 path {}", path.display());
                    continue;
                }
                if !live.load(Ordering::SeqCst) {
                    return;
                }
                sink.push(kind.into_event(path));
            }
        }
        Err(e) => {
            if !live.load(Ordering::SeqCst) {
                return;
            }
            warn!("Watcher error for {}: {}", root.display(), e);
            sink.push(BridgeEvent::WatchError {
                path: root.to_path_buf(),
                message: e.to_string(),
            });
        }
    }
}

/// Map a notify event onto the file-level changes the UI cares about.
///
/// Directory creation/removal and metadata-only changes are not reported.
/// Renames show up as a removal of the old path and an addition of the new
/// one.
pub(crate) fn classify(event: &Event) -> Vec<(FileChangeKind, PathBuf)> {
    let kind = match event.kind {
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => None,
        EventKind::Create(CreateKind::Any) => {
            return files_only(event, FileChangeKind::Added);
        }
        EventKind::Create(_) => Some(FileChangeKind::Added),
        EventKind::Remove(_) => Some(FileChangeKind::Removed),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(FileChangeKind::Removed),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(FileChangeKind::Added),
        // Backends that emit `Both` also emit the `From`/`To` halves
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => None,
        EventKind::Modify(ModifyKind::Name(_)) => {
            return event
                .paths
                .iter()
                .map(|path| {
                    let kind = if path.exists() {
                        FileChangeKind::Added
                    } else {
                        FileChangeKind::Removed
                    };
                    (kind, path.clone())
                })
                .collect();
        }
        EventKind::Modify(_) => {
            return files_only(event, FileChangeKind::Changed);
        }
        // Access, Any, Other
        _ => None,
    };

    match kind {
        Some(kind) => event.paths.iter().map(|p| (kind, p.clone())).collect(),
        None => Vec::new(),
    }
}

fn files_only(event: &Event, kind: FileChangeKind) -> Vec<(FileChangeKind, PathBuf)> {
    event
        .paths
        .iter()
        .filter(|path| !path.is_dir())
        .map(|path| (kind, path.clone()))
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Dotfile Policy
// ─────────────────────────────────────────────────────────────────────────────

/// Skips paths with a dot-prefixed component below the watch root.
///
/// Only the part of the path inside the watched directory is checked, so a
/// watch on e.g. `~/.config/app` still reports its own files.
pub(crate) struct HiddenFilter {
    root: PathBuf,
    canonical_root: Option<PathBuf>,
}

impl HiddenFilter {
    pub(crate) fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            canonical_root: std::fs::canonicalize(root).ok(),
        }
    }

    pub(crate) fn is_hidden(&self, path: &Path) -> bool {
        let relative = path
            .strip_prefix(&self.root)
            .ok()
            .or_else(|| {
                self.canonical_root
                    .as_deref()
                    .and_then(|root| path.strip_prefix(root).ok())
            })
            .or_else(|| path.file_name().map(Path::new));

        relative.is_some_and(|rel| {
            rel.components().any(|component| match component {
                Component::Normal(name) => name.to_string_lossy().starts_with('.'),
                _ => false,
            })
        })
    }
}
