//! Registry of active directory watches, keyed by directory path.

use crate::error::Result;
use crate::events::EventSink;
use crate::watch::DirectoryWatch;
use log::{debug, info};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Owns every live `DirectoryWatch`.
///
/// At most one watch exists per directory: watching a path again closes the
/// previous handle first. The map is only touched by `watch`, `unwatch` and
/// `shutdown`; event delivery runs on the watcher threads and never takes
/// this lock. Dropping the registry shuts every watch down.
pub struct WatchRegistry {
    sink: Arc<dyn EventSink>,
    watches: Mutex<HashMap<PathBuf, DirectoryWatch>>,
}

impl std::fmt::Debug for WatchRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchRegistry")
            .field("watched", &self.watched_paths())
            .finish()
    }
}

impl WatchRegistry {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink,
            watches: Mutex::new(HashMap::new()),
        }
    }

    /// Start watching `path`, replacing any existing watch on it.
    ///
    /// The old handle is closed before the new one opens, so one change is
    /// never reported twice. If the new watch cannot be set up the error is
    /// returned and `path` is left unwatched.
    ///
    /// Spellings of the same directory (`/w`, `/w/`, `/w/./`) share one
    /// watch.
    pub fn watch(&self, path: &Path) -> Result<()> {
        let root = lexical(path);
        let key = watch_key(&root);
        let mut watches = self.lock();

        if let Some(mut previous) = watches.remove(&key) {
            debug!("Replacing existing watch on {}", previous.root().display());
            previous.close();
        }

        let watch = DirectoryWatch::open(root, Arc::clone(&self.sink))?;
        info!(
            "Watching directory {} ({} active)",
            watch.root().display(),
            watches.len() + 1
        );
        watches.insert(key, watch);
        Ok(())
    }

    /// Stop watching `path`. Returns whether a watch was registered.
    pub fn unwatch(&self, path: &Path) -> bool {
        let removed = {
            let mut watches = self.lock();
            let root = lexical(path);
            match watches.remove(&watch_key(&root)) {
                Some(watch) => Some(watch),
                // The directory may be gone, so it no longer canonicalizes
                None => {
                    let key = watches
                        .iter()
                        .find(|(_, watch)| watch.root() == root.as_path())
                        .map(|(key, _)| key.clone());
                    key.and_then(|key| watches.remove(&key))
                }
            }
        };
        match removed {
            Some(mut watch) => {
                watch.close();
                info!("Stopped watching {}", watch.root().display());
                true
            }
            None => false,
        }
    }

    /// Close every watch. Returns how many were open.
    pub fn shutdown(&self) -> usize {
        let drained: Vec<DirectoryWatch> = self.lock().drain().map(|(_, w)| w).collect();
        let count = drained.len();
        for mut watch in drained {
            watch.close();
        }
        if count > 0 {
            info!("Closed {} directory watch(es)", count);
        }
        count
    }

    pub fn is_watching(&self, path: &Path) -> bool {
        self.lock().contains_key(&watch_key(&lexical(path)))
    }

    /// Watched directories, as they were first spelled by the caller.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        self.lock()
            .values()
            .map(|watch| watch.root().to_path_buf())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, DirectoryWatch>> {
        self.watches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// `path` with redundant separators and `.` components removed.
fn lexical(path: &Path) -> PathBuf {
    path.components().collect()
}

/// Map key for a watched directory: its canonical path when it resolves.
fn watch_key(root: &Path) -> PathBuf {
    std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf())
}

impl Drop for WatchRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}
