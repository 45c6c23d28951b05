//! The bridge service: routes requests to the settings store, the file
//! gateway, the watch registry and the dialogs, and pushes events to the UI.

use crate::bridge::{Payload, Request, Response};
use crate::config::SettingsStore;
use crate::error::{Error, Result};
use crate::events::{BridgeEvent, EventSink, NotificationLevel};
use crate::files::launcher::containing_folder;
use crate::files::{DialogProvider, DialogSelection, FileGateway, Launcher, SystemLauncher};
use crate::watch::WatchRegistry;
use log::{debug, info, warn};
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The single service object behind the request boundary.
///
/// Constructed once per UI surface. Dropping it (or calling `shutdown`)
/// closes every directory watch.
pub struct Bridge {
    settings: Arc<SettingsStore>,
    files: FileGateway,
    watches: Arc<WatchRegistry>,
    dialogs: Arc<dyn DialogProvider>,
    launcher: Arc<dyn Launcher>,
    events: Arc<dyn EventSink>,
    ui_ready: AtomicBool,
}

impl Bridge {
    pub fn new(
        settings: Arc<SettingsStore>,
        events: Arc<dyn EventSink>,
        dialogs: Arc<dyn DialogProvider>,
    ) -> Self {
        Self {
            files: FileGateway::new(Arc::clone(&settings)),
            watches: Arc::new(WatchRegistry::new(Arc::clone(&events))),
            settings,
            dialogs,
            launcher: Arc::new(SystemLauncher),
            events,
            ui_ready: AtomicBool::new(false),
        }
    }

    /// Replace the desktop shell hand-off (folders, links).
    pub fn with_launcher(mut self, launcher: Arc<dyn Launcher>) -> Self {
        self.launcher = launcher;
        self
    }

    pub fn watches(&self) -> &WatchRegistry {
        &self.watches
    }

    /// Decode and run a request given as wire operation name plus arguments.
    pub async fn handle_raw(&self, op: &str, args: Value) -> Response {
        match Request::parse(op, args) {
            Ok(request) => self.handle(request).await,
            Err(err) => {
                warn!("Rejected request: {}", err);
                Response::Failure(err.to_string())
            }
        }
    }

    /// Run a request. Failures come back as `Response::Failure`.
    pub async fn handle(&self, request: Request) -> Response {
        let op = request.op();
        debug!("Handling {}", op);

        let result = self.execute(request).await;
        if let Err(err) = &result {
            warn!("{} failed: {}", op, err);
        }
        Response::from(result)
    }

    async fn execute(&self, request: Request) -> Result<Payload> {
        match request {
            Request::GetSettings => Ok(Payload::Settings(self.settings.get_all())),
            Request::UpdateSettings(patch) => {
                let settings = Arc::clone(&self.settings);
                blocking(move || settings.patch(patch)).await?;
                Ok(Payload::Ack)
            }
            Request::ReadFile { path } => self.files.read_file(&path).await.map(Payload::Content),
            Request::WriteFile { path, content } => {
                self.files.write_file(&path, &content).await?;
                Ok(Payload::Ack)
            }
            Request::ListDirectory { path } => {
                self.files.list_directory(&path).await.map(Payload::Entries)
            }
            Request::WatchDirectory { path } => {
                let watches = Arc::clone(&self.watches);
                blocking(move || watches.watch(&path)).await??;
                Ok(Payload::Ack)
            }
            Request::UnwatchDirectory { path } => {
                self.watches.unwatch(&path);
                Ok(Payload::Ack)
            }
            Request::PathExists { path } => {
                Ok(Payload::Exists(self.files.path_exists(&path).await))
            }
            Request::RecentFiles => Ok(Payload::RecentFiles(self.settings.recent_files_for_menu())),
            Request::OpenRecentFile { path } => self.open_recent_file(&path).await,
            Request::OpenFileDialog => {
                let dialogs = Arc::clone(&self.dialogs);
                let picked = blocking(move || dialogs.pick_file()).await?;
                Ok(Payload::Selection(DialogSelection::from_pick(picked)))
            }
            Request::OpenFolderDialog => {
                let dialogs = Arc::clone(&self.dialogs);
                let picked = blocking(move || dialogs.pick_folder()).await?;
                Ok(Payload::Selection(DialogSelection::from_pick(picked)))
            }
            Request::SaveFileDialog { default_path } => {
                let dialogs = Arc::clone(&self.dialogs);
                let picked = blocking(move || dialogs.save_file(default_path.as_deref())).await?;
                Ok(Payload::Selection(DialogSelection::from_pick(picked)))
            }
            Request::ShowInFolder { path } => {
                let folder = containing_folder(&path).await?;
                let launcher = Arc::clone(&self.launcher);
                let target = folder.clone();
                blocking(move || launcher.open_folder(&target))
                    .await?
                    .map_err(|source| Error::Launch {
                        target: folder.display().to_string(),
                        source,
                    })?;
                debug!("Revealed {} in file manager", folder.display());
                Ok(Payload::Ack)
            }
            Request::OpenExternal { url } => {
                let launcher = Arc::clone(&self.launcher);
                let target = url.clone();
                blocking(move || launcher.open_url(&target))
                    .await?
                    .map_err(|source| Error::Launch {
                        target: url.clone(),
                        source,
                    })?;
                debug!("Opened external link {}", url);
                Ok(Payload::Ack)
            }
            Request::UiReady => {
                self.mark_ui_ready();
                Ok(Payload::Ack)
            }
        }
    }

    /// Reopen an entry from the recent-files menu.
    ///
    /// The path is only checked here, when the user picks it. A missing file
    /// is reported to the user and as a failed request.
    async fn open_recent_file(&self, path: &Path) -> Result<Payload> {
        if self.files.path_exists(path).await {
            self.events.push(BridgeEvent::OpenFile {
                path: path.to_path_buf(),
            });
            Ok(Payload::Ack)
        } else {
            let message = format!("File not found: {}", path.display());
            self.events.push(BridgeEvent::Notification {
                level: NotificationLevel::Error,
                message: message.clone(),
            });
            Err(Error::Application(message))
        }
    }

    /// Record that the UI surface can receive events, and send it the
    /// settings snapshot. Only the first call pushes anything.
    pub fn mark_ui_ready(&self) -> bool {
        if self.ui_ready.swap(true, Ordering::SeqCst) {
            return false;
        }
        info!("UI surface ready, sending settings");
        self.events.push(BridgeEvent::SettingsLoaded {
            settings: self.settings.get_all(),
        });
        true
    }

    /// Close every directory watch. Safe to call more than once.
    pub fn shutdown(&self) -> usize {
        self.watches.shutdown()
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Run blocking work (disk flushes, dialogs, shell hand-off, watch setup)
/// off the async workers.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Application(format!("Background task failed: {}", e)))
}
