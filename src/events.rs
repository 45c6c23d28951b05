//! Events pushed from the bridge to the UI surface.
//!
//! These are unsolicited, one-way messages: directory watch notifications,
//! the initial settings snapshot, and requests for the UI to open a file or
//! show a notification.

use crate::config::Settings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedSender;

/// A message pushed to the UI surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum BridgeEvent {
    /// A file under a watched directory was modified
    FileChanged { path: PathBuf },
    /// A file appeared under a watched directory
    FileAdded { path: PathBuf },
    /// A file disappeared from a watched directory
    FileRemoved { path: PathBuf },
    /// The OS watcher for `path` reported an error
    WatchError { path: PathBuf, message: String },
    /// Initial settings, sent once the UI reports it is ready
    SettingsLoaded { settings: Settings },
    /// Ask the UI to open `path` in an editor tab
    OpenFile { path: PathBuf },
    /// A message the UI should show to the user
    Notification {
        level: NotificationLevel,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Error,
}

/// The kinds of change a directory watch reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChangeKind {
    Changed,
    Added,
    Removed,
}

impl FileChangeKind {
    pub fn into_event(self, path: PathBuf) -> BridgeEvent {
        match self {
            FileChangeKind::Changed => BridgeEvent::FileChanged { path },
            FileChangeKind::Added => BridgeEvent::FileAdded { path },
            FileChangeKind::Removed => BridgeEvent::FileRemoved { path },
        }
    }
}

/// Destination for pushed events.
///
/// Implementations must not block: `push` is called from OS watcher threads.
pub trait EventSink: Send + Sync {
    /// Deliver an event. Returns `false` when the UI surface is gone.
    fn push(&self, event: BridgeEvent) -> bool;
}

impl EventSink for UnboundedSender<BridgeEvent> {
    fn push(&self, event: BridgeEvent) -> bool {
        self.send(event).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_file_event_wire_shape() {
        let event = FileChangeKind::Added.into_event(PathBuf::from("/w/new.rs"));
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"event": "fileAdded", "path": "/w/new.rs"})
        );
    }

    #[test]
    fn test_notification_wire_shape() {
        let event = BridgeEvent::Notification {
            level: NotificationLevel::Error,
            message: "File not found: /x".into(),
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"event": "notification", "level": "error", "message": "File not found: /x"})
        );
    }

    #[test]
    fn test_channel_sink_reports_closed_receiver() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<BridgeEvent>();
        assert!(tx.push(BridgeEvent::OpenFile { path: "/a".into() }));
        drop(rx);
        assert!(!tx.push(BridgeEvent::OpenFile { path: "/b".into() }));
    }
}
