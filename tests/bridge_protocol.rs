//! End-to-end tests of the line-delimited request protocol.

use kio::config::SettingsStore;
use kio::files::{DialogProvider, NativeDialogs};
use kio::{serve, Bridge, BridgeEvent};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{duplex, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};
use tokio::sync::mpsc::unbounded_channel;
use tokio::task::JoinHandle;

const WAIT: Duration = Duration::from_secs(5);
const SETTLE: Duration = Duration::from_millis(750);

struct NoDialogs;

impl DialogProvider for NoDialogs {
    fn pick_file(&self) -> Option<PathBuf> {
        None
    }

    fn pick_folder(&self) -> Option<PathBuf> {
        None
    }

    fn save_file(&self, _default_path: Option<&Path>) -> Option<PathBuf> {
        None
    }
}

struct Harness {
    input: Option<DuplexStream>,
    output: Lines<BufReader<DuplexStream>>,
    events: VecDeque<Value>,
    server: JoinHandle<kio::Result<()>>,
    next_id: u64,
    _config: TempDir,
}

impl Harness {
    fn start() -> Self {
        Self::start_with(Arc::new(NoDialogs))
    }

    fn start_with(dialogs: Arc<dyn DialogProvider>) -> Self {
        let config = TempDir::new().unwrap();
        let store = Arc::new(SettingsStore::load(config.path().join("config.json")));
        let (tx, rx) = unbounded_channel::<BridgeEvent>();
        let bridge = Arc::new(Bridge::new(store, Arc::new(tx), dialogs));

        let (client_in, server_in) = duplex(64 * 1024);
        let (server_out, client_out) = duplex(64 * 1024);
        let server = tokio::spawn(serve(bridge, rx, BufReader::new(server_in), server_out));

        Self {
            input: Some(client_in),
            output: BufReader::new(client_out).lines(),
            events: VecDeque::new(),
            server,
            next_id: 0,
            _config: config,
        }
    }

    async fn send_line(&mut self, line: &str) {
        self.send_bytes(line.as_bytes()).await;
    }

    async fn send_bytes(&mut self, line: &[u8]) {
        let input = self.input.as_mut().expect("input already closed");
        input.write_all(line).await.unwrap();
        input.write_all(b"\n").await.unwrap();
    }

    async fn read_line(&mut self, wait: Duration) -> Option<Value> {
        match tokio::time::timeout(wait, self.output.next_line()).await {
            Ok(Ok(Some(line))) => Some(serde_json::from_str(&line).unwrap()),
            _ => None,
        }
    }

    /// Send a request and wait for its reply, keeping events for later.
    async fn request(&mut self, op: &str, args: Value) -> Value {
        self.next_id += 1;
        let id = self.next_id;
        let line = json!({"id": id, "op": op, "args": args}).to_string();
        self.send_line(&line).await;
        self.reply_for(json!(id)).await
    }

    async fn reply_for(&mut self, id: Value) -> Value {
        loop {
            let message = self.read_line(WAIT).await.expect("no reply");
            if message.get("event").is_some() {
                self.events.push_back(message);
            } else if message["id"] == id {
                return message;
            }
        }
    }

    async fn next_event(&mut self, wait: Duration) -> Option<Value> {
        if let Some(event) = self.events.pop_front() {
            return Some(event);
        }
        loop {
            let message = self.read_line(wait).await?;
            if message.get("event").is_some() {
                return Some(message);
            }
        }
    }

    /// Every event that arrives within the settle window.
    async fn settle_events(&mut self) -> Vec<Value> {
        let mut events: Vec<Value> = self.events.drain(..).collect();
        while let Some(event) = self.next_event(SETTLE).await {
            events.push(event);
        }
        events
    }

    async fn close(mut self) -> (kio::Result<()>, Vec<Value>) {
        drop(self.input.take());
        let mut trailing = Vec::new();
        while let Some(message) = self.read_line(WAIT).await {
            trailing.push(message);
        }
        let result = self.server.await.unwrap();
        (result, trailing)
    }
}

fn added(events: &[Value], path: &Path) -> usize {
    let path = path.to_string_lossy();
    events
        .iter()
        .filter(|e| e["event"] == "fileAdded" && e["path"] == json!(path))
        .count()
}

#[tokio::test]
async fn settings_arrive_only_after_ready_signal() {
    let mut harness = Harness::start();

    assert!(harness.next_event(Duration::from_millis(200)).await.is_none());

    let reply = harness.request("uiReady", Value::Null).await;
    assert_eq!(reply["success"], true);

    let event = harness.next_event(WAIT).await.expect("settingsLoaded");
    assert_eq!(event["event"], "settingsLoaded");
    assert_eq!(event["settings"]["theme"], "vs-dark");
    assert_eq!(event["settings"]["tabSize"], 2);

    let (result, _) = harness.close().await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn settings_patches_merge() {
    let mut harness = Harness::start();

    let a = harness.request("updateSettings", json!({"wordWrap": true})).await;
    let b = harness.request("updateSettings", json!({"zenMode": true})).await;
    assert_eq!(a["success"], true);
    assert_eq!(b["success"], true);

    let reply = harness.request("getSettings", Value::Null).await;
    let settings = &reply["data"];
    assert_eq!(settings["wordWrap"], true);
    assert_eq!(settings["zenMode"], true);
    assert_eq!(settings["theme"], "vs-dark");
    assert_eq!(settings["minimap"], true);

    harness.close().await;
}

#[tokio::test]
async fn write_then_read_round_trip() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("p.txt");
    let mut harness = Harness::start();

    let write = harness
        .request("writeFile", json!({"path": file, "content": "x"}))
        .await;
    assert_eq!(write["success"], true);

    let read = harness.request("readFile", json!({"path": file})).await;
    assert_eq!(read, json!({"id": 2, "success": true, "data": "x"}));

    let recent = harness.request("recentFiles", Value::Null).await;
    assert_eq!(recent["data"][0]["displayLabel"], "p.txt");

    harness.close().await;
}

#[tokio::test]
async fn reading_missing_file_fails_without_crashing() {
    let dir = TempDir::new().unwrap();
    let mut harness = Harness::start();

    let reply = harness
        .request("readFile", json!({"path": dir.path().join("absent.txt")}))
        .await;
    assert_eq!(reply["success"], false);
    assert!(!reply["error"].as_str().unwrap().is_empty());

    // The bridge keeps serving
    let exists = harness
        .request("pathExists", json!({"path": dir.path()}))
        .await;
    assert_eq!(exists["data"], true);

    harness.close().await;
}

#[tokio::test]
async fn list_directory_reports_files_and_folders() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("f"), "0123456789").unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    let mut harness = Harness::start();

    let reply = harness
        .request("listDirectory", json!({"path": dir.path()}))
        .await;
    let mut entries = reply["data"].as_array().unwrap().clone();
    entries.sort_by_key(|e| e["name"].as_str().unwrap().to_string());

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["name"], "f");
    assert_eq!(entries[0]["isDirectory"], false);
    assert_eq!(entries[0]["size"], 10);
    assert!(entries[0]["modified"].is_string());
    assert_eq!(entries[1]["name"], "sub");
    assert_eq!(entries[1]["isDirectory"], true);

    harness.close().await;
}

#[tokio::test]
async fn watch_streams_events_until_unwatch() {
    let dir = TempDir::new().unwrap();
    let mut harness = Harness::start();

    let reply = harness
        .request("watchDirectory", json!({"path": dir.path()}))
        .await;
    assert_eq!(reply["success"], true);

    let file = dir.path().join("created.rs");
    std::fs::write(&file, "fn main() {}").unwrap();
    let events = harness.settle_events().await;
    assert_eq!(added(&events, &file), 1, "events: {:?}", events);

    let reply = harness
        .request("unwatchDirectory", json!({"path": dir.path()}))
        .await;
    assert_eq!(reply["success"], true);

    std::fs::write(dir.path().join("after.rs"), "// late").unwrap();
    std::fs::remove_file(&file).unwrap();
    assert!(harness.settle_events().await.is_empty());

    harness.close().await;
}

#[tokio::test]
async fn watching_twice_does_not_duplicate_events() {
    let dir = TempDir::new().unwrap();
    let mut harness = Harness::start();

    harness
        .request("watchDirectory", json!({"path": dir.path()}))
        .await;
    harness
        .request("watchDirectory", json!({"path": dir.path()}))
        .await;

    let file = dir.path().join("single.md");
    std::fs::write(&file, "# once").unwrap();

    let events = harness.settle_events().await;
    assert_eq!(added(&events, &file), 1, "events: {:?}", events);

    harness.close().await;
}

#[tokio::test]
async fn closing_input_shuts_down_watches() {
    let dir = TempDir::new().unwrap();
    let mut harness = Harness::start();
    harness
        .request("watchDirectory", json!({"path": dir.path()}))
        .await;

    let (result, _) = harness.close().await;
    assert!(result.is_ok());

    // Nothing is listening any more; this must not panic or hang
    std::fs::write(dir.path().join("orphan.txt"), "x").unwrap();
}

#[tokio::test]
async fn missing_recent_file_notifies_user() {
    let dir = TempDir::new().unwrap();
    let gone = dir.path().join("deleted.rs");
    let mut harness = Harness::start();

    let reply = harness
        .request("openRecentFile", json!({"path": gone}))
        .await;
    assert_eq!(reply["success"], false);

    let event = harness.next_event(WAIT).await.expect("notification");
    assert_eq!(event["event"], "notification");
    assert_eq!(event["level"], "error");
    assert!(event["message"]
        .as_str()
        .unwrap()
        .starts_with("File not found:"));

    harness.close().await;
}

#[tokio::test]
async fn contract_violations_fail_fast() {
    let mut harness = Harness::start();

    harness.send_line("this is not json").await;
    let reply = harness.reply_for(Value::Null).await;
    assert_eq!(reply["success"], false);
    assert!(reply["error"]
        .as_str()
        .unwrap()
        .contains("malformed request envelope"));

    let unknown = harness.request("formatDisk", Value::Null).await;
    assert_eq!(unknown["success"], false);
    assert!(unknown["error"].as_str().unwrap().contains("formatDisk"));

    let bad_args = harness.request("writeFile", json!({"path": 3})).await;
    assert_eq!(bad_args["success"], false);

    harness.close().await;
}

#[tokio::test]
async fn non_utf8_line_fails_alone() {
    let dir = TempDir::new().unwrap();
    let mut harness = Harness::start();

    harness
        .send_bytes(b"{\"id\":99,\"op\":\"pathExists\",\"args\":{\"path\":\"\xff\"}}")
        .await;
    let rejected = harness.reply_for(Value::Null).await;
    assert_eq!(rejected["success"], false);
    assert!(rejected["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request"));

    let exists = harness
        .request("pathExists", json!({"path": dir.path()}))
        .await;
    assert_eq!(exists["data"], true);

    let (result, _) = harness.close().await;
    assert!(result.is_ok());
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn listing_survives_non_utf8_names() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("ok.txt"), "ok").unwrap();
    std::fs::write(dir.path().join(OsStr::from_bytes(b"bad\xff.txt")), "?").unwrap();
    let mut harness = Harness::start();

    let reply = harness
        .request("listDirectory", json!({"path": dir.path()}))
        .await;
    assert_eq!(reply["success"], true, "reply: {}", reply);
    let entries = reply["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["name"], "ok.txt");

    harness.close().await;
}

#[tokio::test]
async fn shell_requests_validate_arguments() {
    let dir = TempDir::new().unwrap();
    let mut harness = Harness::start();

    let local = harness
        .request("openExternal", json!({"url": "file:///etc/hosts"}))
        .await;
    assert_eq!(local["success"], false);
    assert!(local["error"].as_str().unwrap().starts_with("Invalid request"));

    let missing = harness
        .request("showInFolder", json!({"path": dir.path().join("gone.md")}))
        .await;
    assert_eq!(missing["success"], false);
    assert!(missing["error"]
        .as_str()
        .unwrap()
        .starts_with("File not found:"));

    harness.close().await;
}

#[tokio::test]
async fn dialogs_report_cancellation() {
    let mut harness = Harness::start();

    let reply = harness.request("openFolderDialog", Value::Null).await;
    assert_eq!(
        reply["data"],
        json!({"canceled": true, "filePaths": []})
    );

    harness.close().await;
}

#[test]
fn native_dialogs_implement_provider() {
    fn assert_provider<T: DialogProvider>() {}
    assert_provider::<NativeDialogs>();
}
