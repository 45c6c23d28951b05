//! Kio - Main Entry Point
//!
//! Runs the workspace bridge for one editor window: requests arrive as JSON
//! lines on stdin, replies and pushed events leave as JSON lines on stdout.
//! Logs go to stderr.

use kio::config::{get_config_file_path, SettingsStore};
use kio::error::ResultExt;
use kio::files::NativeDialogs;
use kio::{serve, Bridge, BridgeEvent};
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::sync::mpsc::unbounded_channel;

/// Application name constant.
const APP_NAME: &str = "Kio";

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting {} workspace bridge", APP_NAME);

    let config_path = get_config_file_path().unwrap_or_warn_default(
        PathBuf::from("kio-config.json"),
        "Could not resolve the config directory",
    );
    let settings = Arc::new(SettingsStore::load(config_path));
    info!("Settings file: {}", settings.config_path().display());
    let (events_tx, events_rx) = unbounded_channel::<BridgeEvent>();
    let bridge = Arc::new(Bridge::new(
        settings,
        Arc::new(events_tx),
        Arc::new(NativeDialogs),
    ));

    let result = serve(
        Arc::clone(&bridge),
        events_rx,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await;

    // Also covers the error path; a second call is a no-op
    bridge.shutdown();

    match result {
        Ok(()) => {
            info!("{} shut down cleanly", APP_NAME);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{} stopped: {}", APP_NAME, e);
            ExitCode::FAILURE
        }
    }
}
