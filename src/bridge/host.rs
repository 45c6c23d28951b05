//! Line-delimited JSON transport between the bridge and the UI surface.
//!
//! Each input line is a request envelope `{"id": .., "op": "..", "args": {..}}`.
//! Each output line is either a reply `{"id": .., "success": .., ...}` or a
//! pushed event `{"event": "..", ...}`. Requests run concurrently, so replies
//! may come back in a different order than the requests went in.

use crate::bridge::{Bridge, Response};
use crate::error::{Error, Result};
use crate::events::BridgeEvent;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task::JoinSet;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    id: Value,
    op: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize)]
struct Reply<'a> {
    id: &'a Value,
    #[serde(flatten)]
    response: &'a Response,
}

/// Serve requests from `input` until it closes, writing replies and pushed
/// events to `output`.
///
/// `events` must be the receiving end of the sink the bridge was built with.
/// A line that is not UTF-8 or not a request envelope gets a failure reply
/// with a `null` id and serving continues. All directory watches are closed before this returns, whether the input
/// ended normally or with an error.
pub async fn serve<R, W>(
    bridge: Arc<Bridge>,
    mut events: UnboundedReceiver<BridgeEvent>,
    mut input: R,
    output: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (out_tx, out_rx) = unbounded_channel::<String>();
    let writer = tokio::spawn(write_lines(out_rx, output));

    let event_tx = out_tx.clone();
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let forwarder = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                event = events.recv() => match event {
                    Some(event) => {
                        if !forward_event(&event_tx, &event) {
                            return;
                        }
                    }
                    None => return,
                },
                _ = &mut stop_rx => {
                    // Flush whatever was pushed before shutdown
                    while let Ok(event) = events.try_recv() {
                        if !forward_event(&event_tx, &event) {
                            return;
                        }
                    }
                    return;
                }
            }
        }
    });

    let mut in_flight = JoinSet::new();
    let mut buf = Vec::new();
    let read_result = loop {
        buf.clear();
        match input.read_until(b'\n', &mut buf).await {
            Ok(0) => {
                debug!("UI surface closed its request stream");
                break Ok(());
            }
            Ok(_) => {
                let line = match std::str::from_utf8(&buf) {
                    Ok(line) if line.trim().is_empty() => continue,
                    Ok(line) => line.to_owned(),
                    Err(e) => {
                        let err = Error::InvalidRequest(format!("request is not UTF-8: {}", e));
                        let _ = out_tx.send(failure_reply(err));
                        continue;
                    }
                };
                let bridge = Arc::clone(&bridge);
                let out_tx = out_tx.clone();
                in_flight.spawn(async move {
                    let reply = dispatch_line(&bridge, &line).await;
                    let _ = out_tx.send(reply);
                });
            }
            Err(e) => {
                error!("Failed to read request stream: {}", e);
                break Err(Error::Io(e));
            }
        }
    };

    // Writes in progress are never cut short
    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            error!("Request task failed: {}", e);
        }
    }

    let closed = bridge.shutdown();
    info!("Bridge stopped, {} watch(es) closed", closed);

    let _ = stop_tx.send(());
    if let Err(e) = forwarder.await {
        warn!("Event forwarder stopped: {}", e);
    }
    drop(out_tx);
    match writer.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Failed to flush output: {}", e),
        Err(e) => warn!("Output writer stopped: {}", e),
    }

    read_result
}

/// Queue one event line. Returns `false` once the output side is gone.
fn forward_event(out: &UnboundedSender<String>, event: &BridgeEvent) -> bool {
    match serde_json::to_string(event) {
        Ok(line) => out.send(line).is_ok(),
        Err(e) => {
            warn!("Dropping unserializable event: {}", e);
            true
        }
    }
}

/// Decode one request line, run it, and encode the reply line.
async fn dispatch_line(bridge: &Bridge, line: &str) -> String {
    match serde_json::from_str::<Envelope>(line) {
        Ok(Envelope { id, op, args }) => {
            let response = bridge.handle_raw(&op, args).await;
            encode_reply(&id, &response)
        }
        Err(e) => failure_reply(Error::InvalidRequest(format!(
            "malformed request envelope: {}",
            e
        ))),
    }
}

/// Reply line for input that never became a request, so it has no id.
fn failure_reply(err: Error) -> String {
    warn!("{}", err);
    encode_reply(&Value::Null, &Response::Failure(err.to_string()))
}

fn encode_reply(id: &Value, response: &Response) -> String {
    let reply = Reply { id, response };
    serde_json::to_string(&reply).unwrap_or_else(|e| {
        error!("Failed to encode reply: {}", e);
        serde_json::json!({
            "id": id,
            "success": false,
            "error": format!("Failed to encode reply: {}", e),
        })
        .to_string()
    })
}

async fn write_lines<W>(mut lines: UnboundedReceiver<String>, mut output: W) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = lines.recv().await {
        output.write_all(line.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }
    output.shutdown().await
}
