//! Chrome DevTools Protocol Client
//!
//! One WebSocket per page target. Commands carry an increasing id and are
//! matched to their response by a background reader task; events are
//! ignored.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use crate::error::CdpError;

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type Pending = Arc<StdMutex<HashMap<u64, oneshot::Sender<Result<Value, CdpError>>>>>;

pub struct CdpClient {
    ws_endpoint: String,
    sink: Mutex<WsSink>,
    pending: Pending,
    next_id: AtomicU64,
    timeout: Duration,
    reader: JoinHandle<()>,
}

impl CdpClient {
    /// Connect to a page's `webSocketDebuggerUrl`.
    pub async fn connect(ws_endpoint: &str) -> Result<Self, CdpError> {
        info!("Connecting to CDP websocket at {}", ws_endpoint);
        let (stream, _) = connect_async(ws_endpoint).await?;
        let (sink, mut source) = stream.split();

        let pending: Pending = Arc::default();
        let routes = Arc::clone(&pending);
        let reader = tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        debug!(error = %e, "CDP websocket read failed");
                        break;
                    }
                };
                let Ok(value) = serde_json::from_str::<Value>(&text) else {
                    continue;
                };
                if let Some((id, outcome)) = parse_response(&value) {
                    let waiter = routes.lock().ok().and_then(|mut map| map.remove(&id));
                    if let Some(waiter) = waiter {
                        let _ = waiter.send(outcome);
                    }
                }
            }
            // Dropping the senders wakes every waiter with `Closed`.
            if let Ok(mut map) = routes.lock() {
                map.clear();
            }
        });

        Ok(Self {
            ws_endpoint: ws_endpoint.to_string(),
            sink: Mutex::new(sink),
            pending,
            next_id: AtomicU64::new(1),
            timeout: DEFAULT_COMMAND_TIMEOUT,
            reader,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.ws_endpoint
    }

    pub fn is_connected(&self) -> bool {
        !self.reader.is_finished()
    }

    /// Send one command and wait for its `result`.
    pub async fn send_command(&self, method: &str, params: Value) -> Result<Value, CdpError> {
        if !self.is_connected() {
            return Err(CdpError::Closed);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .map_err(|_| CdpError::Closed)?
            .insert(id, tx);

        let frame = json!({ "id": id, "method": method, "params": params }).to_string();
        debug!(id, method, "Sending CDP command");
        if let Err(e) = self.sink.lock().await.send(Message::Text(frame)).await {
            self.forget(id);
            return Err(e.into());
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(CdpError::Closed),
            Err(_) => {
                self.forget(id);
                Err(CdpError::Timeout(method.to_string()))
            }
        }
    }

    fn forget(&self, id: u64) {
        if let Ok(mut map) = self.pending.lock() {
            map.remove(&id);
        }
    }

    pub async fn close(&self) {
        let _ = self.sink.lock().await.close().await;
        self.reader.abort();
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Split a frame into `(id, outcome)` if it answers a command.
fn parse_response(frame: &Value) -> Option<(u64, Result<Value, CdpError>)> {
    let id = frame.get("id")?.as_u64()?;
    if let Some(error) = frame.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Some((id, Err(CdpError::Protocol { code, message })));
    }
    Some((id, Ok(frame.get("result").cloned().unwrap_or(Value::Null))))
}
