/// TDLib JSON transport over a bridge process.
///
/// Architecture:
///
/// ```text
///   TdClient::spawn()
///         │
///         ├── writer_task   ← receives PendingRequest via mpsc, one JSON line → stdin
///         └── reader_task   ← reads JSON lines from stdout
///                                ├── has "@extra"   → matched oneshot::Sender
///                                ├── "updateFile"   → file update handlers
///                                └── anything else  → logged, dropped
/// ```
///
/// The bridge is any program that relays TDLib JSON objects one per line
/// (e.g. a thin wrapper around `td_json_client`). Authorization happens
/// outside tgload; `login()` only checks the state.
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

use tgload_proto::config::TelegramConfig;
use tgload_proto::protocol::{FileEvent, TdError, UpdateFile};

use crate::error::RemoteError;
use crate::remote::{FileUpdateHandler, RemoteClient};

static NEXT_REQ_ID: AtomicU64 = AtomicU64::new(1);

type Reply = Result<Value, RemoteError>;
type PendingMap = Arc<Mutex<HashMap<u64, (String, oneshot::Sender<Reply>)>>>;
type Handlers = Arc<std::sync::Mutex<Vec<FileUpdateHandler>>>;

struct PendingRequest {
    req_id: u64,
    method: String,
    payload: String, // serialised JSON line (already has '\n')
    reply: oneshot::Sender<Reply>,
}

pub struct TdClient {
    tx: mpsc::Sender<PendingRequest>,
    handlers: Handlers,
    timeout: Duration,
    /// Bridge process, killed when the client is dropped.
    _child: Option<std::sync::Mutex<tokio::process::Child>>,
}

impl TdClient {
    /// Start the configured bridge and connect to its stdio.
    pub fn spawn(config: &TelegramConfig) -> anyhow::Result<Self> {
        info!("td: spawning bridge {}", config.bridge_command);
        let mut child = tokio::process::Command::new(&config.bridge_command)
            .args(&config.bridge_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        info!("td: bridge pid {:?}", child.id());

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow::anyhow!("bridge stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow::anyhow!("bridge stdout unavailable"))?;

        let mut client = Self::from_io(
            stdout,
            stdin,
            Duration::from_secs(config.request_timeout_secs),
        );
        client._child = Some(std::sync::Mutex::new(child));
        Ok(client)
    }

    /// Run the client over any reader/writer pair.
    pub fn from_io<Rd, Wr>(reader: Rd, writer: Wr, timeout: Duration) -> Self
    where
        Rd: AsyncRead + Unpin + Send + 'static,
        Wr: AsyncWrite + Unpin + Send + 'static,
    {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let handlers: Handlers = Arc::new(std::sync::Mutex::new(Vec::new()));
        let (tx, rx) = mpsc::channel::<PendingRequest>(64);

        tokio::spawn(writer_task(writer, rx, pending.clone()));
        tokio::spawn(reader_task(BufReader::new(reader), pending, handlers.clone()));

        Self {
            tx,
            handlers,
            timeout,
            _child: None,
        }
    }
}

impl RemoteClient for TdClient {
    async fn call(&self, method: &str, params: Value) -> Result<Value, RemoteError> {
        let req_id = NEXT_REQ_ID.fetch_add(1, Ordering::Relaxed);
        let mut request = match params {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(RemoteError::new(
                    method,
                    format!("params must be an object, got {other}"),
                ))
            }
        };
        request.insert("@type".into(), Value::from(method));
        request.insert("@extra".into(), Value::from(req_id));
        let mut raw = serde_json::to_string(&request)
            .map_err(|e| RemoteError::new(method, e.to_string()))?;
        raw.push('\n');

        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(PendingRequest {
                req_id,
                method: method.to_string(),
                payload: raw,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RemoteError::new(method, "td writer task gone"))?;

        tokio::time::timeout(self.timeout, reply_rx)
            .await
            .map_err(|_| RemoteError::new(method, format!("timeout for req={req_id}")))?
            .map_err(|_| RemoteError::new(method, format!("reply channel dropped req={req_id}")))?
    }

    fn subscribe_file_updates(&self, handler: FileUpdateHandler) {
        self.handlers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(handler);
    }
}

// ── reader task ───────────────────────────────────────────────────────────────

async fn reader_task<R>(mut reader: BufReader<R>, pending: PendingMap, handlers: Handlers)
where
    R: AsyncRead + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                debug!("td reader: bridge closed");
                fail_all(&pending, "bridge closed").await;
                break;
            }
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let val: Value = match serde_json::from_str(trimmed) {
                    Ok(v) => v,
                    Err(e) => {
                        debug!("td reader: invalid json '{}': {}", trimmed, e);
                        continue;
                    }
                };

                if let Some(req_id) = val.get("@extra").and_then(|v| v.as_u64()) {
                    let entry = pending.lock().await.remove(&req_id);
                    match entry {
                        Some((method, tx)) => {
                            let _ = tx.send(into_reply(&method, val));
                        }
                        None => debug!("td reader: reply for unknown req={}", req_id),
                    }
                } else if val.get("@type").and_then(|v| v.as_str()) == Some("updateFile") {
                    match serde_json::from_value::<UpdateFile>(val) {
                        Ok(update) => dispatch_file_event(&handlers, FileEvent::from(&update.file)),
                        Err(e) => debug!("td reader: bad updateFile: {}", e),
                    }
                } else {
                    debug!("td reader: unhandled {}", trimmed);
                }
            }
            Err(e) => {
                warn!("td reader: read error: {}", e);
                fail_all(&pending, &format!("read error: {e}")).await;
                break;
            }
        }
    }
}

fn into_reply(method: &str, val: Value) -> Reply {
    if val.get("@type").and_then(|v| v.as_str()) == Some("error") {
        let err: TdError = serde_json::from_value(val).unwrap_or(TdError {
            code: 0,
            message: "unknown error".to_string(),
        });
        debug!("td reader: {} failed: {} {}", method, err.code, err.message);
        Err(RemoteError::new(method, format!("{} {}", err.code, err.message)))
    } else {
        Ok(val)
    }
}

fn dispatch_file_event(handlers: &Handlers, event: FileEvent) {
    let handlers: Vec<FileUpdateHandler> = handlers
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .clone();
    for handler in handlers {
        handler(event.clone());
    }
}

async fn fail_all(pending: &PendingMap, cause: &str) {
    let mut map = pending.lock().await;
    for (_, (method, tx)) in map.drain() {
        let _ = tx.send(Err(RemoteError::new(method, cause)));
    }
}

// ── writer task ───────────────────────────────────────────────────────────────

async fn writer_task<W>(mut writer: W, mut rx: mpsc::Receiver<PendingRequest>, pending: PendingMap)
where
    W: AsyncWrite + Unpin,
{
    while let Some(req) = rx.recv().await {
        pending
            .lock()
            .await
            .insert(req.req_id, (req.method.clone(), req.reply));

        let written = async {
            writer.write_all(req.payload.as_bytes()).await?;
            writer.flush().await
        }
        .await;

        if let Err(e) = written {
            warn!("td writer: write error: {}", e);
            if let Some((method, tx)) = pending.lock().await.remove(&req.req_id) {
                let _ = tx.send(Err(RemoteError::new(method, format!("write error: {e}"))));
            }
            break;
        }
    }
    debug!("td writer: exiting");
}
