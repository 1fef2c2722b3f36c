#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tgload_core::{FileUpdateHandler, RemoteClient, RemoteError};
use tgload_proto::protocol::{FileEvent, FileId, MessageId};

/// In-memory chat: serves history from a fixed message list, records every
/// call, and fails the methods it is told to.
pub struct MockRemote {
    /// Newest first, like TDLib.
    messages: Mutex<Vec<Value>>,
    calls: Mutex<Vec<(String, Value)>>,
    failing: Mutex<HashSet<String>>,
    handlers: Mutex<Vec<FileUpdateHandler>>,
    /// Pushes delivered while the next history call is in flight.
    during_history: Mutex<Vec<FileEvent>>,
    auth_state: Mutex<String>,
}

impl MockRemote {
    pub fn new(messages: Vec<Value>) -> Arc<Self> {
        let mut messages = messages;
        messages.sort_by_key(|m| std::cmp::Reverse(m["id"].as_i64().unwrap_or(0)));
        Arc::new(Self {
            messages: Mutex::new(messages),
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            handlers: Mutex::new(Vec::new()),
            during_history: Mutex::new(Vec::new()),
            auth_state: Mutex::new("authorizationStateReady".to_string()),
        })
    }

    pub fn fail(&self, method: &str) {
        self.failing.lock().unwrap().insert(method.to_string());
    }

    pub fn recover(&self, method: &str) {
        self.failing.lock().unwrap().remove(method);
    }

    pub fn set_auth_state(&self, state: &str) {
        *self.auth_state.lock().unwrap() = state.to_string();
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p)
            .collect()
    }

    /// Deliver a progress push to every registered handler.
    pub fn push(&self, file_id: FileId, downloaded_size: u64, path: &str) {
        let handlers = self.handlers.lock().unwrap().clone();
        for handler in handlers {
            handler(FileEvent::new(file_id, Some(path.to_string()), downloaded_size));
        }
    }

    /// Queue a push that lands after the next history page is read but
    /// before it is returned.
    pub fn push_during_next_history(&self, file_id: FileId, downloaded_size: u64, path: &str) {
        self.during_history
            .lock()
            .unwrap()
            .push(FileEvent::new(file_id, Some(path.to_string()), downloaded_size));
    }

    /// Record download progress on the stored messages, so later pages
    /// report it.
    pub fn set_local(&self, file_id: FileId, downloaded_size: u64, path: &str) {
        for message in self.messages.lock().unwrap().iter_mut() {
            let Some(file) = message.pointer_mut("/content/video/video") else {
                continue;
            };
            if file["id"].as_i64() == Some(file_id as i64) {
                file["local"]["downloaded_size"] = json!(downloaded_size);
                file["local"]["path"] = json!(path);
            }
        }
    }

    fn history(&self, params: &Value) -> Value {
        let from = params["from_message_id"].as_i64().unwrap_or(0);
        let limit = params["limit"].as_u64().unwrap_or(100) as usize;
        let page: Vec<Value> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| from == 0 || m["id"].as_i64().unwrap_or(0) < from)
            .take(limit)
            .cloned()
            .collect();
        json!({ "@type": "messages", "total_count": page.len(), "messages": page })
    }
}

impl RemoteClient for MockRemote {
    async fn call(&self, method: &str, params: Value) -> Result<Value, RemoteError> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params.clone()));
        if self.failing.lock().unwrap().contains(method) {
            return Err(RemoteError::new(method, "mock failure"));
        }
        match method {
            "getAuthorizationState" => Ok(json!({ "@type": self.auth_state.lock().unwrap().clone() })),
            "getChatHistory" => {
                let page = self.history(&params);
                let late: Vec<FileEvent> = self.during_history.lock().unwrap().drain(..).collect();
                let handlers = self.handlers.lock().unwrap().clone();
                for event in late {
                    for handler in &handlers {
                        handler(event.clone());
                    }
                }
                Ok(page)
            }
            "deleteMessages" => {
                let ids: Vec<i64> = serde_json::from_value(params["message_ids"].clone()).unwrap();
                self.messages
                    .lock()
                    .unwrap()
                    .retain(|m| !ids.contains(&m["id"].as_i64().unwrap_or(0)));
                Ok(json!({ "@type": "ok" }))
            }
            _ => Ok(json!({ "@type": "ok" })),
        }
    }

    fn subscribe_file_updates(&self, handler: FileUpdateHandler) {
        self.handlers.lock().unwrap().push(handler);
    }
}

pub fn video_message(id: MessageId, file_id: FileId, size: u64, album: &str) -> Value {
    json!({
        "@type": "message",
        "id": id,
        "date": 1_700_000_000 + id,
        "media_album_id": album,
        "content": {
            "@type": "messageVideo",
            "video": {
                "@type": "video",
                "duration": 90,
                "video": {
                    "@type": "file",
                    "id": file_id,
                    "size": size,
                    "expected_size": size,
                    "local": { "@type": "localFile", "path": "", "downloaded_size": 0 }
                }
            },
            "caption": { "@type": "formattedText", "text": format!("video {id}") }
        }
    })
}

pub fn text_message(id: MessageId, album: &str) -> Value {
    json!({
        "@type": "message",
        "id": id,
        "date": 1_700_000_000 + id,
        "media_album_id": album,
        "content": { "@type": "messageText", "text": { "@type": "formattedText", "text": "note" } }
    })
}
