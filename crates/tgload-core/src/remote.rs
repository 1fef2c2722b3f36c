//! Boundary with the chat transport.
//!
//! `call` and `subscribe_file_updates` are the only required methods; the
//! typed operations are thin wrappers that name the TDLib method and shape
//! its parameters, so test doubles only need to answer raw calls.

use std::future::Future;
use std::sync::Arc;

use serde_json::{json, Value};

use tgload_proto::protocol::{AuthorizationState, ChatId, FileEvent, FileId, MessageId, Messages};

use crate::error::{AuthError, RemoteError};

/// Receives every `updateFile` push, on the transport's own task.
pub type FileUpdateHandler = Arc<dyn Fn(FileEvent) + Send + Sync>;

pub trait RemoteClient: Send + Sync + 'static {
    /// Issue one request and wait for its reply or error.
    fn call(
        &self,
        method: &str,
        params: Value,
    ) -> impl Future<Output = Result<Value, RemoteError>> + Send;

    /// Register a handler for file progress pushes. Handlers run in
    /// registration order for every event, until the transport shuts down.
    fn subscribe_file_updates(&self, handler: FileUpdateHandler);

    fn login(&self) -> impl Future<Output = Result<(), AuthError>> + Send {
        async move {
            let reply = self
                .call("getAuthorizationState", json!({}))
                .await
                .map_err(|e| AuthError::new(e.to_string()))?;
            let state: AuthorizationState = serde_json::from_value(reply)
                .map_err(|e| AuthError::new(format!("bad authorization state: {e}")))?;
            if state.is_ready() {
                Ok(())
            } else {
                Err(AuthError::new(format!("session not authorized ({})", state.kind)))
            }
        }
    }

    fn open_chat(&self, chat_id: ChatId) -> impl Future<Output = Result<(), RemoteError>> + Send {
        async move {
            self.call("getChat", json!({ "chat_id": chat_id }))
                .await
                .map(|_| ())
        }
    }

    /// Up to `limit` messages older than `before`, or the newest ones.
    fn fetch_history(
        &self,
        chat_id: ChatId,
        limit: u32,
        before: Option<MessageId>,
    ) -> impl Future<Output = Result<Messages, RemoteError>> + Send {
        async move {
            let reply = self
                .call(
                    "getChatHistory",
                    json!({
                        "chat_id": chat_id,
                        "from_message_id": before.unwrap_or(0),
                        "offset": 0,
                        "limit": limit,
                        "only_local": false,
                    }),
                )
                .await?;
            serde_json::from_value(reply)
                .map_err(|e| RemoteError::new("getChatHistory", format!("bad reply: {e}")))
        }
    }

    /// Ask the transport to download a file. Returns once the request is
    /// accepted, not when the file is complete.
    fn start_download(
        &self,
        file_id: FileId,
        priority: u8,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send {
        async move {
            self.call(
                "downloadFile",
                json!({
                    "file_id": file_id,
                    "priority": priority,
                    "offset": 0,
                    "limit": 0,
                    "synchronous": false,
                }),
            )
            .await
            .map(|_| ())
        }
    }

    fn cancel_download(
        &self,
        file_id: FileId,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send {
        async move {
            self.call(
                "cancelDownloadFile",
                json!({ "file_id": file_id, "only_if_pending": false }),
            )
            .await
            .map(|_| ())
        }
    }

    fn delete_file(&self, file_id: FileId) -> impl Future<Output = Result<(), RemoteError>> + Send {
        async move {
            self.call("deleteFile", json!({ "file_id": file_id }))
                .await
                .map(|_| ())
        }
    }

    fn delete_messages(
        &self,
        chat_id: ChatId,
        message_ids: Vec<MessageId>,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send {
        async move {
            self.call(
                "deleteMessages",
                json!({ "chat_id": chat_id, "message_ids": message_ids, "revoke": true }),
            )
            .await
            .map(|_| ())
        }
    }
}
