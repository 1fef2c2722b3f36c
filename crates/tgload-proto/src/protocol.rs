//! TDLib JSON objects the loader reads, and the progress event it derives
//! from them.
//!
//! Only the fields the loader needs are modelled; everything else in the
//! objects is ignored on deserialisation.

use serde::{Deserialize, Serialize};

pub type FileId = i32;
pub type MessageId = i64;
pub type ChatId = i64;

/// Album id TDLib reports for messages that are not grouped.
pub const NO_ALBUM: &str = "0";

/// Reply to `getChatHistory`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Messages {
    #[serde(default)]
    pub total_count: i32,
    #[serde(default)]
    pub messages: Vec<RawMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: MessageId,
    #[serde(default)]
    pub date: i64,
    /// int64 in TDLib JSON, so it travels as a string. `"0"` means no album.
    #[serde(default = "no_album")]
    pub media_album_id: String,
    pub content: MessageContent,
}

fn no_album() -> String {
    NO_ALBUM.to_string()
}

impl RawMessage {
    /// The album this message belongs to, `None` for the `"0"` sentinel.
    pub fn album_id(&self) -> Option<&str> {
        let id = self.media_album_id.as_str();
        (!id.is_empty() && id != NO_ALBUM).then_some(id)
    }

    pub fn video(&self) -> Option<(&Video, &FormattedText)> {
        match &self.content {
            MessageContent::MessageVideo { video, caption } => Some((video, caption)),
            MessageContent::Other => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "@type", rename_all = "camelCase")]
pub enum MessageContent {
    MessageVideo {
        video: Video,
        #[serde(default)]
        caption: FormattedText,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormattedText {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    /// Seconds.
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub file_name: String,
    pub video: File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct File {
    pub id: FileId,
    /// Exact size, 0 when unknown.
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub expected_size: u64,
    #[serde(default)]
    pub local: LocalFile,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalFile {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub downloaded_size: u64,
    #[serde(default)]
    pub is_downloading_active: bool,
    #[serde(default)]
    pub is_downloading_completed: bool,
}

impl File {
    /// Size to compare progress against.
    pub fn total_size(&self) -> u64 {
        if self.size > 0 {
            self.size
        } else {
            self.expected_size
        }
    }
}

/// Pushed by TDLib whenever a file's state changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateFile {
    pub file: File,
}

/// `getAuthorizationState` reply; only its `@type` matters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationState {
    #[serde(rename = "@type")]
    pub kind: String,
}

impl AuthorizationState {
    pub const READY: &'static str = "authorizationStateReady";

    pub fn is_ready(&self) -> bool {
        self.kind == Self::READY
    }
}

/// TDLib `error` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TdError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// Progress of one file as reported by the transport's push channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEvent {
    pub file_id: FileId,
    /// `None` when the transport reports an empty path.
    pub local_path: Option<String>,
    pub downloaded_size: u64,
}

impl FileEvent {
    pub fn new(file_id: FileId, local_path: Option<String>, downloaded_size: u64) -> Self {
        Self {
            file_id,
            local_path: local_path.filter(|p| !p.is_empty()),
            downloaded_size,
        }
    }
}

impl From<&File> for FileEvent {
    fn from(file: &File) -> Self {
        Self::new(
            file.id,
            Some(file.local.path.clone()),
            file.local.downloaded_size,
        )
    }
}
