use thiserror::Error;

use tgload_proto::protocol::FileId;

/// Login failed. Fatal for the session; never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cant login: {cause}")]
pub struct AuthError {
    pub cause: String,
}

impl AuthError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
        }
    }
}

/// A transport call failed. The caller decides whether to retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cant {method}: {cause}")]
pub struct RemoteError {
    pub method: String,
    pub cause: String,
}

impl RemoteError {
    pub fn new(method: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            cause: cause.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    /// Every download slot is taken; try again once one finishes.
    #[error("download queue is full")]
    QueueFull,
    #[error("file {0} is not in the catalog")]
    NotFound(FileId),
    #[error("cant start download of file {file_id}: {source}")]
    DownloadStart {
        file_id: FileId,
        #[source]
        source: RemoteError,
    },
}

impl Error {
    /// Only a failed login ends the session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
