//! Download orchestration for tgload.
//!
//! - `Catalog` pages through the chat history and keeps the known videos.
//! - `SlotScheduler` hands out the numbered download slots.
//! - `UpdateDispatcher` folds pushed file progress into catalog items.
//! - `WindowController` keeps a list's focus inside its viewport.
//!
//! All of them talk to the chat through a `RemoteClient`; `TdClient` is the
//! real one.

pub mod catalog;
pub mod dispatcher;
pub mod error;
pub mod item;
pub mod remote;
pub mod scheduler;
pub mod session;
pub mod td;
pub mod window;

pub use catalog::Catalog;
pub use dispatcher::{EventOutcome, Subscriber, SubscriptionId, UpdateDispatcher};
pub use error::{AuthError, Error, RemoteError, Result};
pub use item::{AlbumGroup, DownloadState, MediaItem};
pub use remote::{FileUpdateHandler, RemoteClient};
pub use scheduler::{Slot, SlotScheduler, FIRST_SLOT, LAST_SLOT, SLOT_COUNT};
pub use session::Session;
pub use td::TdClient;
pub use window::WindowController;
