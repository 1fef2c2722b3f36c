//! Action enum — all user-initiated intents and internal events.

use tgload_proto::protocol::FileId;

use crate::filters::VideoFilter;

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    DownloadList,
    VideoList,
    VideoInfo,
    FilterPanel,
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Downloads ────────────────────────────────────────────────────────────
    StartDownload(FileId),
    CancelDownload(FileId),
    DeleteLocalFile(FileId),
    OpenFile(FileId),
    /// The download list saw this file complete.
    Downloaded(FileId),

    // ── Videos ───────────────────────────────────────────────────────────────
    DeleteMessage(FileId),
    Archive(FileId),
    Refresh,
    LoadNext,

    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    /// The focused row of a list changed; `None` when the focus was cleared.
    Pointed(Option<FileId>),

    // ── Filters ──────────────────────────────────────────────────────────────
    ToggleFilters,
    ApplyFilter(VideoFilter),
    CloseFilters,

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
}
