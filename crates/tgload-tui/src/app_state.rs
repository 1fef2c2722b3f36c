//! AppState — the catalog data every component reads when drawing.

use std::collections::HashMap;

use tgload_core::{MediaItem, Slot};
use tgload_proto::protocol::FileId;

use crate::filters::VideoFilter;

/// One line for the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub error: bool,
}

#[derive(Debug, Default)]
pub struct AppState {
    /// Catalog snapshot, discovery order.
    pub videos: Vec<MediaItem>,
    /// Download slots currently held, by file.
    pub slots: HashMap<FileId, Slot>,
    pub filter: VideoFilter,
    pub notice: Option<Notice>,
    /// Item shown in the info pane.
    pub pointed: Option<FileId>,
}

impl AppState {
    pub fn item(&self, file_id: FileId) -> Option<&MediaItem> {
        self.videos.iter().find(|v| v.file_id == file_id)
    }

    pub fn has_slot(&self, file_id: FileId) -> bool {
        self.slots.contains_key(&file_id)
    }

    /// Videos passing the active filter, in catalog order.
    pub fn filtered(&self) -> Vec<&MediaItem> {
        self.videos.iter().filter(|v| self.filter.matches(v)).collect()
    }

    /// Replace the snapshot entry for `item`. Items the snapshot does not
    /// know are ignored; the next catalog sync picks them up.
    pub fn apply_update(&mut self, item: MediaItem) {
        if let Some(existing) = self.videos.iter_mut().find(|v| v.file_id == item.file_id) {
            *existing = item;
        }
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            error: false,
        });
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            error: true,
        });
    }
}

#[cfg(test)]
pub(crate) fn test_video(file_id: FileId, duration: u32, expected: u64, downloaded: u64) -> MediaItem {
    MediaItem {
        file_id,
        message_id: file_id as i64 * 10,
        caption: Some(format!("video {file_id}\nsecond line")),
        duration,
        expected_size: expected,
        downloaded_size: downloaded,
        local_path: None,
        album: None,
        source: Some("latest".to_string()),
        date: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn updates_only_touch_known_items() {
        let mut state = AppState {
            videos: vec![test_video(1, 60, 100, 0)],
            ..Default::default()
        };
        state.apply_update(test_video(1, 60, 100, 40));
        state.apply_update(test_video(2, 60, 100, 40));
        assert_eq!(state.videos.len(), 1);
        assert_eq!(state.item(1).unwrap().downloaded_size, 40);
    }

    #[test]
    fn filtered_respects_filter() {
        let mut state = AppState {
            videos: vec![test_video(1, 60, 100, 0), test_video(2, 3600, 100, 0)],
            ..Default::default()
        };
        state.filter.max_duration_secs = Some(600);
        let ids: Vec<FileId> = state.filtered().iter().map(|v| v.file_id).collect();
        assert_eq!(ids, vec![1]);
    }
}
