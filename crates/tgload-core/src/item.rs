//! Catalog entries.

use chrono::{DateTime, Utc};

use tgload_proto::protocol::{FileId, MessageId, RawMessage};

/// Message ids grouped with a video under one album id.
///
/// `siblings` only lists the non-media messages (captions, text) so they can
/// be deleted together with the video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumGroup {
    pub album_id: String,
    pub siblings: Vec<MessageId>,
}

/// One downloadable video.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    pub file_id: FileId,
    pub message_id: MessageId,
    pub caption: Option<String>,
    /// Seconds.
    pub duration: u32,
    pub expected_size: u64,
    pub downloaded_size: u64,
    pub local_path: Option<String>,
    pub album: Option<AlbumGroup>,
    /// Which page the item was discovered on.
    pub source: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

/// Where an item stands in its download lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    /// Known, no slot held.
    Idle,
    Downloading,
    Completed,
}

impl MediaItem {
    /// Build an item from a history message, `None` unless it carries a video.
    pub fn from_message(message: &RawMessage, source: Option<&str>) -> Option<Self> {
        let (video, caption) = message.video()?;
        let file = &video.video;
        let caption = Some(caption.text.clone()).filter(|t| !t.is_empty());
        Some(Self {
            file_id: file.id,
            message_id: message.id,
            caption,
            duration: video.duration,
            expected_size: file.total_size(),
            downloaded_size: file.local.downloaded_size,
            local_path: Some(file.local.path.clone()).filter(|p| !p.is_empty()),
            album: message.album_id().map(|id| AlbumGroup {
                album_id: id.to_string(),
                siblings: Vec::new(),
            }),
            source: source.map(str::to_string),
            date: (message.date > 0)
                .then(|| DateTime::from_timestamp(message.date, 0))
                .flatten(),
        })
    }

    /// Downloaded size reached the expected size.
    ///
    /// Sizes past the expected one (resumed partial files) also count. An
    /// unknown size (0) never completes by size alone.
    pub fn completed(&self) -> bool {
        self.expected_size > 0 && self.downloaded_size >= self.expected_size
    }

    pub fn state(&self, has_slot: bool) -> DownloadState {
        if self.completed() {
            DownloadState::Completed
        } else if has_slot {
            DownloadState::Downloading
        } else {
            DownloadState::Idle
        }
    }

    /// First caption line, empty when there is none.
    pub fn title(&self) -> &str {
        self.caption
            .as_deref()
            .and_then(|c| c.lines().next())
            .unwrap_or("")
    }

    /// Download progress in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.expected_size == 0 {
            return 0.0;
        }
        (self.downloaded_size as f64 / self.expected_size as f64).clamp(0.0, 1.0)
    }

    /// Message ids to delete together with this item.
    pub fn message_ids(&self) -> Vec<MessageId> {
        let mut ids = vec![self.message_id];
        if let Some(album) = &self.album {
            for id in &album.siblings {
                if !ids.contains(id) {
                    ids.push(*id);
                }
            }
        }
        ids
    }

    /// Take the fields that come from the message, keep download progress.
    pub(crate) fn refresh_static(&mut self, fresh: MediaItem) {
        self.message_id = fresh.message_id;
        self.caption = fresh.caption;
        self.duration = fresh.duration;
        self.expected_size = fresh.expected_size;
        self.album = fresh.album;
        self.source = fresh.source;
        self.date = fresh.date;
    }
}

#[cfg(test)]
pub(crate) fn test_item(file_id: FileId, message_id: MessageId, expected_size: u64) -> MediaItem {
    MediaItem {
        file_id,
        message_id,
        caption: None,
        duration: 60,
        expected_size,
        downloaded_size: 0,
        local_path: None,
        album: None,
        source: None,
        date: None,
    }
}
