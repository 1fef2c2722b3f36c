//! Catalog — the videos known from the chat history.
//!
//! Items are keyed by file id and kept in discovery order. Pages are merged
//! rather than appended: a file seen again updates the existing entry. While
//! a file holds a download slot its progress fields belong to the update
//! dispatcher, and a refetch only touches the fields that come from the
//! message.
//!
//! The item lock is never held across a remote call.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use tgload_proto::protocol::{ChatId, FileId, MessageId, Messages};

use crate::error::{Error, Result};
use crate::item::MediaItem;
use crate::remote::RemoteClient;
use crate::scheduler::SlotScheduler;

#[derive(Debug, Default)]
struct CatalogState {
    items: HashMap<FileId, MediaItem>,
    /// Discovery order.
    order: Vec<FileId>,
    /// Non-media messages per album, accumulated over every page.
    albums: HashMap<String, Vec<MessageId>>,
}

impl CatalogState {
    fn merge(&mut self, page: Vec<MediaItem>, active: &HashSet<FileId>) {
        for fresh in page {
            match self.items.get_mut(&fresh.file_id) {
                Some(existing) if active.contains(&fresh.file_id) => existing.refresh_static(fresh),
                Some(existing) => *existing = fresh,
                None => {
                    self.order.push(fresh.file_id);
                    self.items.insert(fresh.file_id, fresh);
                }
            }
        }
    }

    fn remove(&mut self, file_id: FileId) -> Option<MediaItem> {
        let item = self.items.remove(&file_id)?;
        self.order.retain(|id| *id != file_id);
        Some(item)
    }

    fn add_albums(&mut self, albums: HashMap<String, Vec<MessageId>>) {
        for (album_id, ids) in albums {
            let known = self.albums.entry(album_id).or_default();
            for id in ids {
                if !known.contains(&id) {
                    known.push(id);
                }
            }
        }
    }

    fn album_in_use(&self, album_id: &str) -> bool {
        self.items
            .values()
            .any(|i| i.album.as_ref().is_some_and(|a| a.album_id == album_id))
    }

    fn siblings_of(&self, item: &MediaItem) -> Vec<MessageId> {
        let mut ids = item.message_ids();
        if let Some(known) = item.album.as_ref().and_then(|a| self.albums.get(&a.album_id)) {
            for id in known {
                if !ids.contains(id) {
                    ids.push(*id);
                }
            }
        }
        ids
    }
}

/// Turn one history page into items, attaching album siblings.
///
/// Siblings may come before or after their video within the page, so the
/// albums are collected first.
fn build_page(messages: &Messages, source: &str) -> (Vec<MediaItem>, HashMap<String, Vec<MessageId>>) {
    let mut albums: HashMap<String, Vec<MessageId>> = HashMap::new();
    for message in &messages.messages {
        if message.video().is_none() {
            if let Some(album_id) = message.album_id() {
                albums.entry(album_id.to_string()).or_default().push(message.id);
            }
        }
    }

    let mut items: Vec<MediaItem> = Vec::new();
    for message in &messages.messages {
        let Some(mut item) = MediaItem::from_message(message, Some(source)) else {
            continue;
        };
        if let Some(album) = item.album.as_mut() {
            album.siblings = albums.get(&album.album_id).cloned().unwrap_or_default();
        }
        // Same file twice in one page: the later message wins, first position stays.
        match items.iter_mut().find(|i| i.file_id == item.file_id) {
            Some(slot) => *slot = item,
            None => items.push(item),
        }
    }
    (items, albums)
}

pub struct Catalog<R> {
    remote: Arc<R>,
    scheduler: Arc<SlotScheduler<R>>,
    chat_id: ChatId,
    state: Mutex<CatalogState>,
}

impl<R: RemoteClient> Catalog<R> {
    pub fn new(remote: Arc<R>, scheduler: Arc<SlotScheduler<R>>, chat_id: ChatId) -> Self {
        Self {
            remote,
            scheduler,
            chat_id,
            state: Mutex::new(CatalogState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    /// Fetch up to `limit` messages older than `before` (newest page when
    /// `None`) and merge the videos found into the catalog.
    pub async fn fetch_page(&self, limit: u32, before: Option<MessageId>) -> Result<Vec<MediaItem>> {
        let held = self.scheduler.active_ids();
        let messages = self.remote.fetch_history(self.chat_id, limit, before).await?;
        let source = match before {
            Some(id) => format!("before:{id}"),
            None => "latest".to_string(),
        };
        let (page, albums) = build_page(&messages, &source);
        debug!(
            "page {}: {} messages, {} videos",
            source,
            messages.messages.len(),
            page.len()
        );

        let active = self.held_during_fetch(held);
        let mut state = self.state();
        state.add_albums(albums);
        state.merge(page.clone(), &active);
        Ok(page)
    }

    /// Replace the catalog with the newest page. Items holding a download
    /// slot are kept even when the page no longer contains them.
    pub async fn refresh(&self, limit: u32) -> Result<Vec<MediaItem>> {
        let held = self.scheduler.active_ids();
        let messages = self.remote.fetch_history(self.chat_id, limit, None).await?;
        let (page, albums) = build_page(&messages, "latest");

        let active = self.held_during_fetch(held);
        let mut state = self.state();
        let fresh: HashSet<FileId> = page.iter().map(|i| i.file_id).collect();
        let stale: Vec<FileId> = state
            .order
            .iter()
            .copied()
            .filter(|id| !fresh.contains(id) && !active.contains(id))
            .collect();
        for id in stale {
            state.remove(id);
        }
        let CatalogState { items, albums: known, .. } = &mut *state;
        known.retain(|album_id, _| {
            items
                .values()
                .any(|i| i.album.as_ref().is_some_and(|a| &a.album_id == album_id))
        });
        state.add_albums(albums);
        state.merge(page, &active);
        info!("catalog refreshed: {} items", state.order.len());
        Ok(state.snapshot())
    }

    /// Load the next older page, or the first page when nothing is loaded.
    pub async fn load_next(&self, limit: u32) -> Result<Vec<MediaItem>> {
        let oldest = self.state().items.values().map(|i| i.message_id).min();
        match oldest {
            None => self.fetch_page(limit, None).await,
            Some(id) => self.fetch_page(limit, Some(id)).await,
        }
    }

    /// Delete the item's message and its album siblings in one call, then
    /// drop the item and stop its download. Nothing changes locally if the
    /// call fails.
    pub async fn delete_item(&self, item: &MediaItem) -> Result<()> {
        let ids = {
            let state = self.state();
            let current = state
                .items
                .get(&item.file_id)
                .ok_or(Error::NotFound(item.file_id))?;
            state.siblings_of(current)
        };

        self.remote.delete_messages(self.chat_id, ids.clone()).await?;

        let removed = {
            let mut state = self.state();
            let removed = state.remove(item.file_id);
            let album_id = removed.as_ref().and_then(|i| i.album.as_ref()).map(|a| a.album_id.clone());
            if let Some(album_id) = album_id {
                if !state.album_in_use(&album_id) {
                    state.albums.remove(&album_id);
                }
            }
            removed
        };
        info!("deleted file {} (messages {:?})", item.file_id, ids);

        // Events for a removed file are ignored, so completion would never
        // free this slot.
        if let Some(removed) = removed {
            if self.scheduler.slot_of(removed.file_id).is_some() {
                if let Err(e) = self.scheduler.cancel_download(&removed).await {
                    warn!("file {} deleted but its download did not stop: {}", removed.file_id, e);
                }
            }
        }
        Ok(())
    }

    /// Delete the downloaded copy of the item's file and reset its progress.
    pub async fn delete_local_file(&self, item: &MediaItem) -> Result<()> {
        if !self.state().items.contains_key(&item.file_id) {
            return Err(Error::NotFound(item.file_id));
        }
        self.remote.delete_file(item.file_id).await?;

        if let Some(entry) = self.state().items.get_mut(&item.file_id) {
            entry.downloaded_size = 0;
            entry.local_path = None;
        }
        info!("deleted local copy of file {}", item.file_id);
        Ok(())
    }

    /// All items in discovery order.
    pub fn list_all(&self) -> Vec<MediaItem> {
        self.state().snapshot()
    }

    pub fn get(&self, file_id: FileId) -> Option<MediaItem> {
        self.state().items.get(&file_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().items.is_empty()
    }

    /// Files that held a slot when the fetch started or still hold one now.
    /// A download completed mid-fetch keeps the progress it reached.
    fn held_during_fetch(&self, mut held: HashSet<FileId>) -> HashSet<FileId> {
        held.extend(self.scheduler.active_ids());
        held
    }

    /// Apply `f` to the tracked item and return the result, `None` when the
    /// file is not in the catalog.
    pub(crate) fn update<F>(&self, file_id: FileId, f: F) -> Option<MediaItem>
    where
        F: FnOnce(&mut MediaItem),
    {
        let mut state = self.state();
        let item = state.items.get_mut(&file_id)?;
        f(item);
        Some(item.clone())
    }
}

impl CatalogState {
    fn snapshot(&self) -> Vec<MediaItem> {
        self.order
            .iter()
            .filter_map(|id| self.items.get(id))
            .cloned()
            .collect()
    }
}
