//! Download slots.
//!
//! A fixed pool of numbered slots caps concurrent downloads. Slot numbers are
//! also sent to the transport as download priority, so the lowest free number
//! is always handed out first.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use tgload_proto::protocol::FileId;

use crate::error::{Error, Result};
use crate::item::MediaItem;
use crate::remote::RemoteClient;

pub type Slot = u8;

pub const FIRST_SLOT: Slot = 2;
pub const LAST_SLOT: Slot = 32;
pub const SLOT_COUNT: usize = (LAST_SLOT - FIRST_SLOT + 1) as usize;

/// Both directions of the slot binding, always updated together.
#[derive(Debug, Default)]
struct SlotTable {
    by_slot: BTreeMap<Slot, FileId>,
    by_file: HashMap<FileId, Slot>,
}

pub struct SlotScheduler<R> {
    remote: Arc<R>,
    table: Mutex<SlotTable>,
}

impl<R: RemoteClient> SlotScheduler<R> {
    pub fn new(remote: Arc<R>) -> Self {
        Self {
            remote,
            table: Mutex::new(SlotTable::default()),
        }
    }

    fn table(&self) -> MutexGuard<'_, SlotTable> {
        // The table is consistent after every statement, so a poisoned lock
        // still holds usable data.
        self.table.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Bind the lowest free slot to `item`. `None` means every slot is busy.
    ///
    /// An item that already holds a slot keeps it.
    pub fn reserve(&self, item: &MediaItem) -> Option<Slot> {
        let mut table = self.table();
        if let Some(&slot) = table.by_file.get(&item.file_id) {
            return Some(slot);
        }
        let slot = (FIRST_SLOT..=LAST_SLOT).find(|s| !table.by_slot.contains_key(s))?;
        table.by_slot.insert(slot, item.file_id);
        table.by_file.insert(item.file_id, slot);
        Some(slot)
    }

    /// Free whichever slot holds `file_id`.
    pub fn release(&self, file_id: FileId) -> Option<Slot> {
        let mut table = self.table();
        let slot = table.by_file.remove(&file_id)?;
        table.by_slot.remove(&slot);
        Some(slot)
    }

    pub fn slot_of(&self, file_id: FileId) -> Option<Slot> {
        self.table().by_file.get(&file_id).copied()
    }

    /// Active bindings, ordered by slot number.
    pub fn active(&self) -> Vec<(Slot, FileId)> {
        self.table()
            .by_slot
            .iter()
            .map(|(&slot, &file_id)| (slot, file_id))
            .collect()
    }

    pub fn active_ids(&self) -> HashSet<FileId> {
        self.table().by_file.keys().copied().collect()
    }

    pub fn free_slots(&self) -> usize {
        SLOT_COUNT - self.table().by_slot.len()
    }

    /// Reserve a slot and ask the transport to start downloading, using the
    /// slot number as priority.
    ///
    /// `Ok(None)` means the queue is full; callers should not retry on their
    /// own. If the transport rejects the request the slot is freed again.
    pub async fn start_download(&self, item: &MediaItem) -> Result<Option<Slot>> {
        let Some(slot) = self.reserve(item) else {
            debug!("no free slot for file {}", item.file_id);
            return Ok(None);
        };

        match self.remote.start_download(item.file_id, slot).await {
            Ok(()) => {
                info!("file {} downloading in slot {}", item.file_id, slot);
                Ok(Some(slot))
            }
            Err(source) => {
                self.release(item.file_id);
                warn!("file {} failed to start: {}", item.file_id, source);
                Err(Error::DownloadStart {
                    file_id: item.file_id,
                    source,
                })
            }
        }
    }

    /// Free the slot and ask the transport to stop. The slot is freed even
    /// when the transport call fails.
    pub async fn cancel_download(&self, item: &MediaItem) -> Result<()> {
        if let Some(slot) = self.release(item.file_id) {
            debug!("file {} released slot {}", item.file_id, slot);
        }
        self.remote.cancel_download(item.file_id).await?;
        info!("file {} download canceled", item.file_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::item::test_item;
    use crate::remote::FileUpdateHandler;
    use serde_json::{json, Value};

    /// Accepts everything except the methods it is told to fail.
    #[derive(Default)]
    struct StubRemote {
        failing: Vec<&'static str>,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl RemoteClient for StubRemote {
        async fn call(&self, method: &str, params: Value) -> std::result::Result<Value, RemoteError> {
            self.calls.lock().unwrap().push((method.to_string(), params));
            if self.failing.contains(&method) {
                return Err(RemoteError::new(method, "stubbed failure"));
            }
            Ok(json!({ "@type": "ok" }))
        }

        fn subscribe_file_updates(&self, _handler: FileUpdateHandler) {}
    }

    fn scheduler(failing: Vec<&'static str>) -> SlotScheduler<StubRemote> {
        SlotScheduler::new(Arc::new(StubRemote {
            failing,
            ..Default::default()
        }))
    }

    #[test]
    fn thirty_one_slots_then_full() {
        let s = scheduler(vec![]);
        for (n, file_id) in (0..SLOT_COUNT as i32).enumerate() {
            let slot = s.reserve(&test_item(file_id, 100 + file_id as i64, 10));
            assert_eq!(slot, Some(FIRST_SLOT + n as u8));
        }
        assert_eq!(s.reserve(&test_item(999, 999, 10)), None);
        assert_eq!(s.free_slots(), 0);
    }

    #[test]
    fn lowest_free_slot_is_reused() {
        let s = scheduler(vec![]);
        let a = test_item(1, 1, 10);
        let b = test_item(2, 2, 10);
        let c = test_item(3, 3, 10);
        assert_eq!(s.reserve(&a), Some(2));
        assert_eq!(s.reserve(&b), Some(3));
        assert_eq!(s.reserve(&c), Some(4));

        assert_eq!(s.release(2), Some(3));
        assert_eq!(s.reserve(&test_item(4, 4, 10)), Some(3));

        for id in [1, 3, 4] {
            s.release(id);
        }
        assert!(s.active().is_empty());
        assert_eq!(s.reserve(&test_item(5, 5, 10)), Some(FIRST_SLOT));
    }

    #[test]
    fn item_keeps_its_slot() {
        let s = scheduler(vec![]);
        let a = test_item(1, 1, 10);
        assert_eq!(s.reserve(&a), Some(2));
        assert_eq!(s.reserve(&a), Some(2));
        assert_eq!(s.active(), vec![(2, 1)]);
        assert_eq!(s.release(42), None);
    }

    #[tokio::test]
    async fn start_download_sends_slot_as_priority() {
        let s = scheduler(vec![]);
        let slot = s.start_download(&test_item(7, 70, 10)).await.unwrap();
        assert_eq!(slot, Some(2));

        let calls = s.remote.calls.lock().unwrap();
        assert_eq!(calls[0].0, "downloadFile");
        assert_eq!(calls[0].1["file_id"], 7);
        assert_eq!(calls[0].1["priority"], 2);
    }

    #[tokio::test]
    async fn failed_start_frees_the_slot() {
        let s = scheduler(vec!["downloadFile"]);
        let err = s.start_download(&test_item(7, 70, 10)).await.unwrap_err();
        assert!(matches!(err, Error::DownloadStart { file_id: 7, .. }));
        assert_eq!(s.slot_of(7), None);
    }

    #[tokio::test]
    async fn cancel_frees_slot_even_when_remote_fails() {
        let s = scheduler(vec!["cancelDownloadFile"]);
        let item = test_item(7, 70, 10);
        assert_eq!(s.start_download(&item).await.unwrap(), Some(2));
        assert!(s.cancel_download(&item).await.is_err());
        assert_eq!(s.slot_of(7), None);
    }
}
