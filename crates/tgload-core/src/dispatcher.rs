//! UpdateDispatcher — merges pushed file progress into catalog items.
//!
//! Events arrive on the transport's task, concurrently with user commands.
//! One dispatcher lock serialises event handling, so an item is never updated
//! by two events at once and events are applied in delivery order. Every
//! event reaches subscribers; progress is not coalesced.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use tgload_proto::protocol::FileEvent;

use crate::catalog::Catalog;
use crate::item::MediaItem;
use crate::remote::{FileUpdateHandler, RemoteClient};
use crate::scheduler::SlotScheduler;

/// Observer called with the item after every applied event.
pub type Subscriber = Arc<dyn Fn(&MediaItem) -> anyhow::Result<()> + Send + Sync>;

/// Handle returned by `subscribe`; identity of one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// What an event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The file is not in the catalog.
    Ignored,
    Progress,
    /// This event completed the download.
    Completed,
}

pub struct UpdateDispatcher<R> {
    catalog: Arc<Catalog<R>>,
    scheduler: Arc<SlotScheduler<R>>,
    subscribers: Mutex<Vec<(SubscriptionId, Subscriber)>>,
    next_id: AtomicU64,
    serial: Mutex<()>,
}

impl<R: RemoteClient> UpdateDispatcher<R> {
    pub fn new(catalog: Arc<Catalog<R>>, scheduler: Arc<SlotScheduler<R>>) -> Self {
        Self {
            catalog,
            scheduler,
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            serial: Mutex::new(()),
        }
    }

    fn subscribers(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Subscriber)>> {
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register this dispatcher with the transport's push channel.
    ///
    /// The transport only holds a weak reference; events arriving after the
    /// dispatcher is dropped are discarded.
    pub fn attach(self: &Arc<Self>, remote: &R) {
        let weak = Arc::downgrade(self);
        let handler: FileUpdateHandler = Arc::new(move |event| {
            if let Some(dispatcher) = weak.upgrade() {
                dispatcher.on_remote_file_event(event);
            }
        });
        remote.subscribe_file_updates(handler);
    }

    pub fn subscribe(&self, callback: Subscriber) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers().push((id, callback));
        id
    }

    /// Returns `false` when `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    /// Apply one pushed event.
    ///
    /// Untracked files are ignored. A completed download gives its slot back
    /// before subscribers run. Late events for canceled downloads still
    /// update the item.
    pub fn on_remote_file_event(&self, event: FileEvent) -> EventOutcome {
        let _serial = self.serial.lock().unwrap_or_else(|e| e.into_inner());

        let mut was_completed = false;
        let updated = self.catalog.update(event.file_id, |item| {
            was_completed = item.completed();
            item.local_path = event.local_path.clone().filter(|p| !p.is_empty());
            item.downloaded_size = event.downloaded_size;
        });
        let Some(item) = updated else {
            return EventOutcome::Ignored;
        };

        let outcome = if item.completed() {
            if let Some(slot) = self.scheduler.release(item.file_id) {
                debug!("file {} freed slot {}", item.file_id, slot);
            }
            if was_completed {
                EventOutcome::Progress
            } else {
                info!("file {} completed ({} bytes)", item.file_id, item.downloaded_size);
                EventOutcome::Completed
            }
        } else {
            EventOutcome::Progress
        };

        self.notify(&item);
        outcome
    }

    /// Call every subscriber in order. A failing or panicking subscriber is
    /// logged and skipped.
    fn notify(&self, item: &MediaItem) {
        // Cloned so callbacks may (un)subscribe without deadlocking.
        let subscribers: Vec<(SubscriptionId, Subscriber)> = self.subscribers().clone();
        for (id, callback) in subscribers {
            match catch_unwind(AssertUnwindSafe(|| callback(item))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("subscriber {:?} failed for file {}: {}", id, item.file_id, e),
                Err(_) => warn!("subscriber {:?} panicked for file {}", id, item.file_id),
            }
        }
    }
}
