//! Live "all tasks" query plumbing.
//!
//! # Responsibility
//! - Hand out subscriptions that receive full task-list snapshots.
//! - Fan out a new snapshot to every live subscriber after a store mutation.
//!
//! # Invariants
//! - Each subscriber holds at most one pending snapshot; a newer publish
//!   overwrites an unread one.
//! - Subscribers whose handle was dropped are pruned on next publish.
//! - Dropping the publisher closes every subscription.

use crate::model::task::Task;
use log::debug;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, Weak};

#[derive(Debug, Default)]
struct SlotState {
    pending: Option<Vec<Task>>,
    closed: bool,
}

/// Latest-value cell shared by one subscription and its publisher.
#[derive(Debug, Default)]
struct SnapshotSlot {
    state: Mutex<SlotState>,
    ready: Condvar,
}

impl SnapshotSlot {
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn replace(&self, snapshot: Vec<Task>) {
        self.lock().pending = Some(snapshot);
        self.ready.notify_all();
    }

    fn close(&self) {
        self.lock().closed = true;
        self.ready.notify_all();
    }
}

/// Receiving end of a live task-list query.
///
/// The current list is pending right after subscribing; afterwards every
/// store mutation replaces whatever is still unread.
#[derive(Debug)]
pub struct TaskSubscription {
    slot: Arc<SnapshotSlot>,
}

impl TaskSubscription {
    /// Blocks until a snapshot is pending and takes it.
    ///
    /// Returns `None` once the publishing store has been dropped and nothing
    /// is left to read.
    pub fn recv(&self) -> Option<Vec<Task>> {
        let mut state = self.slot.lock();
        loop {
            if let Some(snapshot) = state.pending.take() {
                return Some(snapshot);
            }
            if state.closed {
                return None;
            }
            state = self
                .slot
                .ready
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Takes the pending snapshot without blocking.
    pub fn try_recv(&self) -> Option<Vec<Task>> {
        self.slot.lock().pending.take()
    }

    /// Most recent unread snapshot, if any.
    ///
    /// Same as [`TaskSubscription::try_recv`]; older snapshots are never kept.
    pub fn latest(&self) -> Option<Vec<Task>> {
        self.try_recv()
    }
}

/// Fan-out side owned by a task store.
#[derive(Debug, Default)]
pub(crate) struct SnapshotPublisher {
    subscribers: Mutex<Vec<Weak<SnapshotSlot>>>,
}

impl SnapshotPublisher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber with `initial` already pending.
    pub(crate) fn subscribe(&self, initial: Vec<Task>) -> TaskSubscription {
        let slot = Arc::new(SnapshotSlot::default());
        slot.replace(initial);
        self.lock().push(Arc::downgrade(&slot));
        TaskSubscription { slot }
    }

    pub(crate) fn has_subscribers(&self) -> bool {
        self.lock().iter().any(|slot| slot.strong_count() > 0)
    }

    /// Overwrites the pending snapshot of every live subscriber.
    pub(crate) fn publish(&self, snapshot: &[Task]) {
        let mut subscribers = self.lock();
        let before = subscribers.len();
        subscribers.retain(|weak| match weak.upgrade() {
            Some(slot) => {
                slot.replace(snapshot.to_vec());
                true
            }
            None => false,
        });
        let pruned = before - subscribers.len();
        if pruned > 0 {
            debug!(
                "event=live_query_prune module=repo status=ok pruned={} remaining={}",
                pruned,
                subscribers.len()
            );
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Weak<SnapshotSlot>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for SnapshotPublisher {
    fn drop(&mut self) {
        for slot in self.lock().iter().filter_map(Weak::upgrade) {
            slot.close();
        }
    }
}
