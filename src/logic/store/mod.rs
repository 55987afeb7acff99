//! Shared Simulation Store
//!
//! Holds the latest snapshot for every view of the client. `set` persists the
//! new value and notifies subscribers synchronously, in subscription order,
//! before returning. On open, the last persisted snapshot is restored.
//!
//! Persistence is fire-and-forget: a failed write is logged and the in-memory
//! value stays authoritative for the session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::logic::snapshot::Snapshot;
use crate::logic::storage::{self, keys, StateBackend};

/// Handle returned by `subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn(&Arc<Snapshot>) + Send + Sync>;

pub struct SimulationStore {
    current: RwLock<Option<Arc<Snapshot>>>,
    subscribers: RwLock<Vec<(SubscriptionId, Callback)>>,
    next_id: AtomicU64,
    backend: Arc<dyn StateBackend>,
}

impl SimulationStore {
    /// Open the store, restoring the last persisted snapshot if readable
    pub fn open(backend: Arc<dyn StateBackend>) -> Self {
        let restored: Option<Snapshot> =
            storage::load_best_effort(backend.as_ref(), keys::SIMULATION_DATA);

        if restored.is_some() {
            log::info!("Restored last snapshot from storage");
        }

        Self {
            current: RwLock::new(restored.map(Arc::new)),
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            backend,
        }
    }

    pub fn get(&self) -> Option<Arc<Snapshot>> {
        self.current.read().clone()
    }

    /// Replace the current snapshot, persist it, notify subscribers
    pub fn set(&self, snapshot: impl Into<Arc<Snapshot>>) -> Arc<Snapshot> {
        let snapshot = snapshot.into();
        *self.current.write() = Some(snapshot.clone());

        storage::persist_best_effort(self.backend.as_ref(), keys::SIMULATION_DATA, snapshot.as_ref());

        // Snapshot the list so callbacks may subscribe/unsubscribe or read the store
        let callbacks: Vec<Callback> = self
            .subscribers
            .read()
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();

        for cb in callbacks {
            cb(&snapshot);
        }

        snapshot
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Arc<Snapshot>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push((id, Arc::new(callback)));
        id
    }

    /// Returns false if the id was not subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscribers.write();
        let before = subs.len();
        subs.retain(|(sid, _)| *sid != id);
        subs.len() < before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}
