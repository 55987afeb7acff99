//! Monitor - Single Event-Processing Path
//!
//! Owns the simulation store and every view derived from it. Subscribers are
//! registered in a fixed order on open:
//! 1. alert evaluator (recomputed from scratch)
//! 2. leak tracker (history + cue)
//! 3. segment pair cache (records under the current selection)
//!
//! Upstream completions enter through `apply_completion`; failures and stale
//! responses leave the store untouched.

#[cfg(test)]
mod tests;

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::logic::alerts::{self, Alert, AlertRule};
use crate::logic::config::MonitorConfig;
use crate::logic::geo::{LatLng, Route};
use crate::logic::leak::{LeakEvent, LeakTracker, Notifier, TerminalBell};
use crate::logic::pair_cache::{PointSelection, SegmentPairCache};
use crate::logic::snapshot::Snapshot;
use crate::logic::storage::StateBackend;
use crate::logic::store::{SimulationStore, SubscriptionId};
use crate::logic::upstream::{RequestSequencer, Ticket, UpstreamError};

// ============================================================================
// DERIVED VIEWS
// ============================================================================

/// State recomputed on every snapshot change
struct Views {
    route: Route,
    rules: Vec<AlertRule>,
    alerts: RwLock<Vec<Alert>>,
    tracker: Mutex<LeakTracker>,
    cache: Mutex<SegmentPairCache>,
    selection: RwLock<PointSelection>,
}

impl Views {
    fn refresh_alerts(&self, snapshot: &Arc<Snapshot>) {
        let fresh = alerts::evaluate(snapshot, &self.rules);
        if !fresh.is_empty() {
            log::debug!("{} threshold alert(s) active", fresh.len());
        }
        *self.alerts.write() = fresh;
    }

    fn track_leak(&self, snapshot: &Arc<Snapshot>) {
        self.tracker.lock().on_snapshot(snapshot, &self.route);
    }

    fn remember_pair(&self, snapshot: &Arc<Snapshot>) {
        let selection = self.selection.read().clone();
        if let Err(e) = self
            .cache
            .lock()
            .record(&selection.inlet, &selection.outlet, snapshot.clone())
        {
            log::warn!("Pair {} -> {} not cached: {}", selection.inlet, selection.outlet, e);
        }
    }

    /// Rebuild views for a restored snapshot. The pair cache already holds it
    /// under the pair it was observed with, so it is not recorded again.
    fn restore(&self, snapshot: &Arc<Snapshot>) {
        self.refresh_alerts(snapshot);
        self.track_leak(snapshot);
    }
}

// ============================================================================
// MONITOR
// ============================================================================

pub struct Monitor {
    store: Arc<SimulationStore>,
    views: Arc<Views>,
    sequencer: RequestSequencer,
    backend: Arc<dyn StateBackend>,
    subscriptions: Vec<SubscriptionId>,
}

impl Monitor {
    pub fn open(config: &MonitorConfig, backend: Arc<dyn StateBackend>) -> Self {
        Self::open_with_notifier(config, backend, Box::new(TerminalBell))
    }

    /// Open the store, wire subscribers, then replay any restored snapshot
    pub fn open_with_notifier(
        config: &MonitorConfig,
        backend: Arc<dyn StateBackend>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let store = Arc::new(SimulationStore::open(backend.clone()));

        let tracker = LeakTracker::new(config.history_capacity, config.reference_length)
            .with_notifier(notifier)
            .with_muted(config.muted);

        let views = Arc::new(Views {
            route: config.route.clone(),
            rules: config.alert_rules.clone(),
            alerts: RwLock::new(Vec::new()),
            tracker: Mutex::new(tracker),
            cache: Mutex::new(SegmentPairCache::open(backend.clone(), config.key_policy.clone())),
            selection: RwLock::new(PointSelection::load(&backend)),
        });

        let mut subscriptions = Vec::with_capacity(3);
        let v = views.clone();
        subscriptions.push(store.subscribe(move |snap| v.refresh_alerts(snap)));
        let v = views.clone();
        subscriptions.push(store.subscribe(move |snap| v.track_leak(snap)));
        let v = views.clone();
        subscriptions.push(store.subscribe(move |snap| v.remember_pair(snap)));

        let monitor = Self {
            store,
            views,
            sequencer: RequestSequencer::new(config.stale_policy),
            backend,
            subscriptions,
        };
        monitor.replay_current();

        log::info!(
            "Monitor ready (selection {} -> {}, {} alert rules)",
            monitor.selection().inlet,
            monitor.selection().outlet,
            monitor.views.rules.len()
        );
        monitor
    }

    /// Rebuild alerts and leak history from the current snapshot without a store write
    pub fn replay_current(&self) {
        if let Some(snapshot) = self.store.get() {
            log::debug!("Replaying restored snapshot");
            self.views.restore(&snapshot);
        }
    }

    // ---- upstream -----------------------------------------------------------

    /// Ticket for a request about to be sent
    pub fn begin_request(&mut self) -> Ticket {
        self.sequencer.issue()
    }

    /// Apply an upstream completion.
    ///
    /// `Ok(Some)` is the snapshot now current; `Ok(None)` means the response
    /// was stale and discarded. Errors are handed back with the store untouched.
    pub fn apply_completion(
        &mut self,
        ticket: Ticket,
        result: Result<Snapshot, UpstreamError>,
    ) -> Result<Option<Arc<Snapshot>>, UpstreamError> {
        let snapshot = result?;

        if !self.sequencer.accept(ticket) {
            log::info!("Discarding stale response #{}", ticket.value());
            return Ok(None);
        }

        Ok(Some(self.store.set(snapshot)))
    }

    pub fn in_flight(&self) -> u64 {
        self.sequencer.in_flight()
    }

    // ---- selection ----------------------------------------------------------

    /// Change the inlet/outlet pair.
    ///
    /// Persists the selection and returns the pair's last cached snapshot for
    /// display. The shared store is not modified.
    pub fn select(&mut self, inlet: &str, outlet: &str) -> Option<Arc<Snapshot>> {
        let selection = PointSelection::new(inlet, outlet);
        selection.save(&self.backend);
        *self.views.selection.write() = selection;

        log::info!("Selected {} -> {}", inlet, outlet);
        self.pair_snapshot()
    }

    pub fn selection(&self) -> PointSelection {
        self.views.selection.read().clone()
    }

    /// Last snapshot recorded for the current selection
    pub fn pair_snapshot(&self) -> Option<Arc<Snapshot>> {
        let selection = self.views.selection.read();
        self.views.cache.lock().lookup(&selection.inlet, &selection.outlet)
    }

    pub fn cached_pairs(&self) -> Vec<String> {
        self.views.cache.lock().pairs().map(|p| p.key()).collect()
    }

    // ---- views --------------------------------------------------------------

    pub fn store(&self) -> &Arc<SimulationStore> {
        &self.store
    }

    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.store.get()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.views.alerts.read().clone()
    }

    /// Most recent first
    pub fn leak_history(&self) -> Vec<LeakEvent> {
        self.views.tracker.lock().history().cloned().collect()
    }

    pub fn history_capacity(&self) -> usize {
        self.views.tracker.lock().capacity()
    }

    pub fn latest_leak(&self) -> Option<LeakEvent> {
        self.views.tracker.lock().latest().cloned()
    }

    pub fn map_center(&self) -> LatLng {
        self.views.tracker.lock().map_center(&self.views.route)
    }

    pub fn route(&self) -> &Route {
        &self.views.route
    }

    pub fn set_muted(&self, muted: bool) {
        self.views.tracker.lock().set_muted(muted);
    }

    pub fn is_muted(&self) -> bool {
        self.views.tracker.lock().is_muted()
    }

    pub fn clear_history(&self) {
        self.views.tracker.lock().clear();
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        for id in self.subscriptions.drain(..) {
            self.store.unsubscribe(id);
        }
    }
}
