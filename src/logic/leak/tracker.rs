use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;

use super::notifier::{Notifier, TerminalBell};
use super::types::LeakEvent;
use crate::logic::geo::{self, LatLng, Route};
use crate::logic::snapshot::Snapshot;

/// Derives leak events from snapshots and keeps a capped,
/// most-recent-first history.
pub struct LeakTracker {
    history: VecDeque<LeakEvent>,
    capacity: usize,
    reference_length: f64,
    sequence: u64,
    muted: bool,
    last_source: Option<Arc<Snapshot>>,
    notifier: Box<dyn Notifier>,
}

impl LeakTracker {
    pub fn new(capacity: usize, reference_length: f64) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
            reference_length,
            sequence: 0,
            muted: false,
            last_source: None,
            notifier: Box::new(TerminalBell),
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }

    /// React to a snapshot change.
    ///
    /// Returns the new event when the snapshot signals a leak. Delivering the
    /// same snapshot (same `Arc`) twice is not a change and yields nothing.
    pub fn on_snapshot(&mut self, snapshot: &Arc<Snapshot>, route: &Route) -> Option<LeakEvent> {
        if let Some(prev) = &self.last_source {
            if Arc::ptr_eq(prev, snapshot) {
                return None;
            }
        }
        self.last_source = Some(snapshot.clone());

        if !snapshot.is_leak() {
            return None;
        }
        let input = snapshot.input()?;

        let segment = input.segment();
        let position = geo::locate(Some(&segment), route, self.reference_length);
        self.sequence += 1;

        let event = LeakEvent {
            id: format!("leak-{}-{}", segment, self.sequence),
            schematic_offset: geo::schematic_offset(&segment, self.reference_length),
            segment,
            position,
            detected_at: Utc::now(),
            confidence: snapshot.confidence(),
            source: snapshot.clone(),
        };

        self.push(event.clone());
        log::info!("Leak recorded: {} ({} in history)", event.id, self.history.len());

        if !self.muted {
            if let Err(e) = self.notifier.cue(&event) {
                log::debug!("Leak cue failed: {}", e);
            }
        }

        Some(event)
    }

    fn push(&mut self, event: LeakEvent) {
        if self.history.iter().any(|e| e.id == event.id) {
            return;
        }
        self.history.push_front(event);
        while self.history.len() > self.capacity {
            self.history.pop_back();
        }
    }

    /// Most recent first
    pub fn history(&self) -> impl Iterator<Item = &LeakEvent> {
        self.history.iter()
    }

    pub fn latest(&self) -> Option<&LeakEvent> {
        self.history.front()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Latest leak position, else the route midpoint
    pub fn map_center(&self, route: &Route) -> LatLng {
        self.latest()
            .map(|e| e.position)
            .unwrap_or_else(|| route.midpoint())
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}
