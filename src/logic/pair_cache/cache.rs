use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::KNOWN_POINTS;
use crate::logic::snapshot::Snapshot;
use crate::logic::storage::{self, keys, StateBackend};

const PAIR_SEPARATOR: &str = "->";

/// Ordered (inlet, outlet) selection
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentPair {
    pub inlet: String,
    pub outlet: String,
}

impl SegmentPair {
    pub fn new(inlet: &str, outlet: &str) -> Self {
        Self {
            inlet: inlet.to_string(),
            outlet: outlet.to_string(),
        }
    }

    /// Persisted key form, `"inlet->outlet"`
    pub fn key(&self) -> String {
        format!("{}{}{}", self.inlet, PAIR_SEPARATOR, self.outlet)
    }

    pub fn parse(key: &str) -> Option<Self> {
        let (inlet, outlet) = key.split_once(PAIR_SEPARATOR)?;
        Some(Self::new(inlet, outlet))
    }
}

impl fmt::Display for SegmentPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Which point identifiers the cache accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "points", rename_all = "snake_case")]
pub enum KeyPolicy {
    /// Any identifier is cached
    Permissive,
    /// Only identifiers from this set
    KnownPoints(Vec<String>),
}

impl KeyPolicy {
    pub fn known_points() -> Self {
        KeyPolicy::KnownPoints(KNOWN_POINTS.iter().map(|p| p.to_string()).collect())
    }

    /// Ids containing the key separator are refused under every policy,
    /// since their persisted key could not be split back into the same pair.
    pub fn check(&self, point: &str) -> Result<(), PairCacheError> {
        if point.contains(PAIR_SEPARATOR) {
            return Err(PairCacheError::ReservedSeparator(point.to_string()));
        }
        match self {
            KeyPolicy::Permissive => Ok(()),
            KeyPolicy::KnownPoints(points) if points.iter().any(|p| p == point) => Ok(()),
            KeyPolicy::KnownPoints(_) => Err(PairCacheError::UnknownPoint(point.to_string())),
        }
    }
}

impl Default for KeyPolicy {
    fn default() -> Self {
        KeyPolicy::Permissive
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PairCacheError {
    #[error("Unknown pipeline point '{0}'")]
    UnknownPoint(String),

    #[error("Pipeline point '{0}' contains the reserved '->' separator")]
    ReservedSeparator(String),
}

/// Last snapshot seen per (inlet, outlet) selection, persisted across sessions
pub struct SegmentPairCache {
    entries: BTreeMap<SegmentPair, Arc<Snapshot>>,
    policy: KeyPolicy,
    backend: Arc<dyn StateBackend>,
}

impl SegmentPairCache {
    /// Load the persisted map; unreadable data starts an empty cache
    pub fn open(backend: Arc<dyn StateBackend>, policy: KeyPolicy) -> Self {
        let stored: BTreeMap<String, Snapshot> =
            storage::load_best_effort(backend.as_ref(), keys::SEGMENT_PAIR_CACHE).unwrap_or_default();

        let entries: BTreeMap<SegmentPair, Arc<Snapshot>> = stored
            .into_iter()
            .filter_map(|(key, snap)| match SegmentPair::parse(&key) {
                Some(pair) => Some((pair, Arc::new(snap))),
                None => {
                    log::warn!("Dropping malformed pair cache key '{}'", key);
                    None
                }
            })
            .collect();

        log::debug!("Segment pair cache loaded: {} entries", entries.len());

        Self {
            entries,
            policy,
            backend,
        }
    }

    /// Store or overwrite the entry for `(inlet, outlet)` and persist the map
    pub fn record(
        &mut self,
        inlet: &str,
        outlet: &str,
        snapshot: Arc<Snapshot>,
    ) -> Result<(), PairCacheError> {
        self.policy.check(inlet)?;
        self.policy.check(outlet)?;

        self.entries.insert(SegmentPair::new(inlet, outlet), snapshot);
        self.persist();
        Ok(())
    }

    pub fn lookup(&self, inlet: &str, outlet: &str) -> Option<Arc<Snapshot>> {
        self.entries.get(&SegmentPair::new(inlet, outlet)).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = &SegmentPair> {
        self.entries.keys()
    }

    fn persist(&self) {
        let doc: BTreeMap<String, &Snapshot> = self
            .entries
            .iter()
            .map(|(pair, snap)| (pair.key(), snap.as_ref()))
            .collect();
        storage::persist_best_effort(self.backend.as_ref(), keys::SEGMENT_PAIR_CACHE, &doc);
    }
}
