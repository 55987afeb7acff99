//! Segment Pair Cache
//!
//! Remembers the last snapshot seen for each (inlet, outlet) selection so that
//! switching back to a pair, even after a restart, shows its last readings.
//!
//! Keys are accepted as-is by default; `KeyPolicy::KnownPoints` restricts
//! them to the fixed point set.

pub mod cache;
pub mod selection;

pub use cache::{KeyPolicy, PairCacheError, SegmentPair, SegmentPairCache};
pub use selection::PointSelection;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::logic::snapshot::{PredictionResult, SensorField, SimulationInput, Snapshot};
    use crate::logic::storage::{keys, FileBackend, MemoryBackend, StateBackend};

    fn snap(flow: f64) -> Arc<Snapshot> {
        Arc::new(Snapshot::new(
            SimulationInput::default()
                .with(SensorField::FlowIn, flow)
                .with_gps_segment(1001.0),
            PredictionResult::no_leak().with_confidence(0.4),
        ))
    }

    fn memory() -> Arc<dyn StateBackend> {
        Arc::new(MemoryBackend::new())
    }

    #[test]
    fn test_record_and_lookup() {
        let mut cache = SegmentPairCache::open(memory(), KeyPolicy::Permissive);
        assert!(cache.lookup("A", "B").is_none());

        cache.record("A", "B", snap(221.0)).unwrap();
        cache.record("A", "B", snap(223.0)).unwrap();
        cache.record("C", "D", snap(100.0)).unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.lookup("A", "B").unwrap().sensor(SensorField::FlowIn), Some(223.0));
        // Direction matters
        assert!(cache.lookup("B", "A").is_none());
    }

    #[test]
    fn test_round_trip_across_restart() {
        let dir = tempfile::tempdir().unwrap();
        let backend: Arc<dyn StateBackend> = Arc::new(FileBackend::new(dir.path()));
        let recorded = snap(224.7);

        {
            let mut cache = SegmentPairCache::open(backend.clone(), KeyPolicy::Permissive);
            cache.record("A", "B", recorded.clone()).unwrap();
        }

        let reopened = SegmentPairCache::open(backend, KeyPolicy::Permissive);
        let restored = reopened.lookup("A", "B").unwrap();
        assert_eq!(*restored, *recorded);
    }

    #[test]
    fn test_persisted_layout_uses_arrow_keys() {
        let backend = memory();
        let mut cache = SegmentPairCache::open(backend.clone(), KeyPolicy::Permissive);
        cache.record("A", "C", snap(1.0)).unwrap();

        let raw = backend.load(keys::SEGMENT_PAIR_CACHE).unwrap().unwrap();
        let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(doc.get("A->C").is_some());
    }

    #[test]
    fn test_record_is_idempotent() {
        let backend = memory();
        let mut cache = SegmentPairCache::open(backend.clone(), KeyPolicy::Permissive);
        let s = snap(5.0);

        cache.record("B", "D", s.clone()).unwrap();
        let once = backend.load(keys::SEGMENT_PAIR_CACHE).unwrap();
        cache.record("B", "D", s.clone()).unwrap();
        let twice = backend.load(keys::SEGMENT_PAIR_CACHE).unwrap();

        assert_eq!(once, twice);
        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(&cache.lookup("B", "D").unwrap(), &s));
    }

    #[test]
    fn test_permissive_accepts_unknown_points() {
        let mut cache = SegmentPairCache::open(memory(), KeyPolicy::default());
        cache.record("Z", "valve-9", snap(2.0)).unwrap();
        assert!(cache.lookup("Z", "valve-9").is_some());
    }

    #[test]
    fn test_separator_in_point_is_rejected() {
        let backend = memory();
        let mut cache = SegmentPairCache::open(backend.clone(), KeyPolicy::Permissive);

        assert_eq!(
            cache.record("X->Y", "Z", snap(3.0)),
            Err(PairCacheError::ReservedSeparator("X->Y".into()))
        );
        assert!(cache.record("X", "Y->Z", snap(3.0)).is_err());
        assert!(cache.is_empty());

        // Every accepted pair reloads under the same key
        cache.record("X-", ">Y", snap(4.0)).unwrap();
        let reopened = SegmentPairCache::open(backend, KeyPolicy::Permissive);
        assert!(reopened.lookup("X-", ">Y").is_some());
    }

    #[test]
    fn test_known_points_rejects_out_of_set() {
        let mut cache = SegmentPairCache::open(memory(), KeyPolicy::known_points());
        assert_eq!(
            cache.record("A", "E", snap(2.0)),
            Err(PairCacheError::UnknownPoint("E".into()))
        );
        // Case-sensitive
        assert!(cache.record("a", "B", snap(2.0)).is_err());
        assert!(cache.record("A", "D", snap(2.0)).is_ok());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_selection_defaults_and_persistence() {
        let backend = memory();
        assert_eq!(PointSelection::load(&backend), PointSelection::new("A", "B"));

        PointSelection::new("C", "D").save(&backend);
        assert_eq!(PointSelection::load(&backend), PointSelection::new("C", "D"));
    }

    #[test]
    fn test_pair_key_parse() {
        let pair = SegmentPair::parse("A->B").unwrap();
        assert_eq!(pair, SegmentPair::new("A", "B"));
        assert_eq!(pair.key(), "A->B");
        assert!(SegmentPair::parse("AB").is_none());
    }
}
