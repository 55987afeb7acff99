use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::*;
use crate::logic::geo::{LatLng, Route};
use crate::logic::snapshot::{PredictionResult, SegmentId, SensorField, SimulationInput, Snapshot};

/// Counts cues, optionally failing every one of them
struct CountingNotifier {
    hits: Arc<AtomicUsize>,
    fail: bool,
}

impl Notifier for CountingNotifier {
    fn cue(&self, _event: &LeakEvent) -> Result<(), NotifyError> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(NotifyError::Other("no audio device".into()))
        } else {
            Ok(())
        }
    }
}

fn tracker_with_counter(fail: bool) -> (LeakTracker, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let tracker = LeakTracker::new(20, 600.0).with_notifier(Box::new(CountingNotifier {
        hits: hits.clone(),
        fail,
    }));
    (tracker, hits)
}

fn leak(segment: f64) -> Arc<Snapshot> {
    Arc::new(Snapshot::new(
        SimulationInput::default()
            .with(SensorField::FlowIn, 224.0)
            .with_gps_segment(segment),
        PredictionResult::leak().with_confidence(0.91),
    ))
}

fn no_leak() -> Arc<Snapshot> {
    Arc::new(Snapshot::new(
        SimulationInput::default().with(SensorField::FlowIn, 221.0),
        PredictionResult::no_leak(),
    ))
}

#[test]
fn test_no_leak_leaves_history_unchanged() {
    let (mut tracker, hits) = tracker_with_counter(false);
    let route = Route::default();

    tracker.on_snapshot(&leak(10.0), &route);
    assert_eq!(tracker.len(), 1);

    assert!(tracker.on_snapshot(&no_leak(), &route).is_none());
    assert_eq!(tracker.len(), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_leak_event_fields() {
    let (mut tracker, _) = tracker_with_counter(false);
    let route = Route::new(vec![
        LatLng::new(0.0, 0.0),
        LatLng::new(0.0, 1.0),
        LatLng::new(0.0, 2.0),
    ])
    .unwrap();

    let snap = leak(300.0);
    let event = tracker.on_snapshot(&snap, &route).unwrap();

    assert_eq!(event.segment, SegmentId::Number(300.0));
    assert_eq!(event.position, LatLng::new(0.0, 1.0));
    assert_eq!(event.schematic_offset, 300.0);
    assert_eq!(event.confidence, Some(0.91));
    assert!(Arc::ptr_eq(&event.source, &snap));
    assert!(event.id.starts_with("leak-300-"));
    assert_eq!(tracker.latest(), Some(&event));
}

#[test]
fn test_history_capped_most_recent_first() {
    let (mut tracker, _) = tracker_with_counter(false);
    let route = Route::default();

    for seg in 0..25 {
        tracker.on_snapshot(&leak(seg as f64), &route);
        assert!(tracker.len() <= 20);
    }

    let segments: Vec<f64> = tracker
        .history()
        .map(|e| e.segment.value().unwrap())
        .collect();
    let expected: Vec<f64> = (5..25).rev().map(|s| s as f64).collect();
    assert_eq!(segments, expected);
}

#[test]
fn test_ids_unique_within_same_instant() {
    let (mut tracker, _) = tracker_with_counter(false);
    let route = Route::default();

    let ids: HashSet<String> = (0..20)
        .filter_map(|_| tracker.on_snapshot(&leak(7.0), &route))
        .map(|e| e.id)
        .collect();
    assert_eq!(ids.len(), 20);
}

#[test]
fn test_same_snapshot_is_not_a_new_leak() {
    let (mut tracker, hits) = tracker_with_counter(false);
    let route = Route::default();
    let snap = leak(42.0);

    assert!(tracker.on_snapshot(&snap, &route).is_some());
    assert!(tracker.on_snapshot(&snap, &route).is_none());
    assert_eq!(tracker.len(), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_segment_fallbacks() {
    let (mut tracker, _) = tracker_with_counter(false);
    let route = Route::default();

    let mut input = SimulationInput::default();
    input.segment_id = Some(SegmentId::Number(120.0));
    let snap = Arc::new(Snapshot::new(input, PredictionResult::leak()));
    let event = tracker.on_snapshot(&snap, &route).unwrap();
    assert_eq!(event.segment.value(), Some(120.0));

    let bare = Arc::new(Snapshot::new(SimulationInput::default(), PredictionResult::leak()));
    let event = tracker.on_snapshot(&bare, &route).unwrap();
    assert!(event.segment.is_zero());
    assert_eq!(event.position, route.first());
    assert_eq!(event.confidence, None);
}

#[test]
fn test_missing_input_is_no_leak() {
    let (mut tracker, _) = tracker_with_counter(false);
    let snap = Arc::new(Snapshot {
        simulation_input: None,
        result: Some(PredictionResult::leak()),
    });
    assert!(tracker.on_snapshot(&snap, &Route::default()).is_none());
    assert!(tracker.is_empty());
}

#[test]
fn test_muted_and_failing_cues() {
    let (mut tracker, hits) = tracker_with_counter(true);
    let route = Route::default();

    // Cue failure never reaches the caller
    assert!(tracker.on_snapshot(&leak(1.0), &route).is_some());
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    tracker.set_muted(true);
    assert!(tracker.on_snapshot(&leak(2.0), &route).is_some());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(tracker.len(), 2);
}

#[test]
fn test_map_center() {
    let (mut tracker, _) = tracker_with_counter(false);
    let route = Route::default();
    assert_eq!(tracker.map_center(&route), route.midpoint());

    let event = tracker.on_snapshot(&leak(150.0), &route).unwrap();
    assert_eq!(tracker.map_center(&route), event.position);
}

#[test]
fn test_report_csv() {
    let (mut tracker, _) = tracker_with_counter(false);
    let event = tracker.on_snapshot(&leak(1042.0), &Route::default()).unwrap();

    let csv = event.report_csv();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "key,value");
    assert!(lines.contains(&"flow_in,224"));
    assert!(lines.contains(&"gps_segment_id,1042"));
    assert_eq!(event.report_file_name(), "leak_1042.csv");
}

#[test]
fn test_report_name_without_segment() {
    let mut tracker = LeakTracker::new(20, 600.0).with_notifier(Box::new(SilentNotifier));
    let bare = Arc::new(Snapshot::new(SimulationInput::default(), PredictionResult::leak()));
    let event = tracker.on_snapshot(&bare, &Route::default()).unwrap();
    assert_eq!(event.report_file_name(), "leak_unknown.csv");
}

#[test]
fn test_report_name_stays_in_directory() {
    let (mut tracker, _) = tracker_with_counter(false);

    let mut input = SimulationInput::default();
    input.gps_segment_id = Some(SegmentId::Text("../etc/passwd".to_string()));
    let snap = Arc::new(Snapshot::new(input, PredictionResult::leak()));
    let event = tracker.on_snapshot(&snap, &Route::default()).unwrap();

    let name = event.report_file_name();
    assert_eq!(name, "leak_.._etc_passwd.csv");
    assert!(!name.contains('/'));

    let mut input = SimulationInput::default();
    input.gps_segment_id = Some(SegmentId::Text("seg 7\\b:c".to_string()));
    let snap = Arc::new(Snapshot::new(input, PredictionResult::leak()));
    let event = tracker.on_snapshot(&snap, &Route::default()).unwrap();
    assert_eq!(event.report_file_name(), "leak_seg_7_b_c.csv");
}
