use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::*;
use crate::logic::leak::NotifyError;
use crate::logic::pair_cache::KeyPolicy;
use crate::logic::snapshot::{PredictionResult, SensorField, SimulationInput};
use crate::logic::storage::{FileBackend, MemoryBackend};
use crate::logic::upstream::StalePolicy;

struct CountingNotifier(Arc<AtomicUsize>);

impl Notifier for CountingNotifier {
    fn cue(&self, _event: &LeakEvent) -> Result<(), NotifyError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn config() -> MonitorConfig {
    MonitorConfig {
        muted: false,
        poll_interval_secs: 0,
        ..Default::default()
    }
}

fn open(config: &MonitorConfig, backend: Arc<dyn StateBackend>) -> (Monitor, Arc<AtomicUsize>) {
    let cues = Arc::new(AtomicUsize::new(0));
    let monitor = Monitor::open_with_notifier(config, backend, Box::new(CountingNotifier(cues.clone())));
    (monitor, cues)
}

fn reading(flow: f64, segment: f64, leak: bool) -> Snapshot {
    let result = if leak {
        PredictionResult::leak().with_confidence(0.88)
    } else {
        PredictionResult::no_leak()
    };
    Snapshot::new(
        SimulationInput::default()
            .with(SensorField::FlowIn, flow)
            .with(SensorField::PressureIn, 50.0)
            .with(SensorField::TemperatureIn, 100.0)
            .with_gps_segment(segment),
        result,
    )
}

#[test]
fn test_completion_updates_every_view() {
    let (mut monitor, cues) = open(&config(), Arc::new(MemoryBackend::new()));

    let ticket = monitor.begin_request();
    let applied = monitor
        .apply_completion(ticket, Ok(reading(300.0, 300.0, true)))
        .unwrap()
        .unwrap();

    assert!(Arc::ptr_eq(&monitor.current().unwrap(), &applied));

    let alerts = monitor.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].category, "High Flow Rate");

    let history = monitor.leak_history();
    assert_eq!(history.len(), 1);
    // Default route has two equal legs, so halfway is the middle waypoint
    assert!(history[0].position.planar_distance(&monitor.route().waypoints()[1]) < 1e-9);
    assert_eq!(monitor.map_center(), history[0].position);
    assert_eq!(cues.load(Ordering::SeqCst), 1);

    assert!(Arc::ptr_eq(&monitor.pair_snapshot().unwrap(), &applied));
}

#[test]
fn test_alerts_are_recomputed_not_accumulated() {
    let (mut monitor, _) = open(&config(), Arc::new(MemoryBackend::new()));

    let t = monitor.begin_request();
    monitor.apply_completion(t, Ok(reading(300.0, 1.0, false))).unwrap();
    assert_eq!(monitor.alerts().len(), 1);

    let t = monitor.begin_request();
    monitor.apply_completion(t, Ok(reading(100.0, 1.0, false))).unwrap();
    assert!(monitor.alerts().is_empty());
    assert!(monitor.leak_history().is_empty());
}

#[test]
fn test_failed_request_leaves_store_untouched() {
    let (mut monitor, _) = open(&config(), Arc::new(MemoryBackend::new()));

    let t = monitor.begin_request();
    let before = monitor.apply_completion(t, Ok(reading(10.0, 1.0, false))).unwrap().unwrap();

    let t = monitor.begin_request();
    let err = monitor
        .apply_completion(t, Err(UpstreamError::Server(500)))
        .unwrap_err();
    assert_eq!(err, UpstreamError::Server(500));
    assert!(Arc::ptr_eq(&monitor.current().unwrap(), &before));
}

#[test]
fn test_stale_completion_is_discarded() {
    let (mut monitor, _) = open(&config(), Arc::new(MemoryBackend::new()));

    let slow = monitor.begin_request();
    let fast = monitor.begin_request();
    assert_eq!(monitor.in_flight(), 2);

    monitor.apply_completion(fast, Ok(reading(2.0, 1.0, false))).unwrap();
    let late = monitor.apply_completion(slow, Ok(reading(1.0, 1.0, false))).unwrap();

    assert!(late.is_none());
    assert_eq!(monitor.current().unwrap().sensor(SensorField::FlowIn), Some(2.0));
}

#[test]
fn test_last_write_wins_applies_late_completion() {
    let config = MonitorConfig {
        stale_policy: StalePolicy::LastWriteWins,
        ..config()
    };
    let (mut monitor, _) = open(&config, Arc::new(MemoryBackend::new()));

    let slow = monitor.begin_request();
    let fast = monitor.begin_request();
    monitor.apply_completion(fast, Ok(reading(2.0, 1.0, false))).unwrap();
    monitor.apply_completion(slow, Ok(reading(1.0, 1.0, false))).unwrap();

    assert_eq!(monitor.current().unwrap().sensor(SensorField::FlowIn), Some(1.0));
}

#[test]
fn test_select_returns_cached_pair_without_touching_store() {
    let (mut monitor, _) = open(&config(), Arc::new(MemoryBackend::new()));

    let t = monitor.begin_request();
    let ab = monitor.apply_completion(t, Ok(reading(5.0, 1.0, false))).unwrap().unwrap();

    assert!(monitor.select("C", "D").is_none());
    let t = monitor.begin_request();
    let cd = monitor.apply_completion(t, Ok(reading(6.0, 1.0, false))).unwrap().unwrap();

    let back = monitor.select("A", "B").unwrap();
    assert!(Arc::ptr_eq(&back, &ab));
    assert!(Arc::ptr_eq(&monitor.current().unwrap(), &cd));
    assert_eq!(monitor.cached_pairs(), vec!["A->B".to_string(), "C->D".to_string()]);
}

#[test]
fn test_known_points_policy_skips_unknown_selection() {
    let config = MonitorConfig {
        key_policy: KeyPolicy::known_points(),
        ..config()
    };
    let (mut monitor, _) = open(&config, Arc::new(MemoryBackend::new()));
    monitor.select("A", "Z");

    let t = monitor.begin_request();
    assert!(monitor.apply_completion(t, Ok(reading(5.0, 1.0, false))).unwrap().is_some());
    assert!(monitor.pair_snapshot().is_none());
}

#[test]
fn test_muted_monitor_records_without_cue() {
    let (mut monitor, cues) = open(&config(), Arc::new(MemoryBackend::new()));
    monitor.set_muted(true);
    assert!(monitor.is_muted());

    let t = monitor.begin_request();
    monitor.apply_completion(t, Ok(reading(1.0, 42.0, true))).unwrap();

    assert_eq!(monitor.leak_history().len(), 1);
    assert_eq!(cues.load(Ordering::SeqCst), 0);

    monitor.clear_history();
    assert!(monitor.latest_leak().is_none());
    assert_eq!(monitor.map_center(), monitor.route().midpoint());
}

#[test]
fn test_restart_restores_and_replays() {
    let dir = tempfile::tempdir().unwrap();
    let backend: Arc<dyn StateBackend> = Arc::new(FileBackend::new(dir.path()));

    {
        let (mut monitor, _) = open(&config(), backend.clone());
        monitor.select("B", "C");
        let t = monitor.begin_request();
        monitor.apply_completion(t, Ok(reading(250.0, 150.0, true))).unwrap();
    }

    let (monitor, cues) = open(&config(), backend);
    assert_eq!(monitor.selection(), PointSelection::new("B", "C"));
    assert_eq!(monitor.current().unwrap().sensor(SensorField::FlowIn), Some(250.0));
    assert_eq!(monitor.alerts().len(), 1);
    assert_eq!(monitor.leak_history().len(), 1);
    assert_eq!(cues.load(Ordering::SeqCst), 1);
    assert!(monitor.pair_snapshot().is_some());
}

#[test]
fn test_restart_does_not_cache_under_new_selection() {
    let backend: Arc<dyn StateBackend> = Arc::new(MemoryBackend::new());

    {
        let (mut monitor, _) = open(&config(), backend.clone());
        let t = monitor.begin_request();
        monitor.apply_completion(t, Ok(reading(5.0, 1.0, false))).unwrap();
        assert!(monitor.select("C", "D").is_none());
    }

    let (monitor, _) = open(&config(), backend);
    assert_eq!(monitor.selection(), PointSelection::new("C", "D"));
    assert!(monitor.pair_snapshot().is_none());
    assert_eq!(monitor.cached_pairs(), vec!["A->B".to_string()]);
    assert_eq!(monitor.current().unwrap().sensor(SensorField::FlowIn), Some(5.0));
}

#[test]
fn test_drop_unsubscribes() {
    let (monitor, _) = open(&config(), Arc::new(MemoryBackend::new()));
    let store = monitor.store().clone();
    assert_eq!(store.subscriber_count(), 3);

    drop(monitor);
    assert_eq!(store.subscriber_count(), 0);
}
