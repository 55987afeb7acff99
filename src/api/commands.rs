//! Console Commands - operator interface to the monitor
//!
//! Lines typed on stdin are parsed into `Command`s. Local commands run
//! directly against the `Monitor`; upstream commands (simulate, predict,
//! hardware, equipment) are dispatched by the event loop.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::logic::leak::LeakEvent;
use crate::logic::monitor::Monitor;
use crate::logic::snapshot::{SensorField, SimulationInput, Snapshot};
use crate::logic::upstream::{Component, FailureDetail, HardwareStatus};

// ============================================================================
// COMMANDS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Simulate,
    Predict(SimulationInput),
    Hardware,
    /// Component list, or one component's failure detail
    Equipment(Option<i64>),
    Select { inlet: String, outlet: String },
    Mute,
    Unmute,
    Status,
    Alerts,
    History,
    Pairs,
    Report(Option<PathBuf>),
    Clear,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  simulate                     request a new simulated reading
  predict key=value ...        classify manual readings (all sensor fields + gps_segment_id)
  hardware                     show sensor connection status
  equipment [id]               list components, or show one component's failure detail
  select <inlet> <outlet>      switch the monitored point pair
  mute | unmute                toggle the leak cue
  status                       current reading, prediction and map center
  alerts                       active threshold alerts
  history                      recent leak events
  pairs                        cached point pairs
  report [dir]                 write the latest leak as CSV
  clear                        clear leak history
  quit";

pub fn parse(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err("empty command".into());
    };

    let command = match head.to_lowercase().as_str() {
        "simulate" | "sim" => Command::Simulate,
        "predict" => Command::Predict(parse_readings(words)?),
        "hardware" | "hw" => Command::Hardware,
        "equipment" | "eq" => match words.next() {
            None => Command::Equipment(None),
            Some(id) => Command::Equipment(Some(
                id.parse().map_err(|_| format!("invalid component id '{}'", id))?,
            )),
        },
        "select" => match (words.next(), words.next()) {
            (Some(inlet), Some(outlet)) => Command::Select {
                inlet: inlet.to_string(),
                outlet: outlet.to_string(),
            },
            _ => return Err("usage: select <inlet> <outlet>".into()),
        },
        "mute" => Command::Mute,
        "unmute" => Command::Unmute,
        "status" => Command::Status,
        "alerts" => Command::Alerts,
        "history" => Command::History,
        "pairs" => Command::Pairs,
        "report" => Command::Report(words.next().map(PathBuf::from)),
        "clear" => Command::Clear,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command '{}' (try 'help')", other)),
    };
    Ok(command)
}

/// `key=value` pairs into a sensor input; numeric text becomes a number
fn parse_readings<'a>(pairs: impl Iterator<Item = &'a str>) -> Result<SimulationInput, String> {
    let mut doc = Map::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got '{}'", pair))?;
        let value = match raw.parse::<f64>() {
            Ok(n) => serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null),
            Err(_) => Value::String(raw.to_string()),
        };
        doc.insert(key.to_string(), value);
    }
    serde_json::from_value(Value::Object(doc)).map_err(|e| e.to_string())
}

// ============================================================================
// LOCAL EXECUTION
// ============================================================================

/// Run a command that needs no upstream request. Returns text to print.
pub fn execute_local(monitor: &mut Monitor, command: &Command, data_dir: &Path) -> Option<String> {
    let text = match command {
        Command::Select { inlet, outlet } => match monitor.select(inlet, outlet) {
            Some(cached) => format!(
                "Selected {} -> {}\n{}",
                inlet,
                outlet,
                render_snapshot(&cached)
            ),
            None => format!("Selected {} -> {} (no cached readings)", inlet, outlet),
        },
        Command::Mute => {
            monitor.set_muted(true);
            "Leak cue muted".to_string()
        }
        Command::Unmute => {
            monitor.set_muted(false);
            "Leak cue enabled".to_string()
        }
        Command::Status => render_status(monitor),
        Command::Alerts => render_alerts(monitor),
        Command::History => {
            let history = monitor.leak_history();
            format!(
                "{} of {} leak events\n{}",
                history.len(),
                monitor.history_capacity(),
                render_history(&history)
            )
        }
        Command::Pairs => {
            let pairs = monitor.cached_pairs();
            if pairs.is_empty() {
                "No cached pairs".to_string()
            } else {
                pairs.join("\n")
            }
        }
        Command::Report(dir) => {
            let dir = dir.clone().unwrap_or_else(|| data_dir.join("reports"));
            match monitor.latest_leak() {
                Some(event) => match write_report(&event, &dir) {
                    Ok(path) => format!("Report written to {}", path.display()),
                    Err(e) => format!("Report failed: {}", e),
                },
                None => "No leak to report".to_string(),
            }
        }
        Command::Clear => {
            monitor.clear_history();
            "Leak history cleared".to_string()
        }
        Command::Help => HELP.to_string(),
        Command::Simulate
        | Command::Predict(_)
        | Command::Hardware
        | Command::Equipment(_)
        | Command::Quit => return None,
    };
    Some(text)
}

pub fn write_report(event: &LeakEvent, dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(event.report_file_name());
    std::fs::write(&path, event.report_csv())?;
    log::info!("Leak report saved: {:?}", path);
    Ok(path)
}

// ============================================================================
// RENDERING
// ============================================================================

pub fn render_snapshot(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    let verdict = if snapshot.is_leak() { "LEAK" } else { "no leak" };
    let _ = write!(out, "Prediction: {}", verdict);
    if let Some(c) = snapshot.confidence() {
        let _ = write!(out, " ({:.0}% confidence)", c * 100.0);
    }

    let Some(input) = snapshot.input() else {
        out.push_str("\n  (no sensor input)");
        return out;
    };

    let _ = write!(out, "\n  segment: {}", input.segment());
    for field in SensorField::ALL {
        if let Some(v) = input.get(field) {
            let _ = write!(out, "\n  {:<18} {:.2}", field.label(), v);
        }
    }
    if let Some(diff) = input.flow_difference() {
        let _ = write!(out, "\n  {:<18} {:.2}", "Flow difference", diff);
    }
    out
}

pub fn render_status(monitor: &Monitor) -> String {
    let selection = monitor.selection();
    let center = monitor.map_center();
    let (sw, ne) = monitor.route().bounds();
    let body = match monitor.current() {
        Some(snap) => render_snapshot(&snap),
        None => "No readings yet".to_string(),
    };

    format!(
        "Pair {} -> {} | cue {} | map center ({:.5}, {:.5})\n\
         Route: {} waypoints, bounds ({:.5}, {:.5}) to ({:.5}, {:.5})\n{}",
        selection.inlet,
        selection.outlet,
        if monitor.is_muted() { "muted" } else { "on" },
        center.lat,
        center.lng,
        monitor.route().len(),
        sw.lat,
        sw.lng,
        ne.lat,
        ne.lng,
        body
    )
}

pub fn render_alerts(monitor: &Monitor) -> String {
    let alerts = monitor.alerts();
    if alerts.is_empty() {
        return "No active alerts".to_string();
    }
    alerts
        .iter()
        .map(|a| format!("[{:?}] {}: {:.2} {}", a.severity, a.category, a.value, a.unit))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_history(history: &[LeakEvent]) -> String {
    if history.is_empty() {
        return "No leaks recorded".to_string();
    }
    history
        .iter()
        .map(|e| match e.confidence {
            Some(c) => format!("{}  [{}, {:.0}%]", e.headline(), e.id, c * 100.0),
            None => format!("{}  [{}]", e.headline(), e.id),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_hardware(sensors: &[HardwareStatus]) -> String {
    if sensors.is_empty() {
        return "No sensors reported".to_string();
    }
    sensors
        .iter()
        .map(|s| format!("{:<24} {}", s.name, s.status_label()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_components(components: &[Component]) -> String {
    if components.is_empty() {
        return "No components reported".to_string();
    }
    components
        .iter()
        .map(|c| format!("{:>4}  {}", c.id, c.name))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_failure(id: i64, detail: &FailureDetail) -> String {
    format!(
        "Component {}\n  Status:             {}\n  Last checked:       {}\n  Failure cause:      {}\n  Recommended action: {}",
        id, detail.status, detail.last_checked, detail.cause, detail.recommendation
    )
}

// ============================================================================
// TESTS
// ============================================================================
