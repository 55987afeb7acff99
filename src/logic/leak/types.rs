use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::geo::LatLng;
use crate::logic::snapshot::{SegmentId, Snapshot};

/// A detected leak with its resolved map position. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakEvent {
    pub id: String,
    pub segment: SegmentId,
    pub position: LatLng,
    /// Marker offset on the linear pipe schematic
    pub schematic_offset: f64,
    pub detected_at: DateTime<Utc>,
    pub confidence: Option<f64>,
    /// Snapshot that produced this event (shared, read-only)
    pub source: Arc<Snapshot>,
}

impl LeakEvent {
    /// One-line summary for alert lists
    pub fn headline(&self) -> String {
        format!(
            "Leak at segment {} @ {:.5}, {:.5} ({})",
            self.segment,
            self.position.lat,
            self.position.lng,
            self.detected_at.format("%Y-%m-%d %H:%M:%S")
        )
    }

    /// `key,value` CSV of the sensor input that triggered the leak
    pub fn report_csv(&self) -> String {
        let mut out = String::from("key,value\n");
        if let Some(input) = self.source.input() {
            for (key, value) in input.entries() {
                let _ = writeln!(out, "{},{}", escape_csv(&key), escape_csv(&value));
            }
        }
        out
    }

    /// Report file name; segment characters outside `[A-Za-z0-9_.-]` become `_`
    pub fn report_file_name(&self) -> String {
        if self.segment.is_zero() {
            return "leak_unknown.csv".to_string();
        }
        let segment: String = self
            .segment
            .to_string()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') { c } else { '_' })
            .collect();
        format!("leak_{}.csv", segment)
    }
}

fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
