//! Alert Rule Table
//!
//! Thresholds are configuration, not code: the defaults below can be replaced
//! wholesale from the monitor config file.

use serde::{Deserialize, Serialize};

use crate::logic::snapshot::SensorField;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    AtLeast,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    AtMost,
}

impl Comparison {
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::GreaterThan => value > threshold,
            Self::AtLeast => value >= threshold,
            Self::LessThan => value < threshold,
            Self::AtMost => value <= threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub field: SensorField,
    pub operator: Comparison,
    pub threshold: f64,
    pub category: String,
    pub unit: String,
    pub severity: Severity,
}

impl AlertRule {
    pub fn new(
        field: SensorField,
        operator: Comparison,
        threshold: f64,
        category: &str,
        unit: &str,
        severity: Severity,
    ) -> Self {
        Self {
            field,
            operator,
            threshold,
            category: category.to_string(),
            unit: unit.to_string(),
            severity,
        }
    }

    pub fn fires(&self, value: f64) -> bool {
        self.operator.holds(value, self.threshold)
    }
}

/// Inlet over-range rules
pub fn default_rules() -> Vec<AlertRule> {
    vec![
        AlertRule::new(
            SensorField::FlowIn,
            Comparison::GreaterThan,
            222.0,
            "High Flow Rate",
            "L/s",
            Severity::Critical,
        ),
        AlertRule::new(
            SensorField::PressureIn,
            Comparison::GreaterThan,
            115.0,
            "High Pressure",
            "Pa",
            Severity::High,
        ),
        AlertRule::new(
            SensorField::TemperatureIn,
            Comparison::GreaterThan,
            123.0,
            "High Temperature",
            "°C",
            Severity::Medium,
        ),
    ]
}
