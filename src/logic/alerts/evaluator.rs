use serde::{Deserialize, Serialize};

use super::rules::{AlertRule, Severity};
use crate::logic::snapshot::Snapshot;

/// Threshold violation derived from one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub category: String,
    pub value: f64,
    pub unit: String,
    pub severity: Severity,
}

/// One alert per satisfied rule, in rule order. Absent fields never fire.
pub fn evaluate(snapshot: &Snapshot, rules: &[AlertRule]) -> Vec<Alert> {
    let Some(input) = snapshot.input() else {
        return Vec::new();
    };

    rules
        .iter()
        .filter_map(|rule| {
            let value = input.get(rule.field)?;
            rule.fires(value).then(|| Alert {
                category: rule.category.clone(),
                value,
                unit: rule.unit.clone(),
                severity: rule.severity,
            })
        })
        .collect()
}
