//! Inlet/outlet selection, persisted as two scalar strings

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_INLET, DEFAULT_OUTLET};
use crate::logic::storage::{self, keys, StateBackend};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointSelection {
    pub inlet: String,
    pub outlet: String,
}

impl Default for PointSelection {
    fn default() -> Self {
        Self {
            inlet: DEFAULT_INLET.to_string(),
            outlet: DEFAULT_OUTLET.to_string(),
        }
    }
}

impl PointSelection {
    pub fn new(inlet: &str, outlet: &str) -> Self {
        Self {
            inlet: inlet.to_string(),
            outlet: outlet.to_string(),
        }
    }

    /// Last persisted selection, defaults for missing halves
    pub fn load(backend: &Arc<dyn StateBackend>) -> Self {
        let defaults = Self::default();
        Self {
            inlet: storage::load_best_effort(backend.as_ref(), keys::INLET_POINT)
                .unwrap_or(defaults.inlet),
            outlet: storage::load_best_effort(backend.as_ref(), keys::OUTLET_POINT)
                .unwrap_or(defaults.outlet),
        }
    }

    pub fn save(&self, backend: &Arc<dyn StateBackend>) {
        storage::persist_best_effort(backend.as_ref(), keys::INLET_POINT, &self.inlet);
        storage::persist_best_effort(backend.as_ref(), keys::OUTLET_POINT, &self.outlet);
    }
}
