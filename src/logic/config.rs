//! Monitor Configuration
//!
//! Everything the monitor needs that is not persisted state: route geometry,
//! alert thresholds, history size, cache key policy and upstream settings.
//! Loaded from an optional JSON file; any missing field takes its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::alerts::{default_rules, AlertRule};
use crate::logic::geo::Route;
use crate::logic::pair_cache::KeyPolicy;
use crate::logic::upstream::{StalePolicy, UpstreamConfig};

// ============================================================================
// MONITOR CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Pipeline polyline the leak position is placed on
    pub route: Route,
    /// Schematic length segment ids are folded onto
    pub reference_length: f64,
    pub history_capacity: usize,
    pub alert_rules: Vec<AlertRule>,
    pub key_policy: KeyPolicy,
    pub stale_policy: StalePolicy,
    pub upstream: UpstreamConfig,
    /// Seconds between simulate requests (0 = manual only)
    pub poll_interval_secs: u64,
    pub muted: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            route: Route::default(),
            reference_length: constants::DEFAULT_REFERENCE_LENGTH,
            history_capacity: constants::DEFAULT_HISTORY_CAPACITY,
            alert_rules: default_rules(),
            key_policy: KeyPolicy::default(),
            stale_policy: StalePolicy::default(),
            upstream: UpstreamConfig::default(),
            poll_interval_secs: constants::get_poll_interval(),
            muted: constants::is_muted_by_default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl MonitorConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        Ok(config.sanitized())
    }

    /// Load from `path` if given, falling back to defaults on any error
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match Self::from_file(path) {
            Ok(config) => {
                log::info!("Loaded monitor config from {:?}", path);
                config
            }
            Err(e) => {
                log::warn!("{} ({:?}), using defaults", e, path);
                Self::default()
            }
        }
    }

    fn sanitized(mut self) -> Self {
        if !(self.reference_length.is_finite() && self.reference_length > 0.0) {
            log::warn!(
                "reference_length {} is not usable, using {}",
                self.reference_length,
                constants::DEFAULT_REFERENCE_LENGTH
            );
            self.reference_length = constants::DEFAULT_REFERENCE_LENGTH;
        }
        if self.history_capacity == 0 {
            log::warn!("history_capacity 0 ignored");
            self.history_capacity = constants::DEFAULT_HISTORY_CAPACITY;
        }
        self
    }
}

// ============================================================================
// TESTS
// ============================================================================
