//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Every value can be overridden from the environment (or a `.env` file).

use std::path::PathBuf;

/// Default prediction service URL
///
/// For development the service listens on http://localhost:8000
pub const DEFAULT_UPSTREAM_URL: &str = "http://localhost:8000";

/// Default poll interval for the simulate endpoint (seconds, 0 = manual only)
pub const DEFAULT_POLL_INTERVAL: u64 = 10;

/// Default HTTP timeout (seconds)
pub const DEFAULT_HTTP_TIMEOUT: u64 = 30;

/// Length of the linear pipe schematic that segment ids are folded onto
pub const DEFAULT_REFERENCE_LENGTH: f64 = 600.0;

/// Maximum number of leak events kept in history
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Selectable inlet/outlet points
pub const KNOWN_POINTS: [&str; 4] = ["A", "B", "C", "D"];

pub const DEFAULT_INLET: &str = "A";
pub const DEFAULT_OUTLET: &str = "B";

/// Default pipeline polyline (lat, lng)
pub const DEFAULT_PIPELINE_COORDS: [(f64, f64); 3] = [
    (39.80, -100.50),
    (39.78, -100.44),
    (39.76, -100.38),
];

/// Data directory name under the platform data dir
pub const DATA_DIR_NAME: &str = "leakwatch";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Leakwatch";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get prediction service URL from environment or use default
pub fn get_upstream_url() -> String {
    std::env::var("LEAKWATCH_UPSTREAM_URL")
        .unwrap_or_else(|_| DEFAULT_UPSTREAM_URL.to_string())
}

/// Get poll interval from environment or use default
pub fn get_poll_interval() -> u64 {
    std::env::var("LEAKWATCH_POLL_INTERVAL")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_POLL_INTERVAL)
}

/// Get HTTP timeout from environment or use default
pub fn get_http_timeout() -> u64 {
    std::env::var("LEAKWATCH_HTTP_TIMEOUT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_HTTP_TIMEOUT)
}

/// Get data directory from environment or use the platform default
pub fn get_data_dir() -> PathBuf {
    std::env::var("LEAKWATCH_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(DATA_DIR_NAME)
        })
}

/// Optional JSON config file path
pub fn get_config_path() -> Option<PathBuf> {
    std::env::var("LEAKWATCH_CONFIG").ok().map(PathBuf::from)
}

/// Check if the audible cue starts muted
pub fn is_muted_by_default() -> bool {
    std::env::var("LEAKWATCH_MUTED")
        .map(|s| s.to_lowercase() == "true" || s == "1")
        .unwrap_or(false)
}
