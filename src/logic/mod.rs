//! Logic Module - Monitoring Core
//!
//! ## Architecture
//! - `snapshot/` - Snapshot data model (sensor input + prediction)
//! - `storage/` - Durable key/value backends
//! - `store/` - Shared simulation store (latest snapshot + subscribers)
//! - `geo/` - Route geometry and segment geolocation
//! - `alerts/` - Threshold alert evaluation
//! - `leak/` - Leak event tracking and history
//! - `pair_cache/` - Per inlet/outlet pair snapshot cache
//! - `upstream/` - Prediction service client
//! - `monitor/` - Wiring of store, views and upstream completions

// Data + persistence
pub mod snapshot;
pub mod storage;
pub mod store;

// Derived views
pub mod geo;
pub mod alerts;
pub mod leak;
pub mod pair_cache;

// Runtime
pub mod config;
pub mod upstream;
pub mod monitor;
