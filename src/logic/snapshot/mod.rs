//! Snapshot Module - Prediction Cycle Payloads
//!
//! A snapshot is what one simulate/predict round-trip produces: the sensor
//! readings sent to the model and the model's verdict.
//!
//! # Structure
//! - `types.rs`: `Snapshot`, `SimulationInput`, `PredictionResult`, `SegmentId`
//!
//! Payloads from different upstream versions disagree on details (numeric
//! strings, missing fields, a textual "Leak" marker), so deserialization is
//! lenient and never rejects a partial snapshot.

pub mod types;

pub use types::{
    PredictionResult, SegmentId, SensorField, SimulationInput, Snapshot, LEAK_MARKER,
};
