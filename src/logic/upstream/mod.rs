//! Upstream Module - Prediction Service Communication
//!
//! This module handles:
//! - Simulate / predict requests producing snapshots
//! - Hardware status checks and equipment failure details (display only)
//! - Sequencing of in-flight requests

pub mod client;
pub mod sequence;

pub use client::{
    parse_hardware, snapshot_from_predict, Component, FailureDetail, HardwareStatus,
    UpstreamClient, UpstreamConfig, UpstreamError,
};
pub use sequence::{RequestSequencer, StalePolicy, Ticket};
