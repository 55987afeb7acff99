//! API Module
//!
//! Operator-facing surface of the monitor.
//!
//! Structure:
//! - commands.rs: console command parsing, local execution and rendering

pub mod commands;

pub use commands::{execute_local, parse, Command};
