//! Alert Evaluator
//!
//! Threshold alerts are a pure projection of the current snapshot: they are
//! recomputed from scratch on every change and never accumulated.
//!
//! # Structure
//! - `rules.rs`: `AlertRule`, `Comparison`, default rule table
//! - `evaluator.rs`: `evaluate`

pub mod rules;
pub mod evaluator;

pub use rules::{default_rules, AlertRule, Comparison, Severity};
pub use evaluator::{evaluate, Alert};
