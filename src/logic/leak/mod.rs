//! Leak Event Tracker
//!
//! Turns leak snapshots into `LeakEvent`s positioned on the pipeline route and
//! keeps a bounded rolling history for alert lists and map markers.
//!
//! # Architecture
//! - `types.rs`: `LeakEvent`, CSV report
//! - `tracker.rs`: `LeakTracker` (history, ids, mute)
//! - `notifier.rs`: best-effort notification cues

pub mod types;
pub mod tracker;
pub mod notifier;
#[cfg(test)]
mod tests;

pub use types::LeakEvent;
pub use tracker::LeakTracker;
pub use notifier::{Notifier, NotifyError, SilentNotifier, TerminalBell};
