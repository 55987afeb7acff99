//! Leak notification cues
//!
//! Cues are best-effort: the tracker ignores every error a notifier returns.

use std::io::Write;

use super::types::LeakEvent;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Output unavailable: {0}")]
    Output(#[from] std::io::Error),

    #[error("Notifier failed: {0}")]
    Other(String),
}

pub trait Notifier: Send + Sync {
    fn cue(&self, event: &LeakEvent) -> Result<(), NotifyError>;
}

/// Terminal bell plus a log line
#[derive(Debug, Default)]
pub struct TerminalBell;

impl Notifier for TerminalBell {
    fn cue(&self, event: &LeakEvent) -> Result<(), NotifyError> {
        log::warn!("🚨 {}", event.headline());
        let mut err = std::io::stderr().lock();
        err.write_all(b"\x07")?;
        err.flush()?;
        Ok(())
    }
}

/// Discards every cue
#[derive(Debug, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn cue(&self, _event: &LeakEvent) -> Result<(), NotifyError> {
        Ok(())
    }
}
