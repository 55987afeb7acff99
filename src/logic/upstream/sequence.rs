//! Request sequencing
//!
//! Each upstream request takes a ticket when issued. Completions are checked
//! against the newest completion already applied, so an old response that
//! arrives late cannot replace newer data (unless last-write-wins is chosen).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    /// Drop completions older than the newest applied one
    #[default]
    DiscardStale,
    /// Apply every completion in arrival order
    LastWriteWins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct RequestSequencer {
    issued: u64,
    applied: u64,
    policy: StalePolicy,
}

impl RequestSequencer {
    pub fn new(policy: StalePolicy) -> Self {
        Self {
            issued: 0,
            applied: 0,
            policy,
        }
    }

    pub fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    /// Whether a completion for `ticket` may be applied; records it if so
    pub fn accept(&mut self, ticket: Ticket) -> bool {
        match self.policy {
            StalePolicy::DiscardStale if ticket.0 <= self.applied => false,
            _ => {
                self.applied = self.applied.max(ticket.0);
                true
            }
        }
    }

    /// Requests issued but not yet superseded or applied
    pub fn in_flight(&self) -> u64 {
        self.issued - self.applied
    }
}
