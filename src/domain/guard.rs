//! Protection state machine.
//!
//! The status is recomputed from scratch on every pass, so an order that
//! expires outside the engine's control drops the guard back to
//! [`GuardStatus::Pending`] on the next pass instead of leaving a stale
//! `Protecting` latched.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardStatus {
    /// No position; nothing to protect.
    #[default]
    Monitoring,
    /// Position open without a confirmed stop.
    Pending,
    /// Position open and covered by an active stop at target.
    Protecting,
}

impl GuardStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monitoring => "monitoring",
            Self::Pending => "pending",
            Self::Protecting => "protecting",
        }
    }
}

impl fmt::Display for GuardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change of guard status produced by [`GuardStateMachine::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: GuardStatus,
    pub to: GuardStatus,
}

#[derive(Debug, Default)]
pub struct GuardStateMachine {
    status: GuardStatus,
}

impl GuardStateMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn status(&self) -> GuardStatus {
        self.status
    }

    /// Recompute the status. `stop_confirmed` means an active stop on the
    /// exit side, priced within tolerance of the current target.
    pub fn evaluate(&mut self, flat: bool, stop_confirmed: bool) -> Option<Transition> {
        let next = if flat {
            GuardStatus::Monitoring
        } else if stop_confirmed {
            GuardStatus::Protecting
        } else {
            GuardStatus::Pending
        };
        if next == self.status {
            return None;
        }
        let transition = Transition {
            from: self.status,
            to: next,
        };
        self.status = next;
        Some(transition)
    }
}
