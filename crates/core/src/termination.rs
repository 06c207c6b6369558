// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Termination request modes.

use serde::{Deserialize, Serialize};

/// What the coordinator does with the job once termination finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionAfterTerminate {
    /// Stop for good; the job completes as cancelled/terminated.
    None,
    /// Start a fresh execution once the current one is torn down.
    Restart,
    /// Park the job; it keeps its metadata and can be resumed.
    Suspend,
}

/// How a job should be brought down.
///
/// A graceful mode drains participants through a terminal snapshot so the
/// job can later resume without data loss; a forceful mode interrupts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationMode {
    pub action: ActionAfterTerminate,
    pub with_terminal_snapshot: bool,
    pub graceful: bool,
}

impl TerminationMode {
    pub const CANCEL_FORCEFUL: Self = Self {
        action: ActionAfterTerminate::None,
        with_terminal_snapshot: false,
        graceful: false,
    };
    pub const CANCEL_GRACEFUL: Self = Self {
        action: ActionAfterTerminate::None,
        with_terminal_snapshot: true,
        graceful: true,
    };
    pub const RESTART_GRACEFUL: Self = Self {
        action: ActionAfterTerminate::Restart,
        with_terminal_snapshot: true,
        graceful: true,
    };
    pub const SUSPEND_GRACEFUL: Self = Self {
        action: ActionAfterTerminate::Suspend,
        with_terminal_snapshot: true,
        graceful: true,
    };

    /// Drop the terminal snapshot from this mode. Used when the job has no
    /// processing guarantee: there is no state worth draining, so a graceful
    /// request degrades to its forceful counterpart.
    pub fn without_terminal_snapshot(self) -> Self {
        Self { with_terminal_snapshot: false, graceful: false, ..self }
    }

    /// Stable name used in user-facing rejection messages.
    pub fn name(&self) -> &'static str {
        match (self.action, self.graceful) {
            (ActionAfterTerminate::None, false) => "CANCEL_FORCEFUL",
            (ActionAfterTerminate::None, true) => "CANCEL_GRACEFUL",
            (ActionAfterTerminate::Restart, true) => "RESTART_GRACEFUL",
            (ActionAfterTerminate::Restart, false) => "RESTART_FORCEFUL",
            (ActionAfterTerminate::Suspend, true) => "SUSPEND_GRACEFUL",
            (ActionAfterTerminate::Suspend, false) => "SUSPEND_FORCEFUL",
        }
    }
}

impl std::fmt::Display for TerminationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
#[path = "termination_tests.rs"]
mod tests;
