// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job status and the legal-transition table.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a job as seen by the coordinator.
///
/// `Completed` and `Failed` are terminal; everything else is transient.
/// `SuspendedExportingSnapshot` is driven by the snapshot-export flow and
/// blocks most termination requests while it lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    NotRunning,
    Starting,
    Running,
    Suspended,
    SuspendedExportingSnapshot,
    Completed,
    Failed,
}

crate::simple_display! {
    JobStatus {
        NotRunning => "NOT_RUNNING",
        Starting => "STARTING",
        Running => "RUNNING",
        Suspended => "SUSPENDED",
        SuspendedExportingSnapshot => "SUSPENDED_EXPORTING_SNAPSHOT",
        Completed => "COMPLETED",
        Failed => "FAILED",
    }
}

impl JobStatus {
    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// The table covers the normal lifecycle plus the abort edges: a start
    /// attempt can fail before any plan invocation goes out (`NotRunning` /
    /// `Starting` straight to a terminal status), and a forceful cancel
    /// fails a suspended job.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        match (*self, next) {
            (Completed | Failed, _) => false,
            (NotRunning, NotRunning | Starting | Failed) => true,
            (Starting, Running | NotRunning | Suspended | Completed | Failed) => true,
            (Running, NotRunning | Suspended | Completed | Failed) => true,
            (Suspended, NotRunning | Failed | SuspendedExportingSnapshot) => true,
            (SuspendedExportingSnapshot, Suspended | Failed) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
