// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    not_running_to_starting = { JobStatus::NotRunning, JobStatus::Starting },
    not_running_rescheduled = { JobStatus::NotRunning, JobStatus::NotRunning },
    not_running_cancelled_before_start = { JobStatus::NotRunning, JobStatus::Failed },
    starting_to_running = { JobStatus::Starting, JobStatus::Running },
    starting_aborted = { JobStatus::Starting, JobStatus::NotRunning },
    starting_failed = { JobStatus::Starting, JobStatus::Failed },
    starting_suspended = { JobStatus::Starting, JobStatus::Suspended },
    running_completed = { JobStatus::Running, JobStatus::Completed },
    running_failed = { JobStatus::Running, JobStatus::Failed },
    running_restarting = { JobStatus::Running, JobStatus::NotRunning },
    running_suspended = { JobStatus::Running, JobStatus::Suspended },
    suspended_resumed = { JobStatus::Suspended, JobStatus::NotRunning },
    suspended_cancelled = { JobStatus::Suspended, JobStatus::Failed },
    suspended_exporting = { JobStatus::Suspended, JobStatus::SuspendedExportingSnapshot },
    exporting_back_to_suspended = { JobStatus::SuspendedExportingSnapshot, JobStatus::Suspended },
    exporting_cancelled = { JobStatus::SuspendedExportingSnapshot, JobStatus::Failed },
)]
fn legal_transition(from: JobStatus, to: JobStatus) {
    assert!(from.can_transition_to(to), "{from} -> {to} should be legal");
}

#[parameterized(
    completed_is_final = { JobStatus::Completed, JobStatus::NotRunning },
    completed_not_failed = { JobStatus::Completed, JobStatus::Failed },
    failed_is_final = { JobStatus::Failed, JobStatus::Running },
    failed_not_restarted = { JobStatus::Failed, JobStatus::NotRunning },
    running_not_starting = { JobStatus::Running, JobStatus::Starting },
    suspended_not_running = { JobStatus::Suspended, JobStatus::Running },
    not_running_not_running_directly = { JobStatus::NotRunning, JobStatus::Running },
)]
fn illegal_transition(from: JobStatus, to: JobStatus) {
    assert!(!from.can_transition_to(to), "{from} -> {to} should be illegal");
}

#[test]
fn terminal_statuses() {
    assert!(JobStatus::Completed.is_terminal());
    assert!(JobStatus::Failed.is_terminal());
    for status in [
        JobStatus::NotRunning,
        JobStatus::Starting,
        JobStatus::Running,
        JobStatus::Suspended,
        JobStatus::SuspendedExportingSnapshot,
    ] {
        assert!(!status.is_terminal(), "{status} must not be terminal");
    }
}

#[test]
fn display_matches_wire_names() {
    assert_eq!(JobStatus::NotRunning.to_string(), "NOT_RUNNING");
    assert_eq!(
        JobStatus::SuspendedExportingSnapshot.to_string(),
        "SUSPENDED_EXPORTING_SNAPSHOT"
    );
}
