// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-response tracking for phase B of the start protocol.

use crate::context::JobMaster;
use crate::invoke::broadcast_terminate;
use crate::ops::OpResponse;
use std::sync::atomic::{AtomicBool, Ordering};
use weir_core::{ExecError, ExecutionId, MemberInfo, TerminationMode};

/// Attached to every phase-B reply of one execution attempt.
///
/// Tracks which members have reported completion, caches their final
/// metrics for the aggregator, and tears the execution down on the first
/// real failure. The teardown broadcast races with external termination
/// requests; the compare-and-set flag keeps it at-most-once.
pub(crate) struct ExecutionCompletionCallback {
    master: JobMaster,
    execution_id: ExecutionId,
    participants: Vec<MemberInfo>,
    invocations_cancelled: AtomicBool,
}

impl ExecutionCompletionCallback {
    pub(crate) fn new(
        master: JobMaster,
        execution_id: ExecutionId,
        participants: Vec<MemberInfo>,
    ) -> Self {
        Self { master, execution_id, participants, invocations_cancelled: AtomicBool::new(false) }
    }

    /// One participant answered its `StartExecution`.
    pub(crate) fn on_response(&self, member: &MemberInfo, response: &OpResponse) {
        self.master.lock_state_mut(|s| {
            s.members_with_completed_execution.insert(member.uuid);
            if let OpResponse::Done { metrics, error: None } = response {
                s.partial_metrics.insert(member.uuid, metrics.clone());
            }
        });

        if let Some(error) = response.error() {
            if !matches!(error.peel(), ExecError::TerminatedWithSnapshot) {
                tracing::debug!(
                    job = %self.master.job_id(),
                    member = %member,
                    error = %error,
                    "participant failed, terminating remaining participants"
                );
                self.cancel_invocations(None);
            }
        }
    }

    /// Broadcast `TerminateExecution` to every participant, at most once
    /// per attempt no matter how many callers race into this.
    pub(crate) fn cancel_invocations(&self, mode: Option<TerminationMode>) {
        if self
            .invocations_cancelled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            broadcast_terminate(
                self.master.handles().rpc.clone(),
                self.participants.clone(),
                self.master.job_id(),
                Some(self.execution_id),
                mode,
            );
        }
    }
}

#[cfg(test)]
#[path = "completion_tests.rs"]
mod tests;
