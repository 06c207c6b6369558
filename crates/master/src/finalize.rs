// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Finalization: deciding and applying the job's next state.

use crate::context::JobMaster;
use weir_core::{
    ActionAfterTerminate, ExecError, JobExecutionRecord, JobStatus, ProcessingGuarantee,
};

/// Work computed under the lock and executed after release, so that no
/// external service and no future handler ever runs inside the master lock.
enum DeferredAction {
    /// A restart was explicitly requested: start over now.
    RestartJob,
    /// Conditions may improve later: ask for a delayed retry.
    ScheduleRestart,
    /// The job suspended; persist the record that says so.
    PersistRecord(JobExecutionRecord),
    /// Complete the job cluster-wide, then publish the final result.
    CompleteJob(Option<ExecError>),
    /// Publish the final result locally, keeping the job metadata (used
    /// when this member was reset out of the cluster).
    SetResult(Option<ExecError>),
}

impl JobMaster {
    /// Terminate the current execution (if any) and move the job to its
    /// next state: restart, suspend, complete, or fail.
    ///
    /// Idempotent against re-finalization: once the job is terminal this
    /// logs and returns, so the job-completion future still completes at
    /// most once.
    pub(crate) async fn finalize_job(&self, failure: Option<ExecError>) {
        let (deferred, execution_future) = {
            let decided = self.lock_state_mut(|s| {
                if s.status.is_terminal() {
                    tracing::info!(
                        job = %self.job_id(),
                        status = %s.status,
                        "ignoring finalization, job is already terminal"
                    );
                    return None;
                }

                // Close user vertices. Their failures must never prevent
                // finalization; log and move on.
                if let Some(vertices) = s.vertices.take() {
                    for vertex in &vertices {
                        if let Err(e) =
                            self.handles().plans.complete_vertex(vertex, failure.as_ref())
                        {
                            tracing::warn!(
                                job = %self.job_id(),
                                vertex = %vertex.name,
                                error = %e,
                                "vertex completion failed"
                            );
                        }
                    }
                }

                s.members_with_completed_execution.clear();
                s.partial_metrics.clear();
                let was_cancelled =
                    s.requested_termination == Some(weir_core::TerminationMode::CANCEL_FORCEFUL);
                s.requested_termination = None;
                s.completion_callback = None;
                s.terminal_snapshot_begun = false;
                self.handles().snapshots.on_execution_terminated();
                s.execution_plans.clear();
                s.members_view = None;

                let action = match &failure {
                    Some(ExecError::TerminateRequested(mode)) => Some(mode.action),
                    _ => None,
                };
                let restartable = failure.as_ref().is_some_and(|e| e.is_restartable());
                let elapsed_ms =
                    self.handles().clock.epoch_ms().saturating_sub(s.execution_start_ms);

                let deferred = if action == Some(ActionAfterTerminate::Restart) {
                    s.set_status(self.job_id(), JobStatus::NotRunning);
                    DeferredAction::RestartJob
                } else if restartable && self.config().auto_scaling && !was_cancelled {
                    self.schedule_restart_locked(s, "restartable failure with autoscaling");
                    DeferredAction::ScheduleRestart
                } else if action == Some(ActionAfterTerminate::Suspend)
                    || (restartable
                        && !was_cancelled
                        && !self.config().auto_scaling
                        && self.config().processing_guarantee != ProcessingGuarantee::None)
                {
                    tracing::info!(job = %self.job_id(), "suspending job");
                    s.set_status(self.job_id(), JobStatus::Suspended);
                    s.record.suspended = true;
                    DeferredAction::PersistRecord(s.record.clone())
                } else if matches!(
                    failure.as_ref().map(ExecError::peel),
                    Some(ExecError::LocalMemberReset)
                ) {
                    // This member fell out of the cluster. Fail the job
                    // locally but keep its metadata; it will restart
                    // wherever quorum forms.
                    s.set_status(self.job_id(), JobStatus::Failed);
                    DeferredAction::SetResult(Some(ExecError::Cancelled))
                } else {
                    let success = self.log_outcome(&failure, elapsed_ms);
                    s.set_status(
                        self.job_id(),
                        if success { JobStatus::Completed } else { JobStatus::Failed },
                    );
                    DeferredAction::CompleteJob(failure.clone())
                };
                Some((deferred, s.execution_completion.clone()))
            });
            match decided {
                Some(pair) => pair,
                None => return,
            }
        };

        // The attempt is over regardless of what the job does next.
        execution_future.complete(());

        match deferred {
            DeferredAction::RestartJob => {
                self.handles().coordination.restart_job(self.job_id()).await;
            }
            DeferredAction::ScheduleRestart => {
                self.handles().coordination.schedule_restart(self.job_id()).await;
            }
            DeferredAction::PersistRecord(record) => {
                if let Err(e) =
                    self.handles().store.write_execution_record(self.job_id(), &record)
                {
                    tracing::warn!(
                        job = %self.job_id(),
                        error = %e,
                        "failed to persist suspension"
                    );
                }
            }
            DeferredAction::SetResult(failure) => {
                self.complete_job_future(failure);
            }
            DeferredAction::CompleteJob(failure) => {
                let completed_at = self.handles().clock.epoch_ms();
                match self
                    .handles()
                    .coordination
                    .complete_job(self.job_id(), completed_at, failure.clone())
                    .await
                {
                    Ok(()) => self.complete_job_future(failure),
                    Err(e) => tracing::warn!(
                        job = %self.job_id(),
                        error = %e,
                        "coordination service failed to complete job"
                    ),
                }
            }
        }
    }

    /// Log how the execution ended; returns whether it counts as success.
    fn log_outcome(&self, failure: &Option<ExecError>, elapsed_ms: u64) -> bool {
        match failure {
            None => {
                tracing::info!(
                    job = %self.job_id(),
                    name = %self.job_name(),
                    elapsed_ms,
                    "execution completed successfully"
                );
                true
            }
            Some(e @ (ExecError::Cancelled | ExecError::TerminateRequested(_))) => {
                tracing::info!(
                    job = %self.job_id(),
                    name = %self.job_name(),
                    elapsed_ms,
                    "execution terminated: {e}"
                );
                false
            }
            Some(e) => {
                tracing::error!(
                    job = %self.job_id(),
                    name = %self.job_name(),
                    elapsed_ms,
                    "execution failed: {e}"
                );
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "finalize_tests.rs"]
mod tests;
