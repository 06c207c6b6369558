// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Termination requests: arbitration and the stop protocol.

use crate::context::JobMaster;
use uuid::Uuid;
use weir_core::{
    ExecError, JobStatus, ProcessingGuarantee, Promise, TerminationMode,
};

/// What to do after the lock is released in `request_termination`.
enum AfterRequest {
    Nothing,
    /// The job was suspended: complete it cluster-wide right away.
    CompleteSuspended,
    /// The job was starting or running: drive the stop protocol.
    Handle(TerminationMode),
}

impl JobMaster {
    /// Request that the job stop in the given mode.
    ///
    /// Returns the current execution-completion future together with a
    /// rejection reason. `None` means the request was accepted (or that an
    /// identical forceful cancel is already in flight, which needs no
    /// further action).
    pub async fn request_termination(
        &self,
        mode: TerminationMode,
        allow_while_exporting_snapshot: bool,
    ) -> (Promise<()>, Option<String>) {
        let mut mode = mode;
        let (future, after, complete_job_cancelled) = {
            let outcome = self.lock_state_mut(|s| {
                // Without a processing guarantee there is no state worth a
                // terminal snapshot; only an explicit graceful cancel keeps
                // its drain semantics.
                if self.config().processing_guarantee == ProcessingGuarantee::None
                    && mode != TerminationMode::CANCEL_GRACEFUL
                {
                    mode = mode.without_terminal_snapshot();
                }
                let future = s.execution_completion.clone();

                if s.status == JobStatus::SuspendedExportingSnapshot
                    && !allow_while_exporting_snapshot
                {
                    return Err((
                        future,
                        "Cannot cancel when job status is SUSPENDED_EXPORTING_SNAPSHOT"
                            .to_string(),
                    ));
                }
                if s.status == JobStatus::Suspended && mode != TerminationMode::CANCEL_FORCEFUL {
                    return Err((future, "Job is SUSPENDED".to_string()));
                }
                if let Some(current) = s.requested_termination {
                    if current == TerminationMode::CANCEL_FORCEFUL
                        && mode == TerminationMode::CANCEL_FORCEFUL
                    {
                        // Same forceful cancel twice: the first one already
                        // does everything the caller wants.
                        return Ok((future, AfterRequest::Nothing, false));
                    }
                    return Err((
                        future,
                        format!("Job is already terminating in mode: {}", current.name()),
                    ));
                }

                s.requested_termination = Some(mode);
                let previous = s.status;
                let mut complete_cancelled = false;
                if matches!(
                    previous,
                    JobStatus::Suspended | JobStatus::SuspendedExportingSnapshot
                ) {
                    s.set_status(self.job_id(), JobStatus::Failed);
                    complete_cancelled = true;
                }
                if mode.with_terminal_snapshot {
                    self.handles().snapshots.enqueue_snapshot(None, true);
                }
                let after = if previous == JobStatus::Suspended {
                    AfterRequest::CompleteSuspended
                } else if matches!(previous, JobStatus::Running | JobStatus::Starting) {
                    AfterRequest::Handle(mode)
                } else {
                    AfterRequest::Nothing
                };
                Ok((future, after, complete_cancelled))
            });
            match outcome {
                Ok(accepted) => accepted,
                Err((future, reason)) => return (future, Some(reason)),
            }
        };

        if complete_job_cancelled {
            self.complete_job_future(Some(ExecError::Cancelled));
        }
        match after {
            AfterRequest::Nothing => {}
            AfterRequest::CompleteSuspended => {
                let completed_at = self.handles().clock.epoch_ms();
                if let Err(e) = self
                    .handles()
                    .coordination
                    .complete_job(self.job_id(), completed_at, Some(ExecError::Cancelled))
                    .await
                {
                    tracing::warn!(
                        job = %self.job_id(),
                        error = %e,
                        "failed to complete suspended job after cancellation"
                    );
                }
            }
            AfterRequest::Handle(mode) => self.handle_termination(mode),
        }

        (future, None)
    }

    /// Drive the stop protocol for an accepted termination. Idempotent: at
    /// most one terminal snapshot is begun and at most one terminate
    /// broadcast is dispatched per attempt, no matter how often this runs.
    pub(crate) fn handle_termination(&self, mode: TerminationMode) {
        if mode.with_terminal_snapshot {
            let begin = self.lock_state_mut(|s| {
                if s.terminal_snapshot_begun {
                    false
                } else {
                    s.terminal_snapshot_begun = true;
                    true
                }
            });
            if begin {
                self.handles().snapshots.try_begin_snapshot();
            }
        } else if let Some(callback) = self.lock_state(|s| s.completion_callback.clone()) {
            callback.cancel_invocations(Some(mode));
        }
    }

    /// Stop the job with a terminal snapshot so it can restart cleanly.
    pub async fn gracefully_terminate(&self) -> Promise<()> {
        self.request_termination(TerminationMode::RESTART_GRACEFUL, false).await.0
    }

    /// A participant is shutting down gracefully. If this job runs on it,
    /// restart the job gracefully; the returned future completes when the
    /// current execution is torn down.
    pub async fn on_participant_graceful_shutdown(&self, member_uuid: Uuid) -> Promise<()> {
        let participating =
            self.lock_state(|s| s.execution_plans.keys().any(|m| m.uuid == member_uuid));
        if participating {
            self.gracefully_terminate().await
        } else {
            Promise::completed(())
        }
    }

    /// React to the cluster growing: with autoscaling on, a running job
    /// whose participant set no longer matches the data-member count is
    /// gracefully restarted to use the new members. Returns whether a
    /// restart was initiated.
    pub async fn maybe_scale_up(&self, data_member_count: usize) -> bool {
        if !self.config().auto_scaling {
            return false;
        }
        let mismatch = self.lock_state(|s| {
            !s.execution_plans.is_empty() && s.execution_plans.len() != data_member_count
        });
        if !mismatch {
            return false;
        }
        tracing::info!(
            job = %self.job_id(),
            data_members = data_member_count,
            "cluster size changed, restarting job to scale up"
        );
        let (_future, reason) =
            self.request_termination(TerminationMode::RESTART_GRACEFUL, false).await;
        match reason {
            None => true,
            Some(reason) => {
                tracing::info!(job = %self.job_id(), reason, "scale-up restart not initiated");
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "terminate_tests.rs"]
mod tests;
