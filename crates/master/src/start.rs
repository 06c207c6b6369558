// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Starting a job: plan resolution and the two-phase start protocol.
//!
//! A start attempt runs `try_start_job`, which decides under the master
//! lock whether the job may start at all, then (outside the lock) resolves
//! the DAG into per-member plans and drives `InitExecution` →
//! `StartExecution` across the participants.

use crate::completion::ExecutionCompletionCallback;
use crate::context::{JobMaster, MasterState};
use crate::invoke::{broadcast_terminate, invoke_on_participants, InvocationGroup};
use crate::ops::{Operation, OpResponse, ResponseMap};
use crate::restore::rewrite_dag_for_restore;
use std::sync::Arc;
use uuid::Uuid;
use weir_core::{
    exported_snapshot_map_name, ActionAfterTerminate, Dag, ExecError, ExecutionId,
    ExecutionIdGen, JobMetrics, JobStatus, MemberInfo, ProcessingGuarantee, TerminationMode,
};

/// Where the first execution state comes from when resuming.
struct RestoreSource {
    snapshot_id: i64,
    map_name: String,
    snapshot_name: Option<String>,
}

/// Outcome of the locked half of a start attempt.
enum StartDecision {
    /// Nothing to do (already active, or only bookkeeping happened).
    NotNeeded,
    /// Conditions are not right yet; ask the coordination service to retry.
    Reschedule,
    /// The attempt dies before dispatching anything.
    Abort(ExecError),
    Proceed {
        dag: Dag,
        execution_id: ExecutionId,
        restore: Option<RestoreSource>,
        ongoing_snapshot_id: i64,
    },
}

impl JobMaster {
    /// Attempt to start the job. Safe to call at any time; does nothing if
    /// the job is already active or terminal. All fallible outcomes are
    /// routed through the finalizer, never returned.
    pub async fn try_start_job(&self, id_gen: &dyn ExecutionIdGen) {
        let decision = self.lock_state_mut(|s| self.evaluate_start_locked(s, id_gen));
        match decision {
            StartDecision::NotNeeded => {}
            StartDecision::Reschedule => {
                self.handles().coordination.schedule_restart(self.job_id()).await;
            }
            StartDecision::Abort(error) => self.finalize_job(Some(error)).await,
            StartDecision::Proceed { dag, execution_id, restore, ongoing_snapshot_id } => {
                self.resolve_and_init(dag, execution_id, restore, ongoing_snapshot_id).await;
            }
        }
    }

    fn evaluate_start_locked(
        &self,
        s: &mut MasterState,
        id_gen: &dyn ExecutionIdGen,
    ) -> StartDecision {
        let now = self.handles().clock.epoch_ms();
        s.execution_start_ms = now;
        s.record.mark_executed(now);
        s.members_with_completed_execution.clear();
        s.partial_metrics.clear();

        if s.requested_termination == Some(TerminationMode::CANCEL_FORCEFUL) {
            return StartDecision::Abort(ExecError::Cancelled);
        }
        if s.status != JobStatus::NotRunning {
            tracing::debug!(
                job = %self.job_id(),
                status = %s.status,
                "not starting job, status is not NOT_RUNNING"
            );
            return StartDecision::NotNeeded;
        }
        if s.record.suspended {
            // Only clear the flag on this pass; the job starts on the next.
            s.record.suspended = false;
            self.write_record_locked(s);
            tracing::info!(job = %self.job_id(), "cleared suspension flag");
            return StartDecision::NotNeeded;
        }
        if !self.handles().cluster.is_quorum_present(s.record.quorum_size)
            || !self.handles().cluster.should_start_jobs()
        {
            self.schedule_restart_locked(s, "quorum absent or cluster not safe to start");
            return StartDecision::Reschedule;
        }

        s.set_status(self.job_id(), JobStatus::Starting);
        s.terminal_snapshot_begun = false;
        self.write_record_locked(s);

        if let Some(mode) = s.requested_termination {
            if mode.action == ActionAfterTerminate::Restart {
                // We are starting right now; a pending restart is moot.
                s.requested_termination = None;
            } else {
                return StartDecision::Abort(ExecError::TerminateRequested(mode));
            }
        }

        let dag_bytes = match self.handles().store.read_dag(self.job_id()) {
            Ok(bytes) => bytes,
            Err(e) => {
                return StartDecision::Abort(ExecError::user(format!(
                    "failed to load job definition: {e}"
                )))
            }
        };
        let dag: Dag = match serde_json::from_slice(&dag_bytes) {
            Ok(dag) => dag,
            Err(e) => {
                return StartDecision::Abort(ExecError::user(format!(
                    "failed to deserialize job DAG: {e}"
                )))
            }
        };
        s.vertices = Some(dag.vertices().to_vec());

        let execution_id = id_gen.next_execution_id();
        if let Some(previous) = s.execution_id {
            debug_assert!(execution_id > previous, "execution ids must be monotonic");
            if execution_id <= previous {
                return StartDecision::Abort(ExecError::illegal_state(format!(
                    "execution id went backwards: {execution_id} after {previous}"
                )));
            }
        }
        s.execution_id = Some(execution_id);
        self.handles().snapshots.on_new_execution(execution_id);
        s.execution_completion = weir_core::Promise::new();

        let restore = if s.record.has_snapshot() {
            Some(RestoreSource {
                snapshot_id: s.record.snapshot_id,
                map_name: s.record.successful_snapshot_map_name(self.job_id()),
                snapshot_name: None,
            })
        } else if let Some(name) = &self.config().initial_snapshot_name {
            Some(RestoreSource {
                snapshot_id: -1,
                map_name: exported_snapshot_map_name(name),
                snapshot_name: Some(name.clone()),
            })
        } else {
            None
        };

        StartDecision::Proceed {
            dag,
            execution_id,
            restore,
            ongoing_snapshot_id: s.record.ongoing_snapshot_id,
        }
    }

    /// Steps that run outside the lock: snapshot validation, DAG rewrite,
    /// plan building, and the phase-A dispatch.
    async fn resolve_and_init(
        &self,
        dag: Dag,
        execution_id: ExecutionId,
        restore: Option<RestoreSource>,
        ongoing_snapshot_id: i64,
    ) {
        let dag = match restore {
            Some(source) => {
                match rewrite_dag_for_restore(
                    dag,
                    source.snapshot_id,
                    &source.map_name,
                    source.snapshot_name.as_deref(),
                    self.handles().validator.as_ref(),
                    self.job_id(),
                ) {
                    Ok(dag) => dag,
                    Err(error) => {
                        self.finalize_job(Some(error)).await;
                        return;
                    }
                }
            }
            None => dag,
        };

        let members_view = self.handles().cluster.members_view();
        let plans = match self.handles().plans.build(
            &members_view,
            &dag,
            self.job_id(),
            execution_id,
            self.config(),
            ongoing_snapshot_id,
        ) {
            Ok(plans) => plans,
            Err(error) => {
                self.finalize_job(Some(error)).await;
                return;
            }
        };

        let participants: Vec<MemberInfo> = plans.keys().cloned().collect();
        tracing::info!(
            job = %self.job_id(),
            name = %self.job_name(),
            execution = %execution_id,
            participants = participants.len(),
            "start executing job"
        );
        tracing::debug!(job = %self.job_id(), "execution graph:\n{}", dag.to_dot());

        let participant_uuids: Vec<Uuid> = participants.iter().map(|m| m.uuid).collect();
        let view_version = members_view.version;
        self.lock_state_mut(|s| {
            s.execution_plans = plans.clone();
            s.members_view = Some(members_view);
        });

        let invocations: Vec<(MemberInfo, Operation)> = plans
            .into_iter()
            .map(|(member, plan)| {
                let op = Operation::InitExecution {
                    job_id: self.job_id(),
                    execution_id,
                    members_view_version: view_version,
                    participants: participant_uuids.clone(),
                    plan,
                };
                (member, op)
            })
            .collect();

        let master = self.clone();
        invoke_on_participants(
            self.handles().rpc.clone(),
            invocations,
            InvocationGroup {
                on_response: None,
                on_complete: Box::new(move |responses| {
                    Box::pin(async move {
                        master.on_init_step_completed(execution_id, responses).await;
                    })
                }),
            },
        );
    }

    /// Phase A finished on every participant.
    async fn on_init_step_completed(&self, execution_id: ExecutionId, responses: ResponseMap) {
        let error = self.classify_responses("Init", &responses);
        let status = self.status();
        if error.is_none() && status == JobStatus::Starting {
            self.invoke_start_execution(execution_id).await;
            return;
        }

        // Some init failed, or the job was torn down meanwhile: undo the
        // inits that did succeed.
        let participants: Vec<MemberInfo> = responses.keys().cloned().collect();
        broadcast_terminate(
            self.handles().rpc.clone(),
            participants,
            self.job_id(),
            Some(execution_id),
            None,
        );
        let error = error.unwrap_or_else(|| {
            ExecError::illegal_state(format!(
                "cannot execute job {}: status is {status}",
                self.job_id()
            ))
        });
        self.finalize_job(Some(error)).await;
    }

    /// Phase B: run the initialized execution on every participant.
    async fn invoke_start_execution(&self, execution_id: ExecutionId) {
        tracing::info!(
            job = %self.job_id(),
            name = %self.job_name(),
            execution = %execution_id,
            "executing job"
        );
        let participants: Vec<MemberInfo> =
            self.lock_state(|s| s.execution_plans.keys().cloned().collect());
        let callback = Arc::new(ExecutionCompletionCallback::new(
            self.clone(),
            execution_id,
            participants.clone(),
        ));
        let pending_termination = self.lock_state_mut(|s| {
            s.completion_callback = Some(callback.clone());
            s.requested_termination
        });
        // A termination that arrived during init lands on the fresh
        // callback, so the very first response can short-circuit.
        if let Some(mode) = pending_termination {
            self.handle_termination(mode);
        }

        let per_response = callback.clone();
        let master = self.clone();
        let invocations: Vec<(MemberInfo, Operation)> = participants
            .iter()
            .map(|m| {
                (m.clone(), Operation::StartExecution { job_id: self.job_id(), execution_id })
            })
            .collect();
        invoke_on_participants(
            self.handles().rpc.clone(),
            invocations,
            InvocationGroup {
                on_response: Some(Box::new(move |member, response| {
                    per_response.on_response(member, response);
                })),
                on_complete: Box::new(move |responses| {
                    Box::pin(async move {
                        master.on_execution_step_completed(responses).await;
                    })
                }),
            },
        );

        self.lock_state_mut(|s| s.set_status(self.job_id(), JobStatus::Running));
        if self.config().processing_guarantee != ProcessingGuarantee::None {
            self.handles().snapshots.on_execution_started();
        }
    }

    /// Phase B finished on every participant.
    async fn on_execution_step_completed(&self, responses: ResponseMap) {
        let any_bare_failure =
            responses.values().any(|r| matches!(r, OpResponse::Failure(_)));
        if any_bare_failure {
            // A bare failure means that member produced no final metrics;
            // keep the previous aggregate rather than publish a hole.
            tracing::debug!(
                job = %self.job_id(),
                "skipping job metrics update, some start-execution responses failed"
            );
        } else {
            let mut merged = JobMetrics::empty();
            for (member, response) in &responses {
                if let OpResponse::Done { metrics, .. } = response {
                    merged = merged.merge(JobMetrics::of_member(&member.uuid, metrics));
                }
            }
            self.lock_state_mut(|s| s.job_metrics = merged);
        }

        let error = self.classify_responses("Execution", &responses);
        self.on_complete_execution(error).await;
    }

    /// The execution is over; decide whether a terminal snapshot has to be
    /// awaited before finalization.
    pub(crate) async fn on_complete_execution(&self, error: Option<ExecError>) {
        let (error, wait_for_terminal_snapshot) = self.lock_state(|s| {
            let mut error = error;
            if !matches!(s.status, JobStatus::Starting | JobStatus::Running) {
                tracing::info!(
                    job = %self.job_id(),
                    status = %s.status,
                    "ignoring completion of execution"
                );
                error = Some(ExecError::illegal_state(format!(
                    "execution completion ignored: job status is {}",
                    s.status
                )));
            }
            let wait = matches!(
                &error,
                Some(ExecError::TerminateRequested(mode)) if mode.with_terminal_snapshot
            );
            (error, wait)
        });

        if wait_for_terminal_snapshot {
            let terminal = self.handles().snapshots.terminal_snapshot_future();
            let master = self.clone();
            tokio::spawn(async move {
                terminal.wait().await;
                master.finalize_job(error).await;
            });
        } else {
            self.finalize_job(error).await;
        }
    }

    /// Park the job and ask the coordination service to retry the start
    /// once conditions change. Requires the master lock.
    pub(crate) fn schedule_restart_locked(&self, s: &mut MasterState, reason: &str) {
        tracing::info!(job = %self.job_id(), reason, "scheduling job restart");
        s.set_status(self.job_id(), JobStatus::NotRunning);
    }

    /// Resume a suspended job: clear the persisted flag and start over.
    pub async fn resume_job(&self, id_gen: &dyn ExecutionIdGen) {
        let resumed = self.lock_state_mut(|s| {
            if s.status != JobStatus::Suspended {
                tracing::info!(
                    job = %self.job_id(),
                    status = %s.status,
                    "not resuming, job is not suspended"
                );
                return false;
            }
            s.record.suspended = false;
            self.write_record_locked(s);
            s.set_status(self.job_id(), JobStatus::NotRunning);
            true
        });
        if resumed {
            self.try_start_job(id_gen).await;
        }
    }

    pub(crate) fn write_record_locked(&self, s: &MasterState) {
        if let Err(e) = self.handles().store.write_execution_record(self.job_id(), &s.record) {
            tracing::warn!(
                job = %self.job_id(),
                error = %e,
                "failed to persist job execution record"
            );
        }
    }
}

#[cfg(test)]
#[path = "start_tests.rs"]
mod tests;
