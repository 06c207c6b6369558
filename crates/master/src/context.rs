// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job coordinator state and the handle that owns it.

use crate::adapters::{
    ClusterService, CoordinationService, JobStore, ParticipantRpc, PlanBuilder, SnapshotContext,
    SnapshotValidator,
};
use crate::completion::ExecutionCompletionCallback;
use crate::ops::ExecutionPlan;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;
use weir_core::{
    Clock, ExecError, ExecutionId, JobConfig, JobExecutionRecord, JobId, JobMetrics, JobStatus,
    MemberInfo, MembersView, Promise, RawJobMetrics, TerminationMode, Vertex,
};

/// Handles to the node services a job master calls out to. The outer
/// coordination service constructs one per node and shares it across jobs,
/// so the master never needs a back-reference into its owner.
pub struct NodeHandles {
    pub cluster: Arc<dyn ClusterService>,
    pub rpc: Arc<dyn ParticipantRpc>,
    pub store: Arc<dyn JobStore>,
    pub snapshots: Arc<dyn SnapshotContext>,
    pub coordination: Arc<dyn CoordinationService>,
    pub validator: Arc<dyn SnapshotValidator>,
    pub plans: Arc<dyn PlanBuilder>,
    pub clock: Arc<dyn Clock>,
}

/// Everything guarded by the per-job master lock.
pub(crate) struct MasterState {
    pub(crate) status: JobStatus,
    pub(crate) requested_termination: Option<TerminationMode>,
    pub(crate) execution_id: Option<ExecutionId>,
    pub(crate) execution_plans: HashMap<MemberInfo, ExecutionPlan>,
    pub(crate) members_view: Option<MembersView>,
    /// Vertex snapshot taken at start, closed at finalization.
    pub(crate) vertices: Option<Vec<Vertex>>,
    /// Completes once per attempt; replaced before each attempt dispatches.
    pub(crate) execution_completion: Promise<()>,
    pub(crate) completion_callback: Option<Arc<ExecutionCompletionCallback>>,
    pub(crate) members_with_completed_execution: HashSet<Uuid>,
    pub(crate) partial_metrics: HashMap<Uuid, RawJobMetrics>,
    pub(crate) job_metrics: JobMetrics,
    pub(crate) record: JobExecutionRecord,
    pub(crate) execution_start_ms: u64,
    /// Guards the terminal-snapshot kick-off so repeated termination
    /// handling stays idempotent within one attempt.
    pub(crate) terminal_snapshot_begun: bool,
}

impl MasterState {
    /// Apply a status transition, logging any violation of the legal
    /// transition table. Terminal statuses are never left.
    pub(crate) fn set_status(&mut self, job_id: JobId, next: JobStatus) {
        if self.status == next {
            return;
        }
        if !self.status.can_transition_to(next) {
            tracing::error!(
                job = %job_id,
                from = %self.status,
                to = %next,
                "illegal job status transition"
            );
            debug_assert!(false, "illegal transition {} -> {}", self.status, next);
            if self.status.is_terminal() {
                return;
            }
        }
        tracing::debug!(job = %job_id, from = %self.status, to = %next, "job status");
        self.status = next;
    }
}

/// The master-side controller of one job. Clones share state; the outer
/// coordination service keeps one per job and drives it through the public
/// surface (`try_start_job`, `request_termination`, ...).
#[derive(Clone)]
pub struct JobMaster {
    job_id: JobId,
    config: Arc<JobConfig>,
    handles: Arc<NodeHandles>,
    state: Arc<Mutex<MasterState>>,
    /// Completes at most once per job lifetime.
    job_completion: Promise<Result<(), ExecError>>,
}

impl JobMaster {
    pub fn new(
        job_id: JobId,
        config: JobConfig,
        record: JobExecutionRecord,
        handles: Arc<NodeHandles>,
    ) -> Self {
        Self {
            job_id,
            config: Arc::new(config),
            handles,
            state: Arc::new(Mutex::new(MasterState {
                status: JobStatus::NotRunning,
                requested_termination: None,
                execution_id: None,
                execution_plans: HashMap::new(),
                members_view: None,
                vertices: None,
                execution_completion: Promise::new(),
                completion_callback: None,
                members_with_completed_execution: HashSet::new(),
                partial_metrics: HashMap::new(),
                job_metrics: JobMetrics::empty(),
                record,
                execution_start_ms: 0,
                terminal_snapshot_begun: false,
            })),
            job_completion: Promise::new(),
        }
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Display name for logs: the configured name, or the job id.
    pub fn job_name(&self) -> String {
        self.config.name.clone().unwrap_or_else(|| self.job_id.to_string())
    }

    pub(crate) fn config(&self) -> &JobConfig {
        &self.config
    }

    pub(crate) fn handles(&self) -> &NodeHandles {
        &self.handles
    }

    pub fn status(&self) -> JobStatus {
        self.lock_state(|s| s.status)
    }

    /// Completes once per job lifetime with the terminal outcome.
    pub fn job_completion_future(&self) -> Promise<Result<(), ExecError>> {
        self.job_completion.clone()
    }

    /// Completes once per attempt; always completes normally.
    pub fn execution_completion_future(&self) -> Promise<()> {
        self.lock_state(|s| s.execution_completion.clone())
    }

    /// Last aggregated job-level metrics.
    pub fn job_metrics(&self) -> JobMetrics {
        self.lock_state(|s| s.job_metrics.clone())
    }

    /// Id of the current (or last) execution attempt.
    pub fn execution_id(&self) -> Option<ExecutionId> {
        self.lock_state(|s| s.execution_id)
    }

    pub(crate) fn lock_state<T>(&self, f: impl FnOnce(&MasterState) -> T) -> T {
        let guard = self.state.lock();
        f(&guard)
    }

    pub(crate) fn lock_state_mut<T>(&self, f: impl FnOnce(&mut MasterState) -> T) -> T {
        let mut guard = self.state.lock();
        f(&mut guard)
    }

    /// Complete the job-lifetime future. Safe to call on every path that
    /// reaches a terminal status; only the first call lands.
    pub(crate) fn complete_job_future(&self, failure: Option<ExecError>) {
        let outcome = match failure {
            None => Ok(()),
            Some(e) => Err(e),
        };
        if !self.job_completion.complete(outcome) {
            tracing::debug!(job = %self.job_id, "job completion already set, ignoring");
        }
    }
}
