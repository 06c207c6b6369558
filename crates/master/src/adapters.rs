// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collaborator traits the coordinator depends on.
//!
//! The coordinator never owns these services; the node that hosts it passes
//! handles in at construction time. Keeping them as traits keeps the
//! coordinator testable against in-process fakes.

use crate::ops::{ExecutionPlan, Operation, OpResponse};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;
use weir_core::{
    Dag, ExecError, ExecutionId, JobConfig, JobExecutionRecord, JobId, MemberInfo, MembersView,
    Promise, Vertex,
};

/// Cluster membership as seen by this node.
pub trait ClusterService: Send + Sync {
    fn members_view(&self) -> MembersView;
    fn is_quorum_present(&self, quorum_size: u32) -> bool;
    /// Partition migrations have settled enough to start new work.
    fn should_start_jobs(&self) -> bool;
    fn local_member_uuid(&self) -> Uuid;
}

/// Failures reading or writing the persistent job store.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("job {0} not found")]
    JobNotFound(JobId),
    #[error("job store i/o: {0}")]
    Io(String),
}

/// Persistent job metadata.
pub trait JobStore: Send + Sync {
    /// Serialized DAG bytes as submitted.
    fn read_dag(&self, job_id: JobId) -> Result<Vec<u8>, StoreError>;
    fn write_execution_record(
        &self,
        job_id: JobId,
        record: &JobExecutionRecord,
    ) -> Result<(), StoreError>;
}

/// Per-job snapshot machinery (scheduling, terminal snapshots).
pub trait SnapshotContext: Send + Sync {
    /// A fresh execution id was allocated for this job.
    fn on_new_execution(&self, execution_id: ExecutionId);
    /// The execution reached RUNNING; begin the periodic snapshot schedule.
    fn on_execution_started(&self);
    /// The execution is being finalized; stop any scheduled snapshots.
    fn on_execution_terminated(&self);
    /// Queue a snapshot. Terminal snapshots are flagged so the queue drains
    /// them ahead of regular ones.
    fn enqueue_snapshot(&self, name: Option<String>, terminal: bool);
    /// Kick off the queued terminal snapshot if none is in progress.
    fn try_begin_snapshot(&self);
    /// Completes once the terminal snapshot has been written.
    fn terminal_snapshot_future(&self) -> Promise<()>;
}

/// Cluster-wide job coordination (the service that owns all job masters).
#[async_trait]
pub trait CoordinationService: Send + Sync {
    /// Ask for `try_start_job` to be re-invoked once conditions allow.
    async fn schedule_restart(&self, job_id: JobId);
    /// Restart the job now that its previous execution terminated.
    async fn restart_job(&self, job_id: JobId);
    /// Durably complete the job cluster-wide.
    async fn complete_job(
        &self,
        job_id: JobId,
        completed_at_ms: u64,
        failure: Option<ExecError>,
    ) -> Result<(), ExecError>;
}

/// Validates that a snapshot is usable and resolves its id.
pub trait SnapshotValidator: Send + Sync {
    fn validate(
        &self,
        snapshot_id: i64,
        map_name: &str,
        job_id: JobId,
        snapshot_name: Option<&str>,
    ) -> Result<i64, ExecError>;
}

/// Turns a DAG into per-member execution plans, and closes user vertices
/// when an execution finalizes.
pub trait PlanBuilder: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        members: &MembersView,
        dag: &Dag,
        job_id: JobId,
        execution_id: ExecutionId,
        config: &JobConfig,
        ongoing_snapshot_id: i64,
    ) -> Result<HashMap<MemberInfo, ExecutionPlan>, ExecError>;

    /// Close a user vertex after the execution ended. Errors are the
    /// vertex's problem, not the job's; callers log and move on.
    fn complete_vertex(&self, vertex: &Vertex, failure: Option<&ExecError>)
        -> Result<(), ExecError>;
}

/// Dispatches a single operation to a single participant.
///
/// RPC-layer failures come back as `OpResponse::Failure`, merged into the
/// same response map as application failures; the classifier decides.
#[async_trait]
pub trait ParticipantRpc: Send + Sync {
    async fn invoke(&self, member: &MemberInfo, op: Operation) -> OpResponse;
}
