// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers: fake node services and a wired-up job master.

use crate::adapters::{
    ClusterService, CoordinationService, JobStore, ParticipantRpc, PlanBuilder, SnapshotContext,
    SnapshotValidator, StoreError,
};
use crate::context::{JobMaster, NodeHandles};
use crate::ops::{ExecutionPlan, Operation, OpResponse};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;
use weir_core::{
    Dag, Edge, ExecError, ExecutionId, FakeClock, JobConfig, JobExecutionRecord, JobId,
    MemberInfo, MembersView, MonotonicIdGen, ProcessorSpec, Promise, RawJobMetrics,
    TerminationMode, Vertex,
};

pub(crate) const TEST_JOB_ID: u64 = 0x0123_4567_89ab_cdef;

pub(crate) struct FakeCluster {
    pub view: Mutex<MembersView>,
    pub quorum_present: AtomicBool,
    pub safe_to_start: AtomicBool,
    pub local: Uuid,
}

impl FakeCluster {
    pub(crate) fn new(members: Vec<MemberInfo>) -> Self {
        Self {
            view: Mutex::new(MembersView::new(1, members)),
            quorum_present: AtomicBool::new(true),
            safe_to_start: AtomicBool::new(true),
            local: Uuid::new_v4(),
        }
    }
}

impl ClusterService for FakeCluster {
    fn members_view(&self) -> MembersView {
        self.view.lock().clone()
    }

    fn is_quorum_present(&self, _quorum_size: u32) -> bool {
        self.quorum_present.load(Ordering::Relaxed)
    }

    fn should_start_jobs(&self) -> bool {
        self.safe_to_start.load(Ordering::Relaxed)
    }

    fn local_member_uuid(&self) -> Uuid {
        self.local
    }
}

pub(crate) struct FakeJobStore {
    pub dag: Mutex<Vec<u8>>,
    pub written_records: Mutex<Vec<JobExecutionRecord>>,
}

impl FakeJobStore {
    pub(crate) fn with_dag(dag: &Dag) -> Self {
        Self {
            dag: Mutex::new(serde_json::to_vec(dag).unwrap()),
            written_records: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn last_record(&self) -> Option<JobExecutionRecord> {
        self.written_records.lock().last().cloned()
    }
}

impl JobStore for FakeJobStore {
    fn read_dag(&self, _job_id: JobId) -> Result<Vec<u8>, StoreError> {
        Ok(self.dag.lock().clone())
    }

    fn write_execution_record(
        &self,
        _job_id: JobId,
        record: &JobExecutionRecord,
    ) -> Result<(), StoreError> {
        self.written_records.lock().push(record.clone());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeSnapshotContext {
    pub enqueued: Mutex<Vec<(Option<String>, bool)>>,
    pub begin_snapshot_calls: AtomicUsize,
    pub terminal_future: Mutex<Promise<()>>,
    pub new_executions: Mutex<Vec<ExecutionId>>,
    pub started_calls: AtomicUsize,
    pub terminated_calls: AtomicUsize,
}

impl SnapshotContext for FakeSnapshotContext {
    fn on_new_execution(&self, execution_id: ExecutionId) {
        self.new_executions.lock().push(execution_id);
    }

    fn on_execution_started(&self) {
        self.started_calls.fetch_add(1, Ordering::Relaxed);
    }

    fn on_execution_terminated(&self) {
        self.terminated_calls.fetch_add(1, Ordering::Relaxed);
    }

    fn enqueue_snapshot(&self, name: Option<String>, terminal: bool) {
        self.enqueued.lock().push((name, terminal));
    }

    fn try_begin_snapshot(&self) {
        self.begin_snapshot_calls.fetch_add(1, Ordering::Relaxed);
    }

    fn terminal_snapshot_future(&self) -> Promise<()> {
        self.terminal_future.lock().clone()
    }
}

#[derive(Default)]
pub(crate) struct FakeCoordination {
    pub schedule_restart_calls: AtomicUsize,
    pub restart_calls: AtomicUsize,
    pub completions: Mutex<Vec<Option<ExecError>>>,
}

#[async_trait]
impl CoordinationService for FakeCoordination {
    async fn schedule_restart(&self, _job_id: JobId) {
        self.schedule_restart_calls.fetch_add(1, Ordering::Relaxed);
    }

    async fn restart_job(&self, _job_id: JobId) {
        self.restart_calls.fetch_add(1, Ordering::Relaxed);
    }

    async fn complete_job(
        &self,
        _job_id: JobId,
        _completed_at_ms: u64,
        failure: Option<ExecError>,
    ) -> Result<(), ExecError> {
        self.completions.lock().push(failure);
        Ok(())
    }
}

pub(crate) struct FakeValidator {
    pub resolved_id: i64,
    pub failure: Mutex<Option<ExecError>>,
    pub calls: Mutex<Vec<(i64, String, Option<String>)>>,
}

impl Default for FakeValidator {
    fn default() -> Self {
        Self { resolved_id: 42, failure: Mutex::new(None), calls: Mutex::new(Vec::new()) }
    }
}

impl SnapshotValidator for FakeValidator {
    fn validate(
        &self,
        snapshot_id: i64,
        map_name: &str,
        _job_id: JobId,
        snapshot_name: Option<&str>,
    ) -> Result<i64, ExecError> {
        self.calls.lock().push((
            snapshot_id,
            map_name.to_string(),
            snapshot_name.map(str::to_string),
        ));
        match self.failure.lock().clone() {
            Some(e) => Err(e),
            None => Ok(self.resolved_id),
        }
    }
}

#[derive(Default)]
pub(crate) struct FakePlanBuilder {
    pub failure: Mutex<Option<ExecError>>,
    pub vertex_failure: Mutex<Option<ExecError>>,
    pub built_dags: Mutex<Vec<Dag>>,
    pub completed_vertices: Mutex<Vec<String>>,
}

impl PlanBuilder for FakePlanBuilder {
    fn build(
        &self,
        members: &MembersView,
        dag: &Dag,
        _job_id: JobId,
        _execution_id: ExecutionId,
        _config: &JobConfig,
        _ongoing_snapshot_id: i64,
    ) -> Result<HashMap<MemberInfo, ExecutionPlan>, ExecError> {
        if let Some(e) = self.failure.lock().clone() {
            return Err(e);
        }
        self.built_dags.lock().push(dag.clone());
        Ok(members
            .members
            .iter()
            .map(|m| (m.clone(), ExecutionPlan(json!({ "member": m.uuid.to_string() }))))
            .collect())
    }

    fn complete_vertex(
        &self,
        vertex: &Vertex,
        _failure: Option<&ExecError>,
    ) -> Result<(), ExecError> {
        self.completed_vertices.lock().push(vertex.name.clone());
        match self.vertex_failure.lock().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Scriptable RPC layer. Responses are looked up per member and operation
/// kind; `StartExecution` can be gated so an execution stays in flight
/// until the test releases it.
#[derive(Default)]
pub(crate) struct FakeRpc {
    pub init_responses: Mutex<HashMap<Uuid, OpResponse>>,
    pub start_responses: Mutex<HashMap<Uuid, OpResponse>>,
    pub metrics_responses: Mutex<HashMap<Uuid, OpResponse>>,
    pub start_gate: Mutex<Option<Promise<()>>>,
    pub terminates: Mutex<Vec<(Uuid, Option<TerminationMode>)>>,
}

impl FakeRpc {
    /// Hold every `StartExecution` reply until the returned promise is
    /// completed.
    pub(crate) fn gate_start(&self) -> Promise<()> {
        let gate = Promise::new();
        *self.start_gate.lock() = Some(gate.clone());
        gate
    }

    pub(crate) fn set_start_response(&self, member: &MemberInfo, response: OpResponse) {
        self.start_responses.lock().insert(member.uuid, response);
    }

    pub(crate) fn set_init_response(&self, member: &MemberInfo, response: OpResponse) {
        self.init_responses.lock().insert(member.uuid, response);
    }

    pub(crate) fn set_metrics_response(&self, member: &MemberInfo, response: OpResponse) {
        self.metrics_responses.lock().insert(member.uuid, response);
    }

    /// Number of `TerminateExecution` dispatches, across all members.
    pub(crate) fn terminate_count(&self) -> usize {
        self.terminates.lock().len()
    }
}

#[async_trait]
impl ParticipantRpc for FakeRpc {
    async fn invoke(&self, member: &MemberInfo, op: Operation) -> OpResponse {
        match op {
            Operation::InitExecution { .. } => self
                .init_responses
                .lock()
                .get(&member.uuid)
                .cloned()
                .unwrap_or(OpResponse::Void),
            Operation::StartExecution { .. } => {
                let gate = self.start_gate.lock().clone();
                if let Some(gate) = gate {
                    gate.wait().await;
                }
                self.start_responses.lock().get(&member.uuid).cloned().unwrap_or(
                    OpResponse::Done { metrics: RawJobMetrics::default(), error: None },
                )
            }
            Operation::TerminateExecution { mode, .. } => {
                self.terminates.lock().push((member.uuid, mode));
                OpResponse::Void
            }
            Operation::GetLocalJobMetrics { .. } => self
                .metrics_responses
                .lock()
                .get(&member.uuid)
                .cloned()
                .unwrap_or(OpResponse::Completed),
        }
    }
}

/// A job master wired to fakes, plus handles to all of them.
pub(crate) struct Harness {
    pub master: JobMaster,
    pub members: Vec<MemberInfo>,
    pub cluster: Arc<FakeCluster>,
    pub rpc: Arc<FakeRpc>,
    pub store: Arc<FakeJobStore>,
    pub snapshots: Arc<FakeSnapshotContext>,
    pub coordination: Arc<FakeCoordination>,
    pub validator: Arc<FakeValidator>,
    pub plans: Arc<FakePlanBuilder>,
    pub clock: Arc<FakeClock>,
    pub id_gen: MonotonicIdGen,
}

pub(crate) fn test_dag() -> Dag {
    let mut dag = Dag::new();
    dag.vertex("source", ProcessorSpec::Named { name: "read-stream".into(), params: json!({}) })
        .unwrap();
    dag.vertex("sink", ProcessorSpec::Named { name: "write-map".into(), params: json!({}) })
        .unwrap();
    dag.edge(Edge::between("source", "sink")).unwrap();
    dag
}

pub(crate) fn harness(member_count: usize) -> Harness {
    harness_with(JobConfig::default(), member_count)
}

pub(crate) fn harness_with(config: JobConfig, member_count: usize) -> Harness {
    let members: Vec<MemberInfo> = (0..member_count)
        .map(|i| MemberInfo::new(Uuid::new_v4(), format!("10.0.0.{}:5701", i + 1)))
        .collect();
    let cluster = Arc::new(FakeCluster::new(members.clone()));
    let rpc = Arc::new(FakeRpc::default());
    let store = Arc::new(FakeJobStore::with_dag(&test_dag()));
    let snapshots = Arc::new(FakeSnapshotContext::default());
    let coordination = Arc::new(FakeCoordination::default());
    let validator = Arc::new(FakeValidator::default());
    let plans = Arc::new(FakePlanBuilder::default());
    let clock = Arc::new(FakeClock::new());

    let handles = Arc::new(NodeHandles {
        cluster: cluster.clone(),
        rpc: rpc.clone(),
        store: store.clone(),
        snapshots: snapshots.clone(),
        coordination: coordination.clone(),
        validator: validator.clone(),
        plans: plans.clone(),
        clock: clock.clone(),
    });
    let master = JobMaster::new(
        JobId::new(TEST_JOB_ID),
        config,
        JobExecutionRecord::new(1),
        handles,
    );

    Harness {
        master,
        members,
        cluster,
        rpc,
        store,
        snapshots,
        coordination,
        validator,
        plans,
        clock,
        id_gen: MonotonicIdGen::new(),
    }
}

impl Harness {
    pub(crate) async fn start(&self) {
        self.master.try_start_job(&self.id_gen).await;
        settle().await;
    }
}

/// Let spawned coordinator tasks run to quiescence.
pub(crate) async fn settle() {
    for _ in 0..100 {
        tokio::task::yield_now().await;
    }
}
