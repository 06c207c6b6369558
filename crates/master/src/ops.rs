// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operations the coordinator sends to participants, and their responses.

use std::collections::HashMap;
use uuid::Uuid;
use weir_core::{ExecError, ExecutionId, JobId, MemberInfo, RawJobMetrics, TerminationMode};

/// Opaque per-member execution plan payload produced by the plan builder.
/// The coordinator never looks inside; it only addresses plans by member.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan(pub serde_json::Value);

/// One outbound operation addressed to a single participant.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Phase A: hand the participant its plan and pin the participant set.
    InitExecution {
        job_id: JobId,
        execution_id: ExecutionId,
        members_view_version: u32,
        participants: Vec<Uuid>,
        plan: ExecutionPlan,
    },
    /// Phase B: run the previously initialized execution to completion.
    StartExecution { job_id: JobId, execution_id: ExecutionId },
    /// Cooperative stop signal. `mode` is absent when the coordinator tears
    /// down after a member failure rather than a user request.
    TerminateExecution {
        job_id: JobId,
        execution_id: Option<ExecutionId>,
        mode: Option<TerminationMode>,
    },
    GetLocalJobMetrics { job_id: JobId, execution_id: ExecutionId },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::InitExecution { .. } => "InitExecution",
            Operation::StartExecution { .. } => "StartExecution",
            Operation::TerminateExecution { .. } => "TerminateExecution",
            Operation::GetLocalJobMetrics { .. } => "GetLocalJobMetrics",
        }
    }
}

/// A participant's reply. Responses are heterogeneous across operations, so
/// the boundary uses one tagged type instead of overloading a value slot.
#[derive(Debug, Clone, PartialEq)]
pub enum OpResponse {
    /// Plain acknowledgement (init, terminate).
    Void,
    /// Phase-B result: the execution ran and reported its final metrics,
    /// possibly together with the failure that ended it.
    Done { metrics: RawJobMetrics, error: Option<ExecError> },
    /// Live metrics snapshot.
    Metrics(RawJobMetrics),
    /// The participant already finished this execution and discarded it.
    Completed,
    /// The operation itself failed (locally or at the RPC layer).
    Failure(ExecError),
}

impl OpResponse {
    /// The failure carried by this response, if any.
    pub fn error(&self) -> Option<&ExecError> {
        match self {
            OpResponse::Done { error, .. } => error.as_ref(),
            OpResponse::Failure(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error().is_some()
    }
}

/// Accumulated replies of one fan-out invocation.
pub type ResponseMap = HashMap<MemberInfo, OpResponse>;
