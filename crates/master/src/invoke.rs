// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-out invocation of an operation across participants.

use crate::adapters::ParticipantRpc;
use crate::ops::{Operation, OpResponse, ResponseMap};
use futures_util::future::BoxFuture;
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use weir_core::{ExecutionId, JobId, MemberInfo, TerminationMode};

pub(crate) type PerResponseFn = Box<dyn Fn(&MemberInfo, &OpResponse) + Send + Sync>;
pub(crate) type CompletionFn = Box<dyn FnOnce(ResponseMap) -> BoxFuture<'static, ()> + Send>;

/// The two callbacks attached to one fan-out invocation. The RPC layer
/// calls `on_response` once per reply (in arrival order) and `on_complete`
/// exactly once, after the last reply.
pub(crate) struct InvocationGroup {
    pub(crate) on_response: Option<PerResponseFn>,
    pub(crate) on_complete: CompletionFn,
}

/// Dispatch one operation per participant without blocking the caller.
/// Replies are collected concurrently; the group's completion callback runs
/// on the same task once every participant has answered.
pub(crate) fn invoke_on_participants(
    rpc: Arc<dyn ParticipantRpc>,
    invocations: Vec<(MemberInfo, Operation)>,
    group: InvocationGroup,
) {
    tokio::spawn(async move {
        let mut in_flight = FuturesUnordered::new();
        for (member, op) in invocations {
            let rpc = rpc.clone();
            in_flight.push(async move {
                let response = rpc.invoke(&member, op).await;
                (member, response)
            });
        }

        let InvocationGroup { on_response, on_complete } = group;
        let mut responses = ResponseMap::new();
        while let Some((member, response)) = in_flight.next().await {
            if let Some(cb) = &on_response {
                cb(&member, &response);
            }
            responses.insert(member, response);
        }
        on_complete(responses).await;
    });
}

/// Fire-and-forget `TerminateExecution` to every given participant.
/// Failures are logged and dropped: the coordinator does not retry
/// teardown, a stuck execution is an operator concern.
pub(crate) fn broadcast_terminate(
    rpc: Arc<dyn ParticipantRpc>,
    participants: Vec<MemberInfo>,
    job_id: JobId,
    execution_id: Option<ExecutionId>,
    mode: Option<TerminationMode>,
) {
    tokio::spawn(async move {
        let mut in_flight = FuturesUnordered::new();
        for member in participants {
            let rpc = rpc.clone();
            let op = Operation::TerminateExecution { job_id, execution_id, mode };
            in_flight.push(async move {
                let response = rpc.invoke(&member, op).await;
                (member, response)
            });
        }
        while let Some((member, response)) = in_flight.next().await {
            if let OpResponse::Failure(e) = response {
                tracing::warn!(
                    job = %job_id,
                    member = %member,
                    error = %e,
                    "failed to terminate execution on participant, it may remain stuck"
                );
            }
        }
    });
}
