// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{harness, settle};
use std::sync::Arc;
use weir_core::{ExecError, ExecutionId, RawJobMetrics, TerminationMode};

fn callback(h: &crate::test_helpers::Harness) -> ExecutionCompletionCallback {
    ExecutionCompletionCallback::new(h.master.clone(), ExecutionId::new(1), h.members.clone())
}

#[tokio::test(start_paused = true)]
async fn successful_response_caches_partial_metrics() {
    let h = harness(3);
    let cb = callback(&h);

    cb.on_response(
        &h.members[0],
        &OpResponse::Done { metrics: RawJobMetrics::new(4).with("emitted", 6), error: None },
    );

    h.master.lock_state(|s| {
        assert!(s.members_with_completed_execution.contains(&h.members[0].uuid));
        assert_eq!(
            s.partial_metrics.get(&h.members[0].uuid),
            Some(&RawJobMetrics::new(4).with("emitted", 6))
        );
    });
    settle().await;
    assert_eq!(h.rpc.terminate_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_response_triggers_teardown_broadcast() {
    let h = harness(3);
    let cb = callback(&h);

    cb.on_response(&h.members[1], &OpResponse::Failure(ExecError::user("boom")));
    settle().await;

    assert_eq!(h.rpc.terminate_count(), 3);
    // Teardown after a member failure carries no user-requested mode.
    assert!(h.rpc.terminates.lock().iter().all(|(_, mode)| mode.is_none()));
    h.master.lock_state(|s| {
        assert!(s.members_with_completed_execution.contains(&h.members[1].uuid));
        assert!(s.partial_metrics.is_empty());
    });
}

#[tokio::test(start_paused = true)]
async fn terminated_with_snapshot_does_not_tear_down() {
    let h = harness(3);
    let cb = callback(&h);

    cb.on_response(
        &h.members[0],
        &OpResponse::Failure(ExecError::TerminatedWithSnapshot),
    );
    cb.on_response(
        &h.members[1],
        &OpResponse::Failure(ExecError::wrapped(ExecError::TerminatedWithSnapshot)),
    );
    settle().await;
    assert_eq!(h.rpc.terminate_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancel_invocations_dispatches_at_most_once() {
    let h = harness(3);
    let cb = Arc::new(callback(&h));

    for _ in 0..4 {
        cb.cancel_invocations(Some(TerminationMode::CANCEL_FORCEFUL));
    }
    settle().await;
    assert_eq!(h.rpc.terminate_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn racing_cancellers_still_dispatch_once() {
    let h = harness(3);
    let cb = Arc::new(callback(&h));

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let cb = cb.clone();
            tokio::spawn(async move {
                if i % 2 == 0 {
                    cb.cancel_invocations(None);
                } else {
                    cb.cancel_invocations(Some(TerminationMode::CANCEL_FORCEFUL));
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }
    settle().await;
    assert_eq!(h.rpc.terminate_count(), 3);
}
