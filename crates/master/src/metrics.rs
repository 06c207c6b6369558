// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-demand collection of job metrics across participants.

use crate::context::JobMaster;
use crate::invoke::{invoke_on_participants, InvocationGroup};
use crate::ops::{Operation, OpResponse, ResponseMap};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;
use weir_core::{ExecError, JobMetrics, JobStatus, Promise, RawJobMetrics};

/// Delay before retrying after a participant reported a completed or
/// unknown execution. Covers the window where a member finished locally
/// but the coordinator has not yet reclassified the job.
const COLLECTION_RETRY_DELAY: Duration = Duration::from_millis(100);

impl JobMaster {
    /// Collect a fresh job-level metrics view and complete `client` with it.
    ///
    /// While the job is not running the last known aggregate is returned
    /// immediately. While it runs, every participant is asked for its live
    /// numbers; members that already finished are backed by the partial
    /// metrics their completion reported. The client future is never
    /// completed with a partial view: gaps schedule a retry instead.
    pub fn collect_metrics(&self, client: Promise<Result<JobMetrics, ExecError>>) {
        let (status, execution_id, last_known) =
            self.lock_state(|s| (s.status, s.execution_id, s.job_metrics.clone()));
        if status != JobStatus::Running {
            client.complete(Ok(last_known));
            return;
        }
        let Some(execution_id) = execution_id else {
            client.complete(Ok(last_known));
            return;
        };

        let participants = self.lock_state(|s| {
            s.execution_plans
                .keys()
                .map(|m| {
                    (m.clone(), Operation::GetLocalJobMetrics { job_id: self.job_id(), execution_id })
                })
                .collect::<Vec<_>>()
        });

        let master = self.clone();
        invoke_on_participants(
            self.handles().rpc.clone(),
            participants,
            InvocationGroup {
                on_response: None,
                on_complete: Box::new(move |responses| {
                    Box::pin(async move {
                        master.on_metrics_responses(client, responses);
                    })
                }),
            },
        );
    }

    fn on_metrics_responses(
        &self,
        client: Promise<Result<JobMetrics, ExecError>>,
        responses: ResponseMap,
    ) {
        // A member that finished between our status check and its reply
        // answers ExecutionNotFound; the job will reclassify shortly.
        let any_not_found = responses.values().any(|r| {
            matches!(r, OpResponse::Failure(e) if matches!(e.peel(), ExecError::ExecutionNotFound))
        });
        if any_not_found {
            self.schedule_collection_retry(client);
            return;
        }
        if let Some(error) = responses.values().find_map(|r| r.error()) {
            client.complete(Err(error.clone()));
            return;
        }

        let partial = self.lock_state(|s| s.partial_metrics.clone());
        match merge_member_responses(&responses, &partial) {
            Some(merged) => {
                client.complete(Ok(merged));
            }
            None => self.schedule_collection_retry(client),
        }
    }

    fn schedule_collection_retry(&self, client: Promise<Result<JobMetrics, ExecError>>) {
        tracing::debug!(
            job = %self.job_id(),
            delay_ms = COLLECTION_RETRY_DELAY.as_millis() as u64,
            "incomplete metrics view, retrying collection"
        );
        let master = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(COLLECTION_RETRY_DELAY).await;
            master.collect_metrics(client);
        });
    }
}

/// Merge live responses with the partial metrics cached from members that
/// already completed. Returns `None` when a completed member has no cached
/// entry yet; the caller retries rather than publish a hole.
pub(crate) fn merge_member_responses(
    responses: &ResponseMap,
    partial: &HashMap<Uuid, RawJobMetrics>,
) -> Option<JobMetrics> {
    let mut merged = JobMetrics::empty();
    for (member, response) in responses {
        let raw = match response {
            OpResponse::Metrics(raw) => raw.clone(),
            OpResponse::Completed => partial.get(&member.uuid)?.clone(),
            _ => return None,
        };
        merged = merged.merge(JobMetrics::of_member(&member.uuid, &raw));
    }
    Some(merged)
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
