// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collapsing a set of per-member responses into one job-level outcome.

use crate::context::JobMaster;
use crate::ops::ResponseMap;
use weir_core::{ExecError, TerminationMode};

impl JobMaster {
    /// Classify the responses of one fan-out invocation.
    ///
    /// Returns `None` when every planned participant succeeded. The success
    /// denominator is the execution-plan map, not the response count: a
    /// participant that disappeared before responding surfaces as an
    /// RPC-layer failure in the map, never as a missing entry.
    pub(crate) fn classify_responses(
        &self,
        op_name: &str,
        responses: &ResponseMap,
    ) -> Option<ExecError> {
        let state = self.lock_state(|s| {
            (s.requested_termination, s.execution_plans.len())
        });
        let (requested_termination, plan_size) = state;

        // A forceful cancel overrides whatever the participants reported.
        if requested_termination == Some(TerminationMode::CANCEL_FORCEFUL) {
            return Some(ExecError::Cancelled);
        }

        let failures: Vec<&ExecError> =
            responses.values().filter_map(|r| r.error()).collect();
        let success_count = responses.len() - failures.len();
        if success_count == plan_size {
            return None;
        }

        if !failures.is_empty()
            && failures.iter().all(|e| matches!(e.peel(), ExecError::TerminatedWithSnapshot))
        {
            // Only phase B produces this marker: participants stop with it
            // after writing their share of a terminal snapshot.
            debug_assert_eq!(op_name, "Execution");
            return Some(match requested_termination {
                Some(mode) if mode.with_terminal_snapshot => {
                    if mode == TerminationMode::CANCEL_GRACEFUL {
                        ExecError::Cancelled
                    } else {
                        ExecError::TerminateRequested(mode)
                    }
                }
                other => ExecError::illegal_state(format!(
                    "all {op_name} responses terminated with a snapshot, \
                     but requested termination is {other:?}"
                )),
            });
        }

        // Prefer a real failure over the stop/topology noise around it.
        for failure in &failures {
            let peeled = failure.peel();
            if !matches!(peeled, ExecError::Cancelled | ExecError::TerminatedWithSnapshot)
                && !peeled.is_topology()
            {
                return Some(peeled.clone());
            }
        }

        Some(ExecError::TopologyChanged)
    }
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
