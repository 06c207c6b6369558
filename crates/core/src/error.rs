// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Classified execution failures.
//!
//! Every failure that crosses the coordinator boundary is one of these
//! kinds; classification decides the job's fate, so downstream code matches
//! on the variant instead of inspecting messages.

use crate::termination::TerminationMode;
use thiserror::Error;
use uuid::Uuid;

/// A failure attributed to one execution of a job.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecError {
    /// Cooperative cancellation by user request.
    #[error("job cancelled by user")]
    Cancelled,

    /// Non-cancel termination (restart, suspend, graceful restart).
    #[error("job termination requested: {0}")]
    TerminateRequested(TerminationMode),

    /// At least one participant left the cluster; eligible for restart.
    #[error("cluster topology changed")]
    TopologyChanged,

    /// A specific participant departed mid-execution.
    #[error("member {0} left the cluster")]
    MemberLeft(Uuid),

    /// Wire-level marker: a participant stopped after writing its share of
    /// a terminal snapshot.
    #[error("execution terminated after a terminal snapshot")]
    TerminatedWithSnapshot,

    /// Exception raised in user DAG code or plan materialization.
    #[error("user code failure: {message}")]
    User { message: String, restartable: bool },

    /// This node left the cluster; cancel locally but keep job metadata.
    #[error("local member was reset")]
    LocalMemberReset,

    /// A participant no longer knows the execution (it finished locally).
    #[error("execution not found")]
    ExecutionNotFound,

    /// Coordinator invariant violation. Should not happen.
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// RPC-layer envelope around a remote failure.
    #[error(transparent)]
    Wrapped(Box<ExecError>),
}

impl ExecError {
    pub fn user(message: impl Into<String>) -> Self {
        ExecError::User { message: message.into(), restartable: false }
    }

    pub fn restartable_user(message: impl Into<String>) -> Self {
        ExecError::User { message: message.into(), restartable: true }
    }

    pub fn illegal_state(message: impl Into<String>) -> Self {
        ExecError::IllegalState(message.into())
    }

    pub fn wrapped(inner: ExecError) -> Self {
        ExecError::Wrapped(Box::new(inner))
    }

    /// Strip any RPC envelopes and return the underlying failure.
    pub fn peel(&self) -> &ExecError {
        let mut current = self;
        while let ExecError::Wrapped(inner) = current {
            current = inner;
        }
        current
    }

    /// A participant-departure class of failure.
    pub fn is_topology(&self) -> bool {
        matches!(self.peel(), ExecError::TopologyChanged | ExecError::MemberLeft(_))
    }

    /// Transient failures the job may survive by starting over.
    pub fn is_restartable(&self) -> bool {
        match self.peel() {
            ExecError::TopologyChanged | ExecError::MemberLeft(_) => true,
            ExecError::User { restartable, .. } => *restartable,
            _ => false,
        }
    }

    pub fn is_user_error(&self) -> bool {
        matches!(self.peel(), ExecError::User { .. })
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
