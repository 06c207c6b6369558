// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job and execution identifiers.
//!
//! Job ids are random 64-bit values rendered in the grouped-hex form
//! `hhhh-hhhh-hhhh-hhhh` that appears in logs, map names, and CLI output.
//! Execution ids are signed 64-bit values handed out by an
//! [`ExecutionIdGen`]; the coordinator requires them to be strictly
//! monotonic within one job so that stale responses can be fenced.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use thiserror::Error;

/// Identifier of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(u64);

impl JobId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Parse the grouped-hex form produced by `Display`.
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        let compact: String = s.chars().filter(|c| *c != '-').collect();
        if compact.len() != 16 {
            return Err(IdParseError(s.to_string()));
        }
        u64::from_str_radix(&compact, 16).map(Self).map_err(|_| IdParseError(s.to_string()))
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04x}-{:04x}-{:04x}-{:04x}",
            (self.0 >> 48) & 0xffff,
            (self.0 >> 32) & 0xffff,
            (self.0 >> 16) & 0xffff,
            self.0 & 0xffff
        )
    }
}

/// Error parsing a grouped-hex job id.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid job id: {0:?}")]
pub struct IdParseError(String);

/// Identifier of one execution attempt of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(i64);

impl ExecutionId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Source of fresh execution ids for start attempts.
pub trait ExecutionIdGen: Send + Sync {
    fn next_execution_id(&self) -> ExecutionId;
}

/// Counter-backed id generator. Ids are strictly increasing.
#[derive(Debug, Default)]
pub struct MonotonicIdGen {
    next: AtomicI64,
}

impl MonotonicIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(first: i64) -> Self {
        Self { next: AtomicI64::new(first) }
    }
}

impl ExecutionIdGen for MonotonicIdGen {
    fn next_execution_id(&self) -> ExecutionId {
        ExecutionId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
