// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted per-job execution record and the snapshot map-name layout.

use crate::id::JobId;
use serde::{Deserialize, Serialize};

/// State the coordinator persists about a job across start attempts.
///
/// All field mutation happens under the per-job master lock; the record is
/// written back to the job store whenever a durable field changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobExecutionRecord {
    /// Minimum live-member count required to start.
    pub quorum_size: u32,
    /// Id of the last successful snapshot, or −1 if none exists.
    pub snapshot_id: i64,
    /// Id the in-progress snapshot will get.
    pub ongoing_snapshot_id: i64,
    /// Which of the two rotating snapshot data maps holds the successful
    /// snapshot.
    pub data_map_index: i32,
    #[serde(default)]
    pub suspended: bool,
    /// Set on every start attempt.
    #[serde(default)]
    pub executed: bool,
    /// Epoch millis of the last update.
    #[serde(default)]
    pub timestamp_ms: u64,
}

impl JobExecutionRecord {
    pub fn new(quorum_size: u32) -> Self {
        Self {
            quorum_size,
            snapshot_id: -1,
            ongoing_snapshot_id: 0,
            data_map_index: 0,
            suspended: false,
            executed: false,
            timestamp_ms: 0,
        }
    }

    /// Whether a successful snapshot exists to restore from.
    pub fn has_snapshot(&self) -> bool {
        self.snapshot_id >= 0
    }

    /// Mark that a start attempt consumed this record.
    pub fn mark_executed(&mut self, now_ms: u64) {
        self.executed = true;
        self.timestamp_ms = now_ms;
    }

    /// Name of the data map holding the last successful snapshot.
    pub fn successful_snapshot_map_name(&self, job_id: JobId) -> String {
        snapshot_map_name(job_id, self.data_map_index)
    }
}

/// Internal snapshot data map for a job. Each job rotates between index 0
/// and 1 so an in-progress snapshot never overwrites the successful one.
pub fn snapshot_map_name(job_id: JobId, index: i32) -> String {
    format!("__weir.snapshot.{job_id}.{index}")
}

/// Map holding a user-named exported snapshot.
pub fn exported_snapshot_map_name(name: &str) -> String {
    format!("__weir.exported.{name}")
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
