// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job configuration.

use serde::{Deserialize, Serialize};

/// Delivery guarantee the job's snapshots provide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingGuarantee {
    /// No snapshots; a restarted job loses in-flight state.
    #[default]
    None,
    AtLeastOnce,
    ExactlyOnce,
}

crate::simple_display! {
    ProcessingGuarantee {
        None => "none",
        AtLeastOnce => "at-least-once",
        ExactlyOnce => "exactly-once",
    }
}

/// Configuration for submitting a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: Option<String>,
    pub processing_guarantee: ProcessingGuarantee,
    pub snapshot_interval_ms: u64,
    /// Restart the job to use new members or survive losing members.
    pub auto_scaling: bool,
    /// Exported snapshot to bootstrap the first execution from.
    pub initial_snapshot_name: Option<String>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            name: None,
            processing_guarantee: ProcessingGuarantee::None,
            snapshot_interval_ms: 10_000,
            auto_scaling: true,
            initial_snapshot_name: None,
        }
    }
}

impl JobConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_processing_guarantee(mut self, guarantee: ProcessingGuarantee) -> Self {
        self.processing_guarantee = guarantee;
        self
    }

    pub fn with_snapshot_interval_ms(mut self, interval_ms: u64) -> Self {
        self.snapshot_interval_ms = interval_ms;
        self
    }

    pub fn with_auto_scaling(mut self, enabled: bool) -> Self {
        self.auto_scaling = enabled;
        self
    }

    pub fn with_initial_snapshot_name(mut self, name: impl Into<String>) -> Self {
        self.initial_snapshot_name = Some(name.into());
        self
    }
}
