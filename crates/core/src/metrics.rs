// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job metrics: raw per-member snapshots and the merged job-level view.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metrics snapshot produced by one member's local execution engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawJobMetrics {
    pub timestamp_ms: u64,
    /// Ordered list of `(name, value)` measurements.
    pub values: Vec<(String, i64)>,
}

impl RawJobMetrics {
    pub fn new(timestamp_ms: u64) -> Self {
        Self { timestamp_ms, values: Vec::new() }
    }

    pub fn with(mut self, name: impl Into<String>, value: i64) -> Self {
        self.values.push((name.into(), value));
        self
    }
}

/// One named measurement in the merged view. The name carries the member
/// prefix; the timestamp is the raw snapshot's.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Measurement {
    pub name: String,
    pub value: i64,
    pub timestamp_ms: u64,
}

/// Merged, member-prefixed job-level metrics.
///
/// `merge` concatenates measurement multisets, so it is associative and
/// (up to ordering) commutative, and the empty value is its identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMetrics {
    measurements: Vec<Measurement>,
}

impl JobMetrics {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Lift one member's raw snapshot into the merged form, prefixing every
    /// measurement name with the member tag.
    pub fn of_member(member: &Uuid, raw: &RawJobMetrics) -> Self {
        let prefix = member_prefix(member);
        Self {
            measurements: raw
                .values
                .iter()
                .map(|(name, value)| Measurement {
                    name: format!("{prefix}{name}"),
                    value: *value,
                    timestamp_ms: raw.timestamp_ms,
                })
                .collect(),
        }
    }

    pub fn merge(mut self, other: JobMetrics) -> JobMetrics {
        self.measurements.extend(other.measurements);
        self
    }

    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// Values recorded under the given prefixed name.
    pub fn values_of(&self, name: &str) -> Vec<i64> {
        self.measurements.iter().filter(|m| m.name == name).map(|m| m.value).collect()
    }
}

/// Tag prepended to a measurement name to attribute it to a member.
pub fn member_prefix(member: &Uuid) -> String {
    format!("[member={member}]")
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
