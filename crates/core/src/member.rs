// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster member identity and membership snapshots.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a cluster member. Equality and hashing use only the UUID:
/// a member that rejoins under a new address is still a different UUID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberInfo {
    pub uuid: Uuid,
    pub address: String,
}

impl MemberInfo {
    pub fn new(uuid: Uuid, address: impl Into<String>) -> Self {
        Self { uuid, address: address.into() }
    }
}

impl PartialEq for MemberInfo {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl Eq for MemberInfo {}

impl std::hash::Hash for MemberInfo {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

impl std::fmt::Display for MemberInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.address)
    }
}

/// Point-in-time snapshot of the cluster membership.
///
/// The version increases monotonically with every membership change; the
/// coordinator pins one view per execution so every participant agrees on
/// the participant set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembersView {
    pub version: u32,
    pub members: Vec<MemberInfo>,
}

impl MembersView {
    pub fn new(version: u32, members: Vec<MemberInfo>) -> Self {
        Self { version, members }
    }

    pub fn member_uuids(&self) -> Vec<Uuid> {
        self.members.iter().map(|m| m.uuid).collect()
    }
}
