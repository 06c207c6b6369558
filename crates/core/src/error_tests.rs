// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn peel_unwraps_nested_envelopes() {
    let inner = ExecError::user("boom");
    let wrapped = ExecError::wrapped(ExecError::wrapped(inner.clone()));
    assert_eq!(wrapped.peel(), &inner);
}

#[test]
fn peel_is_identity_for_bare_errors() {
    let e = ExecError::Cancelled;
    assert_eq!(e.peel(), &e);
}

#[test]
fn topology_classification() {
    assert!(ExecError::TopologyChanged.is_topology());
    assert!(ExecError::MemberLeft(Uuid::nil()).is_topology());
    assert!(ExecError::wrapped(ExecError::TopologyChanged).is_topology());
    assert!(!ExecError::Cancelled.is_topology());
    assert!(!ExecError::user("x").is_topology());
}

#[test]
fn restartable_classification() {
    assert!(ExecError::TopologyChanged.is_restartable());
    assert!(ExecError::MemberLeft(Uuid::nil()).is_restartable());
    assert!(ExecError::restartable_user("transient").is_restartable());
    assert!(!ExecError::user("fatal").is_restartable());
    assert!(!ExecError::Cancelled.is_restartable());
    assert!(!ExecError::LocalMemberReset.is_restartable());
    assert!(!ExecError::TerminateRequested(TerminationMode::RESTART_GRACEFUL).is_restartable());
}

#[test]
fn wrapped_display_is_transparent() {
    let wrapped = ExecError::wrapped(ExecError::Cancelled);
    assert_eq!(wrapped.to_string(), ExecError::Cancelled.to_string());
}
