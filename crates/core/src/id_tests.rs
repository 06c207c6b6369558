// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn job_id_display_groups_hex() {
    let id = JobId::new(0x0123_4567_89ab_cdef);
    assert_eq!(id.to_string(), "0123-4567-89ab-cdef");
}

#[test]
fn job_id_parse_roundtrip() {
    let id = JobId::new(0xdead_beef_0042_f00d);
    let parsed = JobId::parse(&id.to_string()).unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn job_id_parse_accepts_undashed() {
    assert_eq!(JobId::parse("0123456789abcdef").unwrap(), JobId::new(0x0123_4567_89ab_cdef));
}

#[test]
fn job_id_parse_rejects_garbage() {
    assert!(JobId::parse("not-a-job-id").is_err());
    assert!(JobId::parse("0123").is_err());
    assert!(JobId::parse("").is_err());
}

#[test]
fn execution_id_display_is_full_hex() {
    assert_eq!(ExecutionId::new(0x2a).to_string(), "000000000000002a");
}

#[test]
fn monotonic_gen_is_strictly_increasing() {
    let gen = MonotonicIdGen::new();
    let mut previous = gen.next_execution_id();
    for _ in 0..100 {
        let next = gen.next_execution_id();
        assert!(next > previous);
        previous = next;
    }
}

#[test]
fn monotonic_gen_starting_at() {
    let gen = MonotonicIdGen::starting_at(7);
    assert_eq!(gen.next_execution_id(), ExecutionId::new(7));
    assert_eq!(gen.next_execution_id(), ExecutionId::new(8));
}
