// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fresh_record_has_no_snapshot() {
    let record = JobExecutionRecord::new(2);
    assert_eq!(record.quorum_size, 2);
    assert_eq!(record.snapshot_id, -1);
    assert!(!record.has_snapshot());
    assert!(!record.suspended);
    assert!(!record.executed);
}

#[test]
fn mark_executed_stamps_timestamp() {
    let mut record = JobExecutionRecord::new(1);
    record.mark_executed(123_456);
    assert!(record.executed);
    assert_eq!(record.timestamp_ms, 123_456);
}

#[test]
fn snapshot_map_names_rotate_by_index() {
    let job_id = JobId::new(0x0123_4567_89ab_cdef);
    let mut record = JobExecutionRecord::new(1);
    assert_eq!(
        record.successful_snapshot_map_name(job_id),
        "__weir.snapshot.0123-4567-89ab-cdef.0"
    );
    record.data_map_index = 1;
    assert_eq!(
        record.successful_snapshot_map_name(job_id),
        "__weir.snapshot.0123-4567-89ab-cdef.1"
    );
}

#[test]
fn exported_map_name_uses_snapshot_name() {
    assert_eq!(exported_snapshot_map_name("nightly"), "__weir.exported.nightly");
}

#[test]
fn serde_defaults_for_old_records() {
    // Records written before the suspended/executed fields existed.
    let json = r#"{"quorum_size":3,"snapshot_id":7,"ongoing_snapshot_id":8,"data_map_index":1}"#;
    let record: JobExecutionRecord = serde_json::from_str(json).unwrap();
    assert!(!record.suspended);
    assert!(!record.executed);
    assert!(record.has_snapshot());
}
