// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{harness, harness_with, test_dag, FakeValidator};
use serde_json::json;
use weir_core::{
    exported_snapshot_map_name, Edge, ExecError, JobConfig, JobId, JobStatus, ProcessorSpec,
    Routing,
};

fn rewrite(
    dag: weir_core::Dag,
    validator: &FakeValidator,
) -> Result<weir_core::Dag, ExecError> {
    rewrite_dag_for_restore(dag, 7, "snapshot-map", Some("nightly"), validator, JobId::new(1))
}

#[test]
fn weaves_read_and_explode_vertices() {
    let validator = FakeValidator::default();
    let dag = rewrite(test_dag(), &validator).unwrap();

    let names: Vec<&str> = dag.vertices().iter().map(|v| v.name.as_str()).collect();
    assert!(names.contains(&SNAPSHOT_READ_VERTEX));
    assert!(names.contains(&SNAPSHOT_EXPLODE_VERTEX));

    // The reader uses the validator's resolved id, not the requested one.
    let read = dag.vertices().iter().find(|v| v.name == SNAPSHOT_READ_VERTEX).unwrap();
    assert_eq!(
        read.processor,
        ProcessorSpec::ReadSnapshot { map_name: "snapshot-map".into(), snapshot_id: 42 }
    );

    let explode = dag.vertices().iter().find(|v| v.name == SNAPSHOT_EXPLODE_VERTEX).unwrap();
    match &explode.processor {
        ProcessorSpec::ExplodeSnapshot { ordinals } => {
            assert_eq!(ordinals.get("source"), Some(&0));
            assert_eq!(ordinals.get("sink"), Some(&1));
        }
        other => panic!("unexpected explode processor: {other:?}"),
    }
}

#[test]
fn read_to_explode_edge_is_isolated() {
    let dag = rewrite(test_dag(), &FakeValidator::default()).unwrap();
    let edge = dag
        .edges()
        .iter()
        .find(|e| e.source == SNAPSHOT_READ_VERTEX && e.dest == SNAPSHOT_EXPLODE_VERTEX)
        .unwrap();
    assert_eq!(edge.routing, Routing::Isolated);
    assert!(!edge.distributed);
}

#[test]
fn restore_edges_drain_before_regular_input() {
    let dag = rewrite(test_dag(), &FakeValidator::default()).unwrap();

    let to_source = dag
        .edges()
        .iter()
        .find(|e| e.source == SNAPSHOT_EXPLODE_VERTEX && e.dest == "source")
        .unwrap();
    assert_eq!(to_source.source_ordinal, 0);
    assert_eq!(to_source.dest_ordinal, 0);
    assert_eq!(to_source.priority, i32::MIN);
    assert!(to_source.distributed);
    assert_eq!(to_source.routing, Routing::Partitioned);

    // `sink` already has a regular inbound edge at ordinal 0, so the
    // restore edge takes the next free one.
    let to_sink = dag
        .edges()
        .iter()
        .find(|e| e.source == SNAPSHOT_EXPLODE_VERTEX && e.dest == "sink")
        .unwrap();
    assert_eq!(to_sink.source_ordinal, 1);
    assert_eq!(to_sink.dest_ordinal, 1);
    assert_eq!(to_sink.priority, i32::MIN);
}

#[test]
fn validator_failure_propagates() {
    let validator = FakeValidator::default();
    *validator.failure.lock() = Some(ExecError::user("snapshot damaged"));
    assert_eq!(rewrite(test_dag(), &validator), Err(ExecError::user("snapshot damaged")));
}

#[test]
fn validator_receives_request_details() {
    let validator = FakeValidator::default();
    rewrite(test_dag(), &validator).unwrap();
    assert_eq!(
        validator.calls.lock().as_slice(),
        &[(7, "snapshot-map".to_string(), Some("nightly".to_string()))]
    );
}

#[test]
fn clashing_vertex_name_is_a_user_error() {
    let mut dag = test_dag();
    dag.vertex(SNAPSHOT_READ_VERTEX, ProcessorSpec::Named { name: "x".into(), params: json!({}) })
        .unwrap();
    let result = rewrite(dag, &FakeValidator::default());
    assert!(matches!(result, Err(ExecError::User { .. })));
}

#[test]
fn restore_preserves_original_edges() {
    let mut dag = test_dag();
    dag.vertex("agg", ProcessorSpec::Named { name: "aggregate".into(), params: json!({}) })
        .unwrap();
    dag.edge(Edge::between("sink", "agg")).unwrap();

    let rewritten = rewrite(dag.clone(), &FakeValidator::default()).unwrap();
    for edge in dag.edges() {
        assert!(rewritten.edges().contains(edge), "lost edge {edge:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn start_restores_from_internal_snapshot() {
    let h = harness(2);
    h.master.lock_state_mut(|s| s.record.snapshot_id = 5);
    h.start().await;

    assert_eq!(h.master.status(), JobStatus::Completed);
    let expected_map =
        h.master.lock_state(|s| s.record.successful_snapshot_map_name(h.master.job_id()));
    assert_eq!(
        h.validator.calls.lock().as_slice(),
        &[(5, expected_map, None)]
    );
    let built = h.plans.built_dags.lock();
    assert!(built[0].vertices().iter().any(|v| v.name == SNAPSHOT_READ_VERTEX));
}

#[tokio::test(start_paused = true)]
async fn start_restores_from_named_exported_snapshot() {
    let h = harness_with(JobConfig::new().with_initial_snapshot_name("nightly"), 2);
    h.start().await;

    assert_eq!(h.master.status(), JobStatus::Completed);
    assert_eq!(
        h.validator.calls.lock().as_slice(),
        &[(-1, exported_snapshot_map_name("nightly"), Some("nightly".to_string()))]
    );
}

#[tokio::test(start_paused = true)]
async fn invalid_snapshot_fails_start_as_user_error() {
    let h = harness(2);
    h.master.lock_state_mut(|s| s.record.snapshot_id = 5);
    *h.validator.failure.lock() = Some(ExecError::user("snapshot damaged"));
    h.start().await;

    assert_eq!(h.master.status(), JobStatus::Failed);
    assert!(matches!(
        h.master.job_completion_future().peek(),
        Some(Err(ExecError::User { .. }))
    ));
}
