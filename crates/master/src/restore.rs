// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rewriting a DAG to restore state from a snapshot.
//!
//! The rewrite prepends a two-vertex sub-graph: a reader that streams the
//! snapshot map and an exploder that routes each saved entry to the vertex
//! it belongs to. The restore edges run at minimum priority so every vertex
//! drains its saved state before touching regular input.

use crate::adapters::SnapshotValidator;
use std::collections::BTreeMap;
use weir_core::{Dag, DagError, Edge, ExecError, JobId, ProcessorSpec};

pub const SNAPSHOT_READ_VERTEX: &str = "__snapshot_read";
pub const SNAPSHOT_EXPLODE_VERTEX: &str = "__snapshot_explode";

/// Validate the snapshot and splice the restore sub-graph into `dag`.
pub(crate) fn rewrite_dag_for_restore(
    mut dag: Dag,
    snapshot_id: i64,
    map_name: &str,
    snapshot_name: Option<&str>,
    validator: &dyn SnapshotValidator,
    job_id: JobId,
) -> Result<Dag, ExecError> {
    let resolved_snapshot_id =
        validator.validate(snapshot_id, map_name, job_id, snapshot_name)?;

    let original_vertices: Vec<String> =
        dag.vertices().iter().map(|v| v.name.clone()).collect();
    let ordinals: BTreeMap<String, usize> = original_vertices
        .iter()
        .enumerate()
        .map(|(index, name)| (name.clone(), index))
        .collect();

    dag.vertex(
        SNAPSHOT_READ_VERTEX,
        ProcessorSpec::ReadSnapshot {
            map_name: map_name.to_string(),
            snapshot_id: resolved_snapshot_id,
        },
    )
    .map_err(restore_error)?;
    dag.vertex(SNAPSHOT_EXPLODE_VERTEX, ProcessorSpec::ExplodeSnapshot { ordinals })
        .map_err(restore_error)?;

    // Reader and exploder scale together; no redistribution between them.
    dag.edge(Edge::between(SNAPSHOT_READ_VERTEX, SNAPSHOT_EXPLODE_VERTEX).isolated())
        .map_err(restore_error)?;

    for (index, name) in original_vertices.iter().enumerate() {
        let inbound = dag.next_free_inbound_ordinal(name);
        dag.edge(
            Edge::between(SNAPSHOT_EXPLODE_VERTEX, name)
                .from_ordinal(index)
                .to_ordinal(inbound)
                .distributed()
                .partitioned()
                .priority(i32::MIN),
        )
        .map_err(restore_error)?;
    }

    Ok(dag)
}

fn restore_error(e: DagError) -> ExecError {
    ExecError::user(format!("cannot insert snapshot-restore vertices: {e}"))
}

#[cfg(test)]
#[path = "restore_tests.rs"]
mod tests;
