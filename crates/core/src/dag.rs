// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job graph: vertices, edges, and validation.
//!
//! A [`Dag`] is what users submit and what the coordinator deserializes at
//! start time. Vertices iterate in insertion order; that order is the
//! contract the snapshot-restore rewrite relies on when it assigns restore
//! ordinals.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Processor behind a vertex. User vertices are opaque to the coordinator;
/// the two snapshot variants are produced only by the restore rewrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorSpec {
    Named {
        name: String,
        #[serde(default)]
        params: serde_json::Value,
    },
    ReadSnapshot {
        map_name: String,
        snapshot_id: i64,
    },
    ExplodeSnapshot {
        /// Original vertex name → restore output ordinal.
        ordinals: BTreeMap<String, usize>,
    },
}

/// A named processing step in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub name: String,
    pub processor: ProcessorSpec,
}

/// How items are routed over an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Routing {
    /// Any available downstream processor.
    Unicast,
    /// 1:1 between parallel processor instances, no redistribution.
    Isolated,
    /// By item key, so equal keys always meet the same processor.
    Partitioned,
}

/// A directed edge between two vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub source_ordinal: usize,
    pub dest: String,
    pub dest_ordinal: usize,
    /// Lower priorities are drained first.
    pub priority: i32,
    pub distributed: bool,
    pub routing: Routing,
}

impl Edge {
    /// Local unicast edge on ordinals 0 → 0.
    pub fn between(source: impl Into<String>, dest: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            source_ordinal: 0,
            dest: dest.into(),
            dest_ordinal: 0,
            priority: 0,
            distributed: false,
            routing: Routing::Unicast,
        }
    }

    pub fn from_ordinal(mut self, ordinal: usize) -> Self {
        self.source_ordinal = ordinal;
        self
    }

    pub fn to_ordinal(mut self, ordinal: usize) -> Self {
        self.dest_ordinal = ordinal;
        self
    }

    pub fn isolated(mut self) -> Self {
        self.routing = Routing::Isolated;
        self
    }

    pub fn partitioned(mut self) -> Self {
        self.routing = Routing::Partitioned;
        self
    }

    pub fn distributed(mut self) -> Self {
        self.distributed = true;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Structural problems rejected when building a graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DagError {
    #[error("vertex already exists: {0}")]
    DuplicateVertex(String),
    #[error("unknown vertex: {0}")]
    UnknownVertex(String),
    #[error("input ordinal {ordinal} of vertex {vertex} is already connected")]
    InputOrdinalTaken { vertex: String, ordinal: usize },
    #[error("output ordinal {ordinal} of vertex {vertex} is already connected")]
    OutputOrdinalTaken { vertex: String, ordinal: usize },
}

/// A directed acyclic graph of vertices and edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dag {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
}

impl Dag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex. Names must be unique within the graph.
    pub fn vertex(
        &mut self,
        name: impl Into<String>,
        processor: ProcessorSpec,
    ) -> Result<(), DagError> {
        let name = name.into();
        if self.vertices.iter().any(|v| v.name == name) {
            return Err(DagError::DuplicateVertex(name));
        }
        self.vertices.push(Vertex { name, processor });
        Ok(())
    }

    /// Add an edge. Both endpoints must exist and both ordinals must be free.
    pub fn edge(&mut self, edge: Edge) -> Result<(), DagError> {
        for endpoint in [&edge.source, &edge.dest] {
            if !self.vertices.iter().any(|v| v.name == *endpoint) {
                return Err(DagError::UnknownVertex(endpoint.clone()));
            }
        }
        if self
            .edges
            .iter()
            .any(|e| e.source == edge.source && e.source_ordinal == edge.source_ordinal)
        {
            return Err(DagError::OutputOrdinalTaken {
                vertex: edge.source,
                ordinal: edge.source_ordinal,
            });
        }
        if self.edges.iter().any(|e| e.dest == edge.dest && e.dest_ordinal == edge.dest_ordinal) {
            return Err(DagError::InputOrdinalTaken {
                vertex: edge.dest,
                ordinal: edge.dest_ordinal,
            });
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Vertices in insertion order.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// The lowest unused input ordinal of the given vertex.
    pub fn next_free_inbound_ordinal(&self, vertex: &str) -> usize {
        self.edges
            .iter()
            .filter(|e| e.dest == vertex)
            .map(|e| e.dest_ordinal + 1)
            .max()
            .unwrap_or(0)
    }

    /// Render the graph in GraphViz DOT form, for logging and debugging.
    pub fn to_dot(&self) -> String {
        use std::fmt::Write as _;
        let mut out = String::from("digraph DAG {\n");
        for v in &self.vertices {
            let _ = writeln!(out, "\t{:?};", v.name);
        }
        for e in &self.edges {
            let mut attrs = Vec::new();
            if e.distributed {
                attrs.push("distributed".to_string());
            }
            match e.routing {
                Routing::Unicast => {}
                Routing::Isolated => attrs.push("isolated".to_string()),
                Routing::Partitioned => attrs.push("partitioned".to_string()),
            }
            if e.priority != 0 {
                attrs.push(format!("priority={}", e.priority));
            }
            if attrs.is_empty() {
                let _ = writeln!(out, "\t{:?} -> {:?};", e.source, e.dest);
            } else {
                let _ = writeln!(
                    out,
                    "\t{:?} -> {:?} [label=\"{}\"];",
                    e.source,
                    e.dest,
                    attrs.join("-")
                );
            }
        }
        out.push_str("}\n");
        out
    }
}

#[cfg(test)]
#[path = "dag_tests.rs"]
mod tests;
