//! Intra-repository dependency graph.

use serde::Serialize;
use std::collections::BTreeMap;

pub mod builder;

pub use builder::{build_dependency_graph, resolve_specifier};

/// Edges of one file. Both lists only name files present in the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub imports: Vec<String>,
    #[serde(rename = "importedBy")]
    pub imported_by: Vec<String>,
}

/// File path to edges, keyed in sorted order. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DependencyGraph {
    nodes: BTreeMap<String, GraphNode>,
}

impl DependencyGraph {
    pub(crate) fn from_nodes(nodes: BTreeMap<String, GraphNode>) -> Self {
        Self { nodes }
    }

    pub fn node(&self, path: &str) -> Option<&GraphNode> {
        self.nodes.get(path)
    }

    /// Files `path` imports; empty when the path is unknown.
    pub fn imports(&self, path: &str) -> &[String] {
        self.nodes.get(path).map(|n| n.imports.as_slice()).unwrap_or(&[])
    }

    /// Files importing `path`; empty when the path is unknown.
    pub fn imported_by(&self, path: &str) -> &[String] {
        self.nodes.get(path).map(|n| n.imported_by.as_slice()).unwrap_or(&[])
    }

    pub fn contains(&self, path: &str) -> bool {
        self.nodes.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.imports.len()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &GraphNode)> {
        self.nodes.iter()
    }
}
