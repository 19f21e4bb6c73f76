//! Builds the dependency graph by resolving relative module specifiers.

use crate::domain::{SourceFile, RESOLVE_EXTENSIONS};
use crate::graph::{DependencyGraph, GraphNode};
use crate::parser::ParserRegistry;
use crate::utils::{dirname, join_normalized};
use std::collections::{BTreeMap, HashSet};

/// Resolve `spec` imported from `from_path` against the known file set.
///
/// Tries the joined path as-is, then with each of [`RESOLVE_EXTENSIONS`]
/// appended. The first hit wins; `None` means the edge is dropped.
pub fn resolve_specifier(spec: &str, from_path: &str, known: &HashSet<&str>) -> Option<String> {
    let joined = join_normalized(dirname(from_path), spec)?;
    if known.contains(joined.as_str()) {
        return Some(joined);
    }
    RESOLVE_EXTENSIONS
        .iter()
        .map(|ext| format!("{joined}{ext}"))
        .find(|candidate| known.contains(candidate.as_str()))
}

/// Build the graph for a file set.
///
/// Unresolved specifiers (packages, missing files, paths escaping the root)
/// produce no edge. Self-imports and duplicate edges are dropped. `imports`
/// keep source order, `imported_by` is sorted, so the result does not depend
/// on the order of `files`.
pub fn build_dependency_graph(files: &[SourceFile], parsers: &ParserRegistry) -> DependencyGraph {
    tracing::debug!("Building dependency graph for {} files", files.len());

    let known: HashSet<&str> = files.iter().map(|f| f.path.as_str()).collect();
    let mut nodes: BTreeMap<String, GraphNode> =
        files.iter().map(|f| (f.path.clone(), GraphNode::default())).collect();
    let mut reverse: Vec<(String, String)> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for file in files {
        if !seen.insert(file.path.as_str()) {
            continue;
        }
        let Some(parser) = parsers.for_path(&file.path) else {
            continue;
        };

        let mut imports: Vec<String> = Vec::new();
        for spec in parser.extract_imports(&file.content) {
            let Some(target) = resolve_specifier(&spec, &file.path, &known) else {
                tracing::trace!("{}: unresolved import {}", file.path, spec);
                continue;
            };
            if target == file.path || imports.contains(&target) {
                continue;
            }
            reverse.push((target.clone(), file.path.clone()));
            imports.push(target);
        }

        if let Some(node) = nodes.get_mut(&file.path) {
            node.imports = imports;
        }
    }

    for (target, source) in reverse {
        if let Some(node) = nodes.get_mut(&target) {
            if !node.imported_by.contains(&source) {
                node.imported_by.push(source);
            }
        }
    }
    for node in nodes.values_mut() {
        node.imported_by.sort();
    }

    let graph = DependencyGraph::from_nodes(nodes);
    tracing::debug!("Dependency graph: {} nodes, {} edges", graph.len(), graph.edge_count());
    graph
}
