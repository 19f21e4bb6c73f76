//! The four independent relevance signals fused by the ranker.

use crate::graph::DependencyGraph;
use crate::utils::dirname;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

static EXPORT_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:function|class|variable)\s+([A-Za-z0-9_$]+)").expect("valid export name regex")
});

/// Lower-cased token frequencies, split on non-word characters.
fn token_counts(text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for token in text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_')) {
        if token.is_empty() {
            continue;
        }
        *counts.entry(token.to_ascii_lowercase()).or_insert(0) += 1;
    }
    counts
}

/// Token-frequency intersection: `Σ min(countA[w], countB[w])` over shared tokens.
pub fn lexical_overlap(a: &str, b: &str) -> f64 {
    let counts_a = token_counts(a);
    let counts_b = token_counts(b);
    counts_a
        .iter()
        .filter_map(|(token, &ca)| counts_b.get(token).map(|&cb| ca.min(cb)))
        .sum::<usize>() as f64
}

/// Additive linkage bonus between two files. Unknown paths score zero.
pub fn dependency_linkage(graph: &DependencyGraph, target: &str, candidate: &str) -> f64 {
    let has = |list: &[String], path: &str| list.iter().any(|p| p == path);
    let mut score = 0.0;
    if has(graph.imports(target), candidate) {
        score += 2.0;
    }
    if has(graph.imports(candidate), target) {
        score += 2.0;
    }
    if has(graph.imported_by(target), candidate) {
        score += 1.5;
    }
    if has(graph.imported_by(candidate), target) {
        score += 1.5;
    }
    score
}

/// 1.0 for the same directory, 0.6 for sibling directories, else 0.
pub fn folder_proximity(a: &str, b: &str) -> f64 {
    let dir_a = dirname(a);
    let dir_b = dirname(b);
    if dir_a == dir_b {
        1.0
    } else if dirname(dir_a) == dirname(dir_b) {
        0.6
    } else {
        0.0
    }
}

/// Exported declaration names listed in a summary digest, lower-cased.
pub fn export_names(summary: &str) -> HashSet<String> {
    EXPORT_NAME_RE
        .captures_iter(summary)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
        .collect()
}

/// 1.0 when the two digests export at least one common name.
pub fn export_name_match(a: &str, b: &str) -> f64 {
    let names_b = export_names(b);
    if export_names(a).iter().any(|name| names_b.contains(name)) {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SourceFile;
    use crate::graph::build_dependency_graph;
    use crate::parser::ParserRegistry;

    #[test]
    fn test_lexical_overlap_sums_min_counts() {
        assert_eq!(lexical_overlap("a a b c", "a b b d"), 2.0);
        assert_eq!(lexical_overlap("Fetch-User", "fetch user USER"), 2.0);
        assert_eq!(lexical_overlap("", "anything"), 0.0);
    }

    #[test]
    fn test_dependency_linkage_is_additive() {
        let files = vec![
            SourceFile::new("a.js", "import './b';\n"),
            SourceFile::new("b.js", ""),
            SourceFile::new("c.js", ""),
        ];
        let graph = build_dependency_graph(&files, &ParserRegistry::default());
        assert_eq!(dependency_linkage(&graph, "a.js", "b.js"), 3.5);
        assert_eq!(dependency_linkage(&graph, "b.js", "a.js"), 3.5);
        assert_eq!(dependency_linkage(&graph, "a.js", "c.js"), 0.0);
        assert_eq!(dependency_linkage(&graph, "ghost.js", "a.js"), 0.0);
    }

    #[test]
    fn test_folder_proximity_levels() {
        assert_eq!(folder_proximity("src/a.js", "src/b.js"), 1.0);
        assert_eq!(folder_proximity("a.js", "b.js"), 1.0);
        assert_eq!(folder_proximity("src/api/a.js", "src/ui/b.js"), 0.6);
        assert_eq!(folder_proximity("src/a.js", "lib/b.js"), 0.6);
        assert_eq!(folder_proximity("src/api/a.js", "lib/ui/b.js"), 0.0);
    }

    #[test]
    fn test_export_name_match_is_case_insensitive() {
        let a = "Exports: function loadUser, class Repo";
        let b = "Exports: variable LOADUSER";
        assert_eq!(export_name_match(a, b), 1.0);
        assert_eq!(export_name_match(a, "Exports: export loadUser"), 0.0);
        assert_eq!(export_name_match(a, "Exports: none"), 0.0);
    }
}
