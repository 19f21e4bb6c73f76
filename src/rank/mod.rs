//! Multi-signal relevance ranking over the context index.
//!
//! Every indexed file is scored against a target by a fixed linear fusion of
//! four signals (see [`signals`]). The ordering is stable: equal scores keep
//! index order, so identical inputs always produce identical rankings.

use crate::domain::{RankedContext, RankingWeights, ScoredFile};
use crate::graph::DependencyGraph;
use crate::index::{ContextIndex, IndexEntry};
use serde::Serialize;
use std::cmp::Ordering;

pub mod signals;

use signals::{dependency_linkage, export_name_match, folder_proximity, lexical_overlap};

/// Raw signal values and the fused score for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalBreakdown {
    pub lexical: f64,
    pub dependency: f64,
    pub folder: f64,
    pub export_name: f64,
    pub fused: f64,
}

pub struct RelevanceRanker<'a> {
    index: &'a ContextIndex,
    graph: &'a DependencyGraph,
    weights: RankingWeights,
}

impl<'a> RelevanceRanker<'a> {
    pub fn new(index: &'a ContextIndex, graph: &'a DependencyGraph) -> Self {
        Self::with_weights(index, graph, RankingWeights::default())
    }

    pub fn with_weights(
        index: &'a ContextIndex,
        graph: &'a DependencyGraph,
        weights: RankingWeights,
    ) -> Self {
        Self { index, graph, weights }
    }

    pub fn weights(&self) -> &RankingWeights {
        &self.weights
    }

    /// Score one candidate entry against the target.
    pub fn score(&self, target: &str, target_summary: &str, candidate: &IndexEntry) -> SignalBreakdown {
        let lexical = lexical_overlap(target_summary, &candidate.summary);
        let dependency = dependency_linkage(self.graph, target, &candidate.file);
        let folder = folder_proximity(target, &candidate.file);
        let export_name = export_name_match(target_summary, &candidate.summary);

        let w = &self.weights;
        let fused = w.lexical * lexical
            + w.dependency * dependency
            + w.folder * folder
            + w.export_name * export_name;

        SignalBreakdown { lexical, dependency, folder, export_name, fused }
    }

    /// Every other indexed file with its signal breakdown, best first.
    pub fn explain(&self, target: &str, target_summary: &str) -> Vec<(String, SignalBreakdown)> {
        let mut scored: Vec<(String, SignalBreakdown)> = self
            .index
            .entries()
            .iter()
            .filter(|entry| entry.file != target)
            .map(|entry| (entry.file.clone(), self.score(target, target_summary, entry)))
            .collect();

        // sort_by is stable, so ties keep index order
        scored.sort_by(|a, b| b.1.fused.partial_cmp(&a.1.fused).unwrap_or(Ordering::Equal));
        scored
    }

    /// Every other indexed file with its fused score, best first.
    pub fn rank(&self, target: &str, target_summary: &str) -> Vec<ScoredFile> {
        self.explain(target, target_summary)
            .into_iter()
            .map(|(file, breakdown)| ScoredFile { file, score: breakdown.fused })
            .collect()
    }

    /// Top-K similar files plus the target's own graph edges.
    pub fn context_for(&self, target: &str, target_summary: &str) -> RankedContext {
        let mut similar_files = self.rank(target, target_summary);
        similar_files.truncate(self.weights.top_k);

        RankedContext {
            similar_files,
            imports: self.graph.imports(target).to_vec(),
            imported_by: self.graph.imported_by(target).to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SourceFile;
    use crate::graph::build_dependency_graph;
    use crate::parser::ParserRegistry;

    fn index_of(entries: &[(&str, &str)]) -> ContextIndex {
        let mut index = ContextIndex::new();
        for (file, summary) in entries {
            index.add(*file, *summary);
        }
        index
    }

    #[test]
    fn test_target_is_excluded_and_results_sorted() {
        let graph = DependencyGraph::default();
        let index = index_of(&[
            ("src/a.js", "alpha beta"),
            ("lib/far/b.js", "alpha"),
            ("src/c.js", "alpha beta gamma"),
        ]);
        let ranker = RelevanceRanker::new(&index, &graph);
        let ranked = ranker.rank("src/a.js", "alpha beta");

        let files: Vec<&str> = ranked.iter().map(|s| s.file.as_str()).collect();
        assert_eq!(files, vec!["src/c.js", "lib/far/b.js"]);
        assert!(ranked[0].score > ranked[1].score);
    }

    #[test]
    fn test_ties_keep_index_order() {
        let graph = DependencyGraph::default();
        let index = index_of(&[("x/1.js", "same"), ("y/2.js", "same"), ("z/3.js", "same")]);
        let ranker = RelevanceRanker::new(&index, &graph);
        let files: Vec<String> =
            ranker.rank("t/target.js", "same").into_iter().map(|s| s.file).collect();
        assert_eq!(files, vec!["x/1.js", "y/2.js", "z/3.js"]);
    }

    #[test]
    fn test_fused_score_uses_configured_weights() {
        let graph = DependencyGraph::default();
        let index = index_of(&[("b.js", "function shared")]);
        let weights = RankingWeights {
            lexical: 1.0,
            dependency: 0.0,
            folder: 10.0,
            export_name: 100.0,
            top_k: 5,
        };
        let ranker = RelevanceRanker::with_weights(&index, &graph, weights);
        let breakdown = ranker.score("a.js", "function shared", &index.entries()[0]);
        assert_eq!(breakdown.lexical, 2.0);
        assert_eq!(breakdown.folder, 1.0);
        assert_eq!(breakdown.export_name, 1.0);
        assert_eq!(breakdown.fused, 2.0 + 10.0 + 100.0);
    }

    #[test]
    fn test_more_lexical_overlap_never_lowers_score() {
        let graph = DependencyGraph::default();
        let index = index_of(&[("src/b.js", "File: src/b.js Exports: none")]);
        let ranker = RelevanceRanker::new(&index, &graph);
        let entry = &index.entries()[0];

        let mut target = String::from("File: src/a.js");
        let mut previous = ranker.score("src/a.js", &target, entry).fused;
        for extra in [" Exports", " none", " b", " js"] {
            target.push_str(extra);
            let next = ranker.score("src/a.js", &target, entry).fused;
            assert!(next >= previous, "{next} < {previous} after adding {extra}");
            previous = next;
        }
    }

    #[test]
    fn test_context_truncates_to_top_k_and_carries_edges() {
        let files = vec![
            SourceFile::new("a.js", "import './b';\n"),
            SourceFile::new("b.js", ""),
        ];
        let graph = build_dependency_graph(&files, &ParserRegistry::default());
        let entries: Vec<(String, String)> =
            (0..8).map(|i| (format!("f{i}.js"), "x".to_string())).collect();
        let mut index = ContextIndex::new();
        index.add("b.js", "x");
        for (file, summary) in &entries {
            index.add(file.as_str(), summary.as_str());
        }

        let ranker = RelevanceRanker::new(&index, &graph);
        let ctx = ranker.context_for("a.js", "x");
        assert_eq!(ctx.similar_files.len(), 5);
        assert_eq!(ctx.similar_files[0].file, "b.js");
        assert_eq!(ctx.imports, vec!["b.js".to_string()]);
        assert!(ctx.imported_by.is_empty());
    }

    #[test]
    fn test_missing_graph_entries_contribute_zero() {
        let graph = DependencyGraph::default();
        let index = index_of(&[("b.js", "")]);
        let ranker = RelevanceRanker::new(&index, &graph);
        let breakdown = ranker.score("a.js", "", &index.entries()[0]);
        assert_eq!(breakdown.dependency, 0.0);
        assert_eq!(breakdown.fused, 0.15);
    }
}
