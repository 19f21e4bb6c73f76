//! Per-file structural summaries.

use crate::domain::{ExportEntry, SourceFile, Summary};
use crate::error::{Diagnostics, Skipped, Stage};
use crate::graph::DependencyGraph;
use crate::parser::ParserRegistry;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Summaries keyed by file path.
pub type Summaries = BTreeMap<String, Summary>;

pub struct SummaryExtractor<'a> {
    parsers: &'a ParserRegistry,
}

impl<'a> SummaryExtractor<'a> {
    pub fn new(parsers: &'a ParserRegistry) -> Self {
        Self { parsers }
    }

    /// Summarize one file, failing when its syntax cannot be parsed.
    pub fn try_extract(&self, file: &SourceFile, graph: &DependencyGraph) -> Result<Summary, Skipped> {
        let parser = self.parsers.for_path(&file.path).ok_or(Skipped::ParseFailed)?;
        let exports = parser.extract_exports(&file.content)?;
        Ok(Summary {
            file: file.path.clone(),
            exports,
            dependencies: graph.imports(&file.path).to_vec(),
            size: file.size,
            parse_failed: false,
        })
    }

    /// Summarize one file, degrading to a placeholder on parse failure.
    pub fn extract(&self, file: &SourceFile, graph: &DependencyGraph) -> Summary {
        self.try_extract(file, graph).unwrap_or_else(|_| degraded(file, graph))
    }

    /// Summarize every file. Parsing runs in parallel; failures are recorded in
    /// `diagnostics` and never abort the run.
    pub fn extract_all(
        &self,
        files: &[SourceFile],
        graph: &DependencyGraph,
        diagnostics: &mut Diagnostics,
    ) -> Summaries {
        let results: Vec<Result<Summary, Skipped>> =
            files.par_iter().map(|file| self.try_extract(file, graph)).collect();

        let mut summaries = Summaries::new();
        for (file, result) in files.iter().zip(results) {
            let summary = match result {
                Ok(summary) => summary,
                Err(reason) => {
                    tracing::warn!("Summary parse error ({}): {}", file.path, reason);
                    diagnostics.skip(Stage::Summary, &file.path, &reason);
                    degraded(file, graph)
                }
            };
            summaries.entry(file.path.clone()).or_insert(summary);
        }
        summaries
    }
}

fn degraded(file: &SourceFile, graph: &DependencyGraph) -> Summary {
    Summary {
        file: file.path.clone(),
        exports: vec![ExportEntry::Unknown],
        dependencies: graph.imports(&file.path).to_vec(),
        size: file.size,
        parse_failed: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_dependency_graph;

    fn setup(files: &[SourceFile]) -> (ParserRegistry, DependencyGraph) {
        let parsers = ParserRegistry::default();
        let graph = build_dependency_graph(files, &parsers);
        (parsers, graph)
    }

    #[test]
    fn test_summary_combines_exports_graph_and_size() {
        let files = vec![
            SourceFile::new("src/a.js", "import { b } from './b';\nexport function run() { return b; }\n"),
            SourceFile::new("src/b.js", "export const b = 1;\n"),
        ];
        let (parsers, graph) = setup(&files);
        let summary = SummaryExtractor::new(&parsers).extract(&files[0], &graph);

        assert_eq!(summary.exports, vec![ExportEntry::Function("run".into())]);
        assert_eq!(summary.dependencies, vec!["src/b.js".to_string()]);
        assert_eq!(summary.size, files[0].content.chars().count());
        assert!(!summary.parse_failed);
    }

    #[test]
    fn test_parse_failure_degrades_but_keeps_dependencies() {
        let files = vec![
            SourceFile::new("a.js", "import b from './b';\nexport function (((\n"),
            SourceFile::new("b.js", "export default 1;\n"),
        ];
        let (parsers, graph) = setup(&files);
        let mut diags = Diagnostics::new();
        let summaries = SummaryExtractor::new(&parsers).extract_all(&files, &graph, &mut diags);

        let a = &summaries["a.js"];
        assert!(a.parse_failed);
        assert_eq!(a.exports, vec![ExportEntry::Unknown]);
        assert_eq!(a.dependencies, vec!["b.js".to_string()]);
        assert_eq!(summaries["b.js"].exports, vec![ExportEntry::DefaultExport]);
        assert_eq!(diags.count(Stage::Summary), 1);
    }

    #[test]
    fn test_unsupported_dialect_degrades() {
        let files = vec![SourceFile::new("tool.py", "def main():\n    pass\n")];
        let (parsers, graph) = setup(&files);
        let mut diags = Diagnostics::new();
        let summaries = SummaryExtractor::new(&parsers).extract_all(&files, &graph, &mut diags);
        assert!(summaries["tool.py"].parse_failed);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let files = vec![
            SourceFile::new("x.ts", "export class X {}\nexport const y = 2;\n"),
            SourceFile::new("y.ts", "import { X } from './x';\nexport function f() {}\n"),
        ];
        let (parsers, graph) = setup(&files);
        let extractor = SummaryExtractor::new(&parsers);
        let first = extractor.extract_all(&files, &graph, &mut Diagnostics::new());
        let second = extractor.extract_all(&files, &graph, &mut Diagnostics::new());
        assert_eq!(first, second);
    }
}
