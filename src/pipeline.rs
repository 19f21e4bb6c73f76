//! End-to-end test generation run.
//!
//! `files -> graph -> summaries -> index -> batches -> generation -> validation`.
//! Every stage before generation is synchronous and deterministic; only the
//! backend calls suspend.

use crate::batch::Batcher;
use crate::domain::{Config, SourceFile, ValidatedArtifact};
use crate::error::{Diagnostics, PipelineError};
use crate::generate::{BatchOutcome, GenerationOrchestrator};
use crate::graph::{build_dependency_graph, DependencyGraph};
use crate::index::ContextIndex;
use crate::llm::LlmBackend;
use crate::parser::ParserRegistry;
use crate::rank::RelevanceRanker;
use crate::summary::{Summaries, SummaryExtractor};
use crate::validate::ValidationFilter;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Immutable analysis of a file set, shared by reference with later stages.
#[derive(Debug)]
pub struct Analysis {
    pub files: Vec<SourceFile>,
    pub graph: DependencyGraph,
    pub summaries: Summaries,
    pub index: ContextIndex,
}

impl Analysis {
    /// Build graph, summaries and index. Unparseable files degrade and are
    /// recorded in `diagnostics`.
    pub fn build(files: Vec<SourceFile>, parsers: &ParserRegistry, diagnostics: &mut Diagnostics) -> Self {
        let graph = build_dependency_graph(&files, parsers);
        let summaries = SummaryExtractor::new(parsers).extract_all(&files, &graph, diagnostics);
        let index = ContextIndex::from_summaries(files.iter().map(|f| f.path.as_str()), &summaries);
        tracing::debug!(
            "analysis: {} files, {} edges, {} index entries",
            files.len(),
            graph.edge_count(),
            index.len()
        );
        Self { files, graph, summaries, index }
    }
}

/// Successful run result.
#[derive(Debug)]
pub struct PipelineOutput {
    pub artifacts: Vec<ValidatedArtifact>,
    pub outcomes: Vec<BatchOutcome>,
    pub diagnostics: Diagnostics,
    pub files_total: usize,
    pub batches_total: usize,
    /// The run stopped early; `artifacts` holds what finished before that
    pub cancelled: bool,
}

pub struct TestPipeline {
    config: Config,
    parsers: ParserRegistry,
    backend: Arc<dyn LlmBackend>,
    cancel: CancellationToken,
}

impl TestPipeline {
    pub fn new(config: Config, backend: Arc<dyn LlmBackend>) -> Self {
        Self { config, parsers: ParserRegistry::default(), backend, cancel: CancellationToken::new() }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every stage over `files`. `on_batch` observes each batch outcome.
    ///
    /// # Errors
    ///
    /// [`PipelineError::NoEligibleFiles`] when batching leaves nothing to send,
    /// [`PipelineError::NoValidatedArtifacts`] when nothing passes validation,
    /// and [`PipelineError::Cancelled`] when a cancelled run produced nothing.
    pub async fn run<F>(&self, files: Vec<SourceFile>, on_batch: F) -> Result<PipelineOutput, PipelineError>
    where
        F: FnMut(&BatchOutcome),
    {
        let mut diagnostics = Diagnostics::new();
        let files_total = files.len();
        let analysis = Analysis::build(files, &self.parsers, &mut diagnostics);

        let ranker =
            RelevanceRanker::with_weights(&analysis.index, &analysis.graph, self.config.ranking);
        let batches = Batcher::new(&analysis.files, &analysis.summaries, &ranker, self.config.batching)
            .create_batches(&mut diagnostics)?;

        let orchestrator = GenerationOrchestrator::new(Arc::clone(&self.backend), &self.config.batching)
            .with_cancellation(self.cancel.clone());
        let run = orchestrator.run(&batches, &mut diagnostics, on_batch).await;

        let generated = run.artifacts().cloned().collect();
        let artifacts = ValidationFilter::new(&analysis.summaries).validate(generated, &mut diagnostics);

        if artifacts.is_empty() {
            return Err(if run.cancelled {
                PipelineError::Cancelled
            } else {
                PipelineError::NoValidatedArtifacts
            });
        }

        tracing::info!(
            "{} of {} generated tests passed validation",
            artifacts.len(),
            run.artifacts().count()
        );
        Ok(PipelineOutput {
            artifacts,
            outcomes: run.outcomes,
            diagnostics,
            files_total,
            batches_total: batches.len(),
            cancelled: run.cancelled,
        })
    }
}
