//! Error taxonomy for the generation pipeline.
//!
//! Per-item and per-batch failures are recoverable and end up in
//! [`Diagnostics`]; only [`PipelineError`] aborts a run.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Why a single file was left out of a stage. Never aborts a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Skipped {
    #[error("unsupported extension '{extension}'")]
    UnsupportedExtension { extension: String },

    #[error("non-code file")]
    NonCode,

    #[error("test or spec source")]
    TestSource,

    #[error("inside build output directory")]
    BuildOutput,

    #[error("{chars} chars exceeds the {limit} char ceiling")]
    Oversized { chars: usize, limit: usize },

    #[error("syntax could not be parsed")]
    ParseFailed,

    #[error("no summary available for context retrieval")]
    ContextUnavailable,

    #[error("no summary for generated file")]
    UnknownFile,

    #[error("does not reference any exported function")]
    NoExportReference,
}

/// Failures of the LLM backend collaborator.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("missing API key: environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("LLM request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("LLM API error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("unexpected LLM response: {0}")]
    Malformed(String),

    #[error("LLM response was empty")]
    Empty,
}

/// Failures scoped to one batch or one structured request.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("response could not be decoded as {expected} after one corrective retry")]
    Undecodable { expected: &'static str },

    #[error("illegal batch transition from {from:?} on {event:?}")]
    InvalidTransition { from: crate::generate::BatchState, event: crate::generate::BatchEvent },

    #[error("generation cancelled")]
    Cancelled,
}

/// Coarse classification a caller can map onto its own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorStatus {
    /// Nothing usable in the input (no eligible files, no controllers)
    BadInput,
    /// The run completed but produced nothing that passed validation
    GenerationFailed,
    /// The LLM backend failed in a way the pipeline could not recover from
    Upstream,
}

impl ErrorStatus {
    /// Process exit code. 1 stays reserved for unclassified failures and 2 for
    /// usage errors.
    pub fn exit_code(self) -> u8 {
        match self {
            Self::BadInput => 3,
            Self::GenerationFailed => 4,
            Self::Upstream => 5,
        }
    }
}

/// Fatal-to-run failures. No partial output accompanies these.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No valid source files found.")]
    NoEligibleFiles,

    #[error("AI failed to generate test files.")]
    NoValidatedArtifacts,

    #[error("No controllers found to document.")]
    NoControllers,

    #[error("{context}: {source}")]
    Generation {
        context: &'static str,
        #[source]
        source: GenerationError,
    },

    #[error("generation cancelled before any artifact was produced")]
    Cancelled,
}

impl PipelineError {
    pub fn status(&self) -> ErrorStatus {
        match self {
            Self::NoEligibleFiles | Self::NoControllers => ErrorStatus::BadInput,
            Self::NoValidatedArtifacts | Self::Cancelled => ErrorStatus::GenerationFailed,
            Self::Generation { .. } => ErrorStatus::Upstream,
        }
    }
}

/// Pipeline stage that recorded a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Summary,
    Batching,
    Context,
    Generation,
    Validation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Summary => "summary",
            Self::Batching => "batching",
            Self::Context => "context",
            Self::Generation => "generation",
            Self::Validation => "validation",
        };
        f.write_str(name)
    }
}

/// A recovered failure, kept for the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<usize>,
    pub message: String,
}

/// Run-level list of recovered failures.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a skipped file and log it.
    pub fn skip(&mut self, stage: Stage, path: &str, reason: &Skipped) {
        tracing::debug!("{stage}: skipping {path}: {reason}");
        self.0.push(Diagnostic {
            stage,
            path: Some(path.to_string()),
            batch: None,
            message: reason.to_string(),
        });
    }

    /// Record a batch-level failure and log it.
    pub fn batch(&mut self, stage: Stage, batch: usize, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{stage}: batch {}: {message}", batch + 1);
        self.0.push(Diagnostic { stage, path: None, batch: Some(batch), message });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of diagnostics recorded by `stage`.
    pub fn count(&self, stage: Stage) -> usize {
        self.0.iter().filter(|d| d.stage == stage).count()
    }
}
