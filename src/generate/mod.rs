//! LLM-driven test generation.
//!
//! Batches are sent one at a time. Each batch walks the [`BatchState`]
//! lifecycle and gets exactly one corrective retry when its response cannot be
//! decoded. A failing batch never affects the others.

pub mod parse;
pub mod prompt;
pub mod state;

pub use parse::{decode_batch, decode_structured, parse_ndjson, strip_fences, Shape};
pub use state::{BatchEvent, BatchState};

use crate::domain::{Batch, BatchLimits, GeneratedArtifact};
use crate::error::{Diagnostics, GenerationError, Stage};
use crate::llm::LlmBackend;
use crate::utils::estimate_tokens;
use prompt::{batch_prompt, corrective_prompt, NDJSON_EXPECTATION};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Final record of one batch.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub index: usize,
    pub state: BatchState,
    pub artifacts: Vec<GeneratedArtifact>,
    /// Backend calls made (1 or 2)
    pub attempts: usize,
    pub error: Option<String>,
}

/// Every outcome of a run, in batch order.
#[derive(Debug, Clone, Default)]
pub struct GenerationRun {
    pub outcomes: Vec<BatchOutcome>,
    /// Set when the run stopped early on cancellation
    pub cancelled: bool,
}

impl GenerationRun {
    /// Decoded records of every accepted batch, in batch order.
    pub fn artifacts(&self) -> impl Iterator<Item = &GeneratedArtifact> {
        self.outcomes
            .iter()
            .filter(|o| o.state == BatchState::Accepted)
            .flat_map(|o| o.artifacts.iter())
    }

    pub fn count(&self, state: BatchState) -> usize {
        self.outcomes.iter().filter(|o| o.state == state).count()
    }
}

pub struct GenerationOrchestrator {
    backend: Arc<dyn LlmBackend>,
    code_chars: usize,
    cancel: CancellationToken,
}

impl GenerationOrchestrator {
    pub fn new(backend: Arc<dyn LlmBackend>, limits: &BatchLimits) -> Self {
        Self { backend, code_chars: limits.prompt_code_chars, cancel: CancellationToken::new() }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run every batch in order. `on_batch` sees each outcome as it lands.
    ///
    /// Cancellation is checked before each batch; batches already finished are
    /// kept.
    pub async fn run<F>(&self, batches: &[Batch], diagnostics: &mut Diagnostics, mut on_batch: F) -> GenerationRun
    where
        F: FnMut(&BatchOutcome),
    {
        let mut run = GenerationRun::default();
        for batch in batches {
            if self.cancel.is_cancelled() {
                tracing::info!("cancelled before batch {}/{}", batch.index + 1, batches.len());
                break;
            }

            tracing::info!("Processing batch {}/{}...", batch.index + 1, batches.len());
            let outcome = self.run_batch(batch).await;
            match (&outcome.state, &outcome.error) {
                (BatchState::Failed, Some(error)) => diagnostics.batch(Stage::Generation, batch.index, error),
                (BatchState::Accepted, _) if outcome.artifacts.is_empty() => {
                    diagnostics.batch(Stage::Generation, batch.index, "response carried no usable records")
                }
                _ => {}
            }
            on_batch(&outcome);

            run.outcomes.push(outcome);
        }
        if self.cancel.is_cancelled() {
            run.cancelled = true;
        }
        run
    }

    /// Drive one batch to a terminal state.
    pub async fn run_batch(&self, batch: &Batch) -> BatchOutcome {
        let mut outcome = BatchOutcome {
            index: batch.index,
            state: BatchState::Pending,
            artifacts: Vec::new(),
            attempts: 0,
            error: None,
        };
        if let Err(e) = self.drive(batch, &mut outcome).await {
            // Only reachable on an illegal transition.
            tracing::error!("batch {}: {e}", batch.index + 1);
            outcome.state = BatchState::Failed;
            outcome.error = Some(e.to_string());
        }
        outcome
    }

    async fn drive(&self, batch: &Batch, outcome: &mut BatchOutcome) -> Result<(), GenerationError> {
        let prompt = batch_prompt(batch, self.code_chars);
        tracing::debug!("batch {}: ~{} prompt tokens", batch.index + 1, estimate_tokens(&prompt));

        outcome.state = outcome.state.advance(BatchEvent::Send)?;
        outcome.attempts = 1;
        let first = match call(self.backend.as_ref(), &prompt, &self.cancel).await {
            Ok(text) => text,
            Err(e) => return abort(outcome, e),
        };

        if let Some(records) = decode_batch(&first) {
            outcome.state = outcome.state.advance(BatchEvent::Decoded)?;
            outcome.state = outcome.state.advance(BatchEvent::Complete)?;
            outcome.artifacts = records;
            return Ok(());
        }

        tracing::warn!("batch {}: undecodable response, retrying once", batch.index + 1);
        outcome.state = outcome.state.advance(BatchEvent::Undecodable)?;
        outcome.attempts = 2;
        let retry = corrective_prompt(&prompt, NDJSON_EXPECTATION);
        let second = match call(self.backend.as_ref(), &retry, &self.cancel).await {
            Ok(text) => text,
            Err(e) => return abort(outcome, e),
        };

        match decode_batch(&second) {
            Some(records) => {
                outcome.state = outcome.state.advance(BatchEvent::Decoded)?;
                outcome.artifacts = records;
            }
            None => {
                outcome.state = outcome.state.advance(BatchEvent::Undecodable)?;
                outcome.error = Some(GenerationError::Undecodable { expected: "NDJSON records" }.to_string());
            }
        }
        Ok(())
    }
}

fn abort(outcome: &mut BatchOutcome, error: GenerationError) -> Result<(), GenerationError> {
    outcome.state = outcome.state.advance(BatchEvent::Abort)?;
    outcome.error = Some(error.to_string());
    Ok(())
}

/// One backend call, raced against cancellation.
async fn call(backend: &dyn LlmBackend, prompt: &str, cancel: &CancellationToken) -> Result<String, GenerationError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(GenerationError::Cancelled),
        response = backend.complete(prompt) => Ok(response?),
    }
}

/// Request a single JSON document of `shape`, with one corrective retry.
///
/// # Errors
///
/// Backend failures are returned as-is without retry. Two undecodable
/// responses yield [`GenerationError::Undecodable`].
pub async fn request_structured<T: DeserializeOwned>(
    backend: &dyn LlmBackend,
    prompt: &str,
    shape: Shape,
    cancel: &CancellationToken,
) -> Result<T, GenerationError> {
    let first = call(backend, prompt, cancel).await?;
    if let Some(value) = decode_structured(&first, shape) {
        return Ok(value);
    }

    tracing::warn!("structured response was not {}, retrying once", shape.describe());
    let retry = corrective_prompt(prompt, shape.describe());
    let second = call(backend, &retry, cancel).await?;
    decode_structured(&second, shape).ok_or(GenerationError::Undecodable { expected: shape.describe() })
}
