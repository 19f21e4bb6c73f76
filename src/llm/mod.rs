//! LLM backend port and adapters.
//!
//! The pipeline only sees [`LlmBackend`]. A client handle is built once per run
//! and passed to the orchestrator; there is no process-wide client.

use crate::error::LlmError;
use async_trait::async_trait;
use futures::stream::BoxStream;

pub mod openai;
pub mod scripted;
pub mod sink;

pub use openai::OpenAiCompatibleClient;
pub use scripted::ScriptedBackend;
pub use sink::{forward_stream, stream_to_sink, ForwardOutcome, StreamFrame, DONE_SENTINEL};

/// Ordered text deltas of one streamed completion. The stream ends after the
/// final delta; an `Err` item is terminal.
pub type DeltaStream = BoxStream<'static, Result<String, LlmError>>;

/// Sends a single text prompt to a language model.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Backend identifier for logs and reports.
    fn name(&self) -> &str;

    /// Complete `prompt` and return the full response text.
    ///
    /// # Errors
    ///
    /// Returns an error on transport, auth, or API failures. Timeout policy
    /// belongs to the implementation.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Complete `prompt` as an incremental stream of text deltas.
    ///
    /// # Errors
    ///
    /// Returns an error when the stream cannot be opened. Mid-stream failures
    /// arrive as an `Err` item.
    async fn stream(&self, prompt: &str) -> Result<DeltaStream, LlmError>;
}
