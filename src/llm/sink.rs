//! Forwarding of streamed completions to a client-facing frame sink.
//!
//! Frames map one-to-one onto the wire payloads a server would emit:
//! `{"content": ".."}` per delta, `{"error": ".."}` on failure, and the bare
//! `[DONE]` sentinel after a clean finish. Nothing follows an error frame.

use crate::llm::{DeltaStream, LlmBackend};
use futures::StreamExt;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    Content(String),
    Error(String),
    Done,
}

impl StreamFrame {
    /// Wire payload for this frame.
    pub fn payload(&self) -> String {
        match self {
            Self::Content(text) => json!({ "content": text }).to_string(),
            Self::Error(message) => json!({ "error": message }).to_string(),
            Self::Done => DONE_SENTINEL.to_string(),
        }
    }
}

/// How a forwarded stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardOutcome {
    /// All deltas forwarded and `Done` sent
    Completed { deltas: usize },
    /// An error frame was sent; the stream was abandoned
    Failed,
    /// The cancellation token fired; no further frames were sent
    Cancelled,
    /// The receiving side went away
    Closed,
}

/// Forward every delta as a `Content` frame, then `Done`.
///
/// Cancellation stops consumption of the upstream immediately; the sink
/// receives no terminal frame in that case.
pub async fn forward_stream(
    mut deltas: DeltaStream,
    sink: &mpsc::Sender<StreamFrame>,
    cancel: &CancellationToken,
) -> ForwardOutcome {
    let mut forwarded = 0usize;
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return ForwardOutcome::Cancelled,
            next = deltas.next() => next,
        };

        let (frame, terminal) = match next {
            Some(Ok(delta)) => {
                forwarded += 1;
                (StreamFrame::Content(delta), None)
            }
            Some(Err(e)) => {
                tracing::warn!("stream failed after {forwarded} deltas: {e}");
                (StreamFrame::Error(e.to_string()), Some(ForwardOutcome::Failed))
            }
            None => (StreamFrame::Done, Some(ForwardOutcome::Completed { deltas: forwarded })),
        };

        if sink.send(frame).await.is_err() {
            return ForwardOutcome::Closed;
        }
        if let Some(outcome) = terminal {
            return outcome;
        }
    }
}

/// Open a stream on `backend` and forward it. A failure to open the stream
/// becomes a single error frame.
pub async fn stream_to_sink(
    backend: &dyn LlmBackend,
    prompt: &str,
    sink: &mpsc::Sender<StreamFrame>,
    cancel: &CancellationToken,
) -> ForwardOutcome {
    let deltas = tokio::select! {
        biased;
        _ = cancel.cancelled() => return ForwardOutcome::Cancelled,
        opened = backend.stream(prompt) => opened,
    };

    match deltas {
        Ok(deltas) => forward_stream(deltas, sink, cancel).await,
        Err(e) => {
            tracing::warn!("could not open stream on {}: {e}", backend.name());
            if sink.send(StreamFrame::Error(e.to_string())).await.is_err() {
                return ForwardOutcome::Closed;
            }
            ForwardOutcome::Failed
        }
    }
}
