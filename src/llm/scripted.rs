//! Offline backend that replays canned responses in order.
//!
//! Used by the pipeline tests and by `--replay` runs that must not touch the
//! network.

use crate::error::LlmError;
use crate::llm::{DeltaStream, LlmBackend};
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Characters per streamed delta.
const DELTA_CHARS: usize = 16;

#[derive(Default)]
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(|r| Ok(r.into())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response.
    pub fn push_response(&self, response: impl Into<String>) {
        self.lock_responses().push_back(Ok(response.into()));
    }

    /// Queue a transport-style failure.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.lock_responses().push_back(Err(message.into()));
    }

    /// Number of prompts received so far.
    pub fn calls(&self) -> usize {
        self.lock_prompts().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.lock_prompts().clone()
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, String>>> {
        self.responses.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_prompts(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.prompts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_response(&self, prompt: &str) -> Result<String, LlmError> {
        self.lock_prompts().push(prompt.to_string());
        match self.lock_responses().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(LlmError::Status { status: 503, message }),
            None => Err(LlmError::Empty),
        }
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.next_response(prompt)
    }

    async fn stream(&self, prompt: &str) -> Result<DeltaStream, LlmError> {
        let text = self.next_response(prompt)?;
        let chars: Vec<char> = text.chars().collect();
        let deltas: Vec<Result<String, LlmError>> =
            chars.chunks(DELTA_CHARS).map(|chunk| Ok(chunk.iter().collect())).collect();
        Ok(futures::stream::iter(deltas).boxed())
    }
}
