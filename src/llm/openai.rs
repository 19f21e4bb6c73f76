//! HTTP adapter for OpenAI-compatible `/chat/completions` endpoints.
//!
//! Defaults target Groq (`https://api.groq.com/openai/v1`), but any compatible
//! server works by changing `llm.base_url` and `llm.model`.

use crate::domain::LlmConfig;
use crate::error::LlmError;
use crate::llm::{DeltaStream, LlmBackend};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

/// LLM client for OpenAI-compatible chat completion APIs.
pub struct OpenAiCompatibleClient {
    client: reqwest::Client,
    config: LlmConfig,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl OpenAiCompatibleClient {
    /// Build a client reading the API key from the env var named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::MissingApiKey`] when the variable is unset or empty.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey(config.api_key_env.clone()))?;
        Self::with_api_key(config, Some(key))
    }

    /// Build a client with an explicit key (`None` for servers without auth).
    pub fn with_api_key(config: &LlmConfig, api_key: Option<String>) -> Result<Self, LlmError> {
        let client =
            reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self { client, config: config.clone(), api_key })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    async fn send(&self, prompt: &str, stream: bool) -> Result<reqwest::Response, LlmError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            max_tokens: if stream { self.config.stream_max_tokens } else { self.config.max_tokens },
            stream,
        };

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiError>(&text).map(|e| e.error.message).unwrap_or(text);
        Err(LlmError::Status { status: status.as_u16(), message })
    }
}

#[async_trait]
impl LlmBackend for OpenAiCompatibleClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self.send(prompt, false).await?;
        let text = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| LlmError::Malformed(format!("chat completion body: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::Empty)?;
        if content.trim().is_empty() {
            return Err(LlmError::Empty);
        }
        Ok(content)
    }

    async fn stream(&self, prompt: &str) -> Result<DeltaStream, LlmError> {
        let response = self.send(prompt, true).await?;
        Ok(parse_sse(response.bytes_stream()))
    }
}

struct SseState<S> {
    inner: Pin<Box<S>>,
    buffer: Vec<u8>,
    pending: VecDeque<Result<String, LlmError>>,
    finished: bool,
}

impl<S> SseState<S> {
    /// Decode every complete line in the buffer.
    fn drain_lines(&mut self) {
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let Some(payload) = line.trim().strip_prefix("data:") else {
                continue;
            };
            let payload = payload.trim();
            if payload == "[DONE]" {
                self.finished = true;
                self.buffer.clear();
                return;
            }
            match serde_json::from_str::<ChatChunk>(payload) {
                Ok(chunk) => {
                    let delta = chunk.choices.into_iter().next().and_then(|c| c.delta.content);
                    if let Some(delta) = delta.filter(|d| !d.is_empty()) {
                        self.pending.push_back(Ok(delta));
                    }
                }
                Err(e) => {
                    self.pending.push_back(Err(LlmError::Malformed(format!("stream chunk: {e}"))));
                    self.finished = true;
                    self.buffer.clear();
                    return;
                }
            }
        }
    }
}

/// Turn a server-sent-events byte stream into text deltas.
///
/// Lines are split on raw bytes so multi-byte characters spanning network
/// chunks decode intact. `data: [DONE]` ends the stream.
pub fn parse_sse<S, B, E>(bytes: S) -> DeltaStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<LlmError> + Send + 'static,
{
    let state =
        SseState { inner: Box::pin(bytes), buffer: Vec::new(), pending: VecDeque::new(), finished: false };

    futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.finished {
                return None;
            }
            match st.inner.next().await {
                Some(Ok(chunk)) => {
                    st.buffer.extend_from_slice(chunk.as_ref());
                    st.drain_lines();
                }
                Some(Err(e)) => {
                    st.finished = true;
                    return Some((Err(e.into()), st));
                }
                None => {
                    st.buffer.push(b'\n');
                    st.drain_lines();
                    st.finished = true;
                }
            }
        }
    })
    .boxed()
}
