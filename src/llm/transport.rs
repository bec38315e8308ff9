//! Streaming transport adapter
//!
//! Wraps the provider's SSE endpoint behind the [`Transport`] trait. The
//! adapter owns the append-only conversation history, reconnects through
//! transient failures (yielding a [`RawChunk::Retry`] marker per attempt),
//! and raises a distinguished invalid-stream condition when the stream ends
//! before a finish reason arrives.

use std::pin::Pin;
use std::time::Duration;

use futures::{Stream, StreamExt};
use reqwest::Client;
use reqwest_eventsource::{Event, EventSource};
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::LlmConfig;

use super::error::TransportError;
use super::types::{FinishReason, Message, ModelChunk, Part, RawChunk, Role, TokenUsage};

/// Initial backoff delay for reconnect attempts
const INITIAL_BACKOFF_MS: u64 = 1000;

/// A lazy, single-pass sequence of raw chunks for one turn
///
/// No network traffic happens until the first chunk is polled.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<RawChunk, TransportError>> + Send>>;

/// One outbound message in, one inbound chunk sequence out
///
/// Implementations hold the ordered turn history; it is appended, never
/// mutated in place, and never survives the process.
pub trait Transport: Send {
    /// Open a streaming exchange for one turn
    ///
    /// Appends `prompt` to the held history before building the request.
    fn send(&mut self, model: &str, prompt: &str, cancel: &CancellationToken) -> ChunkStream;

    /// The conversation history accumulated so far
    fn history(&self) -> &[Message];

    /// Append the model's aggregated reply so the next turn carries it as context
    fn record_reply(&mut self, text: &str);

    /// Drop all held history
    fn clear_history(&mut self);
}

/// SSE transport against the Gemini streaming API
pub struct GeminiTransport {
    http: Client,
    api_key: String,
    base_url: String,
    max_retries: u32,
    max_output_tokens: u32,
    function_declarations: Option<Value>,
    history: Vec<Message>,
}

impl GeminiTransport {
    /// Create a transport from configuration
    ///
    /// Reads the API key from the environment variable named in config.
    pub fn from_config(config: &LlmConfig) -> Result<Self, TransportError> {
        let api_key = config.api_key()?;
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(TransportError::Network)?;

        Ok(Self {
            http,
            api_key,
            base_url: config.base_url.clone(),
            max_retries: config.max_retries,
            max_output_tokens: config.max_output_tokens,
            function_declarations: None,
            history: Vec::new(),
        })
    }

    /// Advertise a tool set to the model on every subsequent request
    pub fn set_function_declarations(&mut self, declarations: Value) {
        self.function_declarations = Some(declarations);
    }

    /// Build the request body from the full held history
    fn build_request_body(&self) -> Value {
        let contents: Vec<Value> = self
            .history
            .iter()
            .map(|msg| {
                let role = match msg.role {
                    Role::User => "user",
                    Role::Model => "model",
                };
                serde_json::json!({
                    "role": role,
                    "parts": [{ "text": msg.text }],
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": { "maxOutputTokens": self.max_output_tokens },
        });

        if let Some(decls) = &self.function_declarations {
            body["tools"] = decls.clone();
        }

        body
    }
}

impl Transport for GeminiTransport {
    fn send(&mut self, model: &str, prompt: &str, cancel: &CancellationToken) -> ChunkStream {
        debug!(%model, history_len = self.history.len(), "GeminiTransport::send");
        self.history.push(Message::user(prompt));

        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, model
        );

        open_stream(
            self.http.clone(),
            url,
            self.api_key.clone(),
            self.build_request_body(),
            self.max_retries,
            cancel.clone(),
        )
    }

    fn history(&self) -> &[Message] {
        &self.history
    }

    fn record_reply(&mut self, text: &str) {
        self.history.push(Message::model(text));
    }

    fn clear_history(&mut self) {
        self.history.clear();
    }
}

struct SseState {
    http: Client,
    url: String,
    api_key: String,
    body: Value,
    attempt: u32,
    max_retries: u32,
    es: Option<EventSource>,
    finished: bool,
    cancel: CancellationToken,
}

/// Open a lazy reconnecting SSE stream
///
/// The connection is established on first poll; each transparent reconnect
/// yields a `Retry` marker before the backoff sleep elapses.
fn open_stream(
    http: Client,
    url: String,
    api_key: String,
    body: Value,
    max_retries: u32,
    cancel: CancellationToken,
) -> ChunkStream {
    let state = SseState {
        http,
        url,
        api_key,
        body,
        attempt: 0,
        max_retries,
        es: None,
        finished: false,
        cancel,
    };

    Box::pin(futures::stream::unfold(state, |mut st| async move {
        loop {
            if st.finished {
                return None;
            }

            if st.es.is_none() {
                if st.attempt > 0 {
                    let backoff = INITIAL_BACKOFF_MS * 2u64.pow(st.attempt - 1);
                    tokio::select! {
                        _ = st.cancel.cancelled() => {
                            st.finished = true;
                            return None;
                        }
                        _ = tokio::time::sleep(Duration::from_millis(backoff)) => {}
                    }
                }

                let request = st
                    .http
                    .post(&st.url)
                    .header("x-goog-api-key", &st.api_key)
                    .header("content-type", "application/json")
                    .json(&st.body);

                match EventSource::new(request) {
                    Ok(es) => st.es = Some(es),
                    Err(e) => {
                        st.finished = true;
                        return Some((Err(TransportError::InvalidStream(e.to_string())), st));
                    }
                }
            }

            let event = {
                let Some(es) = st.es.as_mut() else { continue };
                tokio::select! {
                    _ = st.cancel.cancelled() => {
                        st.finished = true;
                        return None;
                    }
                    event = es.next() => event,
                }
            };

            match event {
                Some(Ok(Event::Open)) => continue,
                Some(Ok(Event::Message(msg))) => {
                    let chunk = match parse_chunk(&msg.data) {
                        Ok(c) => c,
                        Err(e) => {
                            st.finished = true;
                            return Some((Err(e), st));
                        }
                    };

                    if chunk.finish_reason.is_some() {
                        st.finished = true;
                        if let Some(es) = st.es.as_mut() {
                            es.close();
                        }
                    }
                    return Some((Ok(RawChunk::Model(chunk)), st));
                }
                Some(Err(reqwest_eventsource::Error::StreamEnded)) | None => {
                    // The provider closed the stream without a finish reason
                    st.finished = true;
                    return Some((
                        Err(TransportError::InvalidStream(
                            "stream ended before a finish reason".to_string(),
                        )),
                        st,
                    ));
                }
                Some(Err(es_err)) => {
                    let err = classify_sse_error(es_err).await;

                    // Rate limits go straight to the caller with their
                    // retry-after; other transients reconnect up to the cap
                    let reconnect = err.is_retryable()
                        && !matches!(err, TransportError::RateLimited { .. })
                        && st.attempt < st.max_retries;

                    if reconnect {
                        st.attempt += 1;
                        st.es = None;
                        warn!(attempt = st.attempt, error = %err, "transport: reconnecting after transient failure");
                        return Some((Ok(RawChunk::Retry), st));
                    }

                    st.finished = true;
                    return Some((Err(err), st));
                }
            }
        }
    }))
}

async fn classify_sse_error(err: reqwest_eventsource::Error) -> TransportError {
    use reqwest_eventsource::Error as EsError;

    match err {
        EsError::InvalidStatusCode(status, response) => {
            if status.as_u16() == 429 {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(60);
                TransportError::RateLimited {
                    retry_after: Duration::from_secs(retry_after),
                }
            } else {
                let message = response.text().await.unwrap_or_default();
                TransportError::Api {
                    status: status.as_u16(),
                    message,
                }
            }
        }
        EsError::Transport(e) => TransportError::Network(e),
        // Malformed SSE frames, bad content types, encoding failures
        other => TransportError::InvalidStream(other.to_string()),
    }
}

/// Parse one SSE data payload into a model chunk
fn parse_chunk(data: &str) -> Result<ModelChunk, TransportError> {
    let response: StreamResponse = serde_json::from_str(data)?;

    let mut chunk = ModelChunk::default();

    if let Some(candidate) = response.candidates.into_iter().next() {
        if let Some(content) = candidate.content {
            for part in content.parts {
                if let Some(call) = part.function_call {
                    chunk.parts.push(Part::FunctionCall {
                        name: call.name,
                        args: call.args,
                    });
                } else if let Some(text) = part.text {
                    if part.thought {
                        chunk.parts.push(Part::Thought(text));
                    } else {
                        chunk.parts.push(Part::Text(text));
                    }
                }
            }
        }

        if let Some(meta) = candidate.citation_metadata {
            chunk
                .citations
                .extend(meta.citation_sources.into_iter().filter_map(|s| s.uri));
        }

        chunk.finish_reason = candidate.finish_reason.as_deref().map(FinishReason::from_provider);
    }

    if let Some(usage) = response.usage_metadata {
        chunk.usage = Some(TokenUsage {
            prompt_tokens: usage.prompt_token_count,
            response_tokens: usage.candidates_token_count,
            thought_tokens: usage.thoughts_token_count,
        });
    }

    Ok(chunk)
}

// Provider wire format

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
    citation_metadata: Option<CitationMetadata>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
    function_call: Option<WireFunctionCall>,
}

#[derive(Debug, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CitationMetadata {
    #[serde(default)]
    citation_sources: Vec<CitationSource>,
}

#[derive(Debug, Deserialize)]
struct CitationSource {
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
    #[serde(default)]
    thoughts_token_count: u64,
}
