//! Turn engine - the protocol state machine for one exchange
//!
//! Consumes the transport's raw chunk sequence and produces the normalized
//! event sequence. Pull-based: each call to [`Turn::next_event`] computes the
//! next event on demand, suspending only while the transport waits for its
//! next chunk. One `run` equals one outbound message and ends at the first
//! terminal event, no matter how many tool calls were requested; the caller
//! starts a new turn per round with tool results folded into the next prompt.

use std::collections::{BTreeSet, VecDeque};

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::llm::{ChunkStream, FinishReason, ModelChunk, Part, RawChunk, TokenUsage, TransportError};

use super::events::{ToolCallRequest, TurnEvent};

/// Character cap for one-line thought summaries
const SUMMARY_MAX_CHARS: usize = 100;

/// State accumulated over one turn, discarded with it
#[derive(Debug, Default)]
struct TurnState {
    /// Concatenated plain-text response
    text: String,

    /// Tool calls issued during the turn, in emission order
    pending_calls: Vec<ToolCallRequest>,

    /// Deduplicated citation sources, flushed once before `Finished`
    citations: BTreeSet<String>,

    /// Last usage snapshot the provider attached
    usage: TokenUsage,

    /// Finish reason once observed
    finish_reason: Option<FinishReason>,
}

/// One in-flight exchange with the model
///
/// Produced by [`Session::run`](crate::session::Session::run). Yields events
/// until the first terminal event, after which `next_event` returns `None`.
pub struct Turn {
    turn_id: String,
    chunks: Option<ChunkStream>,
    queue: VecDeque<TurnEvent>,
    state: TurnState,
    cancel: CancellationToken,
    done: bool,
}

impl Turn {
    pub(crate) fn new(chunks: ChunkStream, cancel: CancellationToken) -> Self {
        Self {
            turn_id: Uuid::now_v7().simple().to_string(),
            chunks: Some(chunks),
            queue: VecDeque::new(),
            state: TurnState::default(),
            cancel,
            done: false,
        }
    }

    /// A turn that yields exactly one pre-decided terminal event
    pub(crate) fn terminal(event: TurnEvent) -> Self {
        let mut turn = Self::new(Box::pin(futures::stream::empty()), CancellationToken::new());
        turn.chunks = None;
        turn.queue.push_back(event);
        turn
    }

    /// Identifier shared by every tool call this turn issues
    pub fn id(&self) -> &str {
        &self.turn_id
    }

    /// Produce the next event, or `None` after the terminal event
    pub async fn next_event(&mut self) -> Option<TurnEvent> {
        loop {
            if let Some(event) = self.queue.pop_front() {
                if event.is_terminal() {
                    self.finish();
                }
                return Some(event);
            }

            if self.done {
                return None;
            }

            // Checked before every chunk, not only at provider pauses
            if self.cancel.is_cancelled() {
                self.finish();
                return Some(TurnEvent::Cancelled);
            }

            let chunk = match self.chunks.as_mut() {
                Some(stream) => stream.next().await,
                None => None,
            };

            match chunk {
                Some(Ok(RawChunk::Retry)) => return Some(TurnEvent::Retry),
                Some(Ok(RawChunk::Model(model_chunk))) => {
                    // May queue several events; the loop flushes them in order
                    self.process_chunk(model_chunk);
                }
                Some(Err(err)) => {
                    self.queue.push_back(self.classify(err));
                }
                None => {
                    let event = if self.cancel.is_cancelled() {
                        TurnEvent::Cancelled
                    } else {
                        TurnEvent::InvalidStream("stream ended before a finish reason".to_string())
                    };
                    self.queue.push_back(event);
                }
            }
        }
    }

    /// The plain-text response accumulated so far
    pub fn response_text(&self) -> &str {
        &self.state.text
    }

    /// Tool calls issued during the turn, in emission order
    pub fn pending_calls(&self) -> &[ToolCallRequest] {
        &self.state.pending_calls
    }

    /// The finish reason, once `Finished` has been emitted
    pub fn finish_reason(&self) -> Option<&FinishReason> {
        self.state.finish_reason.as_ref()
    }

    /// The last usage snapshot the provider attached
    pub fn usage(&self) -> TokenUsage {
        self.state.usage
    }

    fn finish(&mut self) {
        self.done = true;
        self.chunks = None;
    }

    /// Map chunks to events per the protocol rules, in order: thoughts,
    /// concatenated text, tool calls, then citation flush and finish
    fn process_chunk(&mut self, chunk: ModelChunk) {
        let mut text = String::new();
        let mut calls = Vec::new();

        // Emission order within a chunk is fixed (thoughts, text, calls)
        // regardless of the order the provider listed the parts
        for part in chunk.parts {
            match part {
                Part::Thought(thought) => {
                    let summary = summarize(&thought);
                    self.queue.push_back(TurnEvent::Thought { text: thought, summary });
                }
                Part::Text(t) => text.push_str(&t),
                Part::FunctionCall { name, args } => calls.push((name, args)),
            }
        }

        // One Content event per chunk, delivered before the next chunk is
        // read, so incremental display never lags the stream
        if !text.is_empty() {
            self.state.text.push_str(&text);
            self.queue.push_back(TurnEvent::Content(text));
        }

        for (name, args) in calls {
            let request = ToolCallRequest::new(name, args, &self.turn_id);
            debug!(call_id = %request.id, tool = %request.name, "turn: tool call requested");
            self.state.pending_calls.push(request.clone());
            self.queue.push_back(TurnEvent::ToolCall(request));
        }

        self.state.citations.extend(chunk.citations);

        if let Some(usage) = chunk.usage {
            self.state.usage = usage;
        }

        if let Some(reason) = chunk.finish_reason {
            if !self.state.citations.is_empty() {
                let sources: Vec<String> = std::mem::take(&mut self.state.citations).into_iter().collect();
                self.queue.push_back(TurnEvent::Citation(sources));
            }

            debug!(?reason, "turn: finished");
            self.state.finish_reason = Some(reason.clone());
            self.queue.push_back(TurnEvent::Finished {
                reason,
                usage: self.state.usage,
            });
        }
    }

    /// Classify a failure escaping transport consumption into its terminal event
    fn classify(&self, err: TransportError) -> TurnEvent {
        if self.cancel.is_cancelled() {
            return TurnEvent::Cancelled;
        }
        match err {
            TransportError::InvalidStream(message) => TurnEvent::InvalidStream(message),
            other => TurnEvent::Error {
                status: other.status(),
                message: other.to_string(),
            },
        }
    }
}

/// One-line summary of reasoning text: first non-empty line, capped
fn summarize(text: &str) -> String {
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or(text);
    line.chars().take(SUMMARY_MAX_CHARS).collect()
}
