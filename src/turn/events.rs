//! Normalized turn events

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use uuid::Uuid;

use crate::llm::{FinishReason, TokenUsage};

/// Process-wide sequence component of call identifiers
static CALL_SEQ: AtomicU64 = AtomicU64::new(0);

/// A model-issued request to invoke a named tool
///
/// Created by the turn engine when the provider emits a function invocation;
/// never mutated after creation.
#[derive(Debug, Clone)]
pub struct ToolCallRequest {
    /// Unique per invocation; correlates the request with its result
    pub id: String,

    /// Registered tool name
    pub name: String,

    /// Argument mapping as the provider supplied it
    pub args: Value,

    /// The turn this call originated from
    pub turn_id: String,
}

impl ToolCallRequest {
    pub(crate) fn new(name: String, args: Value, turn_id: &str) -> Self {
        let id = next_call_id(&name);
        Self {
            id,
            name,
            args,
            turn_id: turn_id.to_string(),
        }
    }
}

/// Synthesize a call identifier that cannot collide within the process
///
/// Tool name, then a monotonic sequence number, then a time-ordered random
/// component.
fn next_call_id(name: &str) -> String {
    let seq = CALL_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}-{}", name, seq, Uuid::now_v7().simple())
}

/// A normalized event produced by the turn engine
///
/// Exactly one terminal variant (`Finished`, `Error`, `Cancelled`,
/// `InvalidStream`) ends a turn; all others may repeat before it.
#[derive(Debug, Clone)]
pub enum TurnEvent {
    /// A chunk's worth of response text, emitted before the next chunk is read
    Content(String),

    /// Reasoning content, with a one-line summary
    Thought { text: String, summary: String },

    /// The model requested a tool invocation
    ToolCall(ToolCallRequest),

    /// All citation sources collected during the turn, sorted, flushed once
    /// immediately before `Finished`
    Citation(Vec<String>),

    /// The transport recovered from a transient failure without losing the turn
    Retry,

    /// Terminal: the model finished the turn
    Finished {
        reason: FinishReason,
        usage: TokenUsage,
    },

    /// Terminal: the exchange failed
    Error {
        message: String,
        status: Option<u16>,
    },

    /// Terminal: the underlying stream was truncated or malformed
    InvalidStream(String),

    /// Terminal: the caller raised the cancellation signal
    Cancelled,
}

impl TurnEvent {
    /// Whether this event ends the turn
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TurnEvent::Finished { .. } | TurnEvent::Error { .. } | TurnEvent::InvalidStream(_) | TurnEvent::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_call_ids_are_unique() {
        let ids: HashSet<String> = (0..1000)
            .map(|_| next_call_id("read_file"))
            .collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_call_id_carries_tool_name() {
        let id = next_call_id("grep");
        assert!(id.starts_with("grep-"));
    }

    #[test]
    fn test_terminal_classification() {
        assert!(
            TurnEvent::Finished {
                reason: FinishReason::Stop,
                usage: TokenUsage::default()
            }
            .is_terminal()
        );
        assert!(
            TurnEvent::Error {
                message: "boom".to_string(),
                status: Some(500)
            }
            .is_terminal()
        );
        assert!(TurnEvent::InvalidStream("truncated".to_string()).is_terminal());
        assert!(TurnEvent::Cancelled.is_terminal());

        assert!(!TurnEvent::Content("hi".to_string()).is_terminal());
        assert!(!TurnEvent::Retry.is_terminal());
        assert!(!TurnEvent::Citation(vec![]).is_terminal());
    }
}
