//! Provider-facing request/response types
//!
//! These model the Gemini streaming API closely enough to be useful while
//! staying independent of the wire format, which lives in the transport.

use serde::{Deserialize, Serialize};

/// A message in the conversation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Create a model message
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// Why the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    Other(String),
}

impl FinishReason {
    /// Parse from the provider finish-reason string
    pub fn from_provider(s: &str) -> Self {
        match s {
            "STOP" => FinishReason::Stop,
            "MAX_TOKENS" => FinishReason::MaxTokens,
            "SAFETY" => FinishReason::Safety,
            "RECITATION" => FinishReason::Recitation,
            other => FinishReason::Other(other.to_string()),
        }
    }
}

/// Token accounting snapshot from the provider's usage metadata
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub response_tokens: u64,
    pub thought_tokens: u64,
}

impl TokenUsage {
    /// Fold another snapshot into a running total
    pub fn add(&mut self, other: &TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.response_tokens += other.response_tokens;
        self.thought_tokens += other.thought_tokens;
    }

    pub fn total(&self) -> u64 {
        self.prompt_tokens + self.response_tokens + self.thought_tokens
    }
}

/// One part of a model response chunk, in provider order
#[derive(Debug, Clone)]
pub enum Part {
    /// Normal response text
    Text(String),

    /// Reasoning content, flagged distinctly from normal text
    Thought(String),

    /// A function invocation request
    FunctionCall { name: String, args: serde_json::Value },
}

/// A parsed model response chunk
#[derive(Debug, Clone, Default)]
pub struct ModelChunk {
    /// Content parts in the order the provider listed them
    pub parts: Vec<Part>,

    /// Citation sources attached to this chunk
    pub citations: Vec<String>,

    /// Present on the final chunk of a turn
    pub finish_reason: Option<FinishReason>,

    /// Usage metadata, when the provider attaches it
    pub usage: Option<TokenUsage>,
}

/// A raw chunk from the transport
#[derive(Debug, Clone)]
pub enum RawChunk {
    /// The transport recovered from a transient failure and is retrying;
    /// distinguishable from content so callers can surface it
    Retry,

    /// A model response chunk
    Model(ModelChunk),
}
