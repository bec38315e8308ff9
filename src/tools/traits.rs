//! Tool trait and result types

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::context::ToolContext;
use super::error::ToolError;

/// A read-only capability that can be called by the model
///
/// Implementations perform exactly one bounded read operation. Every path
/// argument must pass through [`ToolContext::validate_path`] before any I/O,
/// and scan loops must observe the cancellation token.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (matches the function name advertised to the model)
    fn name(&self) -> &'static str;

    /// Human-readable description, embedded in the provider schema
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value;

    /// Execute the tool
    async fn execute(&self, input: Value, ctx: &ToolContext, cancel: &CancellationToken) -> ToolResult;
}

/// Immutable advertisement of a tool to the provider
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

impl ToolDescriptor {
    /// Convert to the provider's function-declaration schema
    pub fn to_function_declaration(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "parameters": self.input_schema,
        })
    }
}

/// Coarse classification of a failed tool call
///
/// Lets the caller react differently to a missing file, a security violation,
/// and a cancelled scan without parsing the display message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidArgument,
    BoundaryViolation,
    NotFound,
    Io,
    Cancelled,
    UnknownTool,
}

/// Structured bookkeeping attached to a result
///
/// `truncated` is set whenever a cap was hit; callers must not assume a
/// result is complete without checking it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultMeta {
    /// Number of items (lines, entries, matches) in the payload
    pub count: usize,

    /// Whether a configured cap cut the payload short
    pub truncated: bool,
}

impl ResultMeta {
    pub fn new(count: usize, truncated: bool) -> Self {
        Self { count, truncated }
    }
}

/// Result of a tool execution, produced exactly once per call
#[derive(Debug, Clone)]
pub struct ToolResult {
    /// Plain-text payload returned to the model
    pub content: String,

    /// None on success; the failure classification otherwise
    pub failure: Option<FailureKind>,

    /// Structured metadata for the caller's own bookkeeping
    pub meta: ResultMeta,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            failure: None,
            meta: ResultMeta::default(),
        }
    }

    /// Create a successful result with metadata
    pub fn success_with(content: impl Into<String>, meta: ResultMeta) -> Self {
        Self {
            content: content.into(),
            failure: None,
            meta,
        }
    }

    /// Create a failed result
    pub fn failure(kind: FailureKind, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            failure: Some(kind),
            meta: ResultMeta::default(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.failure.is_some()
    }
}

impl From<ToolError> for ToolResult {
    fn from(err: ToolError) -> Self {
        ToolResult::failure(err.kind(), err.to_string())
    }
}
