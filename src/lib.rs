//! CodeScout - read-only agentic codebase exploration
//!
//! CodeScout drives a streamed LLM conversation through a sandboxed,
//! read-only tool set so the model can explore a workspace without being able
//! to change it. The caller runs one turn at a time, reacts to normalized
//! events as they arrive, executes requested tool calls, and folds the
//! results into the next turn's prompt.
//!
//! # Core Concepts
//!
//! - **One turn, one message**: every [`Session::run`] sends exactly one
//!   prompt and ends at exactly one terminal event
//! - **Read-only by construction**: the built-in registry contains no tool
//!   that can write, delete, or execute
//! - **Boundary before I/O**: every path argument is validated against the
//!   workspace root before any file system access
//! - **Cooperative cancellation**: one token observed by the transport, the
//!   turn engine, and every tool scan loop
//!
//! # Modules
//!
//! - [`config`] - Configuration types and loading
//! - [`llm`] - Provider transport and streaming chunk types
//! - [`session`] - Session lifecycle over one transport
//! - [`tools`] - Read-only tool registry and built-in tools
//! - [`turn`] - The turn engine and its event protocol
//! - [`workspace`] - Workspace boundary validation

pub mod config;
pub mod llm;
pub mod session;
pub mod tools;
pub mod turn;
pub mod workspace;

// Re-export commonly used types
pub use config::{Config, ConfigError, LlmConfig, ToolCaps, WorkspaceConfig};
pub use llm::{
    ChunkStream, FinishReason, GeminiTransport, Message, ModelChunk, Part, RawChunk, Role, TokenUsage, Transport,
    TransportError,
};
pub use session::{Session, SessionError};
pub use tools::{FailureKind, ResultMeta, Tool, ToolContext, ToolDescriptor, ToolError, ToolRegistry, ToolResult};
pub use turn::{ToolCallRequest, Turn, TurnEvent};
pub use workspace::{BoundaryError, WorkspaceBoundary};
