//! Turn engine
//!
//! Translates the transport's raw chunk sequence into the normalized event
//! protocol a caller drives: content, thoughts, tool calls, citations, and
//! exactly one terminal event per turn.

mod engine;
mod events;

pub use engine::Turn;
pub use events::{ToolCallRequest, TurnEvent};
