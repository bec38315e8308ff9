//! Tool system for workspace analysis
//!
//! Tools give the model read-only file system access scoped to a single
//! workspace root. Every path argument is validated against the workspace
//! boundary before any I/O, and every scan loop observes the shared
//! cancellation token.

mod context;
mod error;
mod registry;
mod traits;

pub mod builtin;

pub use context::ToolContext;
pub use error::ToolError;
pub use registry::ToolRegistry;
pub use traits::{FailureKind, ResultMeta, Tool, ToolDescriptor, ToolResult};
