//! ToolContext - execution context shared by all tools in a session

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::ToolCaps;
use crate::workspace::WorkspaceBoundary;

use super::error::ToolError;

/// Execution context for tools, scoped to one workspace
///
/// Carries the workspace boundary and the result caps. Tools never touch the
/// filesystem except through paths returned by [`validate_path`]
/// (`ToolContext::validate_path`).
#[derive(Debug, Clone)]
pub struct ToolContext {
    boundary: WorkspaceBoundary,

    /// Result caps (max matches, max read lines, listing depth, ...)
    pub caps: ToolCaps,
}

impl ToolContext {
    /// Create a context over a validated workspace boundary
    pub fn new(boundary: WorkspaceBoundary, caps: ToolCaps) -> Self {
        debug!(root = %boundary.root().display(), "ToolContext::new");
        Self { boundary, caps }
    }

    /// The canonical workspace root
    pub fn root(&self) -> &Path {
        self.boundary.root()
    }

    /// Resolve and bound-check a path argument
    pub fn validate_path(&self, path: &Path) -> Result<PathBuf, ToolError> {
        Ok(self.boundary.validate(path)?)
    }

    /// Render a resolved path relative to the workspace root
    pub fn display_path(&self, path: &Path) -> String {
        self.boundary.display_path(path)
    }
}
