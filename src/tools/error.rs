//! Tool error types

use thiserror::Error;

use crate::workspace::BoundaryError;

use super::traits::FailureKind;

/// Errors that can occur during tool execution
///
/// Converted into failed [`ToolResult`](super::ToolResult)s at the registry
/// edge so a failed call never aborts the turn.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Boundary(#[from] BoundaryError),

    #[error("File not found: {path}")]
    NotFound {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a directory: {path}")]
    NotADirectory { path: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tool execution cancelled")]
    Cancelled,

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },
}

impl ToolError {
    /// Map to the coarse failure classification carried on results
    pub fn kind(&self) -> FailureKind {
        match self {
            ToolError::Boundary(_) => FailureKind::BoundaryViolation,
            ToolError::NotFound { .. } => FailureKind::NotFound,
            ToolError::NotADirectory { .. } => FailureKind::Io,
            ToolError::InvalidArgument(_) => FailureKind::InvalidArgument,
            ToolError::InvalidPattern(_) => FailureKind::InvalidArgument,
            ToolError::Io(_) => FailureKind::Io,
            ToolError::Cancelled => FailureKind::Cancelled,
            ToolError::UnknownTool { .. } => FailureKind::UnknownTool,
        }
    }

    /// Classify a read failure against the path it was issued for
    pub fn from_io(err: std::io::Error, path: &str) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ToolError::NotFound {
                path: path.to_string(),
                source: err,
            },
            std::io::ErrorKind::NotADirectory => ToolError::NotADirectory { path: path.to_string() },
            _ => ToolError::Io(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_boundary_violation_message() {
        let err = ToolError::Boundary(BoundaryError::Escape {
            path: PathBuf::from("/etc/passwd"),
            root: PathBuf::from("/repo"),
        });

        let msg = err.to_string();
        assert!(msg.contains("/etc/passwd"));
        assert!(msg.contains("/repo"));
        assert_eq!(err.kind(), FailureKind::BoundaryViolation);
    }

    #[test]
    fn test_from_io_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = ToolError::from_io(io, "missing.txt");

        assert!(matches!(err, ToolError::NotFound { .. }));
        assert_eq!(err.kind(), FailureKind::NotFound);
    }

    #[test]
    fn test_from_io_permission_denied() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err = ToolError::from_io(io, "locked.txt");

        assert!(matches!(err, ToolError::Io(_)));
        assert_eq!(err.kind(), FailureKind::Io);
    }

    #[test]
    fn test_cancelled_kind() {
        assert_eq!(ToolError::Cancelled.kind(), FailureKind::Cancelled);
    }
}
