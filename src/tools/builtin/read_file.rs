//! read_file tool - read file contents with line numbers

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::tools::{ResultMeta, Tool, ToolContext, ToolError, ToolResult};

/// Read a file's contents with line numbers, bounded by an offset/limit window
pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn description(&self) -> &'static str {
        "Read a file's contents with line numbers. Supports an offset/limit window \
         for large files. Example: {\"path\": \"src/lib.rs\", \"offset\": 100, \"limit\": 50} \
         reads 50 lines starting at line 100."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path relative to the workspace root, e.g. src/main.rs"
                },
                "offset": {
                    "type": "integer",
                    "description": "Line number to start reading from (1-indexed, default: 1)"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum lines to read (default and cap: configured max)"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext, cancel: &CancellationToken) -> ToolResult {
        debug!(?input, "ReadFileTool::execute");
        let path = match input["path"].as_str() {
            Some(p) => p,
            None => return ToolError::InvalidArgument("path is required".to_string()).into(),
        };

        let offset = input["offset"].as_u64().unwrap_or(1).max(1) as usize;
        let limit = input["limit"]
            .as_u64()
            .map(|l| (l as usize).min(ctx.caps.max_read_lines))
            .unwrap_or(ctx.caps.max_read_lines);

        let full_path = match ctx.validate_path(Path::new(path)) {
            Ok(p) => p,
            Err(e) => return e.into(),
        };

        if cancel.is_cancelled() {
            return ToolError::Cancelled.into();
        }

        let content = match tokio::fs::read_to_string(&full_path).await {
            Ok(c) => c,
            Err(e) => return ToolError::from_io(e, path).into(),
        };

        let total_lines = content.lines().count();
        let mut clipped = false;

        // cat -n style window
        let lines: Vec<String> = content
            .lines()
            .skip(offset.saturating_sub(1))
            .take(limit)
            .enumerate()
            .map(|(i, line)| {
                let display = if line.len() > ctx.caps.max_line_length {
                    clipped = true;
                    let mut cut = ctx.caps.max_line_length;
                    while !line.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    format!("{}...", &line[..cut])
                } else {
                    line.to_string()
                };
                format!("{:>6}\u{2502}{}", offset + i, display)
            })
            .collect();

        let returned = lines.len();
        let truncated = clipped || offset.saturating_sub(1) + returned < total_lines;
        debug!(%path, returned, total_lines, truncated, "ReadFileTool::execute: done");

        ToolResult::success_with(lines.join("\n"), ResultMeta::new(returned, truncated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolCaps;
    use crate::workspace::WorkspaceBoundary;
    use std::fs;
    use tempfile::tempdir;

    fn context(root: &Path) -> ToolContext {
        ToolContext::new(WorkspaceBoundary::new(root).unwrap(), ToolCaps::default())
    }

    #[tokio::test]
    async fn test_read_file_basic() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("test.txt"), "line 1\nline 2\nline 3").unwrap();

        let ctx = context(temp.path());
        let result = ReadFileTool
            .execute(
                serde_json::json!({"path": "test.txt"}),
                &ctx,
                &CancellationToken::new(),
            )
            .await;

        assert!(!result.is_error());
        assert!(result.content.contains("line 1"));
        assert!(result.content.contains("line 3"));
        assert_eq!(result.meta.count, 3);
        assert!(!result.meta.truncated);
    }

    #[tokio::test]
    async fn test_read_file_window() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("test.txt"), "line 1\nline 2\nline 3\nline 4").unwrap();

        let ctx = context(temp.path());
        let result = ReadFileTool
            .execute(
                serde_json::json!({"path": "test.txt", "offset": 2, "limit": 2}),
                &ctx,
                &CancellationToken::new(),
            )
            .await;

        assert!(!result.is_error());
        assert!(!result.content.contains("line 1"));
        assert!(result.content.contains("line 2"));
        assert!(result.content.contains("line 3"));
        assert!(!result.content.contains("line 4"));
        // Window ends before EOF
        assert!(result.meta.truncated);
    }

    #[tokio::test]
    async fn test_read_file_limit_capped() {
        let temp = tempdir().unwrap();
        let body: String = (1..=20).map(|i| format!("line {i}\n")).collect();
        fs::write(temp.path().join("big.txt"), body).unwrap();

        let caps = ToolCaps {
            max_read_lines: 5,
            ..Default::default()
        };
        let ctx = ToolContext::new(WorkspaceBoundary::new(temp.path()).unwrap(), caps);

        // Request far more than the cap allows
        let result = ReadFileTool
            .execute(
                serde_json::json!({"path": "big.txt", "limit": 1000}),
                &ctx,
                &CancellationToken::new(),
            )
            .await;

        assert!(!result.is_error());
        assert_eq!(result.meta.count, 5);
        assert!(result.meta.truncated);
    }

    #[tokio::test]
    async fn test_read_file_long_line_clipped() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("wide.txt"), "x".repeat(5000)).unwrap();

        let ctx = context(temp.path());
        let result = ReadFileTool
            .execute(
                serde_json::json!({"path": "wide.txt"}),
                &ctx,
                &CancellationToken::new(),
            )
            .await;

        assert!(!result.is_error());
        assert!(result.meta.truncated);
        assert!(result.content.ends_with("..."));
    }

    #[tokio::test]
    async fn test_read_file_not_found() {
        let temp = tempdir().unwrap();
        let ctx = context(temp.path());

        let result = ReadFileTool
            .execute(
                serde_json::json!({"path": "nonexistent.txt"}),
                &ctx,
                &CancellationToken::new(),
            )
            .await;

        assert!(result.is_error());
        assert_eq!(result.failure, Some(crate::tools::FailureKind::NotFound));
    }

    #[tokio::test]
    async fn test_read_file_outside_workspace() {
        let temp = tempdir().unwrap();
        let ctx = context(temp.path());

        let result = ReadFileTool
            .execute(
                serde_json::json!({"path": "/etc/passwd"}),
                &ctx,
                &CancellationToken::new(),
            )
            .await;

        assert!(result.is_error());
        assert_eq!(result.failure, Some(crate::tools::FailureKind::BoundaryViolation));
    }

    #[tokio::test]
    async fn test_read_file_missing_path_argument() {
        let temp = tempdir().unwrap();
        let ctx = context(temp.path());

        let result = ReadFileTool
            .execute(serde_json::json!({}), &ctx, &CancellationToken::new())
            .await;

        assert!(result.is_error());
        assert_eq!(result.failure, Some(crate::tools::FailureKind::InvalidArgument));
    }

    #[tokio::test]
    async fn test_read_file_cancelled() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("test.txt"), "content").unwrap();

        let ctx = context(temp.path());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = ReadFileTool
            .execute(serde_json::json!({"path": "test.txt"}), &ctx, &cancel)
            .await;

        assert!(result.is_error());
        assert_eq!(result.failure, Some(crate::tools::FailureKind::Cancelled));
    }
}
