//! list_directory tool - bounded recursive directory listing

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use walkdir::WalkDir;

use crate::tools::{ResultMeta, Tool, ToolContext, ToolError, ToolResult};

/// List files and directories under a path, to a bounded depth
pub struct ListDirectoryTool;

#[async_trait]
impl Tool for ListDirectoryTool {
    fn name(&self) -> &'static str {
        "list_directory"
    }

    fn description(&self) -> &'static str {
        "List files and directories under a path. Directories carry a trailing slash. \
         Example: {\"path\": \"src\", \"depth\": 2} lists src/ and one level below it."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory path relative to the workspace root (default: .)"
                },
                "depth": {
                    "type": "integer",
                    "description": "Recursion depth, 1 lists only direct children (default: 1, capped)"
                }
            }
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext, cancel: &CancellationToken) -> ToolResult {
        debug!(?input, "ListDirectoryTool::execute");
        let path = input["path"].as_str().unwrap_or(".");
        let depth = input["depth"]
            .as_u64()
            .map(|d| (d as usize).clamp(1, ctx.caps.max_list_depth))
            .unwrap_or(1);

        let full_path = match ctx.validate_path(Path::new(path)) {
            Ok(p) => p,
            Err(e) => return e.into(),
        };

        match tokio::fs::metadata(&full_path).await {
            Ok(meta) if !meta.is_dir() => {
                return ToolError::NotADirectory { path: path.to_string() }.into();
            }
            Ok(_) => {}
            Err(e) => return ToolError::from_io(e, path).into(),
        }

        let mut entries = Vec::new();
        let mut truncated = false;

        for entry in WalkDir::new(&full_path)
            .min_depth(1)
            .max_depth(depth)
            .follow_links(false)
            .sort_by_file_name()
        {
            if cancel.is_cancelled() {
                return ToolError::Cancelled.into();
            }

            let entry = match entry {
                Ok(e) => e,
                // Unreadable children are skipped, not fatal
                Err(e) => {
                    debug!(error = %e, "ListDirectoryTool::execute: skipping entry");
                    continue;
                }
            };

            if entries.len() >= ctx.caps.max_list_entries {
                truncated = true;
                break;
            }

            let rel = entry
                .path()
                .strip_prefix(&full_path)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .to_string();
            let suffix = if entry.file_type().is_dir() { "/" } else { "" };
            entries.push(format!("{}{}", rel, suffix));
        }

        let count = entries.len();
        debug!(%path, count, truncated, "ListDirectoryTool::execute: done");

        if entries.is_empty() {
            ToolResult::success_with("(empty directory)", ResultMeta::new(0, false))
        } else {
            ToolResult::success_with(entries.join("\n"), ResultMeta::new(count, truncated))
        }
    }
}
