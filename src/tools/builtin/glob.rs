//! glob tool - find files matching a pattern

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::tools::{ResultMeta, Tool, ToolContext, ToolError, ToolResult};

/// Find files matching a glob pattern within the workspace
pub struct GlobTool;

#[async_trait]
impl Tool for GlobTool {
    fn name(&self) -> &'static str {
        "glob"
    }

    fn description(&self) -> &'static str {
        "Find files matching a glob pattern, rooted at the workspace. \
         Example: {\"pattern\": \"**/*.rs\", \"path\": \"src\"} finds every Rust \
         file under src/."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Glob pattern to match, e.g. **/*.toml"
                },
                "path": {
                    "type": "string",
                    "description": "Base directory relative to the workspace root (default: .)"
                }
            },
            "required": ["pattern"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext, cancel: &CancellationToken) -> ToolResult {
        debug!(?input, "GlobTool::execute");
        let pattern = match input["pattern"].as_str() {
            Some(p) => p,
            None => return ToolError::InvalidArgument("pattern is required".to_string()).into(),
        };

        let base = input["path"].as_str().unwrap_or(".");
        let base_path = match ctx.validate_path(Path::new(base)) {
            Ok(p) => p,
            Err(e) => return e.into(),
        };

        // The pattern itself may be absolute or climb with `..`, either of
        // which overrides the validated base when joined; bound the whole
        // joined pattern before any directory is scanned
        let full_pattern = match ctx.validate_path(&base_path.join(pattern)) {
            Ok(p) => p,
            Err(e) => return e.into(),
        };
        let pattern_str = match full_pattern.to_str() {
            Some(s) => s,
            None => return ToolError::InvalidPattern("pattern is not valid UTF-8".to_string()).into(),
        };

        let paths = match glob::glob(pattern_str) {
            Ok(paths) => paths,
            Err(e) => return ToolError::InvalidPattern(e.to_string()).into(),
        };

        let mut matches = Vec::new();
        let mut truncated = false;

        for entry in paths {
            if cancel.is_cancelled() {
                return ToolError::Cancelled.into();
            }

            let Ok(path) = entry else { continue };

            // Re-check bounds per match: the pattern itself may climb
            if !path.starts_with(ctx.root()) {
                continue;
            }

            if matches.len() >= ctx.caps.max_glob_matches {
                truncated = true;
                break;
            }

            matches.push(ctx.display_path(&path));
        }

        let count = matches.len();
        debug!(%pattern, count, truncated, "GlobTool::execute: done");

        if matches.is_empty() {
            ToolResult::success_with("No matches found", ResultMeta::new(0, false))
        } else {
            ToolResult::success_with(matches.join("\n"), ResultMeta::new(count, truncated))
        }
    }
}
