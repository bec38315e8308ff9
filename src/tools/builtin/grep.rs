//! grep tool - content search over workspace files

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use grep_regex::RegexMatcherBuilder;
use grep_searcher::{BinaryDetection, Searcher, SearcherBuilder, Sink, SinkContext, SinkMatch};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use walkdir::WalkDir;

use crate::tools::{ResultMeta, Tool, ToolContext, ToolError, ToolResult};

/// Search for a regex pattern in workspace files, with context lines
pub struct GrepTool;

#[async_trait]
impl Tool for GrepTool {
    fn name(&self) -> &'static str {
        "grep"
    }

    fn description(&self) -> &'static str {
        "Search file contents for a regex pattern. Returns matching lines with \
         context. Example: {\"pattern\": \"fn main\", \"file_pattern\": \"*.rs\"} \
         finds main functions in Rust files."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Regex pattern to search for"
                },
                "path": {
                    "type": "string",
                    "description": "File or directory to search, relative to the workspace root (default: .)"
                },
                "file_pattern": {
                    "type": "string",
                    "description": "Glob filter on file names, e.g. *.rs"
                },
                "context_lines": {
                    "type": "integer",
                    "description": "Context lines before and after each match (default: 2)"
                },
                "case_insensitive": {
                    "type": "boolean",
                    "description": "Case-insensitive search (default: false)"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum matching lines to return (default and cap: configured max)"
                }
            },
            "required": ["pattern"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext, cancel: &CancellationToken) -> ToolResult {
        debug!(?input, "GrepTool::execute");
        let pattern = match input["pattern"].as_str() {
            Some(p) => p,
            None => return ToolError::InvalidArgument("pattern is required".to_string()).into(),
        };

        let path = input["path"].as_str().unwrap_or(".");
        let file_pattern = input["file_pattern"].as_str();
        let context_lines = input["context_lines"].as_u64().unwrap_or(2) as usize;
        let case_insensitive = input["case_insensitive"].as_bool().unwrap_or(false);
        let max_results = input["max_results"]
            .as_u64()
            .map(|m| (m as usize).min(ctx.caps.max_matches))
            .unwrap_or(ctx.caps.max_matches);

        let search_path = match ctx.validate_path(Path::new(path)) {
            Ok(p) => p,
            Err(e) => return e.into(),
        };

        if !search_path.exists() {
            return ToolError::from_io(
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such path"),
                path,
            )
            .into();
        }

        let matcher = match RegexMatcherBuilder::new()
            .case_insensitive(case_insensitive)
            .build(pattern)
        {
            Ok(m) => m,
            Err(e) => return ToolError::InvalidPattern(e.to_string()).into(),
        };

        let glob_matcher = match file_pattern {
            Some(fp) => match glob::Pattern::new(fp) {
                Ok(g) => Some(g),
                Err(e) => return ToolError::InvalidPattern(e.to_string()).into(),
            },
            None => None,
        };

        let files: Vec<PathBuf> = if search_path.is_file() {
            vec![search_path.clone()]
        } else {
            WalkDir::new(&search_path)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter(|e| match (&glob_matcher, e.path().file_name().and_then(|n| n.to_str())) {
                    (Some(glob), Some(name)) => glob.matches(name),
                    (Some(_), None) => false,
                    (None, _) => true,
                })
                .map(|e| e.path().to_path_buf())
                .collect()
        };

        debug!(file_count = files.len(), "GrepTool::execute: files to search");

        let mut searcher_builder = SearcherBuilder::new();
        searcher_builder
            .binary_detection(BinaryDetection::quit(b'\x00'))
            .line_number(true)
            .before_context(context_lines)
            .after_context(context_lines);

        let mut results: Vec<MatchLine> = Vec::new();
        let mut match_count = 0usize;
        let mut suppressed = false;

        for file_path in files {
            // Checked at the top of the scan loop so a raised token stops the
            // search promptly instead of returning a partial success
            if cancel.is_cancelled() {
                return ToolError::Cancelled.into();
            }

            // Stop only once a match beyond the cap was actually seen; a
            // result holding exactly the cap's worth is complete
            if suppressed {
                break;
            }

            let display_path = ctx.display_path(&file_path);
            let mut searcher = searcher_builder.build();

            let search_result = searcher.search_path(
                &matcher,
                &file_path,
                MatchSink {
                    file: &display_path,
                    results: &mut results,
                    match_count: &mut match_count,
                    suppressed: &mut suppressed,
                    max_results,
                },
            );

            if let Err(e) = search_result {
                // Binary and unreadable files are skipped, not fatal
                debug!(path = %display_path, error = %e, "GrepTool::execute: skipping file");
            }
        }

        let truncated = suppressed;
        debug!(match_count, truncated, "GrepTool::execute: done");

        if results.is_empty() {
            return ToolResult::success_with("No matches found", ResultMeta::new(0, false));
        }

        ToolResult::success_with(
            format_results(&results, truncated, max_results),
            ResultMeta::new(match_count, truncated),
        )
    }
}

#[derive(Debug)]
struct MatchLine {
    file: String,
    line_num: u64,
    line: String,
    is_context: bool,
}

/// Collects matched lines and their surrounding context for one file
///
/// The stock `sinks::UTF8` drops context lines on the floor, so context has
/// to be received through a `Sink` implementation of our own.
struct MatchSink<'a> {
    file: &'a str,
    results: &'a mut Vec<MatchLine>,
    match_count: &'a mut usize,
    suppressed: &'a mut bool,
    max_results: usize,
}

impl MatchSink<'_> {
    fn push(&mut self, line_num: u64, bytes: &[u8], is_context: bool) {
        self.results.push(MatchLine {
            file: self.file.to_string(),
            line_num,
            line: String::from_utf8_lossy(bytes).trim_end().to_string(),
            is_context,
        });
    }
}

impl Sink for MatchSink<'_> {
    type Error = std::io::Error;

    fn matched(&mut self, _searcher: &Searcher, mat: &SinkMatch<'_>) -> Result<bool, Self::Error> {
        if *self.match_count >= self.max_results {
            *self.suppressed = true;
            return Ok(false);
        }
        self.push(mat.line_number().unwrap_or(0), mat.bytes(), false);
        *self.match_count += 1;
        Ok(true)
    }

    fn context(&mut self, _searcher: &Searcher, ctx: &SinkContext<'_>) -> Result<bool, Self::Error> {
        if *self.match_count >= self.max_results {
            return Ok(false);
        }
        self.push(ctx.line_number().unwrap_or(0), ctx.bytes(), true);
        Ok(true)
    }
}

fn format_results(results: &[MatchLine], truncated: bool, max_results: usize) -> String {
    let mut output = String::new();
    let mut current_file = String::new();

    for result in results {
        if result.file != current_file {
            if !current_file.is_empty() {
                output.push('\n');
            }
            current_file = result.file.clone();
        }

        // file:line:content for matches, file-line-content for context
        let separator = if result.is_context { "-" } else { ":" };
        output.push_str(&format!(
            "{}{}{}{}{}\n",
            result.file, separator, result.line_num, separator, result.line
        ));
    }

    if truncated {
        output.push_str(&format!("\n... (truncated at {} matches)", max_results));
    }

    output.trim_end().to_string()
}
