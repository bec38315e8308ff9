//! ToolRegistry - owns the tools available to one session

use std::collections::HashMap;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::builtin::{GlobTool, GrepTool, ListDirectoryTool, ReadFileTool};
use super::context::ToolContext;
use super::error::ToolError;
use super::traits::{Tool, ToolDescriptor, ToolResult};

/// Explicitly constructed, explicitly owned set of tools for one session
///
/// Dispatch is by stable name, resolved at registration time. Only read-only
/// tools exist in this crate, so the standing no-mutation invariant is
/// enforced by what the composition root can register, not by a runtime
/// check.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
    ctx: ToolContext,
}

impl ToolRegistry {
    /// Create a registry with the standard read-only tool set
    pub fn read_only(ctx: ToolContext) -> Self {
        let mut registry = Self::empty(ctx);
        registry.register(Box::new(ReadFileTool));
        registry.register(Box::new(ListDirectoryTool));
        registry.register(Box::new(GlobTool));
        registry.register(Box::new(GrepTool));
        registry
    }

    /// Create an empty registry
    pub fn empty(ctx: ToolContext) -> Self {
        Self {
            tools: HashMap::new(),
            ctx,
        }
    }

    /// Add or replace a tool; the last registration for a name wins
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        debug!(tool_name = %tool.name(), "ToolRegistry::register");
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Descriptors for every registered tool
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools
            .values()
            .map(|t| ToolDescriptor {
                name: t.name(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Convert the registered set to the provider's function-declaration schema
    pub fn function_declarations(&self) -> Value {
        let mut declarations: Vec<Value> = self
            .descriptors()
            .iter()
            .map(|d| d.to_function_declaration())
            .collect();
        declarations.sort_by_key(|d| d["name"].as_str().unwrap_or_default().to_string());

        serde_json::json!([{ "functionDeclarations": declarations }])
    }

    /// Execute a named tool call
    ///
    /// An unknown name yields a typed failed result so the turn can continue;
    /// it never panics or aborts the session.
    pub async fn execute(&self, name: &str, args: Value, cancel: &CancellationToken) -> ToolResult {
        debug!(tool_name = %name, "ToolRegistry::execute");
        match self.tools.get(name) {
            Some(tool) => tool.execute(args, &self.ctx, cancel).await,
            None => ToolError::UnknownTool {
                name: name.to_string(),
            }
            .into(),
        }
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }
}
