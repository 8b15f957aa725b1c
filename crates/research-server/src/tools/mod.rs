//! Tool registry: maps tool names to handlers and renders `tools/list`.

mod basic;
mod research;

pub use basic::{AddTool, WeatherTool};
pub use research::{ExtractInfoTool, SearchPapersTool};

use std::sync::Arc;

use rc_mcp_client::protocol::{McpToolDef, ToolCallContent, ToolCallResult};
use serde_json::{Map, Value};

use crate::types::{ToolError, ToolResult};

/// Arguments of one `tools/call`.
pub type Args = Map<String, Value>;

/// Implement this trait to expose a tool over MCP.
#[async_trait::async_trait]
pub trait ServerTool: Send + Sync + 'static {
    /// Name, description and JSON Schema for `tools/list`.
    fn definition(&self) -> McpToolDef;

    /// Execute the tool.
    async fn call(&self, args: Args) -> ToolResult;
}

/// Registry of tool handlers, in registration order.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<(String, Arc<dyn ServerTool>)>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under the name from its definition. A second tool
    /// with the same name replaces the first.
    ///
    /// Returns `&mut Self` for method chaining.
    pub fn register<T: ServerTool>(&mut self, tool: T) -> &mut Self {
        let name = tool.definition().name;
        let tool: Arc<dyn ServerTool> = Arc::new(tool);
        match self.tools.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = tool,
            None => self.tools.push((name, tool)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ServerTool>> {
        self.tools
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| Arc::clone(t))
    }

    pub fn definitions(&self) -> Vec<McpToolDef> {
        self.tools.iter().map(|(_, t)| t.definition()).collect()
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Run a tool and package the outcome as a `tools/call` result. Every
    /// failure, unknown tools included, becomes an `isError` result.
    pub async fn call(&self, name: &str, args: Args) -> ToolCallResult {
        let outcome = match self.get(name) {
            Some(tool) => tool.call(args).await,
            None => Err(ToolError::NotFound(name.to_string())),
        };
        match outcome {
            Ok(value) => ToolCallResult {
                content: to_content(value),
                is_error: false,
            },
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool call failed");
                ToolCallResult::error(e.to_string())
            }
        }
    }
}

/// Strings are sent as-is and arrays become one text item per element;
/// anything else is sent as JSON text.
fn to_content(value: Value) -> Vec<ToolCallContent> {
    match value {
        Value::Array(items) => items.into_iter().map(value_text).map(ToolCallContent::text).collect(),
        other => vec![ToolCallContent::text(value_text(other))],
    }
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Argument helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub(crate) fn required_str<'a>(args: &'a Args, key: &str) -> Result<&'a str, ToolError> {
    match args.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ToolError::InvalidArgs(format!("'{key}' must be a string"))),
        None => Err(ToolError::InvalidArgs(format!("missing required argument '{key}'"))),
    }
}

/// Integers may arrive as numbers or numeric strings.
pub(crate) fn int_arg(args: &Args, key: &str) -> Result<Option<i64>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| ToolError::InvalidArgs(format!("'{key}' must be an integer"))),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ToolError::InvalidArgs(format!("'{key}' must be an integer"))),
        Some(_) => Err(ToolError::InvalidArgs(format!("'{key}' must be an integer"))),
    }
}

pub(crate) fn required_int(args: &Args, key: &str) -> Result<i64, ToolError> {
    int_arg(args, key)?
        .ok_or_else(|| ToolError::InvalidArgs(format!("missing required argument '{key}'")))
}

/// Default registry: every tool the research server exposes.
pub fn default_registry(
    store: crate::papers::PaperStore,
    source: Arc<dyn crate::arxiv::PaperSource>,
) -> ToolRegistry {
    let mut reg = ToolRegistry::new();
    reg.register(WeatherTool)
        .register(AddTool)
        .register(SearchPapersTool::new(store.clone(), source))
        .register(ExtractInfoTool::new(store));
    reg
}
