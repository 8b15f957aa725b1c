//! Tool catalog: the ordered tool list handed to the completion endpoint.

use rc_domain::tool::ToolDefinition;

use crate::protocol::McpToolDef;

impl From<McpToolDef> for ToolDefinition {
    fn from(tool: McpToolDef) -> Self {
        ToolDefinition {
            name: tool.name,
            description: tool.description,
            parameters: tool.input_schema,
        }
    }
}

/// Tools across every connected server, in discovery order.
///
/// Names are unique: inserting a name that already exists replaces the old
/// definition in place.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: Vec<ToolDefinition>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. Returns `true` when an existing entry was replaced.
    pub fn insert(&mut self, tool: ToolDefinition) -> bool {
        match self.tools.iter_mut().find(|t| t.name == tool.name) {
            Some(existing) => {
                tracing::warn!(tool = %tool.name, "duplicate tool name, replacing earlier definition");
                *existing = tool;
                true
            }
            None => {
                self.tools.push(tool);
                false
            }
        }
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
