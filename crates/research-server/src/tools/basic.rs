//! Toy tools: integer addition and a canned weather report.

use rc_mcp_client::protocol::McpToolDef;
use serde_json::json;

use super::{required_int, required_str, Args, ServerTool};
use crate::types::{ToolError, ToolResult};

pub struct AddTool;

#[async_trait::async_trait]
impl ServerTool for AddTool {
    fn definition(&self) -> McpToolDef {
        McpToolDef {
            name: "add".into(),
            description: "Add two integers and return the sum.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "a": { "type": "integer", "description": "First integer" },
                    "b": { "type": "integer", "description": "Second integer" }
                },
                "required": ["a", "b"]
            }),
        }
    }

    async fn call(&self, args: Args) -> ToolResult {
        let a = required_int(&args, "a")?;
        let b = required_int(&args, "b")?;
        let sum = a
            .checked_add(b)
            .ok_or_else(|| ToolError::InvalidArgs("sum overflows a 64-bit integer".into()))?;
        Ok(json!(sum))
    }
}

pub struct WeatherTool;

#[async_trait::async_trait]
impl ServerTool for WeatherTool {
    fn definition(&self) -> McpToolDef {
        McpToolDef {
            name: "get_weather".into(),
            description: "Get the weather for a city.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "city": { "type": "string", "description": "City name" }
                },
                "required": ["city"]
            }),
        }
    }

    async fn call(&self, args: Args) -> ToolResult {
        let city = required_str(&args, "city")?;
        Ok(json!(format!("The weather in {city} is sunny, 18 degrees.")))
    }
}
