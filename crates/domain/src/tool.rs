use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Internal tool call format (provider-agnostic).
///
/// `arguments` is kept as the raw JSON text the model emitted; it is only
/// parsed when the call is dispatched so a malformed payload fails that one
/// call instead of the whole completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub call_id: String,
    pub tool_name: String,
    pub arguments: String,
}

impl ToolCall {
    pub fn new(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parse the wire arguments into a key/value mapping.
    ///
    /// An empty string is treated as `{}` (some models omit arguments for
    /// zero-parameter tools). Anything that is not a JSON object is rejected.
    pub fn parse_arguments(&self) -> Result<Map<String, Value>, ArgumentError> {
        let raw = self.arguments.trim();
        if raw.is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(raw)? {
            Value::Object(map) => Ok(map),
            other => Err(ArgumentError::NotAnObject(kind_of(&other))),
        }
    }
}

/// Why a tool call's arguments could not be used.
#[derive(thiserror::Error, Debug)]
pub enum ArgumentError {
    #[error("arguments are not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("arguments must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Tool definition exposed to the LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's parameters.
    pub parameters: Value,
}

/// A message in the conversation (provider-agnostic).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Option<String>,
    /// Tool calls requested by the model (assistant messages only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// The call this message answers (tool messages only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

// ── Convenience constructors ───────────────────────────────────────

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self::plain(Role::User, text)
    }
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, text)
    }

    /// An assistant turn that requests tool calls. Empty text becomes `None`.
    pub fn assistant_tool_calls(text: &str, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: (!text.is_empty()).then(|| text.to_string()),
            tool_calls,
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    fn plain(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(text.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// The text content, or `""` when the message carries none.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_object_arguments() {
        let tc = ToolCall::new("c1", "add", r#"{"a": 2, "b": 2}"#);
        let args = tc.parse_arguments().unwrap();
        assert_eq!(args.get("a"), Some(&Value::from(2)));
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn empty_arguments_are_an_empty_map() {
        let tc = ToolCall::new("c1", "ping", "  ");
        assert!(tc.parse_arguments().unwrap().is_empty());
    }

    #[test]
    fn malformed_arguments_are_rejected() {
        let tc = ToolCall::new("c1", "add", r#"{"a": 2,"#);
        assert!(matches!(tc.parse_arguments(), Err(ArgumentError::Malformed(_))));
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        let tc = ToolCall::new("c1", "add", "[1, 2]");
        let err = tc.parse_arguments().unwrap_err();
        assert_eq!(err.to_string(), "arguments must be a JSON object, got an array");
    }

    #[test]
    fn assistant_tool_call_message_drops_empty_text() {
        let msg = Message::assistant_tool_calls("", vec![ToolCall::new("c1", "add", "{}")]);
        assert_eq!(msg.content, None);
        assert_eq!(msg.tool_calls.len(), 1);
        assert_eq!(msg.text(), "");
    }

    #[test]
    fn tool_result_carries_call_id() {
        let msg = Message::tool_result("c7", "4");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("c7"));
        assert_eq!(msg.text(), "4");
    }
}
