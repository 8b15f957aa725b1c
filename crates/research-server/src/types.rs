//! Result and error types shared by every tool handler.

use serde_json::Value;

/// Result type for tool handlers.
pub type ToolResult = Result<Value, ToolError>;

/// Errors a tool handler can return.
///
/// The server reports these to the client as a `tools/call` result with
/// `isError: true` and the message as text content.
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("unknown tool: {0}")]
    NotFound(String),
    #[error("arXiv request failed: {0}")]
    Upstream(String),
    #[error("paper cache: {0}")]
    Io(#[from] std::io::Error),
    #[error("paper cache: {0}")]
    Json(#[from] serde_json::Error),
}
