//! Tool dispatch: routes one model tool call to the MCP session that owns
//! the tool and turns the outcome into tool-message text.

use rc_domain::tool::ToolCall;
use rc_mcp_client::protocol::ToolCallResult;
use rc_mcp_client::McpManager;

/// Dispatch a single tool call. Never fails: every problem is reported to
/// the model as `Error: ...` text.
pub async fn dispatch_tool(mcp: &McpManager, call: &ToolCall) -> String {
    let args = match call.parse_arguments() {
        Ok(args) => args,
        Err(e) => {
            tracing::warn!(tool = %call.tool_name, error = %e, "rejecting tool call");
            return format!("Error: invalid arguments for tool '{}': {e}", call.tool_name);
        }
    };

    let Some(session) = mcp.tool_session(&call.tool_name) else {
        tracing::warn!(tool = %call.tool_name, "model requested unknown tool");
        return format!("Error: tool '{}' not found", call.tool_name);
    };

    tracing::info!(
        tool = %call.tool_name,
        server = %session.name(),
        call_id = %call.call_id,
        "calling tool"
    );

    match session.call_tool(&call.tool_name, args).await {
        Ok(result) => stringify_result(&result),
        Err(e) => {
            tracing::warn!(tool = %call.tool_name, error = %e, "tool call failed");
            format!("Error: {e}")
        }
    }
}

/// Text content joined by newlines; `isError` results get an `Error: `
/// prefix.
pub fn stringify_result(result: &ToolCallResult) -> String {
    let text = result.joined_text();
    if result.is_error {
        format!("Error: {text}")
    } else {
        text
    }
}
