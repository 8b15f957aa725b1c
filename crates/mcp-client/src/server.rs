//! One live MCP server session: the handshake plus typed wrappers for each
//! request the chat client issues.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::protocol::{
    self, GetPromptResult, InitializeResult, McpPromptDef, McpResourceDef, McpToolDef,
    PromptsListResult, ReadResourceResult, ResourcesListResult, ServerCapabilities,
    ToolCallResult, ToolsListResult,
};
use crate::transport::{McpTransport, TransportError};

/// An MCP server connection (one per configured server).
pub struct McpServer {
    /// Server name from config.
    name: String,
    /// Capabilities advertised in the `initialize` response.
    capabilities: ServerCapabilities,
    transport: Box<dyn McpTransport>,
}

impl std::fmt::Debug for McpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpServer")
            .field("name", &self.name)
            .field("alive", &self.transport.is_alive())
            .finish()
    }
}

impl McpServer {
    /// Perform the MCP handshake over an already-open transport:
    /// `initialize` request, then the `notifications/initialized`
    /// notification.
    pub async fn connect(
        name: impl Into<String>,
        transport: Box<dyn McpTransport>,
    ) -> Result<Self, McpError> {
        let name = name.into();

        let params = serde_json::to_value(protocol::initialize_params())
            .map_err(|e| McpError::Protocol(format!("failed to serialize initialize params: {e}")))?;

        let resp = transport.send_request("initialize", Some(params)).await?;
        let init: InitializeResult = decode("initialize", resp.into_result())?;

        tracing::debug!(
            server = %name,
            protocol_version = %init.protocol_version,
            "MCP initialize response received"
        );

        transport.send_notification("notifications/initialized").await?;

        Ok(Self {
            name,
            capabilities: init.capabilities,
            transport,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capabilities(&self) -> &ServerCapabilities {
        &self.capabilities
    }

    /// Check if the server's transport is still alive.
    pub fn is_alive(&self) -> bool {
        self.transport.is_alive()
    }

    pub async fn list_tools(&self) -> Result<Vec<McpToolDef>, McpError> {
        let r: ToolsListResult = self.request("tools/list", None).await?;
        Ok(r.tools)
    }

    pub async fn list_prompts(&self) -> Result<Vec<McpPromptDef>, McpError> {
        let r: PromptsListResult = self.request("prompts/list", None).await?;
        Ok(r.prompts)
    }

    pub async fn list_resources(&self) -> Result<Vec<McpResourceDef>, McpError> {
        let r: ResourcesListResult = self.request("resources/list", None).await?;
        Ok(r.resources)
    }

    /// Call a tool on this server.
    pub async fn call_tool(
        &self,
        tool_name: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolCallResult, McpError> {
        let params = serde_json::json!({
            "name": tool_name,
            "arguments": arguments,
        });
        self.request("tools/call", Some(params)).await
    }

    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult, McpError> {
        self.request("resources/read", Some(serde_json::json!({ "uri": uri })))
            .await
    }

    /// Materialize a prompt template. Argument values are strings on the
    /// wire regardless of the declared type.
    pub async fn get_prompt(
        &self,
        prompt_name: &str,
        arguments: &HashMap<String, String>,
    ) -> Result<GetPromptResult, McpError> {
        let params = serde_json::json!({
            "name": prompt_name,
            "arguments": arguments,
        });
        self.request("prompts/get", Some(params)).await
    }

    /// Gracefully shut down the server.
    pub async fn shutdown(&self) {
        tracing::info!(server = %self.name, "shutting down MCP server");
        self.transport.shutdown().await;
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<T, McpError> {
        if !self.transport.is_alive() {
            return Err(McpError::ServerDown(self.name.clone()));
        }
        let resp = self.transport.send_request(method, params).await?;
        decode(method, resp.into_result())
    }
}

fn decode<T: DeserializeOwned>(
    method: &str,
    result: Result<Value, protocol::JsonRpcError>,
) -> Result<T, McpError> {
    let value = result.map_err(|error| McpError::Rpc {
        method: method.to_string(),
        error,
    })?;
    serde_json::from_value(value)
        .map_err(|e| McpError::Protocol(format!("failed to parse {method} result: {e}")))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Error type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Errors specific to MCP operations.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    #[error("MCP transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("MCP protocol error: {0}")]
    Protocol(String),

    #[error("{method} failed: {error}")]
    Rpc {
        method: String,
        error: protocol::JsonRpcError,
    },

    #[error("MCP server is down: {0}")]
    ServerDown(String),
}

impl From<McpError> for rc_domain::error::Error {
    fn from(e: McpError) -> Self {
        rc_domain::error::Error::Mcp(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::JsonRpcError;
    use crate::testing::{method_not_found, MockTransport};
    use serde_json::json;

    #[tokio::test]
    async fn handshake_sends_initialize_then_notification() {
        let mock = MockTransport::new(|m, _| Err(method_not_found(m)));
        let log = mock.log();
        let server = McpServer::connect("research", Box::new(mock)).await.unwrap();
        assert_eq!(server.name(), "research");
        assert_eq!(log.methods(), ["initialize", "notifications/initialized"]);
        assert!(server.capabilities().prompts.is_some());
    }

    #[tokio::test]
    async fn rejected_handshake_is_an_error() {
        let mock = MockTransport::raw(|_, _| {
            Err(JsonRpcError {
                code: -32603,
                message: "boom".into(),
                data: None,
            })
        });
        let err = McpServer::connect("bad", Box::new(mock)).await.unwrap_err();
        assert!(matches!(err, McpError::Rpc { ref method, .. } if method == "initialize"));
    }

    #[tokio::test]
    async fn call_tool_sends_name_and_arguments() {
        let mock = MockTransport::with_tools(json!([{ "name": "add" }]), |_, args| {
            (args["a"].as_i64().unwrap_or(0) + args["b"].as_i64().unwrap_or(0)).to_string()
        });
        let log = mock.log();
        let server = McpServer::connect("math", Box::new(mock)).await.unwrap();

        let mut args = Map::new();
        args.insert("a".into(), json!(2));
        args.insert("b".into(), json!(2));
        let result = server.call_tool("add", args).await.unwrap();

        assert_eq!(result.joined_text(), "4");
        let call = log.calls().pop().unwrap();
        assert_eq!(call.method, "tools/call");
        assert_eq!(call.params.unwrap()["name"], "add");
    }

    #[tokio::test]
    async fn get_prompt_passes_string_arguments() {
        let mock = MockTransport::new(|method, params| match method {
            "prompts/get" => {
                let topic = params.and_then(|p| p["arguments"]["topic"].as_str()).unwrap_or("");
                Ok(json!({
                    "messages": [{ "role": "user", "content": { "type": "text", "text": format!("about {topic}") } }]
                }))
            }
            other => Err(method_not_found(other)),
        });
        let server = McpServer::connect("p", Box::new(mock)).await.unwrap();
        let args = HashMap::from([("topic".to_string(), "transformers".to_string())]);
        let result = server.get_prompt("generate_search_prompt", &args).await.unwrap();
        let text = result.messages.into_iter().next().unwrap().content.into_text();
        assert_eq!(text, "about transformers");
    }

    #[tokio::test]
    async fn requests_after_shutdown_fail_fast() {
        let mock = MockTransport::new(|m, _| Err(method_not_found(m)));
        let server = McpServer::connect("s", Box::new(mock)).await.unwrap();
        server.shutdown().await;
        assert!(!server.is_alive());
        let err = server.list_tools().await.unwrap_err();
        assert!(matches!(err, McpError::ServerDown(name) if name == "s"));
    }

    #[tokio::test]
    async fn malformed_result_is_a_protocol_error() {
        let mock = MockTransport::new(|_, _| Ok(json!({ "tools": "not a list" })));
        let server = McpServer::connect("s", Box::new(mock)).await.unwrap();
        let err = server.list_tools().await.unwrap_err();
        assert!(matches!(err, McpError::Protocol(_)));
    }
}
