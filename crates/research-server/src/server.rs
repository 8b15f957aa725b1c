//! JSON-RPC dispatch and the stdio serve loop.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rc_mcp_client::protocol::{
    Implementation, InitializeResult, JsonRpcIncoming, JsonRpcResponse, ServerCapabilities,
    ToolCallResult, INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND, PROTOCOL_VERSION,
};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::arxiv::{ArxivClient, PaperSource, ARXIV_API_URL};
use crate::papers::PaperStore;
use crate::tools::{default_registry, Args, ToolRegistry};
use crate::types::ToolError;
use crate::{prompts, resources};

pub const SERVER_NAME: &str = "research";

/// Server settings, taken from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Root of the paper cache. `PAPER_DIR`, default `papers`.
    pub paper_dir: PathBuf,
    pub arxiv_url: String,
    pub arxiv_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            paper_dir: PathBuf::from("papers"),
            arxiv_url: ARXIV_API_URL.into(),
            arxiv_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var("PAPER_DIR") {
            if !dir.trim().is_empty() {
                config.paper_dir = PathBuf::from(dir);
            }
        }
        config
    }
}

pub struct ResearchServer {
    store: PaperStore,
    tools: ToolRegistry,
}

impl ResearchServer {
    pub fn new(store: PaperStore, source: Arc<dyn PaperSource>) -> Self {
        let tools = default_registry(store.clone(), source);
        Self { store, tools }
    }

    /// Server backed by the live arXiv API.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ToolError> {
        let source = ArxivClient::new(config.arxiv_url.clone(), config.arxiv_timeout)?;
        Ok(Self::new(PaperStore::new(config.paper_dir.clone()), Arc::new(source)))
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Read newline-delimited JSON-RPC from `reader` and answer on `writer`
    /// until EOF. Lines that are not valid JSON-RPC are logged and dropped.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let msg: JsonRpcIncoming = match serde_json::from_str(line) {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!(error = %e, "dropping malformed message");
                    continue;
                }
            };
            if let Some(resp) = self.handle(msg).await {
                let mut out = serde_json::to_vec(&resp)?;
                out.push(b'\n');
                writer.write_all(&out).await?;
                writer.flush().await?;
            }
        }
        tracing::info!("input closed, shutting down");
        Ok(())
    }

    /// Answer one message. Notifications get no response.
    pub async fn handle(&self, msg: JsonRpcIncoming) -> Option<JsonRpcResponse> {
        let Some(id) = msg.id else {
            tracing::debug!(method = %msg.method, "notification");
            return None;
        };
        tracing::debug!(id, method = %msg.method, "request");
        let params = msg.params.unwrap_or(Value::Null);

        let resp = match msg.method.as_str() {
            "initialize" => reply(id, &initialize_result()),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => reply(id, &json!({ "tools": self.tools.definitions() })),
            "tools/call" => self.call_tool(id, &params).await,
            "resources/list" => reply(id, &json!({ "resources": resources::list() })),
            "resources/templates/list" => {
                reply(id, &json!({ "resourceTemplates": resources::templates() }))
            }
            "resources/read" => self.read_resource(id, &params),
            "prompts/list" => reply(id, &json!({ "prompts": prompts::list() })),
            "prompts/get" => get_prompt(id, &params),
            other => {
                tracing::debug!(method = other, "method not found");
                JsonRpcResponse::failure(id, METHOD_NOT_FOUND, format!("method not found: {other}"))
            }
        };
        Some(resp)
    }

    async fn call_tool(&self, id: u64, params: &Value) -> JsonRpcResponse {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return JsonRpcResponse::failure(id, INVALID_PARAMS, "missing tool name");
        };
        let args = match params.get("arguments") {
            None | Some(Value::Null) => Args::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => {
                let err = ToolError::InvalidArgs("arguments must be an object".into());
                return reply(id, &ToolCallResult::error(err.to_string()));
            }
        };
        tracing::info!(tool = name, "tool call");
        reply(id, &self.tools.call(name, args).await)
    }

    fn read_resource(&self, id: u64, params: &Value) -> JsonRpcResponse {
        let Some(uri) = params.get("uri").and_then(Value::as_str) else {
            return JsonRpcResponse::failure(id, INVALID_PARAMS, "missing resource uri");
        };
        match resources::read(&self.store, uri) {
            Ok(Some(contents)) => reply(id, &json!({ "contents": [contents] })),
            Ok(None) => JsonRpcResponse::failure(id, INVALID_PARAMS, format!("unknown resource: {uri}")),
            Err(e) => {
                tracing::warn!(uri, error = %e, "resource read failed");
                JsonRpcResponse::failure(id, INTERNAL_ERROR, e.to_string())
            }
        }
    }
}

fn get_prompt(id: u64, params: &Value) -> JsonRpcResponse {
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return JsonRpcResponse::failure(id, INVALID_PARAMS, "missing prompt name");
    };
    // Clients should send strings; other scalars are accepted as their JSON text.
    let args: HashMap<String, String> = params
        .get("arguments")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .map(|(k, v)| {
                    let v = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), v)
                })
                .collect()
        })
        .unwrap_or_default();

    match prompts::get(name, &args) {
        Ok(result) => reply(id, &result),
        Err(e) => JsonRpcResponse::failure(id, INVALID_PARAMS, e.to_string()),
    }
}

fn initialize_result() -> InitializeResult {
    InitializeResult {
        protocol_version: PROTOCOL_VERSION.into(),
        capabilities: ServerCapabilities {
            tools: Some(json!({})),
            prompts: Some(json!({})),
            resources: Some(json!({})),
        },
        server_info: Some(Implementation {
            name: SERVER_NAME.into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }),
    }
}

fn reply<T: Serialize>(id: u64, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::failure(id, INTERNAL_ERROR, e.to_string()),
    }
}
