//! Shared fakes for chat integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rc_domain::config::ChatConfig;
use rc_domain::error::Result;
use rc_domain::tool::ToolCall;
use rc_mcp_client::testing::MockTransport;
use rc_mcp_client::{McpManager, McpServer};
use rc_providers::{ChatRequest, ChatResponse, LlmProvider};
use rc_chat::Chatbot;

type Script = dyn Fn(usize, &ChatRequest) -> Result<ChatResponse> + Send + Sync;

/// Completion endpoint whose replies come from a closure of
/// `(call_index, request)`. Every request is recorded.
pub struct ScriptedProvider {
    script: Box<Script>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new<F>(script: F) -> Arc<Self>
    where
        F: Fn(usize, &ChatRequest) -> Result<ChatResponse> + Send + Sync + 'static,
    {
        Arc::new(Self {
            script: Box::new(script),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Replies in order; the last reply repeats once the list runs out.
    pub fn sequence(replies: Vec<ChatResponse>) -> Arc<Self> {
        Self::new(move |idx, _| Ok(replies[idx.min(replies.len() - 1)].clone()))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        let idx = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(req.clone());
        (self.script)(idx, req)
    }

    fn provider_id(&self) -> &str {
        "scripted"
    }
}

pub fn text(content: &str) -> ChatResponse {
    ChatResponse {
        content: content.into(),
        finish_reason: Some("stop".into()),
        model: "scripted".into(),
        ..Default::default()
    }
}

/// A reply asking for the given `(call_id, tool, raw_arguments)` calls.
pub fn tool_calls(calls: &[(&str, &str, &str)]) -> ChatResponse {
    ChatResponse {
        tool_calls: calls
            .iter()
            .map(|(id, name, args)| ToolCall::new(*id, *name, *args))
            .collect(),
        finish_reason: Some("tool_calls".into()),
        model: "scripted".into(),
        ..Default::default()
    }
}

/// A session exposing `add(a, b)` and `get_weather(city)`.
pub fn math_server() -> MockTransport {
    MockTransport::with_tools(
        serde_json::json!([
            { "name": "add", "description": "Add two integers",
              "inputSchema": { "type": "object", "properties": { "a": {}, "b": {} } } },
            { "name": "get_weather", "description": "Weather for a city" }
        ]),
        |tool, args| match tool {
            "add" => (args["a"].as_i64().unwrap_or(0) + args["b"].as_i64().unwrap_or(0)).to_string(),
            _ => format!("The weather in {} is sunny", args["city"].as_str().unwrap_or("?")),
        },
    )
}

pub async fn manager_with(sessions: Vec<(&str, MockTransport)>) -> McpManager {
    let mut mgr = McpManager::empty();
    for (name, transport) in sessions {
        let server = McpServer::connect(name, Box::new(transport)).await.unwrap();
        mgr.add_session(server).await.unwrap();
    }
    mgr
}

pub fn chat_config(max_rounds: usize) -> ChatConfig {
    ChatConfig {
        max_rounds,
        turn_timeout_secs: None,
    }
}

pub fn chatbot(provider: Arc<ScriptedProvider>, mcp: McpManager, max_rounds: usize) -> Chatbot {
    Chatbot::new(provider, mcp, &chat_config(max_rounds))
}
