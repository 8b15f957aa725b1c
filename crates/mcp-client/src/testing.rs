//! In-memory transport for tests (enabled by the `test-util` feature).
//!
//! A [`MockTransport`] answers each request by calling a handler closure with
//! the method and params, and records every exchange so tests can assert on
//! call order.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::protocol::{JsonRpcError, JsonRpcResponse, METHOD_NOT_FOUND};
use crate::transport::{McpTransport, TransportError};

type Handler = dyn Fn(&str, Option<&Value>) -> Result<Value, JsonRpcError> + Send + Sync;

/// One recorded request or notification.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: String,
    pub params: Option<Value>,
}

/// Shared view of the calls a [`MockTransport`] has seen. Survives the
/// transport being boxed and moved into a session.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<RecordedCall>>>);

impl CallLog {
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.0.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.method).collect()
    }

    fn push(&self, method: &str, params: Option<Value>) {
        if let Ok(mut calls) = self.0.lock() {
            calls.push(RecordedCall {
                method: method.to_string(),
                params,
            });
        }
    }
}

pub struct MockTransport {
    handler: Box<Handler>,
    log: CallLog,
    next_id: AtomicU64,
    alive: AtomicBool,
}

impl MockTransport {
    /// A transport whose server answers `initialize` (advertising tools,
    /// prompts and resources) and delegates everything else to `handler`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str, Option<&Value>) -> Result<Value, JsonRpcError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(move |method, params| match method {
                "initialize" => Ok(json!({
                    "protocolVersion": crate::protocol::PROTOCOL_VERSION,
                    "capabilities": { "tools": {}, "prompts": {}, "resources": {} },
                    "serverInfo": { "name": "mock", "version": "0.0.0" }
                })),
                _ => handler(method, params),
            }),
            log: CallLog::default(),
            next_id: AtomicU64::new(1),
            alive: AtomicBool::new(true),
        }
    }

    /// A transport with a fully custom handler, `initialize` included.
    pub fn raw<F>(handler: F) -> Self
    where
        F: Fn(&str, Option<&Value>) -> Result<Value, JsonRpcError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            log: CallLog::default(),
            next_id: AtomicU64::new(1),
            alive: AtomicBool::new(true),
        }
    }

    /// A server that exposes the given tools, each answering with
    /// `reply(tool, arguments)`, and no prompts or resources.
    pub fn with_tools<F>(tools: Value, reply: F) -> Self
    where
        F: Fn(&str, &Value) -> String + Send + Sync + 'static,
    {
        Self::new(move |method, params| match method {
            "tools/list" => Ok(json!({ "tools": tools.clone() })),
            "prompts/list" => Ok(json!({ "prompts": [] })),
            "resources/list" => Ok(json!({ "resources": [] })),
            "tools/call" => {
                let params = params.cloned().unwrap_or(Value::Null);
                let name = params["name"].as_str().unwrap_or_default().to_string();
                let text = reply(&name, &params["arguments"]);
                Ok(json!({ "content": [{ "type": "text", "text": text }] }))
            }
            other => Err(method_not_found(other)),
        })
    }

    /// Handle to the call log; clone it before boxing the transport.
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

pub fn method_not_found(method: &str) -> JsonRpcError {
    JsonRpcError {
        code: METHOD_NOT_FOUND,
        message: format!("method not found: {method}"),
        data: None,
    }
}

#[async_trait]
impl McpTransport for MockTransport {
    async fn send_request(&self, method: &str, params: Option<Value>) -> Result<JsonRpcResponse, TransportError> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(TransportError::ProcessExited);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let reply = (self.handler)(method, params.as_ref());
        self.log.push(method, params);
        Ok(match reply {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => JsonRpcResponse {
                jsonrpc: "2.0".into(),
                id,
                result: None,
                error: Some(err),
            },
        })
    }

    async fn send_notification(&self, method: &str) -> Result<(), TransportError> {
        self.log.push(method, None);
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    async fn shutdown(&self) {
        self.alive.store(false, Ordering::SeqCst);
        self.log.push("shutdown", None);
    }
}
