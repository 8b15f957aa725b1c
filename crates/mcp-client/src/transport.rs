//! MCP transport layer.
//!
//! Every session talks newline-delimited JSON-RPC. [`JsonLines`] owns that
//! framing over any async byte pipe; [`StdioTransport`] pairs it with a
//! spawned child process.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

use crate::protocol::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use rc_domain::config::McpServerConfig;

/// How long a single request may wait for its response.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Grace period between closing a child's stdin and killing it.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Non-JSON stdout lines tolerated before the server is declared broken.
const MAX_SKIP_LINES: usize = 1000;

#[async_trait]
pub trait McpTransport: Send + Sync {
    /// Send a request and wait for the response carrying the same id.
    async fn send_request(&self, method: &str, params: Option<Value>) -> Result<JsonRpcResponse, TransportError>;

    /// Fire-and-forget notification.
    async fn send_notification(&self, method: &str) -> Result<(), TransportError>;

    fn is_alive(&self) -> bool;

    async fn shutdown(&self);
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MCP server process has exited")]
    ProcessExited,

    #[error("timeout waiting for response")]
    Timeout,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Line framing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One JSON-RPC message per line over a reader/writer pair.
///
/// `exchange` holds an internal lock for the whole write-then-read cycle,
/// so concurrent callers can never pick up each other's responses.
pub struct JsonLines<R, W> {
    server: String,
    reader: Mutex<R>,
    writer: Mutex<W>,
    exchange_lock: Mutex<()>,
    next_id: AtomicU64,
    alive: AtomicBool,
    timeout: Duration,
}

impl<R, W> JsonLines<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(server: impl Into<String>, reader: R, writer: W) -> Self {
        Self {
            server: server.into(),
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            exchange_lock: Mutex::new(()),
            next_id: AtomicU64::new(1),
            alive: AtomicBool::new(true),
            timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Send a request and read until the matching response arrives.
    /// Notifications, responses to other ids and stray log output are
    /// skipped.
    pub async fn exchange(&self, method: &str, params: Option<Value>) -> Result<JsonRpcResponse, TransportError> {
        let _guard = self.exchange_lock.lock().await;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(server = %self.server, id, method, "sending MCP request");
        self.write(&JsonRpcRequest::new(id, method, params)).await?;

        tokio::time::timeout(self.timeout, self.read_response(id))
            .await
            .map_err(|_| TransportError::Timeout)?
    }

    async fn read_response(&self, id: u64) -> Result<JsonRpcResponse, TransportError> {
        loop {
            let line = self.read_json_line().await?;
            match serde_json::from_str::<JsonRpcResponse>(&line) {
                Ok(resp) if resp.id == id => return Ok(resp),
                Ok(resp) => {
                    tracing::debug!(server = %self.server, expected = id, got = resp.id, "ignoring response for another request");
                }
                Err(_) => {
                    tracing::debug!(server = %self.server, line = %line, "ignoring non-response message");
                }
            }
        }
    }

    pub async fn notify(&self, method: &str) -> Result<(), TransportError> {
        tracing::debug!(server = %self.server, method, "sending MCP notification");
        self.write(&JsonRpcNotification::new(method)).await
    }

    /// Flush and close the write half.
    pub async fn close(&self) {
        self.mark_dead();
        if let Err(e) = self.writer.lock().await.shutdown().await {
            tracing::debug!(server = %self.server, error = %e, "error closing MCP server input");
        }
    }

    async fn write<T: Serialize>(&self, msg: &T) -> Result<(), TransportError> {
        if !self.is_alive() {
            return Err(TransportError::ProcessExited);
        }
        let mut line = serde_json::to_vec(msg)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Next line that looks like a JSON object. EOF marks the peer dead.
    async fn read_json_line(&self) -> Result<String, TransportError> {
        if !self.is_alive() {
            return Err(TransportError::ProcessExited);
        }

        let mut reader = self.reader.lock().await;
        let mut skipped = 0usize;
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                self.mark_dead();
                return Err(TransportError::ProcessExited);
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('{') {
                return Ok(trimmed.to_string());
            }
            skipped += 1;
            if skipped >= MAX_SKIP_LINES {
                self.mark_dead();
                return Err(TransportError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "MCP server produced too many non-JSON lines on stdout",
                )));
            }
            tracing::debug!(server = %self.server, line = %trimmed, "skipping non-JSON stdout line");
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Stdio transport
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A child process speaking MCP on its stdin/stdout. Its stderr is
/// relayed into the log at debug level.
pub struct StdioTransport {
    lines: JsonLines<BufReader<ChildStdout>, ChildStdin>,
    child: Mutex<Child>,
}

/// The command line for one configured server. Configured `env` entries
/// are added on top of the inherited environment.
pub fn server_command(config: &McpServerConfig) -> Command {
    let mut cmd = Command::new(&config.command);
    cmd.args(&config.args)
        .envs(&config.env)
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .kill_on_drop(true);
    cmd
}

impl StdioTransport {
    /// Spawn the server process. It is killed if the transport is dropped
    /// without a [`shutdown`](McpTransport::shutdown).
    pub fn spawn(config: &McpServerConfig) -> Result<Self, TransportError> {
        let mut child = server_command(config).spawn()?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "failed to capture child stdio",
            )));
        };
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(config.name.clone(), stderr));
        }

        Ok(Self {
            lines: JsonLines::new(config.name.clone(), BufReader::new(stdout), stdin),
            child: Mutex::new(child),
        })
    }
}

async fn forward_stderr(server: String, stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        tracing::debug!(server = %server, "{line}");
    }
}

#[async_trait]
impl McpTransport for StdioTransport {
    async fn send_request(&self, method: &str, params: Option<Value>) -> Result<JsonRpcResponse, TransportError> {
        self.lines.exchange(method, params).await
    }

    async fn send_notification(&self, method: &str) -> Result<(), TransportError> {
        self.lines.notify(method).await
    }

    fn is_alive(&self) -> bool {
        self.lines.is_alive()
    }

    async fn shutdown(&self) {
        let server = &self.lines.server;
        self.lines.close().await;

        let mut child = self.child.lock().await;
        match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
            Ok(Ok(status)) => tracing::debug!(server = %server, ?status, "MCP server process exited"),
            Ok(Err(e)) => tracing::warn!(server = %server, error = %e, "error waiting for MCP server process"),
            Err(_) => {
                tracing::warn!(server = %server, "MCP server did not exit in time, killing");
                if let Err(e) = child.kill().await {
                    tracing::warn!(server = %server, error = %e, "failed to kill MCP server process");
                }
            }
        }
    }
}
