//! Chat runtime: the multi-round tool-calling loop.
//!
//! One [`Chatbot`] owns the completion endpoint and every MCP session.
//! [`Chatbot::process_query`] sends the conversation to the model, runs the
//! tool calls it asks for (one at a time, in order), feeds the results back,
//! and repeats until the model answers without tool calls or the round
//! limit is hit.

pub mod tools;

use std::sync::Arc;
use std::time::Duration;

use rc_domain::config::ChatConfig;
use rc_domain::error::{Error, Result};
use rc_domain::tool::Message;
use rc_mcp_client::McpManager;
use rc_providers::{ChatRequest, LlmProvider};

/// Returned in place of an answer when the round limit is exceeded.
pub const ROUND_LIMIT_MESSAGE: &str =
    "Reached the maximum number of tool-call rounds; please simplify your request.";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Loop state
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingCompletion,
    DispatchingTools,
    Done,
    RoundLimitExceeded,
}

impl LoopState {
    pub fn is_terminal(self) -> bool {
        matches!(self, LoopState::Done | LoopState::RoundLimitExceeded)
    }
}

/// Result of one query.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    /// Final assistant text, or [`ROUND_LIMIT_MESSAGE`].
    pub text: String,
    /// Always terminal.
    pub state: LoopState,
    /// Completion requests made.
    pub rounds: usize,
    /// The full conversation, starting with the user query.
    pub messages: Vec<Message>,
}

impl QueryOutcome {
    pub fn hit_round_limit(&self) -> bool {
        self.state == LoopState::RoundLimitExceeded
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Chatbot
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct Chatbot {
    provider: Arc<dyn LlmProvider>,
    pub(crate) mcp: McpManager,
    model: Option<String>,
    max_rounds: usize,
    turn_timeout: Option<Duration>,
}

impl Chatbot {
    pub fn new(provider: Arc<dyn LlmProvider>, mcp: McpManager, chat: &ChatConfig) -> Self {
        Self {
            provider,
            mcp,
            model: None,
            max_rounds: chat.max_rounds,
            turn_timeout: chat.turn_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Override the provider's default model for every request.
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn mcp(&self) -> &McpManager {
        &self.mcp
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// Answer one user query, running tool calls as the model requests them.
    ///
    /// A completion-endpoint failure aborts the query. Tool failures never
    /// do: they become tool-message content for the model to read.
    pub async fn process_query(&self, query: &str) -> Result<QueryOutcome> {
        match self.turn_timeout {
            None => self.run_loop(query).await,
            Some(limit) => tokio::time::timeout(limit, self.run_loop(query))
                .await
                .map_err(|_| {
                    tracing::warn!(timeout_secs = limit.as_secs(), "query timed out");
                    Error::Timeout(format!("query exceeded {}s", limit.as_secs()))
                })?,
        }
    }

    async fn run_loop(&self, query: &str) -> Result<QueryOutcome> {
        let mut messages = vec![Message::user(query)];
        let tools = self.mcp.catalog().definitions().to_vec();
        let mut state = LoopState::AwaitingCompletion;
        let mut round = 0;

        loop {
            round += 1;
            if round > self.max_rounds {
                transition(&mut state, LoopState::RoundLimitExceeded, round);
                tracing::warn!(max_rounds = self.max_rounds, "tool-call round limit reached");
                return Ok(QueryOutcome {
                    text: ROUND_LIMIT_MESSAGE.to_string(),
                    state,
                    rounds: self.max_rounds,
                    messages,
                });
            }

            transition(&mut state, LoopState::AwaitingCompletion, round);
            let req = ChatRequest {
                messages: messages.clone(),
                tools: tools.clone(),
                model: self.model.clone(),
            };
            let resp = self.provider.chat(&req).await?;

            if !resp.has_tool_calls() {
                messages.push(Message::assistant(resp.content.clone()));
                transition(&mut state, LoopState::Done, round);
                return Ok(QueryOutcome {
                    text: resp.content,
                    state,
                    rounds: round,
                    messages,
                });
            }

            transition(&mut state, LoopState::DispatchingTools, round);
            messages.push(Message::assistant_tool_calls(
                &resp.content,
                resp.tool_calls.clone(),
            ));

            for call in &resp.tool_calls {
                let result = tools::dispatch_tool(&self.mcp, call).await;
                messages.push(Message::tool_result(&call.call_id, result));
            }
        }
    }

    /// Close every MCP session.
    pub async fn shutdown(&self) {
        self.mcp.shutdown().await;
    }
}

fn transition(state: &mut LoopState, next: LoopState, round: usize) {
    tracing::debug!(round, from = ?*state, to = ?next, "loop state");
    *state = next;
}
