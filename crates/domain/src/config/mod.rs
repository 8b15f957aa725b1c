mod mcp;

pub use mcp::*;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the `mcpServers` JSON file.
    #[serde(default = "d_servers_file")]
    pub servers_file: PathBuf,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            servers_file: d_servers_file(),
            llm: LlmConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Completion endpoint
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// OpenAI-compatible completion endpoint (OpenAI, Ollama, vLLM, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "d_base_url")]
    pub base_url: String,
    #[serde(default = "d_model")]
    pub model: String,
    /// Environment variable holding the API key. When unset (or the
    /// variable is empty) no `Authorization` header is sent, which is what
    /// local endpoints such as Ollama expect.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "d_120")]
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: d_base_url(),
            model: d_model(),
            api_key_env: None,
            request_timeout_secs: 120,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Chat loop
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Maximum completion rounds per query before giving up.
    #[serde(default = "d_20")]
    pub max_rounds: usize,
    /// Optional wall-clock limit for one query. `None` bounds queries by
    /// round count only.
    #[serde(default)]
    pub turn_timeout_secs: Option<u64>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_rounds: 20,
            turn_timeout_secs: None,
        }
    }
}

fn d_servers_file() -> PathBuf {
    PathBuf::from("server_config.json")
}
fn d_base_url() -> String {
    "http://127.0.0.1:11434/v1".into()
}
fn d_model() -> String {
    "qwen2.5:7b".into()
}
fn d_120() -> u64 {
    120
}
fn d_20() -> usize {
    20
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

impl Config {
    /// Reject values that would make the chat loop unusable.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.chat.max_rounds == 0 {
            return Err(crate::error::Error::Config(
                "chat.max_rounds must be at least 1".into(),
            ));
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(crate::error::Error::Config(
                "llm.base_url must not be empty".into(),
            ));
        }
        if self.chat.turn_timeout_secs == Some(0) {
            return Err(crate::error::Error::Config(
                "chat.turn_timeout_secs must be positive when set".into(),
            ));
        }
        Ok(())
    }
}
