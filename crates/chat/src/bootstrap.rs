//! Startup: read the server list, build the completion client, and connect
//! to every MCP server.

use std::sync::Arc;

use anyhow::Context;
use rc_domain::config::{Config, McpServersFile};
use rc_mcp_client::{Launcher, McpManager, StdioLauncher};
use rc_providers::{LlmProvider, OpenAiCompatProvider};

use crate::runtime::Chatbot;

/// Build a ready chatbot from the resolved configuration.
pub async fn build_chatbot(config: &Config) -> anyhow::Result<Chatbot> {
    let provider = OpenAiCompatProvider::from_config(&config.llm)
        .context("building completion client")?;
    tracing::debug!(
        base_url = %config.llm.base_url,
        model = %provider.default_model(),
        "completion client ready"
    );
    build_chatbot_with(config, Arc::new(provider), &StdioLauncher).await
}

/// Like [`build_chatbot`] with the provider and launcher supplied.
///
/// A missing or malformed server file is fatal; individual servers that
/// fail to start are skipped.
pub async fn build_chatbot_with(
    config: &Config,
    provider: Arc<dyn LlmProvider>,
    launcher: &dyn Launcher,
) -> anyhow::Result<Chatbot> {
    config.validate()?;

    let servers = McpServersFile::load(&config.servers_file)?;
    if servers.servers.is_empty() {
        tracing::warn!(path = %config.servers_file.display(), "no MCP servers configured");
    }

    let mut mcp = McpManager::empty();
    let report = mcp.connect_to_servers(&servers.servers, launcher).await;
    for (name, reason) in &report.failed {
        tracing::warn!(server = %name, reason = %reason, "server unavailable for this session");
    }
    for (name, reason) in &report.partial {
        tracing::warn!(server = %name, reason = %reason, "server only partially available");
    }

    Ok(Chatbot::new(provider, mcp, &config.chat))
}
