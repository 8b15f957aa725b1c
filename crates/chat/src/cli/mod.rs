pub mod chat;
pub mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rc_domain::config::Config;

/// research-chat: chat with a model that can use MCP tools.
#[derive(Debug, Parser)]
#[command(name = "research-chat", version, about)]
pub struct Cli {
    /// Model override (e.g. "qwen2.5:7b").
    #[arg(long, global = true)]
    pub model: Option<String>,
    /// Path to the `mcpServers` JSON file.
    #[arg(long, global = true)]
    pub servers: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive chat (default when no subcommand is given).
    Chat,
    /// Send a single message and print the answer.
    Run {
        /// The message to send.
        message: String,
    },
    /// Print version information.
    Version,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path specified by `RC_CONFIG` (or
/// `research-chat.toml` by default). A missing file means defaults.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path =
        std::env::var("RC_CONFIG").unwrap_or_else(|_| "research-chat.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        Config::default()
    };

    Ok((config, config_path))
}

/// Apply command-line flags on top of the file configuration.
pub fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(model) = &cli.model {
        config.llm.model = model.clone();
    }
    if let Some(servers) = &cli.servers {
        config.servers_file = servers.clone();
    }
}
