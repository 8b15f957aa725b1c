use clap::Parser;
use tracing_subscriber::EnvFilter;

use rc_chat::bootstrap;
use rc_chat::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Command::Version) = cli.command {
        println!("research-chat {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    init_cli_tracing();
    let (mut config, config_path) = cli::load_config()?;
    cli::apply_overrides(&mut config, &cli);
    tracing::debug!(config = %config_path, servers = %config.servers_file.display(), "configuration loaded");

    let bot = bootstrap::build_chatbot(&config).await?;

    let result = match &cli.command {
        None | Some(Command::Chat) => cli::chat::chat(&bot).await,
        Some(Command::Run { message }) => cli::run::run(&bot, message).await,
        Some(Command::Version) => Ok(()),
    };

    bot.shutdown().await;
    result
}

/// Compact, human-readable logs on stderr. `RUST_LOG` overrides the
/// default `warn` level.
fn init_cli_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
