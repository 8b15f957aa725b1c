use rc_research_server::{ResearchServer, ServerConfig};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout is the protocol channel; logs go to stderr only.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .compact()
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(paper_dir = %config.paper_dir.display(), "research server starting");

    let server = ResearchServer::from_config(&config)?;
    server
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;
    Ok(())
}
