//! walletchat binary entry point.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use walletchat::config::{Config, load_walletchat_env};
use walletchat::gateway::HttpGateway;
use walletchat::orchestrator::Orchestrator;
use walletchat::repl::Repl;
use walletchat::session::SessionIdentity;
use walletchat::state::{ConversationStore, WalletStore};

/// Chat with a wallet-management agent from the terminal.
#[derive(Debug, Parser)]
#[command(name = "walletchat", version, about)]
struct Cli {
    /// Send a single message and exit instead of starting the REPL.
    #[arg(short, long)]
    message: Option<String>,

    /// Override the backend agent base URL.
    #[arg(long)]
    backend_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `./.env` first, then `~/.walletchat/.env`; dotenvy never overwrites.
    let _ = dotenvy::dotenv();
    load_walletchat_env();

    // Logs go to stderr so the transcript on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("walletchat=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env().context("loading configuration")?;
    if let Some(backend_url) = cli.backend_url {
        config.backend_url = backend_url.trim_end_matches('/').to_string();
    }

    let identity = SessionIdentity::file_backed(&config.session_path);
    let session_id = identity
        .get_or_create()
        .context("resolving session identity")?;
    tracing::debug!(%session_id, backend_url = %config.backend_url, "starting walletchat");

    let gateway = Arc::new(HttpGateway::new(config.backend_url.clone()));
    let orchestrator = Arc::new(Orchestrator::new(
        gateway,
        ConversationStore::new(),
        WalletStore::new(),
        session_id,
    ));

    let mut repl = Repl::new(orchestrator, identity, config.explorer_tx_base.clone());
    if let Some(message) = cli.message {
        repl = repl.with_message(message);
    }
    repl.run().await.context("running chat surface")?;

    Ok(())
}
