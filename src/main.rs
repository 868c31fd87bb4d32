use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mailbox_rtc::{init_logging, Config, Endpoint, HttpRelayClient, RelayServer, RelayState, Role};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "mailbox-rtc")]
#[command(about = "Two-party WebRTC sessions signaled through a mailbox relay", long_about = None)]
struct Cli {
    /// Relay base URL used by the endpoints
    #[arg(long, global = true)]
    relay_url: Option<String>,

    /// Address the relay binds to
    #[arg(long, global = true)]
    bind: Option<String>,

    /// Poll interval for empty mailboxes, in milliseconds
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,

    /// STUN/TURN server URL (repeatable, replaces the default)
    #[arg(long = "stun", global = true)]
    stun: Vec<String>,

    /// Debug logging for this crate
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay
    Relay,
    /// Create the offer and open the data channel
    Initiator,
    /// Wait for an offer and answer it
    Responder,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::default();
        if let Some(ref url) = self.relay_url {
            config.relay_url = url.clone();
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval_ms = ms;
        }
        if !self.stun.is_empty() {
            config.ice_servers = self.stun.clone();
        }
        if let Some(ref bind) = self.bind {
            config.bind_address = bind.clone();
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = cli.config();

    match cli.command {
        Commands::Relay => {
            let server = RelayServer::new(RelayState::new(), config.bind_address.clone());
            server.run().await?;
        }
        Commands::Initiator => run_endpoint(Role::Initiator, config).await?,
        Commands::Responder => run_endpoint(Role::Responder, config).await?,
    }

    Ok(())
}

async fn run_endpoint(role: Role, config: Config) -> Result<()> {
    let client = HttpRelayClient::new(&config.relay_url).context("Invalid relay URL")?;
    let cancel = CancellationToken::new();

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutting down");
            ctrl_c.cancel();
        }
    });

    Endpoint::new(role, config, Arc::new(client))
        .run(cancel)
        .await
        .with_context(|| format!("{} session failed", role))
}
