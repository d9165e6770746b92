//! Recon Runner binary
//!
//! Command-line entry point: runs the pipeline against a target, or reports
//! the stored progress of an earlier run.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recon_runner::commands::{Commands, handle_command};
use recon_runner::config::Config;

#[derive(Parser)]
#[command(name = "recon-runner")]
#[command(about = "Recon pipeline runner", long_about = None)]
struct Cli {
    /// Backend URL (overrides RECON_BACKEND_URL)
    #[arg(long, env = "RECON_BACKEND_URL")]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recon_runner=info,recon_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(url) = cli.backend_url {
        config.backend_url = url;
    }
    config.validate().context("Invalid configuration")?;

    debug!(
        "Loaded configuration: backend_url={}, state_dir={}",
        config.backend_url,
        config.state_dir.display()
    );

    handle_command(cli.command, &config).await
}
