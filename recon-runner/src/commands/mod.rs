//! Commands module
//!
//! Defines the operator commands and routes them to their handlers.

mod run;
mod status;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use recon_core::domain::job::JobStatus;
use uuid::Uuid;

use crate::config::Config;

/// Top-level commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the recon pipeline against a target
    Run {
        /// Scope target ID known to the backend
        #[arg(long)]
        target_id: Uuid,

        /// Target domain (wildcards like *.example.com are accepted)
        #[arg(long)]
        domain: String,

        /// Continue from the step a previous run stopped at
        #[arg(long)]
        resume: bool,

        /// Keep run state in memory only (nothing is written to the state dir)
        #[arg(long, conflicts_with = "resume")]
        ephemeral: bool,

        /// Do not log per-scan progress, only print the summary
        #[arg(short, long)]
        quiet: bool,
    },
    /// Show the stored progress of a target's run
    Status {
        /// Scope target ID
        #[arg(long)]
        target_id: Uuid,
    },
    /// List the pipeline steps in order
    Steps,
}

/// Handle a command
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Run {
            target_id,
            domain,
            resume,
            ephemeral,
            quiet,
        } => {
            let options = run::RunOptions {
                resume,
                ephemeral,
                quiet,
            };
            run::run_pipeline(config, target_id, domain, options).await
        }
        Commands::Status { target_id } => status::show_status(config, target_id).await,
        Commands::Steps => {
            status::list_steps();
            Ok(())
        }
    }
}

/// Colorize a scan status for terminal output
fn colorize_status(status: JobStatus) -> ColoredString {
    let status_str = status.as_str();
    match status {
        JobStatus::Pending | JobStatus::Processing => status_str.yellow(),
        JobStatus::Completed | JobStatus::Success => status_str.green(),
        JobStatus::Failed | JobStatus::Error => status_str.red(),
        JobStatus::Timeout | JobStatus::HardTimeout | JobStatus::AbsoluteTimeout => {
            status_str.magenta()
        }
        JobStatus::NoScans | JobStatus::PersistentError => status_str.red(),
        JobStatus::Unknown => status_str.dimmed(),
    }
}
