//! Run command handler

use anyhow::{Context, Result};
use colored::*;
use recon_client::BackendClient;
use recon_core::domain::pipeline::PipelineDefinition;
use recon_core::domain::target::Target;
use std::sync::Arc;
use uuid::Uuid;

use super::colorize_status;
use crate::config::Config;
use crate::repository::{
    FileRunStateStore, HttpConsolidator, HttpScanRepository, InMemoryRunStateStore, RunStateStore,
};
use crate::scheduler::{PipelineRunner, RunSummary, RunnerPorts, RunnerSettings, StepOutcome};
use crate::service::{NoopObserver, ScanObserver, TracingObserver};

/// Flags of the run command
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub resume: bool,
    pub ephemeral: bool,
    pub quiet: bool,
}

/// Runs the full pipeline and prints a per-step summary
pub async fn run_pipeline(
    config: &Config,
    target_id: Uuid,
    domain: String,
    options: RunOptions,
) -> Result<()> {
    let http = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .context("Failed to build HTTP client")?;
    let client = Arc::new(BackendClient::with_client(config.backend_url.clone(), http));

    let ports = RunnerPorts {
        scans: Arc::new(HttpScanRepository::new(Arc::clone(&client))),
        consolidator: Arc::new(HttpConsolidator::new(client)),
        store: state_store(config, options),
        observer: observer(options),
    };

    let runner = PipelineRunner::new(
        PipelineDefinition::recon(),
        ports,
        config.budget,
        RunnerSettings::from(config),
    );

    let target = Target::new(target_id, domain);
    let summary = runner.run(&target, options.resume).await;

    print_summary(&target, &summary);

    Ok(())
}

fn state_store(config: &Config, options: RunOptions) -> Arc<dyn RunStateStore> {
    if options.ephemeral {
        Arc::new(InMemoryRunStateStore::new())
    } else {
        Arc::new(FileRunStateStore::new(config.state_dir.clone()))
    }
}

fn observer(options: RunOptions) -> Arc<dyn ScanObserver> {
    if options.quiet {
        Arc::new(NoopObserver)
    } else {
        Arc::new(TracingObserver)
    }
}

fn print_summary(target: &Target, summary: &RunSummary) {
    println!();
    println!("{}", format!("Pipeline run for {}", target.domain).bold());
    if let Some(step) = summary.resumed_from {
        println!("  Resumed at: {}", step.to_string().cyan());
    }
    println!("{}", "─".repeat(60).dimmed());

    for step in &summary.steps {
        let detail = match &step.outcome {
            StepOutcome::Finished { scan_id, status } => {
                format!("{} {}", colorize_status(*status), scan_id.to_string().dimmed())
            }
            StepOutcome::Consolidated {
                subdomains,
                live_web_servers,
            } => format!(
                "{} {} subdomains, {} live web servers",
                "consolidated".green(),
                subdomains,
                live_web_servers
            ),
            StepOutcome::Failed(message) => format!("{} {}", "failed".red(), message),
        };
        println!("  {:<26} {}", step.name.to_string(), detail);
    }

    println!("{}", "─".repeat(60).dimmed());
    let totals = format!(
        "{} succeeded, {} failed",
        summary.succeeded(),
        summary.failed()
    );
    if summary.failed() == 0 {
        println!("{}", totals.green());
    } else {
        println!("{}", totals.yellow());
    }
}
