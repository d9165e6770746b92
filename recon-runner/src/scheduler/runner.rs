//! Pipeline runner
//!
//! Runs the steps of a definition strictly in order. A tool step is
//! launch, watch, settle, refresh; a consolidation step is settle, merge,
//! re-read aggregates. Nothing a step does can stop the run: errors are
//! logged at the step boundary and the runner moves on.

use anyhow::Result;
use recon_core::domain::job::JobStatus;
use recon_core::domain::pipeline::{PipelineDefinition, PipelineRunState, Step, StepKind, StepName};
use recon_core::domain::target::Target;
use recon_core::domain::tool::Tool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::{Config, WatchBudget};
use crate::repository::{Consolidator, RunStateStore, ScanRepository};
use crate::service::{CompletionWatcher, JobLauncher, ResultRefresher, ScanObserver};

/// Fixed pauses between the phases of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerSettings {
    /// After a watch resolves, before results are re-read
    pub settle_delay: Duration,
    /// Before a consolidation merges results
    pub consolidation_settle_delay: Duration,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(2),
            consolidation_settle_delay: Duration::from_secs(2),
        }
    }
}

impl From<&Config> for RunnerSettings {
    fn from(config: &Config) -> Self {
        Self {
            settle_delay: config.settle_delay,
            consolidation_settle_delay: config.consolidation_settle_delay,
        }
    }
}

/// Collaborators a runner talks to
pub struct RunnerPorts {
    pub scans: Arc<dyn ScanRepository>,
    pub consolidator: Arc<dyn Consolidator>,
    pub store: Arc<dyn RunStateStore>,
    pub observer: Arc<dyn ScanObserver>,
}

/// How a single step ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// A tool ran and its watch resolved (possibly with a synthetic status)
    Finished { scan_id: Uuid, status: JobStatus },
    /// Results were merged and re-read
    Consolidated {
        subdomains: usize,
        live_web_servers: usize,
    },
    /// The step raised an error and was skipped over
    Failed(String),
}

impl StepOutcome {
    /// Whether the step produced what it was supposed to
    pub fn is_success(&self) -> bool {
        match self {
            StepOutcome::Finished { status, .. } => status.is_success(),
            StepOutcome::Consolidated { .. } => true,
            StepOutcome::Failed(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub name: StepName,
    pub outcome: StepOutcome,
}

/// Result of one pipeline run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub target_id: Uuid,
    /// Stored step the run resumed at, if it resumed at all
    pub resumed_from: Option<StepName>,
    pub steps: Vec<StepReport>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.steps.iter().filter(|step| step.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.steps.len() - self.succeeded()
    }
}

/// Runs a pipeline definition against one target at a time
pub struct PipelineRunner {
    definition: PipelineDefinition,
    launcher: JobLauncher,
    watcher: CompletionWatcher,
    refresher: ResultRefresher,
    consolidator: Arc<dyn Consolidator>,
    store: Arc<dyn RunStateStore>,
    observer: Arc<dyn ScanObserver>,
    settings: RunnerSettings,
}

impl PipelineRunner {
    /// Creates a new runner
    pub fn new(
        definition: PipelineDefinition,
        ports: RunnerPorts,
        budget: WatchBudget,
        settings: RunnerSettings,
    ) -> Self {
        Self {
            definition,
            launcher: JobLauncher::new(Arc::clone(&ports.scans)),
            watcher: CompletionWatcher::new(Arc::clone(&ports.scans), budget),
            refresher: ResultRefresher::new(ports.scans),
            consolidator: ports.consolidator,
            store: ports.store,
            observer: ports.observer,
            settings,
        }
    }

    pub fn definition(&self) -> &PipelineDefinition {
        &self.definition
    }

    /// Runs every step from the start (or from the stored marker when
    /// `resume` is set) and writes `completed` once the last one is done
    pub async fn run(&self, target: &Target, resume: bool) -> RunSummary {
        let (start, mut state, resumed) = self.initial_state(target.id, resume).await;
        let resumed_from = resumed.then_some(state.current_step);

        info!(
            target = %target.domain,
            steps = self.definition.len() - start,
            resumed_from = ?resumed_from,
            "Starting pipeline run"
        );

        let mut steps = Vec::with_capacity(self.definition.len() - start);

        for step in &self.definition.steps()[start..] {
            state.advance(step.name);
            self.persist(&state).await;

            info!(step = %step.name, "Running step");

            let outcome = match self.execute(step, target).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(step = %step.name, "Step failed: {:#}", e);
                    StepOutcome::Failed(format!("{:#}", e))
                }
            };

            steps.push(StepReport {
                name: step.name,
                outcome,
            });
        }

        state.advance(StepName::Completed);
        self.persist(&state).await;

        let summary = RunSummary {
            target_id: target.id,
            resumed_from,
            steps,
        };

        info!(
            target = %target.domain,
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            "Pipeline run completed"
        );

        summary
    }

    /// Picks the first step index and the marker to advance from, and
    /// whether that marker was taken from a stored run
    async fn initial_state(
        &self,
        target_id: Uuid,
        resume: bool,
    ) -> (usize, PipelineRunState, bool) {
        if resume {
            match self.store.load(target_id).await {
                Ok(Some(stored)) => {
                    if let Some(index) = self.definition.position(stored.current_step) {
                        return (index, stored, true);
                    }
                    info!(marker = %stored.current_step, "Nothing to resume, starting over");
                }
                Ok(None) => info!("No stored run, starting from the first step"),
                Err(e) => warn!("Failed to load run state, starting over: {:#}", e),
            }
        }

        let first = self
            .definition
            .steps()
            .first()
            .map(|step| step.name)
            .unwrap_or(StepName::Completed);

        (0, PipelineRunState::start(target_id, first), false)
    }

    async fn persist(&self, state: &PipelineRunState) {
        if let Err(e) = self.store.save(state).await {
            warn!(step = %state.current_step, "Failed to persist run state: {:#}", e);
        }
    }

    async fn execute(&self, step: &Step, target: &Target) -> Result<StepOutcome> {
        match step.kind {
            StepKind::ToolInvocation(tool) => self.run_tool(step, tool, target).await,
            StepKind::Consolidation => self.consolidate(target).await,
        }
    }

    async fn run_tool(&self, step: &Step, tool: Tool, target: &Target) -> Result<StepOutcome> {
        let observer = self.observer.as_ref();

        let handle = self
            .launcher
            .start(tool, target, step.start_params(), observer)
            .await?;

        let outcome = self.watch_and_refresh(tool, target.id, handle.scan_id).await;

        // The indicator is cleared even when the watch or refresh failed
        observer.on_running_changed(tool, false);

        outcome
    }

    async fn watch_and_refresh(&self, tool: Tool, target_id: Uuid, scan_id: Uuid) -> Result<StepOutcome> {
        let observer = self.observer.as_ref();

        let watched = self.watcher.wait_until_done(tool, target_id, observer).await?;

        time::sleep(self.settings.settle_delay).await;

        let refreshed = match self.refresher.sync(tool, target_id, observer).await {
            Ok(record) => record,
            Err(e) => {
                warn!(tool = %tool, "Failed to refresh results: {:#}", e);
                None
            }
        };

        // A synthetic status says why the watch gave up; keep it over
        // whatever the backend reports afterwards
        let status = match refreshed {
            Some(record) if !watched.status.is_synthetic() => record.status,
            _ => watched.status,
        };

        Ok(StepOutcome::Finished { scan_id, status })
    }

    async fn consolidate(&self, target: &Target) -> Result<StepOutcome> {
        time::sleep(self.settings.consolidation_settle_delay).await;

        self.consolidator.consolidate(target.id).await?;
        let aggregates = self.consolidator.aggregates(target.id).await?;

        self.observer.on_aggregates_changed(&aggregates);

        Ok(StepOutcome::Consolidated {
            subdomains: aggregates.consolidated_subdomains.len(),
            live_web_servers: aggregates.live_web_servers,
        })
    }
}
