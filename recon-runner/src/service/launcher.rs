//! Job launcher
//!
//! Starts one tool against a target and returns at once. Observing the scan
//! afterwards is the watcher's job.

use anyhow::{Context, Result};
use recon_core::domain::target::Target;
use recon_core::domain::tool::Tool;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::repository::ScanRepository;
use crate::service::observer::ScanObserver;

/// Handle to a started scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobHandle {
    pub tool: Tool,
    pub target_id: Uuid,
    pub scan_id: Uuid,
}

/// Starts tools on the backend
pub struct JobLauncher {
    repository: Arc<dyn ScanRepository>,
}

impl JobLauncher {
    /// Creates a new launcher
    pub fn new(repository: Arc<dyn ScanRepository>) -> Self {
        Self { repository }
    }

    /// Sends a single start request
    ///
    /// Any non-success answer is returned as an error and is not retried.
    /// On success the tool is reported as running before returning.
    pub async fn start(
        &self,
        tool: Tool,
        target: &Target,
        params: serde_json::Map<String, serde_json::Value>,
        observer: &dyn ScanObserver,
    ) -> Result<JobHandle> {
        let started = self
            .repository
            .start(tool, target, params)
            .await
            .with_context(|| format!("Failed to start {} for {}", tool, target.domain))?;

        observer.on_running_changed(tool, true);

        info!(tool = %tool, scan_id = %started.scan_id, "Started scan");

        Ok(JobHandle {
            tool,
            target_id: target.id,
            scan_id: started.scan_id,
        })
    }
}
