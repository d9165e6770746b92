//! Result refresher
//!
//! Re-reads the authoritative record of a tool/target pair after its watch
//! resolved. The backend may commit a scan's final result metadata slightly
//! after flipping its status, so the watcher's copy can be stale.

use anyhow::{Context, Result};
use recon_core::domain::job::{JobRecord, latest};
use recon_core::domain::tool::Tool;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::repository::ScanRepository;
use crate::service::observer::ScanObserver;

/// Republishes the most recent record of a tool
pub struct ResultRefresher {
    repository: Arc<dyn ScanRepository>,
}

impl ResultRefresher {
    /// Creates a new refresher
    pub fn new(repository: Arc<dyn ScanRepository>) -> Self {
        Self { repository }
    }

    /// Fetches and republishes the latest record; idempotent
    ///
    /// Tools with a detail endpoint are read from it, falling back to the
    /// list record when the detail cannot be fetched.
    pub async fn sync(
        &self,
        tool: Tool,
        target_id: Uuid,
        observer: &dyn ScanObserver,
    ) -> Result<Option<JobRecord>> {
        let records = self
            .repository
            .list(tool, target_id)
            .await
            .with_context(|| format!("Failed to refresh {} results", tool))?;

        let Some(newest) = latest(&records).cloned() else {
            debug!(tool = %tool, "Nothing to refresh");
            return Ok(None);
        };

        let record = if tool.has_detail_endpoint() {
            match self.repository.detail(tool, newest.id).await {
                Ok(detail) => detail,
                Err(e) => {
                    warn!(tool = %tool, scan_id = %newest.id, "Detail unavailable: {}", e);
                    newest
                }
            }
        } else {
            newest
        };

        observer.on_status_changed(tool, &record);

        Ok(Some(record))
    }
}
