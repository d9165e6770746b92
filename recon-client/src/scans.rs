//! Scan-related API endpoints

use crate::BackendClient;
use crate::error::Result;
use recon_core::domain::job::JobRecord;
use recon_core::domain::tool::Tool;
use recon_core::dto::scan::{StartScan, StartScanResponse};
use tracing::{debug, warn};
use uuid::Uuid;

impl BackendClient {
    // =============================================================================
    // Scan Lifecycle
    // =============================================================================

    /// Start a tool against a target
    ///
    /// # Arguments
    /// * `tool` - The tool to start
    /// * `req` - Target-identifying body plus any tool parameters
    ///
    /// # Returns
    /// The id of the scan the backend created
    pub async fn start_scan(&self, tool: Tool, req: &StartScan) -> Result<StartScanResponse> {
        let url = self.url(&format!("/{}/run", tool));
        debug!("POST {}", url);
        let response = self.client.post(&url).json(req).send().await?;

        self.handle_response(response).await
    }

    /// List every scan of a tool for a target
    ///
    /// The backend returns the records in no guaranteed order, and `null`
    /// instead of `[]` when a tool has never run for the target.
    ///
    /// Entries are decoded one by one: a record that does not decode is
    /// skipped, while a body that is not an array is a `ParseError`.
    pub async fn list_scans(&self, target_id: Uuid, tool: Tool) -> Result<Vec<JobRecord>> {
        let url = self.url(&format!("/scopetarget/{}/scans/{}", target_id, tool));
        let response = self.client.get(&url).send().await?;

        let entries: Option<Vec<serde_json::Value>> = self.handle_response(response).await?;

        let records = entries
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<JobRecord>(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(tool = %tool, target = %target_id, "Skipping undecodable scan record: {}", e);
                    None
                }
            })
            .collect();

        Ok(records)
    }

    /// Get a single scan with its tool-specific fields
    pub async fn get_scan(&self, tool: Tool, scan_id: Uuid) -> Result<JobRecord> {
        let url = self.url(&format!("/{}/{}", tool, scan_id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
