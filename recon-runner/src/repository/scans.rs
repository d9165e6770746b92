//! Scans repository
//!
//! Job-control operations against the backend:
//! - Starting a tool
//! - Listing every scan of a tool for a target
//! - Reading one scan's detail

use async_trait::async_trait;
use recon_client::{BackendClient, Result};
use recon_core::domain::job::JobRecord;
use recon_core::domain::target::Target;
use recon_core::domain::tool::Tool;
use recon_core::dto::scan::{StartScan, StartScanResponse};
use std::sync::Arc;
use uuid::Uuid;

/// Repository trait for scan operations
///
/// Errors keep the client's classification so callers can tell a non-2xx
/// answer from a transport or decoding failure.
#[async_trait]
pub trait ScanRepository: Send + Sync {
    /// Starts a tool against a target
    ///
    /// # Arguments
    /// * `tool` - The tool to start
    /// * `target` - The target under reconnaissance
    /// * `params` - Extra tool parameters sent with the target
    async fn start(
        &self,
        tool: Tool,
        target: &Target,
        params: serde_json::Map<String, serde_json::Value>,
    ) -> Result<StartScanResponse>;

    /// Lists all scans of a tool for a target, in no particular order
    async fn list(&self, tool: Tool, target_id: Uuid) -> Result<Vec<JobRecord>>;

    /// Reads one scan from the tool's detail endpoint
    async fn detail(&self, tool: Tool, scan_id: Uuid) -> Result<JobRecord>;
}

/// HTTP implementation of ScanRepository
pub struct HttpScanRepository {
    client: Arc<BackendClient>,
}

impl HttpScanRepository {
    /// Creates a new HTTP scan repository
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ScanRepository for HttpScanRepository {
    async fn start(
        &self,
        tool: Tool,
        target: &Target,
        params: serde_json::Map<String, serde_json::Value>,
    ) -> Result<StartScanResponse> {
        let body = StartScan::for_tool(tool, target, params);
        self.client.start_scan(tool, &body).await
    }

    async fn list(&self, tool: Tool, target_id: Uuid) -> Result<Vec<JobRecord>> {
        self.client.list_scans(target_id, tool).await
    }

    async fn detail(&self, tool: Tool, scan_id: Uuid) -> Result<JobRecord> {
        self.client.get_scan(tool, scan_id).await
    }
}
