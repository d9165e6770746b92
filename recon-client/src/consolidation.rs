//! Consolidation endpoints

use crate::BackendClient;
use crate::error::Result;
use recon_core::dto::scan::ConsolidatedSubdomains;
use tracing::debug;
use uuid::Uuid;

impl BackendClient {
    /// Merge and deduplicate every subdomain gathered for a target
    ///
    /// Returns once the backend has committed the merged set.
    pub async fn consolidate(&self, target_id: Uuid) -> Result<()> {
        let url = self.url(&format!("/consolidate-subdomains/{}", target_id));
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;

        self.handle_empty_response(response).await
    }

    /// Get the consolidated subdomain list of a target
    pub async fn consolidated_subdomains(&self, target_id: Uuid) -> Result<Vec<String>> {
        let url = self.url(&format!("/consolidated-subdomains/{}", target_id));
        let response = self.client.get(&url).send().await?;

        let body: ConsolidatedSubdomains = self.handle_response(response).await?;
        Ok(body.subdomains.unwrap_or_default())
    }

    /// Get the live web servers discovered for a target
    ///
    /// Entries are returned undecoded; the pipeline only counts them.
    pub async fn target_urls(&self, target_id: Uuid) -> Result<Vec<serde_json::Value>> {
        let url = self.url(&format!("/scope-targets/{}/target-urls", target_id));
        let response = self.client.get(&url).send().await?;

        let urls: Option<Vec<serde_json::Value>> = self.handle_response(response).await?;
        Ok(urls.unwrap_or_default())
    }
}
