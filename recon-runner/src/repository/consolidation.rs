//! Consolidation repository
//!
//! Triggers the backend's merge of accumulated results and re-reads the
//! aggregate result sets later steps build on.

use anyhow::{Context, Result};
use async_trait::async_trait;
use recon_client::BackendClient;
use recon_core::domain::target::TargetAggregates;
use std::sync::Arc;
use uuid::Uuid;

/// Repository trait for the consolidation routine
#[async_trait]
pub trait Consolidator: Send + Sync {
    /// Merges results gathered so far; returns once the merge is durable
    async fn consolidate(&self, target_id: Uuid) -> Result<()>;

    /// Reads the canonical aggregate result sets of a target
    async fn aggregates(&self, target_id: Uuid) -> Result<TargetAggregates>;
}

/// HTTP implementation of Consolidator
pub struct HttpConsolidator {
    client: Arc<BackendClient>,
}

impl HttpConsolidator {
    /// Creates a new HTTP consolidator
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Consolidator for HttpConsolidator {
    async fn consolidate(&self, target_id: Uuid) -> Result<()> {
        self.client
            .consolidate(target_id)
            .await
            .context("Failed to consolidate subdomains")
    }

    async fn aggregates(&self, target_id: Uuid) -> Result<TargetAggregates> {
        let consolidated_subdomains = self
            .client
            .consolidated_subdomains(target_id)
            .await
            .context("Failed to fetch consolidated subdomains")?;

        let live_web_servers = self
            .client
            .target_urls(target_id)
            .await
            .context("Failed to fetch live web servers")?
            .len();

        Ok(TargetAggregates {
            consolidated_subdomains,
            live_web_servers,
        })
    }
}
