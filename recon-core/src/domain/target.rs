//! Target domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The domain under reconnaissance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Scope target id on the backend
    pub id: Uuid,
    /// Domain or wildcard domain (`*.example.com`)
    pub domain: String,
}

impl Target {
    pub fn new(id: Uuid, domain: impl Into<String>) -> Self {
        Self {
            id,
            domain: domain.into(),
        }
    }

    /// Domain with any leading wildcard label removed
    pub fn fqdn(&self) -> &str {
        self.domain.trim_start_matches("*.")
    }
}

/// Result sets re-read after each consolidation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetAggregates {
    pub consolidated_subdomains: Vec<String>,
    pub live_web_servers: usize,
}
