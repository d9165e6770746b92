//! Scan DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::target::Target;
use crate::domain::tool::{TargetSelector, Tool};

/// Body of `POST /{tool}/run`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartScan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope_target_id: Option<Uuid>,
    /// Additional tool parameters, sent alongside the target
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl StartScan {
    /// Builds the start body the given tool expects for a target
    pub fn for_tool(
        tool: Tool,
        target: &Target,
        params: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        let (fqdn, scope_target_id) = match tool.target_selector() {
            TargetSelector::Domain => (Some(target.fqdn().to_string()), None),
            TargetSelector::ScopeTarget => (None, Some(target.id)),
        };

        Self {
            fqdn,
            scope_target_id,
            params,
        }
    }
}

/// Response of `POST /{tool}/run`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartScanResponse {
    pub scan_id: Uuid,
}

/// Response of `GET /consolidated-subdomains/{target_id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsolidatedSubdomains {
    /// `null` when nothing has been consolidated yet
    #[serde(default)]
    pub subdomains: Option<Vec<String>>,
}
