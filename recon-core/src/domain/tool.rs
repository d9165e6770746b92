//! Tool domain types

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// External discovery tool executed by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    Amass,
    Sublist3r,
    Assetfinder,
    Gau,
    Ctl,
    Subfinder,
    Httpx,
    Shuffledns,
    Cewl,
    Gospider,
    Subdomainizer,
    NucleiScreenshot,
    Metadata,
}

/// How a tool's start request identifies the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSelector {
    /// Started against the bare domain (`{"fqdn": ...}`)
    Domain,
    /// Started against accumulated results of the scope target (`{"scope_target_id": ...}`)
    ScopeTarget,
}

impl Tool {
    pub const ALL: [Tool; 13] = [
        Tool::Amass,
        Tool::Sublist3r,
        Tool::Assetfinder,
        Tool::Gau,
        Tool::Ctl,
        Tool::Subfinder,
        Tool::Httpx,
        Tool::Shuffledns,
        Tool::Cewl,
        Tool::Gospider,
        Tool::Subdomainizer,
        Tool::NucleiScreenshot,
        Tool::Metadata,
    ];

    /// URL path segment used by the backend for this tool
    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Amass => "amass",
            Tool::Sublist3r => "sublist3r",
            Tool::Assetfinder => "assetfinder",
            Tool::Gau => "gau",
            Tool::Ctl => "ctl",
            Tool::Subfinder => "subfinder",
            Tool::Httpx => "httpx",
            Tool::Shuffledns => "shuffledns",
            Tool::Cewl => "cewl",
            Tool::Gospider => "gospider",
            Tool::Subdomainizer => "subdomainizer",
            Tool::NucleiScreenshot => "nuclei-screenshot",
            Tool::Metadata => "metadata",
        }
    }

    pub fn target_selector(&self) -> TargetSelector {
        match self {
            Tool::Httpx
            | Tool::Shuffledns
            | Tool::Cewl
            | Tool::NucleiScreenshot
            | Tool::Metadata => TargetSelector::ScopeTarget,
            _ => TargetSelector::Domain,
        }
    }

    /// Whether the backend exposes `GET /{tool}/{scan_id}` with richer fields
    pub fn has_detail_endpoint(&self) -> bool {
        matches!(self, Tool::Httpx)
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tool::ALL
            .iter()
            .copied()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| format!("unknown tool '{}'", s))
    }
}
