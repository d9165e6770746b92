//! Pipeline domain types
//!
//! The pipeline is a fixed, ordered catalog of steps. Most steps run one
//! tool; three consolidate the results gathered so far. The probe and
//! screenshot pair is repeated after each consolidation as distinct steps,
//! so every round is tracked (and resumable) on its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::tool::Tool;

/// Step identifier, also used as the persisted progress marker
///
/// `Idle` and `Completed` are markers only and never appear in a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    Idle,
    Amass,
    Sublist3r,
    Assetfinder,
    Gau,
    Ctl,
    Subfinder,
    Consolidate,
    Httpx,
    NucleiScreenshot,
    Shuffledns,
    Cewl,
    ConsolidateRound2,
    HttpxRound2,
    NucleiScreenshotRound2,
    Gospider,
    Subdomainizer,
    ConsolidateRound3,
    HttpxRound3,
    NucleiScreenshotRound3,
    Metadata,
    Completed,
}

impl StepName {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::Idle => "idle",
            StepName::Amass => "amass",
            StepName::Sublist3r => "sublist3r",
            StepName::Assetfinder => "assetfinder",
            StepName::Gau => "gau",
            StepName::Ctl => "ctl",
            StepName::Subfinder => "subfinder",
            StepName::Consolidate => "consolidate",
            StepName::Httpx => "httpx",
            StepName::NucleiScreenshot => "nuclei_screenshot",
            StepName::Shuffledns => "shuffledns",
            StepName::Cewl => "cewl",
            StepName::ConsolidateRound2 => "consolidate_round2",
            StepName::HttpxRound2 => "httpx_round2",
            StepName::NucleiScreenshotRound2 => "nuclei_screenshot_round2",
            StepName::Gospider => "gospider",
            StepName::Subdomainizer => "subdomainizer",
            StepName::ConsolidateRound3 => "consolidate_round3",
            StepName::HttpxRound3 => "httpx_round3",
            StepName::NucleiScreenshotRound3 => "nuclei_screenshot_round3",
            StepName::Metadata => "metadata",
            StepName::Completed => "completed",
        }
    }

    /// Probe/screenshot round this step belongs to, if it is a repeated step
    pub fn round(&self) -> Option<u8> {
        match self {
            StepName::Httpx | StepName::NucleiScreenshot => Some(1),
            StepName::HttpxRound2 | StepName::NucleiScreenshotRound2 => Some(2),
            StepName::HttpxRound3 | StepName::NucleiScreenshotRound3 => Some(3),
            _ => None,
        }
    }

    /// Whether this is a progress marker rather than an executable step
    pub fn is_marker(&self) -> bool {
        matches!(self, StepName::Idle | StepName::Completed)
    }
}

impl std::fmt::Display for StepName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| format!("unknown step '{}'", s))
    }
}

/// What a step does when it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepKind {
    /// Start one tool and wait for it to finish
    ToolInvocation(Tool),
    /// Merge accumulated results before later steps consume them
    Consolidation,
}

/// One entry of the pipeline catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub name: StepName,
    pub kind: StepKind,
}

impl Step {
    pub const fn tool(name: StepName, tool: Tool) -> Self {
        Self {
            name,
            kind: StepKind::ToolInvocation(tool),
        }
    }

    pub const fn consolidation(name: StepName) -> Self {
        Self {
            name,
            kind: StepKind::Consolidation,
        }
    }

    /// Extra start parameters for tool steps
    ///
    /// Later probe/screenshot rounds tell the backend which round they are.
    pub fn start_params(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut params = serde_json::Map::new();
        if let Some(round) = self.name.round().filter(|round| *round > 1) {
            params.insert("round".to_string(), serde_json::Value::from(round));
        }
        params
    }
}

/// Ordered, immutable catalog of steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDefinition {
    steps: Vec<Step>,
}

impl PipelineDefinition {
    /// Builds a definition from an explicit step list
    ///
    /// Marker names (`idle`, `completed`) are rejected, as are duplicates,
    /// since step names double as resume markers.
    pub fn new(steps: Vec<Step>) -> Result<Self, String> {
        for (idx, step) in steps.iter().enumerate() {
            if step.name.is_marker() {
                return Err(format!("'{}' is a marker, not a step", step.name));
            }
            if steps[..idx].iter().any(|prev| prev.name == step.name) {
                return Err(format!("duplicate step '{}'", step.name));
            }
        }
        Ok(Self { steps })
    }

    /// The full reconnaissance catalog: discovery, three consolidations, and
    /// three probe/screenshot rounds.
    pub fn recon() -> Self {
        use StepName as S;

        Self {
            steps: vec![
                Step::tool(S::Amass, Tool::Amass),
                Step::tool(S::Sublist3r, Tool::Sublist3r),
                Step::tool(S::Assetfinder, Tool::Assetfinder),
                Step::tool(S::Gau, Tool::Gau),
                Step::tool(S::Ctl, Tool::Ctl),
                Step::tool(S::Subfinder, Tool::Subfinder),
                Step::consolidation(S::Consolidate),
                Step::tool(S::Httpx, Tool::Httpx),
                Step::tool(S::NucleiScreenshot, Tool::NucleiScreenshot),
                Step::tool(S::Shuffledns, Tool::Shuffledns),
                Step::tool(S::Cewl, Tool::Cewl),
                Step::consolidation(S::ConsolidateRound2),
                Step::tool(S::HttpxRound2, Tool::Httpx),
                Step::tool(S::NucleiScreenshotRound2, Tool::NucleiScreenshot),
                Step::tool(S::Gospider, Tool::Gospider),
                Step::tool(S::Subdomainizer, Tool::Subdomainizer),
                Step::consolidation(S::ConsolidateRound3),
                Step::tool(S::HttpxRound3, Tool::Httpx),
                Step::tool(S::NucleiScreenshotRound3, Tool::NucleiScreenshot),
                Step::tool(S::Metadata, Tool::Metadata),
            ],
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Index of the named step, if it belongs to this catalog
    pub fn position(&self, name: StepName) -> Option<usize> {
        self.steps.iter().position(|step| step.name == name)
    }
}

impl Default for PipelineDefinition {
    fn default() -> Self {
        Self::recon()
    }
}

/// The only state the runner persists
///
/// Written before every step begins and once more as `completed` at the end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRunState {
    pub target_id: Uuid,
    pub current_step: StepName,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PipelineRunState {
    pub fn start(target_id: Uuid, first_step: StepName) -> Self {
        let now = Utc::now();
        Self {
            target_id,
            current_step: first_step,
            started_at: now,
            updated_at: Some(now),
        }
    }

    pub fn advance(&mut self, step: StepName) {
        self.current_step = step;
        self.updated_at = Some(Utc::now());
    }

    pub fn is_finished(&self) -> bool {
        self.current_step == StepName::Completed
    }
}
