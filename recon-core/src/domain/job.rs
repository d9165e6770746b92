//! Job domain types
//!
//! A job (or scan) is one invocation of an external tool against a target.
//! The backend keeps every historical invocation; only the most recent one
//! per (tool, target) is authoritative.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

use super::tool::Tool;

/// Scan record as reported by the backend, or synthesized by the watcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawJobRecord")]
pub struct JobRecord {
    pub id: Uuid,
    pub target_id: Option<Uuid>,
    pub tool: Option<Tool>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub result_ref: Option<String>,
    /// Diagnostic for synthetic records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Tool-specific fields the engine does not interpret
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Wire shape of a scan record
///
/// The backend names the same fields differently depending on the tool
/// (`scan_id` next to a row `id`, `scope_target_id`, `result`), so every
/// spelling is accepted and resolved in `TryFrom`.
#[derive(Deserialize)]
struct RawJobRecord {
    #[serde(default)]
    scan_id: Option<Uuid>,
    #[serde(default)]
    id: Option<Uuid>,
    #[serde(default)]
    scope_target_id: Option<Uuid>,
    #[serde(default)]
    target_id: Option<Uuid>,
    #[serde(default)]
    tool: Option<Tool>,
    status: JobStatus,
    created_at: DateTime<Utc>,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    result_ref: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl TryFrom<RawJobRecord> for JobRecord {
    type Error = String;

    fn try_from(raw: RawJobRecord) -> Result<Self, Self::Error> {
        let id = raw
            .scan_id
            .or(raw.id)
            .ok_or_else(|| "scan record has neither `scan_id` nor `id`".to_string())?;

        Ok(Self {
            id,
            target_id: raw.scope_target_id.or(raw.target_id),
            tool: raw.tool,
            status: raw.status,
            created_at: raw.created_at,
            result_ref: raw.result.or(raw.result_ref),
            message: raw.message,
            extra: raw.extra,
        })
    }
}

/// Scan status
///
/// The first group is reported by the backend; the second is produced by the
/// watcher when it gives up on a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Success,
    Failed,
    Error,

    Timeout,
    HardTimeout,
    AbsoluteTimeout,
    NoScans,
    PersistentError,

    /// Any status string the engine does not recognise
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// Terminal statuses the backend reports
    pub fn is_backend_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Success | JobStatus::Failed | JobStatus::Error
        )
    }

    /// Statuses only ever produced by the watcher
    pub fn is_synthetic(&self) -> bool {
        matches!(
            self,
            JobStatus::Timeout
                | JobStatus::HardTimeout
                | JobStatus::AbsoluteTimeout
                | JobStatus::NoScans
                | JobStatus::PersistentError
        )
    }

    /// No further change is expected after this status
    pub fn is_terminal(&self) -> bool {
        self.is_backend_terminal() || self.is_synthetic()
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Success)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
            JobStatus::Error => "error",
            JobStatus::Timeout => "timeout",
            JobStatus::HardTimeout => "hard_timeout",
            JobStatus::AbsoluteTimeout => "absolute_timeout",
            JobStatus::NoScans => "no_scans",
            JobStatus::PersistentError => "persistent_error",
            JobStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl JobRecord {
    /// Builds a watcher-produced record carrying a diagnostic status
    ///
    /// `id` is the last scan observed for the pair, or nil if none was seen.
    pub fn synthetic(
        tool: Tool,
        target_id: Uuid,
        id: Option<Uuid>,
        status: JobStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.unwrap_or(Uuid::nil()),
            target_id: Some(target_id),
            tool: Some(tool),
            status,
            created_at: Utc::now(),
            result_ref: None,
            message: Some(message.into()),
            extra: serde_json::Map::new(),
        }
    }

    /// Ordering used to pick the authoritative record: newest `created_at`,
    /// then greatest `id` when timestamps are equal.
    pub fn recency_cmp(&self, other: &Self) -> Ordering {
        self.created_at
            .cmp(&other.created_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Selects the most recent record of a list
///
/// Returns `None` for an empty list. The choice is independent of list order.
pub fn latest(records: &[JobRecord]) -> Option<&JobRecord> {
    records.iter().max_by(|a, b| a.recency_cmp(b))
}
