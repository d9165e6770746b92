//! Scripted fakes for the engine's ports

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use recon_client::ClientError;
use recon_core::domain::job::{JobRecord, JobStatus};
use recon_core::domain::target::{Target, TargetAggregates};
use recon_core::domain::tool::Tool;
use recon_core::dto::scan::StartScanResponse;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use crate::repository::{Consolidator, ScanRepository};
use crate::service::observer::ScanObserver;

/// Shared, ordered log of port calls
pub type EventLog = Arc<Mutex<Vec<String>>>;

/// A scan record created `secs` seconds from now
pub fn record(status: JobStatus, secs: i64) -> JobRecord {
    JobRecord {
        id: Uuid::new_v4(),
        target_id: None,
        tool: None,
        status,
        created_at: Utc::now() + chrono::Duration::seconds(secs),
        result_ref: None,
        message: None,
        extra: serde_json::Map::new(),
    }
}

/// Asserts that `expected` (and at most a few ms more) passed since `started`
pub fn assert_elapsed(started: Instant, expected: Duration) {
    let elapsed = started.elapsed();
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(50),
        "expected ~{:?}, got {:?}",
        expected,
        elapsed
    );
}

/// One scripted answer of the list endpoint
#[derive(Debug, Clone)]
pub enum ListReply {
    Records(Vec<JobRecord>),
    /// Non-2xx status
    Status(u16),
    /// Body that did not decode
    Malformed,
    /// Never answers
    Hang,
}

impl ListReply {
    pub fn records(records: Vec<JobRecord>) -> Self {
        ListReply::Records(records)
    }
}

#[derive(Default)]
struct Script {
    queue: VecDeque<ListReply>,
    forever: Option<ListReply>,
}

/// Scan repository answering from per-tool scripts
///
/// Without a script, every list answers with a single completed scan.
#[derive(Default)]
pub struct ScriptedScans {
    scripts: Mutex<HashMap<Tool, Script>>,
    failing_starts: Mutex<HashSet<Tool>>,
    list_calls: Mutex<HashMap<Tool, usize>>,
    events: EventLog,
}

impl ScriptedScans {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shares an event log with other fakes
    pub fn with_events(events: EventLog) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    /// Replies used in order; afterwards the default reply applies
    pub fn script(&self, tool: Tool, replies: Vec<ListReply>) {
        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts.entry(tool).or_default();
        script.queue = replies.into();
    }

    /// Reply used once the scripted queue is empty, for good
    pub fn script_forever(&self, tool: Tool, reply: ListReply) {
        let mut scripts = self.scripts.lock().unwrap();
        scripts.entry(tool).or_default().forever = Some(reply);
    }

    /// Makes every start of `tool` fail with a server error
    pub fn fail_start(&self, tool: Tool) {
        self.failing_starts.lock().unwrap().insert(tool);
    }

    pub fn list_calls(&self, tool: Tool) -> usize {
        self.list_calls.lock().unwrap().get(&tool).copied().unwrap_or(0)
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn log(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    fn next_reply(&self, tool: Tool) -> ListReply {
        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts.entry(tool).or_default();

        script
            .queue
            .pop_front()
            .or_else(|| script.forever.clone())
            .unwrap_or_else(|| ListReply::Records(vec![record(JobStatus::Completed, 0)]))
    }
}

#[async_trait]
impl ScanRepository for ScriptedScans {
    async fn start(
        &self,
        tool: Tool,
        _target: &Target,
        _params: serde_json::Map<String, serde_json::Value>,
    ) -> recon_client::Result<StartScanResponse> {
        self.log(format!("start:{}", tool));

        if self.failing_starts.lock().unwrap().contains(&tool) {
            return Err(ClientError::api_error(500, "tool failed to start"));
        }

        Ok(StartScanResponse {
            scan_id: Uuid::new_v4(),
        })
    }

    async fn list(&self, tool: Tool, _target_id: Uuid) -> recon_client::Result<Vec<JobRecord>> {
        self.log(format!("list:{}", tool));
        *self.list_calls.lock().unwrap().entry(tool).or_default() += 1;

        match self.next_reply(tool) {
            ListReply::Records(records) => Ok(records),
            ListReply::Status(status) => Err(ClientError::api_error(status, "scripted failure")),
            ListReply::Malformed => Err(ClientError::ParseError("expected an array".to_string())),
            ListReply::Hang => std::future::pending().await,
        }
    }

    async fn detail(&self, tool: Tool, scan_id: Uuid) -> recon_client::Result<JobRecord> {
        self.log(format!("detail:{}", tool));

        let mut detail = record(JobStatus::Success, 0);
        detail.id = scan_id;
        detail
            .extra
            .insert("detailed".to_string(), serde_json::Value::Bool(true));
        Ok(detail)
    }
}

/// Consolidator that records its calls
#[derive(Default)]
pub struct RecordingConsolidator {
    events: EventLog,
    fail: Mutex<bool>,
}

impl RecordingConsolidator {
    pub fn with_events(events: EventLog) -> Self {
        Self {
            events,
            fail: Mutex::new(false),
        }
    }

    pub fn fail_merges(&self) {
        *self.fail.lock().unwrap() = true;
    }
}

#[async_trait]
impl Consolidator for RecordingConsolidator {
    async fn consolidate(&self, _target_id: Uuid) -> Result<()> {
        self.events.lock().unwrap().push("consolidate".to_string());
        if *self.fail.lock().unwrap() {
            anyhow::bail!("merge failed");
        }
        Ok(())
    }

    async fn aggregates(&self, _target_id: Uuid) -> Result<TargetAggregates> {
        self.events.lock().unwrap().push("aggregates".to_string());
        Ok(TargetAggregates {
            consolidated_subdomains: vec!["a.example.com".to_string()],
            live_web_servers: 1,
        })
    }
}

/// Observer that remembers everything it was told
#[derive(Default)]
pub struct RecordingObserver {
    statuses: Mutex<Vec<(Tool, JobStatus)>>,
    running: Mutex<Vec<(Tool, bool)>>,
    aggregates: Mutex<Vec<TargetAggregates>>,
}

impl RecordingObserver {
    pub fn statuses(&self, tool: Tool) -> Vec<JobStatus> {
        self.statuses
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| *t == tool)
            .map(|(_, status)| *status)
            .collect()
    }

    pub fn running(&self, tool: Tool) -> Vec<bool> {
        self.running
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| *t == tool)
            .map(|(_, running)| *running)
            .collect()
    }

    pub fn aggregates_seen(&self) -> usize {
        self.aggregates.lock().unwrap().len()
    }
}

impl ScanObserver for RecordingObserver {
    fn on_status_changed(&self, tool: Tool, record: &JobRecord) {
        self.statuses.lock().unwrap().push((tool, record.status));
    }

    fn on_running_changed(&self, tool: Tool, running: bool) {
        self.running.lock().unwrap().push((tool, running));
    }

    fn on_aggregates_changed(&self, aggregates: &TargetAggregates) {
        self.aggregates.lock().unwrap().push(aggregates.clone());
    }
}
