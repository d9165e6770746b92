//! Completion watcher
//!
//! Polls the backend until the most recent scan of a tool/target pair
//! reaches a terminal status, or until the watch's time budget runs out.
//!
//! A watch always resolves exactly once:
//! - with the backend's terminal record (`completed`, `success`, `failed`, `error`)
//! - with `error`, `no_scans` or `persistent_error` once the bounded retry of
//!   failed or empty polls is exhausted
//! - with `timeout`, `hard_timeout` or `absolute_timeout` when a tier of the
//!   deadline expires
//!
//! `processing` is not terminal: the tool is done but the backend is still
//! writing its results, so the watcher keeps polling.

use anyhow::Result;
use recon_client::FailureKind;
use recon_core::domain::job::{JobRecord, JobStatus, latest};
use recon_core::domain::tool::Tool;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::WatchBudget;
use crate::repository::ScanRepository;
use crate::service::deadline::{Deadline, Threshold};
use crate::service::observer::ScanObserver;

type WatchKey = (Tool, Uuid);

/// Watches scans until they finish
#[derive(Clone)]
pub struct CompletionWatcher {
    repository: Arc<dyn ScanRepository>,
    budget: WatchBudget,
    active: Arc<Mutex<HashSet<WatchKey>>>,
}

/// Releases a (tool, target) pair when its watch ends, however it ends
struct ActiveWatch {
    key: WatchKey,
    active: Arc<Mutex<HashSet<WatchKey>>>,
}

impl Drop for ActiveWatch {
    fn drop(&mut self) {
        if let Ok(mut active) = self.active.lock() {
            active.remove(&self.key);
        }
    }
}

/// How the race between the poll loop and the deadline ended
enum Resolution {
    Polled(JobRecord),
    Expired(Threshold),
}

impl CompletionWatcher {
    /// Creates a new watcher
    pub fn new(repository: Arc<dyn ScanRepository>, budget: WatchBudget) -> Self {
        Self {
            repository,
            budget,
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Waits until the latest scan of `tool` for `target_id` is done
    ///
    /// Resolves within the absolute timeout of the budget with either a
    /// genuine terminal record or a synthetic one. Fails only when the same
    /// pair is already being watched.
    pub async fn wait_until_done(
        &self,
        tool: Tool,
        target_id: Uuid,
        observer: &dyn ScanObserver,
    ) -> Result<JobRecord> {
        let _watch = self.claim(tool, target_id)?;
        let deadline = Deadline::start(self.budget);
        let last_seen: Mutex<Option<JobRecord>> = Mutex::new(None);

        debug!(tool = %tool, target = %target_id, "Watching scan");

        let resolution = tokio::select! {
            biased;
            record = self.poll_until_terminal(tool, target_id, &deadline, &last_seen, observer) => {
                Resolution::Polled(record)
            }
            _ = time::sleep_until(deadline.at(Threshold::Hard)) => Resolution::Expired(Threshold::Hard),
            _ = time::sleep_until(deadline.at(Threshold::Absolute)) => {
                Resolution::Expired(Threshold::Absolute)
            }
        };

        let record = match resolution {
            Resolution::Polled(record) => record,
            Resolution::Expired(threshold) => {
                let message = format!(
                    "no terminal status within {:?} ({:?} limit)",
                    deadline.limit(threshold),
                    threshold
                );
                self.give_up(tool, target_id, &last_seen, threshold.status(), message)
            }
        };

        if record.status.is_synthetic() {
            observer.on_status_changed(tool, &record);
        }
        observer.on_running_changed(tool, false);

        info!(
            tool = %tool,
            target = %target_id,
            status = %record.status,
            elapsed = ?deadline.elapsed(),
            "Watch resolved"
        );

        Ok(record)
    }

    fn claim(&self, tool: Tool, target_id: Uuid) -> Result<ActiveWatch> {
        let key = (tool, target_id);
        let mut active = self
            .active
            .lock()
            .map_err(|_| anyhow::anyhow!("watch registry poisoned"))?;

        if !active.insert(key) {
            anyhow::bail!("{} is already being watched for target {}", tool, target_id);
        }

        Ok(ActiveWatch {
            key,
            active: Arc::clone(&self.active),
        })
    }

    /// The poll loop; also resolves on the soft threshold
    async fn poll_until_terminal(
        &self,
        tool: Tool,
        target_id: Uuid,
        deadline: &Deadline,
        last_seen: &Mutex<Option<JobRecord>>,
        observer: &dyn ScanObserver,
    ) -> JobRecord {
        let period = self.budget.poll_interval;
        let mut ticker = time::interval_at(deadline.started() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut failures: u32 = 0;

        loop {
            tokio::select! {
                biased;
                _ = time::sleep_until(deadline.at(Threshold::Soft)) => {
                    let message = format!("still not finished after {:?}", deadline.limit(Threshold::Soft));
                    return self.give_up(tool, target_id, last_seen, JobStatus::Timeout, message);
                }
                _ = ticker.tick() => {}
            }

            let (status, reason) = match self.repository.list(tool, target_id).await {
                Ok(records) => match latest(&records) {
                    Some(record) => {
                        failures = 0;
                        self.observe(tool, record, last_seen, observer);

                        if record.status.is_backend_terminal() {
                            return record.clone();
                        }

                        debug!(tool = %tool, status = %record.status, "Scan not finished");

                        if let Some(threshold) = deadline.expired(Instant::now()) {
                            let message = format!("still {} when the {:?} limit passed", record.status, threshold);
                            return self.give_up(tool, target_id, last_seen, threshold.status(), message);
                        }
                        continue;
                    }
                    None => (JobStatus::NoScans, "backend reported no scans".to_string()),
                },
                Err(e) => match e.kind() {
                    FailureKind::Status => (JobStatus::Error, e.to_string()),
                    FailureKind::Transport => (JobStatus::PersistentError, e.to_string()),
                },
            };

            failures += 1;
            debug!(
                tool = %tool,
                attempt = failures,
                max = self.budget.max_empty_or_error_attempts,
                "Poll failed: {}",
                reason
            );

            if failures > self.budget.max_empty_or_error_attempts {
                let message = format!("{} consecutive failed polls, last: {}", failures, reason);
                return self.give_up(tool, target_id, last_seen, status, message);
            }
        }
    }

    /// Publishes a record if it differs from the last one seen
    fn observe(
        &self,
        tool: Tool,
        record: &JobRecord,
        last_seen: &Mutex<Option<JobRecord>>,
        observer: &dyn ScanObserver,
    ) {
        let Ok(mut last) = last_seen.lock() else {
            return;
        };

        let changed = last
            .as_ref()
            .is_none_or(|prev| prev.id != record.id || prev.status != record.status);

        if changed {
            observer.on_status_changed(tool, record);
            *last = Some(record.clone());
        }
    }

    fn give_up(
        &self,
        tool: Tool,
        target_id: Uuid,
        last_seen: &Mutex<Option<JobRecord>>,
        status: JobStatus,
        message: String,
    ) -> JobRecord {
        let last_id = last_seen
            .lock()
            .ok()
            .and_then(|last| last.as_ref().map(|record| record.id));

        warn!(tool = %tool, target = %target_id, status = %status, "{}", message);

        JobRecord::synthetic(tool, target_id, last_id, status, message)
    }
}
