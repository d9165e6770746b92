//! Run-state repository
//!
//! Persists the pipeline's progress marker so an interrupted run can report
//! (and resume from) the step it was on.

use anyhow::{Context, Result};
use async_trait::async_trait;
use recon_core::domain::pipeline::PipelineRunState;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

/// Persistence port for the run marker
#[async_trait]
pub trait RunStateStore: Send + Sync {
    /// Loads the marker of a target, if one was ever written
    async fn load(&self, target_id: Uuid) -> Result<Option<PipelineRunState>>;

    /// Writes the marker, replacing any previous one for the same target
    async fn save(&self, state: &PipelineRunState) -> Result<()>;
}

/// Stores one JSON file per target under a directory
pub struct FileRunStateStore {
    dir: PathBuf,
}

impl FileRunStateStore {
    /// Creates a store rooted at `dir`; the directory is created on first save
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, target_id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", target_id))
    }
}

#[async_trait]
impl RunStateStore for FileRunStateStore {
    async fn load(&self, target_id: Uuid) -> Result<Option<PipelineRunState>> {
        let path = self.path_for(target_id);

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        let state = serde_json::from_str(&contents)
            .with_context(|| format!("Corrupt run state in {}", path.display()))?;

        Ok(Some(state))
    }

    async fn save(&self, state: &PipelineRunState) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let path = self.path_for(state.target_id);
        let tmp = path.with_extension("json.tmp");
        let contents = serde_json::to_vec_pretty(state).context("Failed to encode run state")?;

        // Write-then-rename so a crash never leaves a truncated marker
        tokio::fs::write(&tmp, contents)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        Ok(())
    }
}

/// In-memory store, also records every write in order
///
/// Backs runs that should leave nothing on disk.
#[derive(Default)]
pub struct InMemoryRunStateStore {
    states: Mutex<HashMap<Uuid, PipelineRunState>>,
    history: Mutex<Vec<PipelineRunState>>,
}

impl InMemoryRunStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every state saved so far, oldest first
    pub fn history(&self) -> Vec<PipelineRunState> {
        self.history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RunStateStore for InMemoryRunStateStore {
    async fn load(&self, target_id: Uuid) -> Result<Option<PipelineRunState>> {
        let states = self
            .states
            .lock()
            .map_err(|_| anyhow::anyhow!("run state lock poisoned"))?;
        Ok(states.get(&target_id).cloned())
    }

    async fn save(&self, state: &PipelineRunState) -> Result<()> {
        self.states
            .lock()
            .map_err(|_| anyhow::anyhow!("run state lock poisoned"))?
            .insert(state.target_id, state.clone());
        self.history
            .lock()
            .map_err(|_| anyhow::anyhow!("run state lock poisoned"))?
            .push(state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_core::domain::pipeline::StepName;

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRunStateStore::new(dir.path().join("state"));
        let target_id = Uuid::new_v4();

        assert!(store.load(target_id).await.unwrap().is_none());

        let mut state = PipelineRunState::start(target_id, StepName::Amass);
        store.save(&state).await.unwrap();

        state.advance(StepName::HttpxRound2);
        store.save(&state).await.unwrap();

        let loaded = store.load(target_id).await.unwrap().unwrap();
        assert_eq!(loaded, state);
        assert_eq!(loaded.current_step, StepName::HttpxRound2);
    }

    #[tokio::test]
    async fn test_file_store_keeps_targets_apart() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRunStateStore::new(dir.path());
        let first = PipelineRunState::start(Uuid::new_v4(), StepName::Gau);
        let second = PipelineRunState::start(Uuid::new_v4(), StepName::Metadata);

        store.save(&first).await.unwrap();
        store.save(&second).await.unwrap();

        let loaded = store.load(first.target_id).await.unwrap().unwrap();
        assert_eq!(loaded.current_step, StepName::Gau);
    }

    #[tokio::test]
    async fn test_file_store_reports_corrupt_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRunStateStore::new(dir.path());
        let target_id = Uuid::new_v4();

        std::fs::write(dir.path().join(format!("{}.json", target_id)), "{ not json").unwrap();

        assert!(store.load(target_id).await.is_err());
    }

    #[tokio::test]
    async fn test_in_memory_store_history() {
        let store = InMemoryRunStateStore::new();
        let mut state = PipelineRunState::start(Uuid::new_v4(), StepName::Amass);
        store.save(&state).await.unwrap();
        state.advance(StepName::Completed);
        store.save(&state).await.unwrap();

        let steps: Vec<StepName> = store.history().iter().map(|s| s.current_step).collect();
        assert_eq!(steps, vec![StepName::Amass, StepName::Completed]);
        assert!(store.load(state.target_id).await.unwrap().unwrap().is_finished());
    }
}
