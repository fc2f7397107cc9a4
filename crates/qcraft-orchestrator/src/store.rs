//! Workflow state and result storage.

use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::OrchestratorResult;
use crate::workflow::{Step, WorkflowId, WorkflowState, WorkflowStatus};

/// In-memory table of workflow states.
///
/// Each run owns its entry. Once a workflow leaves `running` its status is
/// final: later transitions are ignored.
#[derive(Debug, Default)]
pub struct WorkflowStore {
    states: RwLock<FxHashMap<WorkflowId, WorkflowState>>,
}

impl WorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking stage never holds this lock, so a poisoned map is still
    // consistent.
    fn read(&self) -> RwLockReadGuard<'_, FxHashMap<WorkflowId, WorkflowState>> {
        self.states.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, FxHashMap<WorkflowId, WorkflowState>> {
        self.states.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a new running workflow.
    pub fn begin(&self, id: WorkflowId) {
        self.write().insert(id, WorkflowState::running());
    }

    /// Append a completed step.
    pub fn record_step(&self, id: &WorkflowId, step: Step) {
        if let Some(state) = self.write().get_mut(id) {
            state.steps.push(step);
        }
    }

    /// Move a running workflow to `status`.
    ///
    /// Returns `false`, leaving the state untouched, when the workflow is
    /// unknown or already terminal.
    pub fn transition(&self, id: &WorkflowId, status: WorkflowStatus, error: Option<String>) -> bool {
        let mut states = self.write();
        let Some(state) = states.get_mut(id) else {
            return false;
        };
        if state.status.is_terminal() {
            debug!(
                "Ignoring transition of workflow {} from {} to {}",
                id, state.status, status
            );
            return false;
        }
        state.status = status;
        if error.is_some() {
            state.error = error;
        }
        if status.is_terminal() {
            state.finished_at = Some(Utc::now());
        }
        true
    }

    /// Snapshot of a workflow.
    pub fn get(&self, id: &WorkflowId) -> Option<WorkflowState> {
        self.read().get(id).cloned()
    }

    /// Number of tracked workflows.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

/// JSON file store for workflow results.
///
/// Stores each result as a separate `<workflow_id>.json` file.
#[derive(Debug, Clone)]
pub struct ResultStore {
    base_dir: PathBuf,
}

impl ResultStore {
    /// Create a result store at the given path.
    pub fn new(base_dir: impl AsRef<Path>) -> OrchestratorResult<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn result_path(&self, id: &WorkflowId) -> PathBuf {
        self.base_dir.join(format!("{id}.json"))
    }

    /// Write the result of a workflow, replacing any earlier one.
    pub fn save<T: Serialize>(&self, id: &WorkflowId, result: &T) -> OrchestratorResult<PathBuf> {
        let path = self.result_path(id);
        let json = serde_json::to_string_pretty(result)?;
        std::fs::write(&path, json)?;
        debug!("Stored result for workflow {} at {:?}", id, path);
        Ok(path)
    }

    /// Load a stored result.
    pub fn load<T: DeserializeOwned>(&self, id: &WorkflowId) -> OrchestratorResult<Option<T>> {
        match std::fs::read_to_string(self.result_path(id)) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a stored result. Missing results are not an error.
    pub fn delete(&self, id: &WorkflowId) -> OrchestratorResult<()> {
        match std::fs::remove_file(self.result_path(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transition_from_running() {
        let store = WorkflowStore::new();
        let id = WorkflowId::new();
        store.begin(id);
        store.record_step(&id, Step::named("device_loaded"));
        assert!(store.transition(&id, WorkflowStatus::Completed, None));

        let state = store.get(&id).unwrap();
        assert_eq!(state.status, WorkflowStatus::Completed);
        assert!(state.has_step("device_loaded"));
        assert!(state.finished_at.is_some());
    }

    #[test]
    fn test_terminal_state_is_not_overwritten() {
        let store = WorkflowStore::new();
        let id = WorkflowId::new();
        store.begin(id);
        assert!(store.transition(&id, WorkflowStatus::Cancelled, None));
        assert!(!store.transition(&id, WorkflowStatus::Completed, None));
        assert!(!store.transition(&id, WorkflowStatus::Failed, Some("boom".into())));

        let state = store.get(&id).unwrap();
        assert_eq!(state.status, WorkflowStatus::Cancelled);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_unknown_workflow() {
        let store = WorkflowStore::new();
        let id = WorkflowId::new();
        assert!(store.get(&id).is_none());
        assert!(!store.transition(&id, WorkflowStatus::Cancelled, None));
        store.record_step(&id, Step::named("analyzed"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_result_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("results")).unwrap();
        let id = WorkflowId::new();

        assert!(store.load::<serde_json::Value>(&id).unwrap().is_none());

        let path = store.save(&id, &json!({"status": "completed"})).unwrap();
        assert!(path.ends_with(format!("{id}.json")));
        let loaded: serde_json::Value = store.load(&id).unwrap().unwrap();
        assert_eq!(loaded["status"], "completed");

        store.delete(&id).unwrap();
        store.delete(&id).unwrap();
        assert!(store.load::<serde_json::Value>(&id).unwrap().is_none());
    }
}
