//! Workflow identity, status and step records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{OrchestratorError, OrchestratorResult};

/// Unique identifier for a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(pub Uuid);

impl WorkflowId {
    /// Create a new random workflow ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a workflow ID from a string.
    pub fn parse(s: &str) -> OrchestratorResult<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| OrchestratorError::InvalidWorkflowId(format!("{s}: {e}")))
    }
}

impl Default for WorkflowId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
    /// Reported for ids the orchestrator has never seen.
    Unknown,
}

impl WorkflowStatus {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowStatus::Completed | WorkflowStatus::Failed | WorkflowStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Running => "running",
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Failed => "failed",
            WorkflowStatus::Cancelled => "cancelled",
            WorkflowStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed step.
///
/// Most steps are plain names such as `analyzed`; the code selection step
/// records what was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Named(String),
    CodeSelected {
        code_family: String,
        layout: String,
        distance: u32,
    },
}

impl Step {
    pub fn named(name: impl Into<String>) -> Self {
        Step::Named(name.into())
    }

    /// The step name, or `None` for a code selection.
    pub fn name(&self) -> Option<&str> {
        match self {
            Step::Named(name) => Some(name),
            Step::CodeSelected { .. } => None,
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Named(name) => f.write_str(name),
            Step::CodeSelected {
                code_family,
                layout,
                distance,
            } => write!(f, "{code_family}/{layout}/d={distance}"),
        }
    }
}

/// Per-run workflow record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub status: WorkflowStatus,
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl WorkflowState {
    /// A freshly started, running workflow.
    pub fn running() -> Self {
        Self {
            status: WorkflowStatus::Running,
            steps: Vec::new(),
            error: None,
            started_at: Some(Utc::now()),
            finished_at: None,
        }
    }

    /// The record reported for an unknown workflow id.
    pub fn unknown() -> Self {
        Self {
            status: WorkflowStatus::Unknown,
            steps: Vec::new(),
            error: None,
            started_at: None,
            finished_at: None,
        }
    }

    /// Whether `step` was completed.
    pub fn has_step(&self, step: &str) -> bool {
        self.steps.iter().any(|s| s.name() == Some(step))
    }
}
