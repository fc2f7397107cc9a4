//! Error types for the orchestrator.

use thiserror::Error;

/// Errors raised while configuring the orchestrator or persisting results.
///
/// Pipeline stage failures never surface here; they are recorded on the
/// workflow instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OrchestratorError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid workflow identifier.
    #[error("Invalid workflow id: {0}")]
    InvalidWorkflowId(String),

    /// Invalid device profile.
    #[error("Device error: {0}")]
    Device(#[from] qcraft_ir::IrError),

    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

/// Result type for orchestrator operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
