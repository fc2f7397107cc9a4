//! Error types for packaging and export.

use thiserror::Error;

/// Errors that can occur while exporting a job.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExportError {
    /// The export policy forbids the package from leaving the machine.
    #[error("Export blocked by policy '{policy}'")]
    PermissionDenied { policy: String },

    /// Unrecognized export policy name.
    #[error("Unknown export policy '{0}'. Valid: none, obfuscate, strict-local")]
    UnknownPolicy(String),

    /// Manifest serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;
