//! Error types for the compilation stages.

use qcraft_codes::CodeError;
use qcraft_ir::IrError;
use thiserror::Error;

/// Errors that can occur during compilation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Malformed circuit or device input to the cost model.
    #[error("Cost model error: {0}")]
    CostModel(String),

    /// The fault-tolerant circuit cannot be assembled on this layout.
    #[error("Infeasible fault-tolerant assembly: {0}")]
    Infeasible(String),

    /// A stage needs an input that an earlier stage did not produce.
    #[error("Missing input: {0}")]
    MissingInput(&'static str),

    /// Code family error.
    #[error(transparent)]
    Code(#[from] CodeError),

    /// Circuit or device model error.
    #[error(transparent)]
    Ir(#[from] IrError),
}

impl CompileError {
    /// Whether this error means the requested qubits or distance cannot fit.
    pub fn is_infeasible(&self) -> bool {
        matches!(
            self,
            CompileError::Infeasible(_)
                | CompileError::Code(CodeError::InsufficientQubits { .. })
                | CompileError::Code(CodeError::IncompleteMapping { .. })
        )
    }
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infeasible_classification() {
        assert!(CompileError::Infeasible("3 logical qubits, 2 patches".into()).is_infeasible());
        assert!(
            CompileError::Code(CodeError::IncompleteMapping {
                mapped: 3,
                requested: 17
            })
            .is_infeasible()
        );
        assert!(!CompileError::CostModel("bad rate".into()).is_infeasible());
        assert!(!CompileError::MissingInput("mapping").is_infeasible());
    }
}
