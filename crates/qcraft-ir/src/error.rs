//! Error types for the IR crate.

use thiserror::Error;

/// Errors that can occur while building or validating circuits and devices.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// A gate references a qubit outside the declared qubit set.
    #[error("Gate '{gate_name}' references qubit {qubit}, which is not declared in the circuit")]
    QubitOutOfRange {
        /// Name of the offending gate.
        gate_name: String,
        /// The undeclared qubit.
        qubit: u32,
    },

    /// A gate lists the same qubit twice.
    #[error("Duplicate qubit {qubit} in gate '{gate_name}'")]
    DuplicateQubit {
        /// Name of the offending gate.
        gate_name: String,
        /// The repeated qubit.
        qubit: u32,
    },

    /// Connectivity is not symmetric.
    #[error("Connectivity is not symmetric: {from} -> {to} has no reverse edge")]
    AsymmetricConnectivity {
        /// Source of the one-way edge.
        from: u32,
        /// Target of the one-way edge.
        to: u32,
    },

    /// An error rate is outside `[0, 1]`.
    #[error("Error rate for '{name}' must be within [0, 1], got {value}")]
    InvalidErrorRate {
        /// Gate name or qubit label.
        name: String,
        /// The rejected value.
        value: f64,
    },

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IrError::QubitOutOfRange {
            gate_name: "CNOT".into(),
            qubit: 7,
        };
        assert_eq!(
            err.to_string(),
            "Gate 'CNOT' references qubit 7, which is not declared in the circuit"
        );

        let err = IrError::AsymmetricConnectivity { from: 0, to: 3 };
        assert_eq!(
            err.to_string(),
            "Connectivity is not symmetric: 0 -> 3 has no reverse edge"
        );
    }
}
