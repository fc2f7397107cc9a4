//! Error types for code-family generation and mapping.

use thiserror::Error;

/// Result type for code-family operations.
pub type CodeResult<T> = Result<T, CodeError>;

/// Errors raised by family providers, mappers and estimators.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CodeError {
    /// The family is not registered, or is disabled.
    #[error("Unknown or disabled code family: {0}")]
    UnknownFamily(String),

    /// Bad or missing family, layout or code specification.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Requested patches do not fit on the device.
    #[error(
        "Not enough physical qubits for {num_patches} {layout} patch(es) of distance {distance}: \
         required {required}, available {available} (max feasible distance {max_distance})"
    )]
    InsufficientQubits {
        /// Layout type of the patches.
        layout: String,
        /// Requested code distance.
        distance: u32,
        /// Number of patches.
        num_patches: usize,
        /// Physical qubits required.
        required: usize,
        /// Physical qubits on the device.
        available: usize,
        /// Largest distance the device can hold for this patch count.
        max_distance: u32,
    },

    /// Automatic distance selection found no distance with a valid mapping.
    #[error("No feasible code distance for {num_patches} {layout} patch(es) on this device")]
    NoFeasibleDistance {
        /// Layout type searched.
        layout: String,
        /// Number of patches.
        num_patches: usize,
    },

    /// A physical qubit was assigned twice.
    #[error("Mapping overlap: physical qubit {0} assigned to more than one code qubit")]
    MappingOverlap(u32),

    /// A mapping does not cover every code qubit.
    #[error("Incomplete mapping: {mapped} of {requested} code qubits placed")]
    IncompleteMapping {
        /// Code qubits that received a physical qubit.
        mapped: usize,
        /// Code qubits in the layout.
        requested: usize,
    },

    /// Logical error estimation failed.
    #[error("Estimation error: {0}")]
    Estimation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CodeError::UnknownFamily("toric".into());
        assert_eq!(err.to_string(), "Unknown or disabled code family: toric");

        let err = CodeError::InsufficientQubits {
            layout: "planar".into(),
            distance: 7,
            num_patches: 1,
            required: 97,
            available: 50,
            max_distance: 5,
        };
        assert!(err.to_string().contains("required 97, available 50"));

        let err = CodeError::MappingOverlap(12);
        assert_eq!(
            err.to_string(),
            "Mapping overlap: physical qubit 12 assigned to more than one code qubit"
        );
    }
}
