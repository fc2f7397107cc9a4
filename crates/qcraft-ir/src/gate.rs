//! Gate-name classification.
//!
//! Gate records carry free-form names, so every classification here is
//! case-insensitive and treats `CX` as an alias of `CNOT`.

/// Non-Clifford gates that need a dedicated fault-tolerant protocol.
pub const NON_CLIFFORD_GATES: [&str; 5] = ["T", "TDG", "CCX", "CS", "CSDG"];

/// Clifford-group gates understood by the compiler.
pub const CLIFFORD_GATES: [&str; 12] = [
    "I", "ID", "X", "Y", "Z", "H", "S", "SDG", "SX", "CNOT", "CZ", "SWAP",
];

/// Gates that are their own inverse.
pub const SELF_INVERSE_GATES: [&str; 8] = ["X", "Y", "Z", "H", "CNOT", "CZ", "SWAP", "ID"];

/// Coarse classification of a gate name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateClass {
    /// Member of the Clifford group.
    Clifford,
    /// Requires magic states or an equivalent protocol.
    NonClifford,
    /// Measurement in the computational basis.
    Measurement,
    /// Anything else (parameterized rotations, custom gates).
    Other,
}

/// Normalize a gate name: upper-case, with `CX` folded into `CNOT`.
pub fn canonical_name(name: &str) -> String {
    let upper = name.trim().to_ascii_uppercase();
    match upper.as_str() {
        "CX" => "CNOT".to_string(),
        "MEASURE_Z" | "M" => "MEASURE".to_string(),
        _ => upper,
    }
}

/// Classify a gate by name.
pub fn classify(name: &str) -> GateClass {
    let canonical = canonical_name(name);
    if canonical == "MEASURE" {
        GateClass::Measurement
    } else if NON_CLIFFORD_GATES.contains(&canonical.as_str()) {
        GateClass::NonClifford
    } else if CLIFFORD_GATES.contains(&canonical.as_str()) {
        GateClass::Clifford
    } else {
        GateClass::Other
    }
}

/// Check whether a gate is non-Clifford.
pub fn is_non_clifford(name: &str) -> bool {
    classify(name) == GateClass::NonClifford
}

/// Check whether a gate is a measurement.
pub fn is_measurement(name: &str) -> bool {
    classify(name) == GateClass::Measurement
}

/// Check whether a gate is `T` or `Tdg`.
pub fn is_t_like(name: &str) -> bool {
    matches!(canonical_name(name).as_str(), "T" | "TDG")
}

/// Check whether a gate entangles two qubits.
pub fn is_entangling(name: &str) -> bool {
    matches!(canonical_name(name).as_str(), "CNOT" | "CZ" | "SWAP")
}

/// Check whether a gate is its own inverse.
pub fn is_self_inverse(name: &str) -> bool {
    SELF_INVERSE_GATES.contains(&canonical_name(name).as_str())
}

/// Compare two gate names after normalization.
pub fn same_gate(a: &str, b: &str) -> bool {
    canonical_name(a) == canonical_name(b)
}
