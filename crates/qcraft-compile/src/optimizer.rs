//! Peephole cancellation of self-inverse gate pairs.

use qcraft_ir::{CircuitIr, GateRecord, gate};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome of [`optimize_circuit`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub gates_before: usize,
    pub gates_after: usize,
    pub cancelled_pairs: usize,
}

fn cancels(a: &GateRecord, b: &GateRecord) -> bool {
    if !gate::is_self_inverse(&a.name) || !gate::same_gate(&a.name, &b.name) {
        return false;
    }
    if !a.params.is_empty() || !b.params.is_empty() {
        return false;
    }
    if a.qubits == b.qubits {
        return true;
    }
    let symmetric = matches!(gate::canonical_name(&a.name).as_str(), "CZ" | "SWAP");
    symmetric && a.qubits.len() == 2 && a.qubits[0] == b.qubits[1] && a.qubits[1] == b.qubits[0]
}

/// Remove adjacent pairs of identical self-inverse gates.
///
/// Cancellation cascades: `H X X H` reduces to nothing. Parameterized gates
/// are never cancelled.
pub fn optimize_circuit(circuit: &CircuitIr) -> (CircuitIr, OptimizationReport) {
    let mut kept: Vec<GateRecord> = Vec::with_capacity(circuit.gates.len());
    let mut cancelled_pairs = 0;

    for g in &circuit.gates {
        if kept.last().is_some_and(|top| cancels(top, g)) {
            kept.pop();
            cancelled_pairs += 1;
        } else {
            kept.push(g.clone());
        }
    }

    let report = OptimizationReport {
        gates_before: circuit.gates.len(),
        gates_after: kept.len(),
        cancelled_pairs,
    };
    debug!(
        "Optimizer cancelled {} gate pairs ({} -> {} gates)",
        cancelled_pairs, report.gates_before, report.gates_after
    );
    let optimized = CircuitIr {
        qubits: circuit.qubits.clone(),
        gates: kept,
        clbits: circuit.clbits,
    };
    (optimized, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancels_nested_pairs() {
        let circuit = CircuitIr::new(2)
            .gate("H", [0])
            .gate("CX", [0, 1])
            .gate("cnot", [0, 1])
            .gate("h", [0])
            .gate("MEASURE", [0]);
        let (optimized, report) = optimize_circuit(&circuit);
        assert_eq!(optimized.gates.len(), 1);
        assert_eq!(optimized.gates[0].name, "MEASURE");
        assert_eq!(report.cancelled_pairs, 2);
        assert_eq!(report.gates_before, 5);
    }

    #[test]
    fn test_keeps_non_matching_pairs() {
        let circuit = CircuitIr::new(2)
            .gate("CX", [0, 1])
            .gate("CX", [1, 0])
            .gate("T", [0])
            .gate("T", [0])
            .gate("S", [1])
            .gate("S", [1]);
        let (optimized, report) = optimize_circuit(&circuit);
        assert_eq!(optimized.gates.len(), 6);
        assert_eq!(report.cancelled_pairs, 0);
    }

    #[test]
    fn test_symmetric_gates_cancel_in_either_order() {
        let circuit = CircuitIr::new(2).gate("CZ", [0, 1]).gate("CZ", [1, 0]);
        let (optimized, _) = optimize_circuit(&circuit);
        assert!(optimized.gates.is_empty());
    }

    #[test]
    fn test_parameterized_gates_are_kept() {
        let mut circuit = CircuitIr::new(1);
        circuit.push(GateRecord::new("X", [0]).with_params([0.5]));
        circuit.push(GateRecord::new("X", [0]).with_params([0.5]));
        let (optimized, _) = optimize_circuit(&circuit);
        assert_eq!(optimized.gates.len(), 2);
    }
}
