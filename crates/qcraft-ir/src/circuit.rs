//! Logical circuit description handed to the compiler.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate;

/// Declared qubits of a circuit: either a count or an explicit index list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QubitSpec {
    /// Qubits `0..n`.
    Count(u32),
    /// An explicit, ordered list of qubit indices.
    Indices(Vec<u32>),
}

impl QubitSpec {
    /// Number of declared qubits.
    pub fn len(&self) -> usize {
        match self {
            QubitSpec::Count(n) => *n as usize,
            QubitSpec::Indices(ids) => ids.len(),
        }
    }

    /// Check if no qubits are declared.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check whether `qubit` is declared.
    pub fn contains(&self, qubit: u32) -> bool {
        match self {
            QubitSpec::Count(n) => qubit < *n,
            QubitSpec::Indices(ids) => ids.contains(&qubit),
        }
    }

    /// Declared qubit ids in declaration order.
    pub fn ids(&self) -> Vec<u32> {
        match self {
            QubitSpec::Count(n) => (0..*n).collect(),
            QubitSpec::Indices(ids) => ids.clone(),
        }
    }
}

impl Default for QubitSpec {
    fn default() -> Self {
        QubitSpec::Count(0)
    }
}

/// A single gate application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateRecord {
    /// Optional stable identifier from the circuit source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Gate name, e.g. `"H"` or `"CNOT"`.
    pub name: String,
    /// Operand qubits.
    #[serde(default)]
    pub qubits: Vec<u32>,
    /// Optional time slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<u64>,
    /// Gate parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<f64>,
}

impl GateRecord {
    /// Create a gate on the given qubits.
    pub fn new(name: impl Into<String>, qubits: impl Into<Vec<u32>>) -> Self {
        Self {
            id: None,
            name: name.into(),
            qubits: qubits.into(),
            time: None,
            params: vec![],
        }
    }

    /// Attach an identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attach a time slot.
    #[must_use]
    pub fn with_time(mut self, time: u64) -> Self {
        self.time = Some(time);
        self
    }

    /// Attach parameters.
    #[must_use]
    pub fn with_params(mut self, params: impl Into<Vec<f64>>) -> Self {
        self.params = params.into();
        self
    }

    /// Number of operand qubits.
    pub fn arity(&self) -> usize {
        self.qubits.len()
    }

    /// Check whether this gate is a measurement.
    pub fn is_measurement(&self) -> bool {
        gate::is_measurement(&self.name)
    }
}

/// A logical quantum circuit.
///
/// The circuit is a flat, ordered gate list over a declared qubit set. It is
/// the boundary format accepted by the compiler and, after fault-tolerant
/// lowering, the format of the physical circuit that gets packaged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CircuitIr {
    /// Declared qubits.
    #[serde(default)]
    pub qubits: QubitSpec,
    /// Gates in program order.
    #[serde(default)]
    pub gates: Vec<GateRecord>,
    /// Number of classical bits, if declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clbits: Option<u32>,
}

impl CircuitIr {
    /// Create an empty circuit over qubits `0..num_qubits`.
    pub fn new(num_qubits: u32) -> Self {
        Self {
            qubits: QubitSpec::Count(num_qubits),
            gates: vec![],
            clbits: None,
        }
    }

    /// Create an empty circuit over an explicit qubit list.
    pub fn with_qubits(qubits: impl Into<Vec<u32>>) -> Self {
        Self {
            qubits: QubitSpec::Indices(qubits.into()),
            gates: vec![],
            clbits: None,
        }
    }

    /// Parse a circuit from JSON.
    pub fn from_json(json: &str) -> IrResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Append a gate.
    pub fn push(&mut self, gate: GateRecord) -> &mut Self {
        self.gates.push(gate);
        self
    }

    /// Builder-style gate append.
    #[must_use]
    pub fn gate(mut self, name: impl Into<String>, qubits: impl Into<Vec<u32>>) -> Self {
        self.gates.push(GateRecord::new(name, qubits));
        self
    }

    /// Number of declared qubits.
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Number of logical qubits used for resource estimates (never zero).
    pub fn logical_qubits(&self) -> usize {
        self.num_qubits().max(1)
    }

    /// Number of gates.
    pub fn num_gates(&self) -> usize {
        self.gates.len()
    }

    /// All qubits referenced by at least one gate.
    pub fn used_qubits(&self) -> BTreeSet<u32> {
        self.gates
            .iter()
            .flat_map(|g| g.qubits.iter().copied())
            .collect()
    }

    /// Check that every gate operand is declared and no gate repeats an operand.
    pub fn validate(&self) -> IrResult<()> {
        for g in &self.gates {
            let mut seen = BTreeSet::new();
            for &q in &g.qubits {
                if !self.qubits.contains(q) {
                    return Err(IrError::QubitOutOfRange {
                        gate_name: g.name.clone(),
                        qubit: q,
                    });
                }
                if !seen.insert(q) {
                    return Err(IrError::DuplicateQubit {
                        gate_name: g.name.clone(),
                        qubit: q,
                    });
                }
            }
        }
        Ok(())
    }
}
