//! Fault-tolerant circuit assembly.
//!
//! Lowers a logical circuit onto a mapped multi-patch layout. Logical qubit
//! `i` (by declaration order) lives in patch `i`. Gates the patch code
//! implements natively are applied transversally to the physical data
//! qubits; every other gate is emitted once on the patch anchors and tagged
//! with the protocol chosen by [`select_protocol`].

use std::collections::{BTreeMap, BTreeSet};

use qcraft_codes::{Mapping, MultiPatchLayout};
use qcraft_ir::{CircuitIr, DeviceCapabilities, GateRecord, QubitSpec};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{CompileError, CompileResult};
use crate::policy::{Protocol, ProtocolPreferences, select_protocol};

/// Protocol chosen for a non-transversal logical gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolDecision {
    pub gate_index: usize,
    pub gate: String,
    /// Logical operands.
    pub qubits: Vec<u32>,
    pub protocol: Protocol,
}

/// A physical circuit together with the decisions taken to build it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtCircuit {
    pub circuit: CircuitIr,
    pub decisions: Vec<ProtocolDecision>,
    /// Patch holding each logical qubit.
    pub patch_of: BTreeMap<u32, usize>,
}

impl FtCircuit {
    /// Number of gates lowered transversally.
    pub fn transversal_gates(&self) -> usize {
        self.circuit.gates.len() - self.decisions.len()
    }
}

/// Builds fault-tolerant physical circuits.
#[derive(Debug, Clone, Default)]
pub struct FtBuilder {
    capabilities: DeviceCapabilities,
    preferences: ProtocolPreferences,
}

impl FtBuilder {
    /// Create a builder for a device with `capabilities`.
    pub fn new(capabilities: DeviceCapabilities) -> Self {
        Self {
            capabilities,
            preferences: ProtocolPreferences::default(),
        }
    }

    /// Set the protocol preferences for non-transversal gates.
    #[must_use]
    pub fn with_preferences(mut self, preferences: ProtocolPreferences) -> Self {
        self.preferences = preferences;
        self
    }

    /// Assemble `logical` on `layout` as placed by `mapping`.
    ///
    /// Fails with [`CompileError::Infeasible`] when the circuit has more
    /// logical qubits than the layout has patches, or when the mapping does
    /// not place every code qubit.
    #[instrument(skip_all, fields(gates = logical.num_gates(), patches = layout.num_patches()))]
    pub fn assemble(
        &self,
        logical: &CircuitIr,
        layout: &MultiPatchLayout,
        mapping: &Mapping,
    ) -> CompileResult<FtCircuit> {
        logical.validate()?;
        let ids = logical.qubits.ids();
        if ids.len() > layout.num_patches() {
            return Err(CompileError::Infeasible(format!(
                "circuit needs {} logical qubits but the layout has {} patches",
                ids.len(),
                layout.num_patches()
            )));
        }
        mapping
            .require_complete()
            .map_err(|e| CompileError::Infeasible(e.to_string()))?;

        let patch_of: BTreeMap<u32, usize> =
            ids.iter().enumerate().map(|(patch, &q)| (q, patch)).collect();
        let data = physical_data_qubits(layout, mapping)?;

        let mut gates = Vec::new();
        let mut decisions = Vec::new();
        for (index, g) in logical.gates.iter().enumerate() {
            let patches: Vec<usize> = g.qubits.iter().map(|q| patch_of[q]).collect();
            let native = !patches.is_empty()
                && patches
                    .iter()
                    .all(|&p| layout.code_spaces[p].supports_gate(&g.name));

            if native {
                lower_transversal(g, &patches, &data, &mut gates);
                continue;
            }

            let protocol = select_protocol(&g.name, &self.capabilities, &self.preferences);
            let anchors: Vec<u32> = patches
                .iter()
                .filter_map(|&p| data[p].first().copied())
                .collect();
            let mut lowered = GateRecord::new(g.name.clone(), anchors)
                .with_id(format!("g{index}:{protocol}"))
                .with_params(g.params.clone());
            lowered.time = g.time;
            gates.push(lowered);
            decisions.push(ProtocolDecision {
                gate_index: index,
                gate: g.name.clone(),
                qubits: g.qubits.clone(),
                protocol,
            });
        }

        let physical: BTreeSet<u32> = mapping.physical_qubits().into_iter().collect();
        debug!(
            "Assembled {} physical gates on {} qubits ({} protocol decisions)",
            gates.len(),
            physical.len(),
            decisions.len()
        );
        Ok(FtCircuit {
            circuit: CircuitIr {
                qubits: QubitSpec::Indices(physical.into_iter().collect()),
                gates,
                clbits: logical.clbits,
            },
            decisions,
            patch_of,
        })
    }
}

/// Physical data qubits of every patch, in ascending code-qubit order.
fn physical_data_qubits(layout: &MultiPatchLayout, mapping: &Mapping) -> CompileResult<Vec<Vec<u32>>> {
    layout
        .code_spaces
        .iter()
        .enumerate()
        .map(|(patch, cs)| {
            cs.data_qubits()
                .into_iter()
                .map(|q| {
                    mapping.physical(patch, q).ok_or_else(|| {
                        CompileError::Infeasible(format!("data qubit {q} of patch {patch} is not mapped"))
                    })
                })
                .collect()
        })
        .collect()
}

fn lower_transversal(g: &GateRecord, patches: &[usize], data: &[Vec<u32>], out: &mut Vec<GateRecord>) {
    let columns = patches.iter().map(|&p| data[p].len()).min().unwrap_or(0);
    for k in 0..columns {
        let qubits: Vec<u32> = patches.iter().map(|&p| data[p][k]).collect();
        let mut lowered = GateRecord::new(g.name.clone(), qubits).with_params(g.params.clone());
        lowered.time = g.time;
        if let Some(id) = &g.id {
            lowered = lowered.with_id(format!("{id}.{k}"));
        }
        out.push(lowered);
    }
}
