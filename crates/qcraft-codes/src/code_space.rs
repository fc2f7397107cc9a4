//! Code-space and multi-patch layout types.
//!
//! A [`CodeSpace`] is one patch of a QEC code in its own local qubit-id
//! space. A [`MultiPatchLayout`] combines several patches: each patch keeps
//! its local ids, and the merged views (`qubit_layout`, `stabilizer_map`,
//! `logical_operators`, `adjacency`) use global ids obtained by adding the
//! running total of ids allocated by earlier patches.

use std::collections::{BTreeMap, BTreeSet};

use qcraft_ir::QubitGraph;
use qcraft_ir::gate::canonical_name;
use serde::{Deserialize, Serialize};

use crate::error::{CodeError, CodeResult};

/// Horizontal gap between patches in the merged coordinate frame.
const PATCH_SPACING: i32 = 2;

/// Role of a qubit inside a code patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QubitRole {
    /// Carries encoded information.
    Data,
    /// Measures an X-type stabilizer.
    AncillaX,
    /// Measures a Z-type stabilizer.
    AncillaZ,
}

impl QubitRole {
    /// Check whether this is an ancilla role.
    pub fn is_ancilla(self) -> bool {
        !matches!(self, QubitRole::Data)
    }
}

/// Position and role of one code qubit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QubitSite {
    pub x: i32,
    pub y: i32,
    pub role: QubitRole,
}

impl QubitSite {
    /// Create a site.
    pub fn new(x: i32, y: i32, role: QubitRole) -> Self {
        Self { x, y, role }
    }
}

/// A parity check measured through one ancilla.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stabilizer {
    pub ancilla: u32,
    pub data_qubits: Vec<u32>,
}

/// X- and Z-type stabilizers of a code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilizerMap {
    #[serde(rename = "X", default)]
    pub x: Vec<Stabilizer>,
    #[serde(rename = "Z", default)]
    pub z: Vec<Stabilizer>,
}

impl StabilizerMap {
    /// Total number of stabilizers.
    pub fn len(&self) -> usize {
        self.x.len() + self.z.len()
    }

    /// Check if there are no stabilizers.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty() && self.z.is_empty()
    }

    /// All stabilizers, X first.
    pub fn iter(&self) -> impl Iterator<Item = &Stabilizer> {
        self.x.iter().chain(self.z.iter())
    }

    fn shifted(&self, offset: u32) -> Self {
        let shift = |s: &Stabilizer| Stabilizer {
            ancilla: s.ancilla + offset,
            data_qubits: s.data_qubits.iter().map(|q| q + offset).collect(),
        };
        Self {
            x: self.x.iter().map(shift).collect(),
            z: self.z.iter().map(shift).collect(),
        }
    }
}

/// Supports of the logical X and Z operators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalOperators {
    #[serde(rename = "X", default)]
    pub x: Vec<u32>,
    #[serde(rename = "Z", default)]
    pub z: Vec<u32>,
}

/// One patch of a QEC code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeSpace {
    /// Family that generated this patch.
    pub family: String,
    /// Layout type, e.g. `"planar"`.
    pub layout_type: String,
    /// Code distance.
    pub code_distance: u32,
    /// Every code qubit with its coordinates and role.
    pub qubit_layout: BTreeMap<u32, QubitSite>,
    /// Stabilizers.
    pub stabilizer_map: StabilizerMap,
    /// Logical operator supports.
    pub logical_operators: LogicalOperators,
    /// Interaction graph between code qubits.
    pub adjacency: QubitGraph,
    /// Logical gates the code implements without a dedicated protocol.
    pub supported_logical_gates: BTreeSet<String>,
}

impl CodeSpace {
    /// Number of code qubits.
    pub fn num_qubits(&self) -> usize {
        self.qubit_layout.len()
    }

    /// Data qubit ids in ascending order.
    pub fn data_qubits(&self) -> Vec<u32> {
        self.qubits_with(|role| role == QubitRole::Data)
    }

    /// Ancilla qubit ids in ascending order.
    pub fn ancilla_qubits(&self) -> Vec<u32> {
        self.qubits_with(QubitRole::is_ancilla)
    }

    fn qubits_with(&self, pred: impl Fn(QubitRole) -> bool) -> Vec<u32> {
        self.qubit_layout
            .iter()
            .filter(|(_, site)| pred(site.role))
            .map(|(&q, _)| q)
            .collect()
    }

    /// Number of ids this patch allocates: one past the largest id in use.
    pub fn id_span(&self) -> u32 {
        let layout_max = self.qubit_layout.keys().next_back().copied();
        let ancilla_max = self.stabilizer_map.iter().map(|s| s.ancilla).max();
        layout_max.max(ancilla_max).map_or(0, |m| m + 1)
    }

    /// Check whether `gate` is implemented natively by this code.
    pub fn supports_gate(&self, gate: &str) -> bool {
        let name = canonical_name(gate);
        self.supported_logical_gates
            .iter()
            .any(|g| canonical_name(g) == name)
    }

    /// Copy of this patch with every id shifted by `offset`.
    pub fn shifted(&self, offset: u32) -> Self {
        Self {
            family: self.family.clone(),
            layout_type: self.layout_type.clone(),
            code_distance: self.code_distance,
            qubit_layout: self
                .qubit_layout
                .iter()
                .map(|(&q, &site)| (q + offset, site))
                .collect(),
            stabilizer_map: self.stabilizer_map.shifted(offset),
            logical_operators: LogicalOperators {
                x: self.logical_operators.x.iter().map(|q| q + offset).collect(),
                z: self.logical_operators.z.iter().map(|q| q + offset).collect(),
            },
            adjacency: self.adjacency.relabel(|q| q + offset),
            supported_logical_gates: self.supported_logical_gates.clone(),
        }
    }

    /// Check internal consistency: every referenced id exists with the right role.
    pub fn validate(&self) -> CodeResult<()> {
        if self.qubit_layout.is_empty() {
            return Err(CodeError::Configuration(format!(
                "{} layout of distance {} is empty",
                self.layout_type, self.code_distance
            )));
        }
        let role_of = |q: u32| self.qubit_layout.get(&q).map(|s| s.role);
        for (stabs, expected) in [
            (&self.stabilizer_map.x, QubitRole::AncillaX),
            (&self.stabilizer_map.z, QubitRole::AncillaZ),
        ] {
            for stab in stabs {
                if role_of(stab.ancilla) != Some(expected) {
                    return Err(CodeError::Configuration(format!(
                        "stabilizer ancilla {} is not a {:?} qubit",
                        stab.ancilla, expected
                    )));
                }
                if let Some(&q) = stab
                    .data_qubits
                    .iter()
                    .find(|&&q| role_of(q) != Some(QubitRole::Data))
                {
                    return Err(CodeError::Configuration(format!(
                        "stabilizer on ancilla {} references non-data qubit {q}",
                        stab.ancilla
                    )));
                }
            }
        }
        let logical = self
            .logical_operators
            .x
            .iter()
            .chain(self.logical_operators.z.iter());
        for &q in logical {
            if role_of(q) != Some(QubitRole::Data) {
                return Err(CodeError::Configuration(format!(
                    "logical operator references non-data qubit {q}"
                )));
            }
        }
        Ok(())
    }

    fn width(&self) -> i32 {
        let xs = self.qubit_layout.values().map(|s| s.x);
        match (xs.clone().min(), xs.max()) {
            (Some(lo), Some(hi)) => hi - lo + 1,
            _ => 0,
        }
    }
}

/// Placement of one patch inside a [`MultiPatchLayout`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchInfo {
    pub index: usize,
    /// Added to local ids to obtain global ids.
    pub offset: u32,
    pub layout_type: String,
    pub code_distance: u32,
    pub num_qubits: usize,
}

/// Several code patches with globally unique qubit ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiPatchLayout {
    pub family: String,
    /// Layout type of the first patch.
    pub layout_type: String,
    /// Distance of the first patch.
    pub code_distance: u32,
    /// Patches in local id space.
    pub code_spaces: Vec<CodeSpace>,
    pub patches: Vec<PatchInfo>,
    /// Merged views in global id space.
    pub qubit_layout: BTreeMap<u32, QubitSite>,
    pub stabilizer_map: StabilizerMap,
    pub logical_operators: LogicalOperators,
    pub adjacency: QubitGraph,
}

impl MultiPatchLayout {
    /// Combine patches, tagging each with `family`.
    pub fn combine(family: impl Into<String>, code_spaces: Vec<CodeSpace>) -> Self {
        let family = family.into();
        let mut code_spaces = code_spaces;
        let mut patches = Vec::with_capacity(code_spaces.len());
        let mut qubit_layout = BTreeMap::new();
        let mut stabilizer_map = StabilizerMap::default();
        let mut logical_operators = LogicalOperators::default();
        let mut adjacency = QubitGraph::new();

        let mut offset = 0u32;
        let mut x_shift = 0i32;
        for (index, cs) in code_spaces.iter_mut().enumerate() {
            cs.family = family.clone();
            let global = cs.shifted(offset);
            for (q, site) in global.qubit_layout {
                qubit_layout.insert(q, QubitSite { x: site.x + x_shift, ..site });
            }
            stabilizer_map.x.extend(global.stabilizer_map.x);
            stabilizer_map.z.extend(global.stabilizer_map.z);
            logical_operators.x.extend(global.logical_operators.x);
            logical_operators.z.extend(global.logical_operators.z);
            adjacency.extend(&global.adjacency);
            patches.push(PatchInfo {
                index,
                offset,
                layout_type: cs.layout_type.clone(),
                code_distance: cs.code_distance,
                num_qubits: cs.num_qubits(),
            });
            offset += cs.id_span();
            x_shift += cs.width() + PATCH_SPACING;
        }

        let (layout_type, code_distance) = code_spaces
            .first()
            .map(|cs| (cs.layout_type.clone(), cs.code_distance))
            .unwrap_or_default();

        Self {
            family,
            layout_type,
            code_distance,
            code_spaces,
            patches,
            qubit_layout,
            stabilizer_map,
            logical_operators,
            adjacency,
        }
    }

    /// Number of patches.
    pub fn num_patches(&self) -> usize {
        self.code_spaces.len()
    }

    /// Total number of code qubits across all patches.
    pub fn total_qubits(&self) -> usize {
        self.code_spaces.iter().map(CodeSpace::num_qubits).sum()
    }

    /// Global id of a patch-local qubit.
    pub fn global_id(&self, patch: usize, local: u32) -> Option<u32> {
        let cs = self.code_spaces.get(patch)?;
        cs.qubit_layout
            .contains_key(&local)
            .then(|| self.patches[patch].offset + local)
    }
}
