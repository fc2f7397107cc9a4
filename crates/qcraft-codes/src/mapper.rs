//! Assignment of code qubits to physical qubits.
//!
//! The [`MappingStrategy`] trait is the contract every mapper satisfies: no
//! physical qubit is ever assigned twice, and the same [`MappingConstraints`]
//! shape is accepted. [`GreedyMapper`] is the deterministic baseline.

use std::collections::{BTreeMap, BTreeSet};

use qcraft_ir::DeviceProfile;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::code_space::MultiPatchLayout;
use crate::error::{CodeError, CodeResult};

/// Constraints on how patches are generated and placed.
///
/// Every field is optional so that user preferences and discovery hints can
/// be layered with [`MappingConstraints::merged_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_patches: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub patch_shapes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub patch_distances: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_distance_between_patches: Option<u32>,
    /// Physical qubits that must not be used.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub exclude_qubits: BTreeSet<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_logical_qubits: Option<usize>,
    /// Reserve one extra patch for code switching.
    pub require_code_switching: bool,
}

impl MappingConstraints {
    /// Constraints for a fixed number of patches.
    pub fn with_patches(num_patches: usize) -> Self {
        Self {
            num_patches: Some(num_patches),
            ..Self::default()
        }
    }

    /// Number of patches to generate: explicit count, else logical qubits
    /// (plus one when code switching is required), never less than one.
    pub fn resolved_num_patches(&self) -> usize {
        let n = match (self.num_patches, self.num_logical_qubits) {
            (Some(n), _) => n,
            (None, Some(l)) => l + usize::from(self.require_code_switching),
            (None, None) => 1,
        };
        n.max(1)
    }

    /// Layer `overrides` on top of `self`: set fields in `overrides` win,
    /// excluded qubits are unioned.
    #[must_use]
    pub fn merged_with(&self, overrides: &MappingConstraints) -> Self {
        Self {
            num_patches: overrides.num_patches.or(self.num_patches),
            patch_shapes: if overrides.patch_shapes.is_empty() {
                self.patch_shapes.clone()
            } else {
                overrides.patch_shapes.clone()
            },
            patch_distances: if overrides.patch_distances.is_empty() {
                self.patch_distances.clone()
            } else {
                overrides.patch_distances.clone()
            },
            min_distance_between_patches: overrides
                .min_distance_between_patches
                .or(self.min_distance_between_patches),
            exclude_qubits: self
                .exclude_qubits
                .union(&overrides.exclude_qubits)
                .copied()
                .collect(),
            num_logical_qubits: overrides.num_logical_qubits.or(self.num_logical_qubits),
            require_code_switching: self.require_code_switching
                || overrides.require_code_switching,
        }
    }
}

/// Physical placement of one patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchAssignment {
    pub patch_id: usize,
    /// Local code qubit id to physical qubit id.
    pub assignments: BTreeMap<u32, u32>,
    /// Code qubits in the patch.
    pub requested: usize,
}

impl PatchAssignment {
    /// Check whether every code qubit of the patch was placed.
    pub fn is_complete(&self) -> bool {
        self.assignments.len() == self.requested
    }
}

/// Summary statistics for a mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingMetrics {
    pub mapped_qubits: usize,
    pub requested_qubits: usize,
    pub complete: bool,
    /// Mean readout error over the chosen physical qubits.
    pub mean_readout_error: f64,
    /// Fraction of code adjacency edges that land on physically coupled qubits.
    pub adjacency_preserved: f64,
}

/// Assignment of `(patch_id, code_qubit_id)` to physical qubits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    pub patches: Vec<PatchAssignment>,
    pub has_overlap: bool,
    pub optimization_metrics: MappingMetrics,
}

impl Mapping {
    /// Flattened `(patch_id, code_qubit_id) -> physical` view.
    pub fn logical_to_physical(&self) -> BTreeMap<(usize, u32), u32> {
        self.patches
            .iter()
            .flat_map(|p| p.assignments.iter().map(move |(&q, &hw)| ((p.patch_id, q), hw)))
            .collect()
    }

    /// Physical qubit assigned to a code qubit.
    pub fn physical(&self, patch: usize, code_qubit: u32) -> Option<u32> {
        self.patches
            .iter()
            .find(|p| p.patch_id == patch)
            .and_then(|p| p.assignments.get(&code_qubit).copied())
    }

    /// All assigned physical qubits, in assignment order per patch.
    pub fn physical_qubits(&self) -> Vec<u32> {
        self.patches
            .iter()
            .flat_map(|p| p.assignments.values().copied())
            .collect()
    }

    /// Number of placed code qubits.
    pub fn len(&self) -> usize {
        self.patches.iter().map(|p| p.assignments.len()).sum()
    }

    /// Check if nothing was placed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check whether every patch is fully placed.
    pub fn is_complete(&self) -> bool {
        !self.patches.is_empty() && self.patches.iter().all(PatchAssignment::is_complete)
    }

    /// Verify the no-overlap invariant.
    pub fn verify(&self) -> CodeResult<()> {
        let mut seen = BTreeSet::new();
        for hw in self.physical_qubits() {
            if !seen.insert(hw) {
                return Err(CodeError::MappingOverlap(hw));
            }
        }
        Ok(())
    }

    /// Fail with [`CodeError::IncompleteMapping`] unless every code qubit is placed.
    pub fn require_complete(&self) -> CodeResult<()> {
        if self.is_complete() {
            Ok(())
        } else {
            Err(CodeError::IncompleteMapping {
                mapped: self.len(),
                requested: self.patches.iter().map(|p| p.requested).sum(),
            })
        }
    }
}

/// A strategy that places a multi-patch layout on a device.
///
/// Implementations must never assign a physical qubit twice.
pub trait MappingStrategy: Send + Sync {
    /// Strategy name for logs.
    fn name(&self) -> &str;

    /// Map every patch of `layout` onto `device`.
    fn map(
        &self,
        layout: &MultiPatchLayout,
        device: &DeviceProfile,
        constraints: &MappingConstraints,
    ) -> CodeResult<Mapping>;
}

impl std::fmt::Debug for dyn MappingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MappingStrategy({})", self.name())
    }
}

/// Deterministic greedy mapper.
///
/// Physical qubits are sorted by ascending readout error (stable, so ties keep
/// id order); patches are filled in order, code qubits in ascending local id.
/// When the pool runs dry the current patch is left partial.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyMapper;

impl GreedyMapper {
    /// Create a greedy mapper.
    pub fn new() -> Self {
        Self
    }

    fn candidate_pool(device: &DeviceProfile, constraints: &MappingConstraints) -> Vec<u32> {
        let mut pool: Vec<u32> = device
            .physical_qubits()
            .into_iter()
            .filter(|q| !constraints.exclude_qubits.contains(q))
            .collect();
        pool.sort_by(|a, b| device.readout_error(*a).total_cmp(&device.readout_error(*b)));
        pool
    }
}

impl MappingStrategy for GreedyMapper {
    fn name(&self) -> &str {
        "greedy"
    }

    fn map(
        &self,
        layout: &MultiPatchLayout,
        device: &DeviceProfile,
        constraints: &MappingConstraints,
    ) -> CodeResult<Mapping> {
        let pool = Self::candidate_pool(device, constraints);
        let mut next = pool.into_iter();
        let mut patches = Vec::with_capacity(layout.num_patches());

        for (patch_id, cs) in layout.code_spaces.iter().enumerate() {
            let mut assignments = BTreeMap::new();
            for &q in cs.qubit_layout.keys() {
                match next.next() {
                    Some(hw) => {
                        assignments.insert(q, hw);
                    }
                    None => break,
                }
            }
            if assignments.len() < cs.num_qubits() {
                debug!(
                    "Physical pool exhausted in patch {}: {} of {} qubits placed",
                    patch_id,
                    assignments.len(),
                    cs.num_qubits()
                );
            }
            patches.push(PatchAssignment {
                patch_id,
                assignments,
                requested: cs.num_qubits(),
            });
        }

        let mut mapping = Mapping {
            patches,
            has_overlap: false,
            optimization_metrics: MappingMetrics::default(),
        };
        mapping.has_overlap = mapping.verify().is_err();
        mapping.optimization_metrics = compute_metrics(layout, &mapping, device);
        Ok(mapping)
    }
}

/// Compute [`MappingMetrics`] for a mapping.
pub fn compute_metrics(
    layout: &MultiPatchLayout,
    mapping: &Mapping,
    device: &DeviceProfile,
) -> MappingMetrics {
    let physical = mapping.physical_qubits();
    let mean_readout_error = if physical.is_empty() {
        0.0
    } else {
        physical.iter().map(|&q| device.readout_error(q)).sum::<f64>() / physical.len() as f64
    };

    let mut edges = 0usize;
    let mut preserved = 0usize;
    for (patch_id, cs) in layout.code_spaces.iter().enumerate() {
        for (a, b) in cs.adjacency.edges() {
            if let (Some(pa), Some(pb)) = (mapping.physical(patch_id, a), mapping.physical(patch_id, b)) {
                edges += 1;
                if device.connectivity.is_empty() || device.connectivity.is_connected(pa, pb) {
                    preserved += 1;
                }
            }
        }
    }
    let adjacency_preserved = if edges == 0 {
        1.0
    } else {
        preserved as f64 / edges as f64
    };

    MappingMetrics {
        mapped_qubits: mapping.len(),
        requested_qubits: layout.total_qubits(),
        complete: mapping.is_complete(),
        mean_readout_error,
        adjacency_preserved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code_space::{CodeSpace, LogicalOperators, QubitRole, QubitSite, StabilizerMap};
    use qcraft_ir::QubitGraph;

    fn tiny_patch(n: u32) -> CodeSpace {
        CodeSpace {
            family: "test".into(),
            layout_type: "line".into(),
            code_distance: 1,
            qubit_layout: (0..n)
                .map(|q| (q, QubitSite::new(q as i32, 0, QubitRole::Data)))
                .collect(),
            stabilizer_map: StabilizerMap::default(),
            logical_operators: LogicalOperators::default(),
            adjacency: QubitGraph::linear(n),
            supported_logical_gates: BTreeSet::new(),
        }
    }

    fn device() -> DeviceProfile {
        DeviceProfile::new("sim", "line-6", 6)
            .with_connectivity(QubitGraph::linear(6))
            .with_readout_error(0, 0.05)
            .with_readout_error(1, 0.01)
            .with_readout_error(2, 0.02)
            .with_readout_error(3, 0.01)
            .with_readout_error(4, 0.03)
            .with_readout_error(5, 0.04)
    }

    #[test]
    fn test_greedy_prefers_low_readout_error() {
        let layout = MultiPatchLayout::combine("test", vec![tiny_patch(2), tiny_patch(2)]);
        let mapping = GreedyMapper::new()
            .map(&layout, &device(), &MappingConstraints::default())
            .unwrap();
        assert_eq!(mapping.physical(0, 0), Some(1));
        assert_eq!(mapping.physical(0, 1), Some(3));
        assert_eq!(mapping.physical(1, 0), Some(2));
        assert_eq!(mapping.physical(1, 1), Some(4));
        assert!(!mapping.has_overlap);
        assert!(mapping.is_complete());
        assert!(mapping.verify().is_ok());
    }

    #[test]
    fn test_greedy_respects_exclusions() {
        let layout = MultiPatchLayout::combine("test", vec![tiny_patch(3)]);
        let constraints = MappingConstraints {
            exclude_qubits: [1, 3].into_iter().collect(),
            ..MappingConstraints::default()
        };
        let mapping = GreedyMapper::new().map(&layout, &device(), &constraints).unwrap();
        let used = mapping.physical_qubits();
        assert!(!used.contains(&1));
        assert!(!used.contains(&3));
        assert_eq!(used.len(), 3);
    }

    #[test]
    fn test_greedy_partial_when_pool_exhausted() {
        let layout = MultiPatchLayout::combine("test", vec![tiny_patch(4), tiny_patch(4)]);
        let mapping = GreedyMapper::new()
            .map(&layout, &device(), &MappingConstraints::default())
            .unwrap();
        assert_eq!(mapping.len(), 6);
        assert!(mapping.patches[0].is_complete());
        assert!(!mapping.patches[1].is_complete());
        assert!(!mapping.is_complete());
        assert!(!mapping.has_overlap);
        assert!(matches!(
            mapping.require_complete(),
            Err(CodeError::IncompleteMapping { mapped: 6, requested: 8 })
        ));
        assert!(!mapping.optimization_metrics.complete);
    }

    #[test]
    fn test_greedy_without_connectivity_uses_max_qubits() {
        let layout = MultiPatchLayout::combine("test", vec![tiny_patch(3)]);
        let device = DeviceProfile::new("sim", "bare", 3);
        let mapping = GreedyMapper::new()
            .map(&layout, &device, &MappingConstraints::default())
            .unwrap();
        assert_eq!(mapping.physical_qubits(), vec![0, 1, 2]);
        assert_eq!(mapping.optimization_metrics.adjacency_preserved, 1.0);
    }

    #[test]
    fn test_verify_detects_overlap() {
        let mapping = Mapping {
            patches: vec![
                PatchAssignment {
                    patch_id: 0,
                    assignments: [(0, 7)].into_iter().collect(),
                    requested: 1,
                },
                PatchAssignment {
                    patch_id: 1,
                    assignments: [(0, 7)].into_iter().collect(),
                    requested: 1,
                },
            ],
            ..Mapping::default()
        };
        assert!(matches!(mapping.verify(), Err(CodeError::MappingOverlap(7))));
    }

    #[test]
    fn test_resolved_num_patches() {
        assert_eq!(MappingConstraints::default().resolved_num_patches(), 1);
        assert_eq!(MappingConstraints::with_patches(3).resolved_num_patches(), 3);
        let c = MappingConstraints {
            num_logical_qubits: Some(2),
            require_code_switching: true,
            ..MappingConstraints::default()
        };
        assert_eq!(c.resolved_num_patches(), 3);
        assert_eq!(MappingConstraints::with_patches(0).resolved_num_patches(), 1);
    }

    #[test]
    fn test_merged_with_prefers_overrides() {
        let base = MappingConstraints {
            num_patches: Some(1),
            patch_shapes: vec!["rectangular".into()],
            exclude_qubits: [0].into_iter().collect(),
            ..MappingConstraints::default()
        };
        let hints = MappingConstraints {
            num_patches: Some(2),
            patch_shapes: vec!["planar".into(), "planar".into()],
            min_distance_between_patches: Some(1),
            exclude_qubits: [5].into_iter().collect(),
            ..MappingConstraints::default()
        };
        let merged = base.merged_with(&hints);
        assert_eq!(merged.num_patches, Some(2));
        assert_eq!(merged.patch_shapes, vec!["planar", "planar"]);
        assert_eq!(merged.min_distance_between_patches, Some(1));
        assert_eq!(merged.exclude_qubits.len(), 2);
    }
}
