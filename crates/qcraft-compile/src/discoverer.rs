//! Patch discovery.
//!
//! Enumerates every enabled family, layout and placeable distance, scores
//! each candidate with the cost model plus a resource penalty and returns the
//! best few along with mapping hints for the mapper.

use std::collections::BTreeSet;

use qcraft_codes::{FamilyRegistry, MappingConstraints};
use qcraft_ir::{CircuitIr, DeviceProfile};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::cost_model::{CostModel, CostModelConfig};
use crate::error::CompileResult;

/// Number of candidates returned by [`PatchDiscoverer::discover`].
pub const MAX_CANDIDATES: usize = 5;

/// Score penalty per unit of distance per logical qubit.
pub const RESOURCE_PENALTY: f64 = 0.001;

/// Physical resources of a candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchResources {
    pub phys_qubits: usize,
    pub ancilla: usize,
}

/// A ranked code configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchCandidate {
    pub family: String,
    pub distance: u32,
    pub layout_type: String,
    pub supported_logical: BTreeSet<String>,
    pub resources: PatchResources,
    /// Lower is better.
    pub score: f64,
}

/// Ranked candidates and the mapping hints derived from the best one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Discovery {
    pub candidates: Vec<PatchCandidate>,
    pub hints: MappingConstraints,
}

impl Discovery {
    /// The best-ranked candidate.
    pub fn best(&self) -> Option<&PatchCandidate> {
        self.candidates.first()
    }
}

/// Recommends code patches for a circuit on a device.
#[derive(Debug)]
pub struct PatchDiscoverer<'a> {
    registry: &'a FamilyRegistry,
    device: &'a DeviceProfile,
    cost_config: CostModelConfig,
}

impl<'a> PatchDiscoverer<'a> {
    /// Create a discoverer over the enabled families of `registry`.
    pub fn new(registry: &'a FamilyRegistry, device: &'a DeviceProfile) -> Self {
        Self {
            registry,
            device,
            cost_config: CostModelConfig::default(),
        }
    }

    /// Use custom cost model parameters.
    #[must_use]
    pub fn with_cost_config(mut self, config: CostModelConfig) -> Self {
        self.cost_config = config;
        self
    }

    /// Rank candidate patches for `circuit`.
    ///
    /// Candidates whose layout cannot be generated are skipped. Cost model
    /// failures propagate.
    #[instrument(skip(self, circuit), fields(device = %self.device.device_name))]
    pub fn discover(&self, circuit: &CircuitIr) -> CompileResult<Discovery> {
        let logical = circuit.num_qubits().max(1);
        let model = CostModel::new(self.device, &self.cost_config)?;
        let path_a = model.estimate_path_a(circuit)?;
        let path_b = model.estimate_path_b(circuit)?;
        let best_error = path_a.expected_error.min(path_b.expected_error);

        let mut candidates = Vec::new();
        for family in self.registry.enabled_families() {
            let provider = match self.registry.get_family_api(&family) {
                Ok(p) => p,
                Err(e) => {
                    debug!("Skipping family {}: {}", family, e);
                    continue;
                }
            };
            for layout in provider.list_layout_types() {
                for distance in provider.list_code_distances(self.device, &layout) {
                    let shapes = vec![layout.clone(); logical];
                    let generated =
                        match provider.generate_multi_patch_layout(logical, &[distance], &shapes) {
                            Ok(g) => g,
                            Err(e) => {
                                debug!("Skipping {} {} d={}: {}", family, layout, distance, e);
                                continue;
                            }
                        };
                    let ancilla = generated
                        .code_spaces
                        .iter()
                        .map(|cs| cs.ancilla_qubits().len())
                        .sum();
                    candidates.push(PatchCandidate {
                        family: family.clone(),
                        distance,
                        layout_type: layout.clone(),
                        supported_logical: provider.list_supported_logical_gates(&layout, distance),
                        resources: PatchResources {
                            phys_qubits: generated.total_qubits(),
                            ancilla,
                        },
                        score: best_error + RESOURCE_PENALTY * f64::from(distance) * logical as f64,
                    });
                }
            }
        }

        candidates.sort_by(|a, b| a.score.total_cmp(&b.score));
        candidates.truncate(MAX_CANDIDATES);

        let best_layout = candidates
            .first()
            .map_or_else(|| "planar".to_string(), |c| c.layout_type.clone());
        let hints = MappingConstraints {
            num_patches: Some(logical),
            patch_shapes: vec![best_layout; logical],
            min_distance_between_patches: Some(1),
            ..MappingConstraints::default()
        };
        debug!("Discovered {} patch candidates", candidates.len());
        Ok(Discovery { candidates, hints })
    }
}

/// Code selection policy used when discovery yields nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeSelectionPolicy {
    /// Layouts to choose from; the first one wins.
    pub allowed_layouts: Vec<String>,
}

impl Default for CodeSelectionPolicy {
    fn default() -> Self {
        Self {
            allowed_layouts: vec!["planar".into(), "rotated".into()],
        }
    }
}

/// User overrides for the surface code decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceCodePreferences {
    pub layout: Option<String>,
    pub distance: Option<u32>,
}

/// Chosen surface code layout and distance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceCodeDecision {
    pub layout: String,
    pub distance: u32,
}

/// Pick a surface code without discovery.
///
/// Uses the first allowed layout and `clamp(max_qubits / 10, 3, 5)`, lowered
/// to an odd distance. User preferences override both.
pub fn decide_surface_code(
    device: &DeviceProfile,
    policy: &CodeSelectionPolicy,
    prefs: &SurfaceCodePreferences,
) -> SurfaceCodeDecision {
    let layout = prefs.layout.clone().unwrap_or_else(|| {
        policy
            .allowed_layouts
            .first()
            .cloned()
            .unwrap_or_else(|| "planar".to_string())
    });
    let heuristic = (device.max_qubits / 10).clamp(3, 5);
    let distance = prefs
        .distance
        .unwrap_or(if heuristic % 2 == 0 { heuristic - 1 } else { heuristic });
    SurfaceCodeDecision { layout, distance }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qcraft_codes::FamilyDescriptor;
    use qcraft_ir::QubitGraph;

    fn device(n: u32) -> DeviceProfile {
        DeviceProfile::new("sim", "grid", n).with_connectivity(QubitGraph::linear(n))
    }

    #[test]
    fn test_discover_ranks_by_score() {
        let registry = FamilyRegistry::with_builtin_families();
        let dev = device(60);
        let circuit = CircuitIr::new(1).gate("H", [0]).gate("MEASURE", [0]);
        let discovery = PatchDiscoverer::new(&registry, &dev).discover(&circuit).unwrap();

        assert!(!discovery.candidates.is_empty());
        assert!(discovery.candidates.len() <= MAX_CANDIDATES);
        for pair in discovery.candidates.windows(2) {
            assert!(pair[0].score <= pair[1].score);
        }
        let best = discovery.best().unwrap();
        assert_eq!(best.distance, 3);
        assert_eq!(best.family, "surface");
        assert_eq!(best.layout_type, "planar");
        assert_eq!(best.resources.phys_qubits, 17);
        assert_eq!(best.resources.ancilla, 8);
        assert!(best.supported_logical.contains("CNOT"));
    }

    #[test]
    fn test_score_formula() {
        let registry = FamilyRegistry::with_builtin_families();
        let dev = device(100);
        let circuit = CircuitIr::new(2).gate("CX", [0, 1]);
        let discovery = PatchDiscoverer::new(&registry, &dev).discover(&circuit).unwrap();

        let model = CostModel::new(&dev, &CostModelConfig::default()).unwrap();
        let base = model
            .estimate_path_a(&circuit)
            .unwrap()
            .expected_error
            .min(model.estimate_path_b(&circuit).unwrap().expected_error);
        for c in &discovery.candidates {
            let expected = base + 0.001 * f64::from(c.distance) * 2.0;
            assert!((c.score - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_hints_follow_best_layout() {
        let registry = FamilyRegistry::with_builtin_families();
        let dev = device(100);
        let circuit = CircuitIr::new(3);
        let discovery = PatchDiscoverer::new(&registry, &dev).discover(&circuit).unwrap();
        let best = discovery.best().unwrap().layout_type.clone();

        assert_eq!(discovery.hints.num_patches, Some(3));
        assert_eq!(discovery.hints.patch_shapes, vec![best; 3]);
        assert_eq!(discovery.hints.min_distance_between_patches, Some(1));
    }

    #[test]
    fn test_no_candidates_defaults_to_planar() {
        let registry = FamilyRegistry::new()
            .with_descriptors(vec![FamilyDescriptor::new("surface").disabled()]);
        let dev = device(10);
        let discovery = PatchDiscoverer::new(&registry, &dev)
            .discover(&CircuitIr::new(2))
            .unwrap();
        assert!(discovery.candidates.is_empty());
        assert_eq!(discovery.hints.patch_shapes, vec!["planar", "planar"]);
    }

    #[test]
    fn test_cost_model_failure_propagates() {
        let registry = FamilyRegistry::with_builtin_families();
        let dev = device(20);
        let circuit = CircuitIr::new(1).gate("CX", [0, 3]);
        assert!(PatchDiscoverer::new(&registry, &dev).discover(&circuit).is_err());
    }

    #[test]
    fn test_decide_surface_code() {
        let policy = CodeSelectionPolicy::default();
        let none = SurfaceCodePreferences::default();
        assert_eq!(
            decide_surface_code(&device(20), &policy, &none),
            SurfaceCodeDecision {
                layout: "planar".into(),
                distance: 3
            }
        );
        assert_eq!(decide_surface_code(&device(45), &policy, &none).distance, 3);
        assert_eq!(decide_surface_code(&device(127), &policy, &none).distance, 5);

        let prefs = SurfaceCodePreferences {
            layout: Some("color".into()),
            distance: Some(7),
        };
        let decision = decide_surface_code(&device(20), &policy, &prefs);
        assert_eq!(decision.layout, "color");
        assert_eq!(decision.distance, 7);

        let empty = CodeSelectionPolicy {
            allowed_layouts: vec![],
        };
        assert_eq!(decide_surface_code(&device(20), &empty, &none).layout, "planar");
    }
}
