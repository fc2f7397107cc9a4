//! Surface code family: planar, rotated and color layouts.

mod color;
mod lattice;

use std::collections::BTreeSet;
use std::sync::Arc;

use qcraft_ir::DeviceProfile;
use tracing::{debug, instrument};

use crate::code_space::{CodeSpace, MultiPatchLayout};
use crate::error::{CodeError, CodeResult};
use crate::mapper::{GreedyMapper, MappingConstraints, MappingStrategy};
use crate::provider::{FamilyProvider, MappedLayout, odd_distances};
use crate::selector::AutoDistanceSelector;

/// Family name.
pub const SURFACE_FAMILY: &str = "surface";

/// Layout types, in preference order.
pub const SURFACE_LAYOUTS: [&str; 3] = ["planar", "rotated", "color"];

/// Logical gates every surface layout implements natively.
pub const SURFACE_LOGICAL_GATES: [&str; 6] = ["X", "Z", "CNOT", "H", "S", "MEASURE"];

/// The surface code family provider.
#[derive(Debug, Clone)]
pub struct SurfaceProvider {
    selector: AutoDistanceSelector,
    mapper: Arc<dyn MappingStrategy>,
}

impl SurfaceProvider {
    /// Create a provider using the greedy mapper and default selector.
    pub fn new() -> Self {
        Self {
            selector: AutoDistanceSelector::default(),
            mapper: Arc::new(GreedyMapper::new()),
        }
    }

    /// Use a custom distance selector.
    #[must_use]
    pub fn with_selector(mut self, selector: AutoDistanceSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Use a custom mapping strategy.
    #[must_use]
    pub fn with_mapper(mut self, mapper: Arc<dyn MappingStrategy>) -> Self {
        self.mapper = mapper;
        self
    }

    fn gate_set() -> BTreeSet<String> {
        SURFACE_LOGICAL_GATES.iter().map(|g| (*g).to_string()).collect()
    }
}

impl Default for SurfaceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FamilyProvider for SurfaceProvider {
    fn family(&self) -> &str {
        SURFACE_FAMILY
    }

    fn list_layout_types(&self) -> Vec<String> {
        SURFACE_LAYOUTS.iter().map(|l| (*l).to_string()).collect()
    }

    fn list_code_distances(&self, device: &DeviceProfile, layout: &str) -> Vec<u32> {
        odd_distances(self.max_feasible_distance(layout, 1, device))
    }

    fn generate_code_space(&self, layout: &str, distance: u32) -> CodeResult<CodeSpace> {
        if distance < 3 || distance % 2 == 0 {
            return Err(CodeError::Configuration(format!(
                "surface code distance must be odd and at least 3, got {distance}"
            )));
        }
        let code_space = match layout {
            "planar" => lattice::surface_patch(layout, distance, false, Self::gate_set()),
            "rotated" => lattice::surface_patch(layout, distance, true, Self::gate_set()),
            "color" => color::color_patch(distance, Self::gate_set()),
            other => {
                return Err(CodeError::Configuration(format!(
                    "unknown surface layout '{other}'"
                )));
            }
        };
        debug!(
            "Generated {} patch at distance {} ({} qubits)",
            layout,
            distance,
            code_space.num_qubits()
        );
        Ok(code_space)
    }

    fn list_supported_logical_gates(&self, _layout: &str, _distance: u32) -> BTreeSet<String> {
        Self::gate_set()
    }

    fn required_qubits(&self, layout: &str, distance: u32, num_patches: usize) -> usize {
        let d = distance as usize;
        let per_patch = match layout {
            "planar" | "rotated" => (2 * d * d).saturating_sub(1),
            "color" => (3 * d * d + 1) / 2,
            _ => d * d,
        };
        num_patches.max(1) * per_patch
    }

    fn max_feasible_distance(&self, layout: &str, num_patches: usize, device: &DeviceProfile) -> u32 {
        let per_patch = f64::from(device.max_qubits) / num_patches.max(1) as f64;
        let bound = match layout {
            "planar" | "rotated" => (per_patch + 1.0) / 2.0,
            "color" => (2.0 * per_patch - 1.0) / 3.0,
            _ => per_patch,
        };
        bound.max(0.0).sqrt().floor() as u32
    }

    fn mapping_strategy(&self) -> &dyn MappingStrategy {
        self.mapper.as_ref()
    }

    #[instrument(skip(self, constraints, device), fields(device = %device.device_name))]
    fn get_multi_patch_mapping(
        &self,
        distance: Option<u32>,
        layout: &str,
        constraints: &MappingConstraints,
        device: &DeviceProfile,
    ) -> CodeResult<MappedLayout> {
        let Some(distance) = distance else {
            return self.selector.select(self, layout, constraints, device);
        };

        let num_patches = constraints.resolved_num_patches();
        self.check_capacity(layout, distance, num_patches, device)?;
        let shapes = vec![layout.to_string(); num_patches];
        let generated: MultiPatchLayout =
            self.generate_multi_patch_layout(num_patches, &[distance], &shapes)?;
        let mapping = self.map_layout(&generated, device, constraints)?;
        Ok(MappedLayout {
            layout: generated,
            mapping,
            distance,
            estimated_ler: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qcraft_ir::QubitGraph;

    fn device(n: u32) -> DeviceProfile {
        DeviceProfile::new("sim", "grid", n).with_connectivity(QubitGraph::linear(n))
    }

    #[test]
    fn test_required_qubits() {
        let p = SurfaceProvider::new();
        assert_eq!(p.required_qubits("planar", 3, 1), 17);
        assert_eq!(p.required_qubits("rotated", 5, 2), 98);
        assert_eq!(p.required_qubits("color", 3, 1), 14);
        assert_eq!(p.required_qubits("other", 3, 2), 18);
    }

    #[test]
    fn test_max_feasible_distance() {
        let p = SurfaceProvider::new();
        let dev = device(50);
        assert_eq!(p.max_feasible_distance("planar", 1, &dev), 5);
        assert_eq!(p.max_feasible_distance("planar", 2, &dev), 3);
        assert_eq!(p.max_feasible_distance("color", 1, &dev), 5);
        assert_eq!(p.max_feasible_distance("other", 1, &dev), 7);
        assert_eq!(p.list_code_distances(&dev, "planar"), vec![3, 5]);
        assert_eq!(p.max_feasible_distance("color", 1, &DeviceProfile::new("sim", "empty", 0)), 0);
    }

    #[test]
    fn test_rejects_bad_distance_and_layout() {
        let p = SurfaceProvider::new();
        assert!(matches!(p.generate_code_space("planar", 4), Err(CodeError::Configuration(_))));
        assert!(matches!(p.generate_code_space("planar", 1), Err(CodeError::Configuration(_))));
        assert!(matches!(p.generate_code_space("hexagon", 3), Err(CodeError::Configuration(_))));
    }

    #[test]
    fn test_fixed_distance_checks_capacity() {
        let p = SurfaceProvider::new();
        let err = p
            .get_multi_patch_mapping(Some(5), "planar", &MappingConstraints::with_patches(2), &device(50))
            .unwrap_err();
        assert!(matches!(
            err,
            CodeError::InsufficientQubits { required: 98, available: 50, .. }
        ));

        let mapped = p
            .get_multi_patch_mapping(Some(3), "planar", &MappingConstraints::with_patches(2), &device(50))
            .unwrap();
        assert_eq!(mapped.layout.num_patches(), 2);
        assert_eq!(mapped.mapping.len(), 34);
        assert!(mapped.mapping.is_complete());
        assert!(!mapped.mapping.has_overlap);
        assert!(mapped.estimated_ler.is_none());
    }

    #[test]
    fn test_fixed_distance_rejects_partial_mapping() {
        let p = SurfaceProvider::new();
        let constraints = MappingConstraints {
            exclude_qubits: (0..40).collect(),
            ..MappingConstraints::with_patches(1)
        };
        let err = p
            .get_multi_patch_mapping(Some(3), "planar", &constraints, &device(50))
            .unwrap_err();
        assert!(matches!(err, CodeError::IncompleteMapping { mapped: 10, requested: 17 }));
    }

    #[test]
    fn test_multi_patch_capacity() {
        let p = SurfaceProvider::new();
        let err = p.check_multi_patch_capacity(2, &[3], &["planar".into()], &device(20)).unwrap_err();
        assert!(matches!(
            err,
            CodeError::InsufficientQubits { required: 34, available: 20, num_patches: 2, .. }
        ));

        let mixed = ["planar".to_string(), "rotated".to_string()];
        let err = p.check_multi_patch_capacity(2, &[3, 5], &mixed, &device(60)).unwrap_err();
        match err {
            CodeError::InsufficientQubits { layout, distance, required, available, .. } => {
                assert_eq!(layout, "planar+rotated");
                assert_eq!(distance, 5);
                assert_eq!(required, 66);
                assert_eq!(available, 60);
            }
            other => panic!("unexpected error: {other}"),
        }
        p.check_multi_patch_capacity(2, &[3, 5], &mixed, &device(66)).unwrap();
    }

    #[test]
    fn test_layout_is_tagged_with_family() {
        let p = SurfaceProvider::new();
        let layout = p
            .generate_multi_patch_layout(2, &[3, 5], &["planar".into(), "color".into()])
            .unwrap();
        assert_eq!(layout.family, SURFACE_FAMILY);
        assert_eq!(layout.code_spaces[1].layout_type, "color");
        assert_eq!(layout.code_spaces[1].code_distance, 5);
        assert_eq!(layout.patches[1].offset, 17);
        assert!(layout.code_spaces.iter().all(|cs| cs.supports_gate("cx")));
    }

    #[test]
    fn test_auto_distance_on_fifty_qubits() {
        let p = SurfaceProvider::new();
        let mapped = p
            .get_multi_patch_mapping(None, "planar", &MappingConstraints::default(), &device(50))
            .unwrap();
        assert!([3, 5].contains(&mapped.distance));
    }
}
