//! Property-based tests for layout generation and mapping.

use std::collections::BTreeSet;

use proptest::prelude::*;
use qcraft_codes::{
    CodeError, FamilyProvider, GreedyMapper, MappingConstraints, MappingStrategy, QldpcProvider,
    SurfaceProvider,
};
use qcraft_ir::{DeviceProfile, QubitGraph};

fn line_device(n: u32, readout: &[f64]) -> DeviceProfile {
    let mut device = DeviceProfile::new("sim", "line", n).with_connectivity(QubitGraph::linear(n));
    for (q, &e) in readout.iter().enumerate().take(n as usize) {
        device = device.with_readout_error(q as u32, e);
    }
    device
}

fn arb_surface_layout() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["planar", "rotated", "color"])
}

proptest! {
    /// No physical qubit is ever assigned twice, whatever the device size.
    #[test]
    fn test_greedy_mapping_never_overlaps(
        n in 0_u32..120,
        patches in 1_usize..4,
        distance in prop::sample::select(vec![3_u32, 5]),
        layout in arb_surface_layout(),
        readout in prop::collection::vec(0.0_f64..0.1, 120),
        excluded in prop::collection::btree_set(0_u32..120, 0..20),
    ) {
        let provider = SurfaceProvider::new();
        let shapes = vec![layout.to_string(); patches];
        let generated = provider
            .generate_multi_patch_layout(patches, &[distance], &shapes)
            .expect("generation failed");
        let device = line_device(n, &readout);
        let constraints = MappingConstraints {
            exclude_qubits: excluded.clone(),
            ..MappingConstraints::default()
        };

        let mapping = GreedyMapper::new().map(&generated, &device, &constraints).expect("mapping failed");
        let physical = mapping.physical_qubits();
        let distinct: BTreeSet<u32> = physical.iter().copied().collect();

        prop_assert_eq!(distinct.len(), physical.len());
        prop_assert!(!mapping.has_overlap);
        prop_assert!(mapping.verify().is_ok());
        prop_assert!(physical.iter().all(|q| !excluded.contains(q) && *q < n));

        let pool = (0..n).filter(|q| !excluded.contains(q)).count();
        prop_assert_eq!(mapping.len(), generated.total_qubits().min(pool));
        prop_assert_eq!(mapping.is_complete(), generated.total_qubits() <= pool);
    }

    /// Patches fail with `InsufficientQubits` one qubit below the requirement
    /// and map completely once the device reaches it.
    #[test]
    fn test_capacity_threshold(
        patches in 1_usize..4,
        distance in prop::sample::select(vec![3_u32, 5, 7]),
        layout in arb_surface_layout(),
    ) {
        let provider = SurfaceProvider::new();
        let required = provider.required_qubits(layout, distance, patches) as u32;
        let constraints = MappingConstraints::with_patches(patches);

        let small = line_device(required - 1, &[]);
        let err = provider
            .get_multi_patch_mapping(Some(distance), layout, &constraints, &small)
            .unwrap_err();
        let is_capacity_error = matches!(err, CodeError::InsufficientQubits { .. });
        prop_assert!(is_capacity_error);

        let exact = line_device(required, &[]);
        let mapped = provider
            .get_multi_patch_mapping(Some(distance), layout, &constraints, &exact)
            .expect("mapping at exact capacity failed");
        prop_assert!(mapped.mapping.is_complete());
        prop_assert_eq!(mapped.mapping.len(), mapped.layout.total_qubits());
    }

    /// Auto-selection never returns a distance the device cannot hold.
    #[test]
    fn test_auto_distance_is_feasible(max_qubits in 17_u32..200, patches in 1_usize..3) {
        let provider = SurfaceProvider::new();
        let device = line_device(max_qubits, &[]);
        let constraints = MappingConstraints::with_patches(patches);
        match provider.get_multi_patch_mapping(None, "planar", &constraints, &device) {
            Ok(mapped) => {
                prop_assert!(mapped.distance % 2 == 1);
                prop_assert!(provider.required_qubits("planar", mapped.distance, patches) <= max_qubits as usize);
            }
            Err(e) => {
                let is_infeasible = matches!(e, CodeError::NoFeasibleDistance { .. });
                prop_assert!(is_infeasible);
                prop_assert!(provider.required_qubits("planar", 3, patches) > max_qubits as usize);
            }
        }
    }
}

#[test]
fn test_fifty_qubit_planar_selects_three_or_five() {
    let provider = SurfaceProvider::new();
    let device = line_device(50, &[]);
    let mapped = provider
        .get_multi_patch_mapping(None, "planar", &MappingConstraints::default(), &device)
        .unwrap();
    assert!([3, 5].contains(&mapped.distance));
}

#[test]
fn test_qldpc_patches_are_disjoint() {
    let provider = QldpcProvider::new();
    let device = line_device(100, &[]);
    let mapped = provider
        .get_multi_patch_mapping(Some(3), "tanner", &MappingConstraints::with_patches(4), &device)
        .unwrap();
    assert_eq!(mapped.layout.patches[3].offset, 75);
    assert_eq!(mapped.mapping.len(), 100);
    assert!(mapped.mapping.verify().is_ok());
}
