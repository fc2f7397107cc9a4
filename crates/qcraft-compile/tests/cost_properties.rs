//! Property tests for the cost model, discovery ranking and protocol table.

use proptest::prelude::*;
use qcraft_codes::FamilyRegistry;
use qcraft_compile::{
    CostModel, CostModelConfig, PatchDiscoverer, Protocol, ProtocolPreferences, select_protocol,
};
use qcraft_ir::{CircuitIr, DeviceCapabilities, DeviceProfile, GateRecord, QubitGraph};

const GATE_NAMES: [&str; 7] = ["H", "X", "T", "CX", "CZ", "MEASURE", "S"];

fn arb_circuit(max_qubits: u32) -> impl Strategy<Value = CircuitIr> {
    (2..=max_qubits).prop_flat_map(|n| {
        prop::collection::vec((0..GATE_NAMES.len(), 0..n, 0..n), 0..40).prop_map(move |ops| {
            let mut circuit = CircuitIr::new(n);
            for (g, a, b) in ops {
                let name = GATE_NAMES[g];
                let qubits = if matches!(name, "CX" | "CZ") {
                    if a == b {
                        continue;
                    }
                    vec![a, b]
                } else {
                    vec![a]
                };
                circuit.push(GateRecord::new(name, qubits));
            }
            circuit
        })
    })
}

fn line_device(n: u32, cx: f64) -> DeviceProfile {
    DeviceProfile::new("sim", "line", n)
        .with_connectivity(QubitGraph::linear(n))
        .with_gate_error("cx", cx)
}

proptest! {
    /// Identical inputs give identical estimates.
    #[test]
    fn test_cost_model_is_deterministic(circuit in arb_circuit(6), cx in 0.0_f64..0.05) {
        let device = line_device(12, cx);
        let first = CostModel::new(&device, &CostModelConfig::default()).unwrap();
        let second = CostModel::new(&device, &CostModelConfig::default()).unwrap();

        prop_assert_eq!(first.estimate_path_a(&circuit).unwrap(), second.estimate_path_a(&circuit).unwrap());
        prop_assert_eq!(first.estimate_path_b(&circuit).unwrap(), second.estimate_path_b(&circuit).unwrap());
    }

    /// Expected error stays a probability and path B never routes fewer gates.
    #[test]
    fn test_estimates_are_bounded(circuit in arb_circuit(6), cx in 0.0_f64..1.0) {
        let device = line_device(8, cx);
        let model = CostModel::new(&device, &CostModelConfig::default()).unwrap();
        let a = model.estimate_path_a(&circuit).unwrap();
        let b = model.estimate_path_b(&circuit).unwrap();
        prop_assert!((0.0..=1.0).contains(&a.expected_error));
        prop_assert!((0.0..=1.0).contains(&b.expected_error));
        prop_assert!(b.circuit_features.twoq >= a.circuit_features.twoq);
        prop_assert!(b.estimated_swaps >= a.estimated_swaps);
    }

    /// Candidates come back sorted by score, at most five of them.
    #[test]
    fn test_discovery_is_ranked(circuit in arb_circuit(3), n in 20_u32..120) {
        let registry = FamilyRegistry::with_builtin_families();
        let device = line_device(n, 0.01);
        let discovery = PatchDiscoverer::new(&registry, &device).discover(&circuit).unwrap();
        prop_assert!(discovery.candidates.len() <= 5);
        for pair in discovery.candidates.windows(2) {
            prop_assert!(pair[0].score <= pair[1].score);
        }
    }

    /// Non-Clifford gates never teleport unless pinned.
    #[test]
    fn test_non_clifford_protocols(
        gate in prop::sample::select(vec!["T", "Tdg", "CCX", "CS", "CSdg"]),
        conditional in any::<bool>(),
        dynamic in any::<bool>(),
        prefer in prop::option::of(prop::sample::select(vec![
            Protocol::MagicStateInjection,
            Protocol::LatticeSurgery,
            Protocol::Teleportation,
        ])),
    ) {
        let caps = DeviceCapabilities::none()
            .with_conditional(conditional)
            .with_dynamic_circuits(dynamic);
        let prefs = ProtocolPreferences { prefer, ..ProtocolPreferences::default() };
        let protocol = select_protocol(gate, &caps, &prefs);
        if conditional || dynamic {
            let expected = match prefer {
                Some(Protocol::MagicStateInjection) => Protocol::MagicStateInjection,
                _ => Protocol::LatticeSurgery,
            };
            prop_assert_eq!(protocol, expected);
        } else {
            prop_assert_eq!(protocol, Protocol::MagicStateInjection);
        }
    }
}
