//! Fidelity validation of a compiled circuit.

use qcraft_codes::{LogicalErrorEstimator, MappedLayout, NoiseModel};
use qcraft_ir::{CircuitIr, DeviceProfile};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cost_model::{CostModel, CostModelConfig, Strategy};
use crate::error::CompileResult;

/// How the estimate was obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ValidationReport {
    /// Fast proxy from the dual-path cost model.
    CostModel {
        selected_model: Strategy,
        expected_error: f64,
        latency_ns: u64,
    },
    /// Logical error estimate over the mapped layout.
    Estimator { estimated_logical_error_rate: f64 },
}

/// Validate `circuit` on `device`.
///
/// With `estimator` and `mapped` set, the logical error rate of the mapped
/// layout is estimated; an estimator failure falls back to the cost model.
pub fn validate_circuit(
    circuit: &CircuitIr,
    device: &DeviceProfile,
    cost_config: &CostModelConfig,
    estimator: Option<(&dyn LogicalErrorEstimator, &NoiseModel)>,
    mapped: Option<&MappedLayout>,
) -> CompileResult<ValidationReport> {
    if let (Some((estimator, noise)), Some(mapped)) = (estimator, mapped) {
        match estimator.estimate(&mapped.layout, &mapped.mapping, noise) {
            Ok(rate) => {
                return Ok(ValidationReport::Estimator {
                    estimated_logical_error_rate: rate,
                });
            }
            Err(e) => warn!("Estimator validation failed, using cost model: {}", e),
        }
    }

    let selection = CostModel::new(device, cost_config)?.select_strategy(circuit)?;
    let chosen = match selection.selected {
        Strategy::A => &selection.path_a,
        Strategy::B => &selection.path_b,
    };
    Ok(ValidationReport::CostModel {
        selected_model: selection.selected,
        expected_error: chosen.expected_error,
        latency_ns: chosen.latency_ns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use qcraft_codes::{FamilyProvider, MappingConstraints, SurfaceProvider, ThresholdEstimator};
    use qcraft_ir::QubitGraph;

    fn device() -> DeviceProfile {
        DeviceProfile::new("sim", "line", 20).with_connectivity(QubitGraph::linear(20))
    }

    #[test]
    fn test_cost_model_proxy() {
        let circuit = CircuitIr::new(1).gate("H", [0]);
        let report = validate_circuit(&circuit, &device(), &CostModelConfig::default(), None, None).unwrap();
        let ValidationReport::CostModel {
            selected_model,
            latency_ns,
            ..
        } = report
        else {
            panic!("expected cost model report");
        };
        assert_eq!(selected_model, Strategy::A);
        assert_eq!(latency_ns, 220);

        let json = serde_json::to_value(
            validate_circuit(&circuit, &device(), &CostModelConfig::default(), None, None).unwrap(),
        )
        .unwrap();
        assert_eq!(json["method"], "cost_model");
        assert_eq!(json["selected_model"], "A");
    }

    #[test]
    fn test_estimator_path() {
        let dev = device();
        let mapped = SurfaceProvider::new()
            .get_multi_patch_mapping(Some(3), "planar", &MappingConstraints::default(), &dev)
            .unwrap();
        let estimator = ThresholdEstimator::default();
        let dyn_estimator: &dyn LogicalErrorEstimator = &estimator;
        let noise = NoiseModel::default();
        let report = validate_circuit(
            &CircuitIr::new(1),
            &dev,
            &CostModelConfig::default(),
            Some((dyn_estimator, &noise)),
            Some(&mapped),
        )
        .unwrap();
        let ValidationReport::Estimator {
            estimated_logical_error_rate,
        } = report
        else {
            panic!("expected estimator report");
        };
        assert!((estimated_logical_error_rate - estimator.patch_error(3, 0.001)).abs() < 1e-12);
    }

    #[test]
    fn test_estimator_failure_falls_back() {
        let dev = device();
        let mapped = SurfaceProvider::new()
            .get_multi_patch_mapping(Some(3), "planar", &MappingConstraints::default(), &dev)
            .unwrap();
        let estimator: &dyn LogicalErrorEstimator = &ThresholdEstimator::default();
        let bad_noise = NoiseModel::new(2.0);
        let report = validate_circuit(
            &CircuitIr::new(1),
            &dev,
            &CostModelConfig::default(),
            Some((estimator, &bad_noise)),
            Some(&mapped),
        )
        .unwrap();
        assert!(matches!(report, ValidationReport::CostModel { .. }));
    }
}
