//! Logical error rate estimation.
//!
//! Decoder-backed estimation lives outside this crate; the
//! [`LogicalErrorEstimator`] trait is the seam it plugs into. The built-in
//! [`ThresholdEstimator`] uses the standard below-threshold scaling law.

use serde::{Deserialize, Serialize};

use crate::code_space::MultiPatchLayout;
use crate::error::{CodeError, CodeResult};
use crate::mapper::Mapping;

/// Physical noise assumed when estimating logical error rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseModel {
    /// Physical error probability per operation.
    pub p: f64,
}

impl NoiseModel {
    /// Create a noise model with physical error rate `p`.
    pub fn new(p: f64) -> Self {
        Self { p }
    }
}

impl Default for NoiseModel {
    fn default() -> Self {
        Self { p: 0.001 }
    }
}

/// Estimates the logical error rate of a mapped layout.
pub trait LogicalErrorEstimator: Send + Sync {
    /// Return a probability in `[0, 1]`, or an error on invalid input.
    fn estimate(
        &self,
        layout: &MultiPatchLayout,
        mapping: &Mapping,
        noise: &NoiseModel,
    ) -> CodeResult<f64>;
}

/// Below-threshold scaling: `p_L = A * (p / p_th)^((d + 1) / 2)` per patch.
///
/// Patches fail independently; the layout fails if any patch does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdEstimator {
    /// Threshold error rate `p_th`.
    pub threshold: f64,
    /// Prefactor `A`.
    pub prefactor: f64,
}

impl Default for ThresholdEstimator {
    fn default() -> Self {
        Self {
            threshold: 0.01,
            prefactor: 0.1,
        }
    }
}

impl ThresholdEstimator {
    /// Logical error rate of a single patch of distance `distance`.
    pub fn patch_error(&self, distance: u32, p: f64) -> f64 {
        let exponent = f64::from(distance + 1) / 2.0;
        (self.prefactor * (p / self.threshold).powf(exponent)).clamp(0.0, 1.0)
    }
}

impl LogicalErrorEstimator for ThresholdEstimator {
    fn estimate(
        &self,
        layout: &MultiPatchLayout,
        mapping: &Mapping,
        noise: &NoiseModel,
    ) -> CodeResult<f64> {
        if !(0.0..=1.0).contains(&noise.p) {
            return Err(CodeError::Estimation(format!(
                "physical error rate {} outside [0, 1]",
                noise.p
            )));
        }
        if layout.code_spaces.is_empty() {
            return Err(CodeError::Estimation("layout has no patches".into()));
        }
        if mapping.is_empty() {
            return Err(CodeError::Estimation("mapping is empty".into()));
        }
        mapping
            .require_complete()
            .map_err(|e| CodeError::Estimation(e.to_string()))?;

        let survive: f64 = layout
            .code_spaces
            .iter()
            .map(|cs| 1.0 - self.patch_error(cs.code_distance, noise.p))
            .product();
        Ok((1.0 - survive).clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::{GreedyMapper, MappingConstraints, MappingStrategy};
    use crate::surface::SurfaceProvider;
    use crate::provider::FamilyProvider;
    use qcraft_ir::{DeviceProfile, QubitGraph};

    fn mapped(distance: u32) -> (MultiPatchLayout, Mapping) {
        let provider = SurfaceProvider::new();
        let layout = provider
            .generate_multi_patch_layout(1, &[distance], &["planar".to_string()])
            .unwrap();
        let device = DeviceProfile::new("sim", "grid", 100).with_connectivity(QubitGraph::grid(10, 10));
        let mapping = GreedyMapper::new()
            .map(&layout, &device, &MappingConstraints::default())
            .unwrap();
        (layout, mapping)
    }

    #[test]
    fn test_larger_distance_lowers_error() {
        let est = ThresholdEstimator::default();
        let noise = NoiseModel::default();
        let (l3, m3) = mapped(3);
        let (l5, m5) = mapped(5);
        let e3 = est.estimate(&l3, &m3, &noise).unwrap();
        let e5 = est.estimate(&l5, &m5, &noise).unwrap();
        assert!((e3 - 0.001).abs() < 1e-12);
        assert!(e5 < e3);
    }

    #[test]
    fn test_rejects_empty_mapping() {
        let (layout, _) = mapped(3);
        let err = ThresholdEstimator::default()
            .estimate(&layout, &Mapping::default(), &NoiseModel::default())
            .unwrap_err();
        assert!(matches!(err, CodeError::Estimation(_)));
    }

    #[test]
    fn test_rejects_invalid_noise() {
        let (layout, mapping) = mapped(3);
        assert!(
            ThresholdEstimator::default()
                .estimate(&layout, &mapping, &NoiseModel::new(1.5))
                .is_err()
        );
    }

    #[test]
    fn test_patch_error_clamped() {
        let est = ThresholdEstimator::default();
        assert_eq!(est.patch_error(3, 1.0), 1.0);
        assert!(est.patch_error(7, 0.0) == 0.0);
    }
}
