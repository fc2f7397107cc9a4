//! Automatic code-distance selection.

use std::sync::Arc;

use qcraft_ir::DeviceProfile;
use tracing::{debug, info};

use crate::error::{CodeError, CodeResult};
use crate::estimator::{LogicalErrorEstimator, NoiseModel, ThresholdEstimator};
use crate::mapper::MappingConstraints;
use crate::provider::{FamilyProvider, MappedLayout, odd_distances};

/// Searches odd distances from 3 up to the largest feasible one and keeps the
/// candidate with the lowest estimated logical error rate.
///
/// Candidates are placed with the provider's own mapping strategy. A distance
/// whose generation, mapping or estimation fails is skipped, and so is one
/// whose mapping leaves code qubits unplaced. Ties keep the smaller distance.
#[derive(Clone)]
pub struct AutoDistanceSelector {
    estimator: Arc<dyn LogicalErrorEstimator>,
    noise: NoiseModel,
}

impl AutoDistanceSelector {
    /// Create a selector ranking candidates with `estimator`.
    pub fn new(estimator: Arc<dyn LogicalErrorEstimator>) -> Self {
        Self {
            estimator,
            noise: NoiseModel::default(),
        }
    }

    /// Set the noise model passed to the estimator.
    #[must_use]
    pub fn with_noise(mut self, noise: NoiseModel) -> Self {
        self.noise = noise;
        self
    }

    /// Select the best distance for `layout` on `device`.
    pub fn select(
        &self,
        provider: &dyn FamilyProvider,
        layout: &str,
        constraints: &MappingConstraints,
        device: &DeviceProfile,
    ) -> CodeResult<MappedLayout> {
        let num_patches = constraints.resolved_num_patches();
        let max_distance = provider.max_feasible_distance(layout, num_patches, device);
        let mut best: Option<MappedLayout> = None;

        for distance in odd_distances(max_distance) {
            match self.evaluate(provider, layout, distance, num_patches, constraints, device) {
                Ok(candidate) => {
                    let better = best
                        .as_ref()
                        .is_none_or(|b| candidate.estimated_ler < b.estimated_ler);
                    if better {
                        best = Some(candidate);
                    }
                }
                Err(e) => debug!("Skipping code distance {}: {}", distance, e),
            }
        }

        let best = best.ok_or_else(|| CodeError::NoFeasibleDistance {
            layout: layout.to_string(),
            num_patches,
        })?;
        info!(
            "Selected {} layout at distance {} (estimated LER {:.3e})",
            layout,
            best.distance,
            best.estimated_ler.unwrap_or(f64::NAN)
        );
        Ok(best)
    }

    fn evaluate(
        &self,
        provider: &dyn FamilyProvider,
        layout: &str,
        distance: u32,
        num_patches: usize,
        constraints: &MappingConstraints,
        device: &DeviceProfile,
    ) -> CodeResult<MappedLayout> {
        provider.check_capacity(layout, distance, num_patches, device)?;
        let shapes = vec![layout.to_string(); num_patches];
        let generated =
            provider.generate_multi_patch_layout(num_patches, &[distance], &shapes)?;
        let mapping = provider.map_layout(&generated, device, constraints)?;
        let ler = self.estimator.estimate(&generated, &mapping, &self.noise)?;
        Ok(MappedLayout {
            layout: generated,
            mapping,
            distance,
            estimated_ler: Some(ler),
        })
    }
}

impl Default for AutoDistanceSelector {
    fn default() -> Self {
        Self::new(Arc::new(ThresholdEstimator::default()))
    }
}

impl std::fmt::Debug for AutoDistanceSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoDistanceSelector")
            .field("noise", &self.noise)
            .finish()
    }
}
