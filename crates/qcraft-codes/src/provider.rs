//! The code-family provider interface.

use std::collections::BTreeSet;

use qcraft_ir::DeviceProfile;
use serde::{Deserialize, Serialize};

use crate::code_space::{CodeSpace, MultiPatchLayout};
use crate::error::{CodeError, CodeResult};
use crate::mapper::{Mapping, MappingConstraints, MappingStrategy};

/// Distance used when a patch has no explicit distance.
pub const DEFAULT_DISTANCE: u32 = 3;

/// A generated layout together with its hardware mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedLayout {
    pub layout: MultiPatchLayout,
    pub mapping: Mapping,
    /// Distance the layout was generated at.
    pub distance: u32,
    /// Estimated logical error rate, when auto-selection computed one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_ler: Option<f64>,
}

/// A QEC code family.
///
/// Providers are registered by name in a
/// [`FamilyRegistry`](crate::registry::FamilyRegistry) and shared across
/// workflow runs, so implementations must be thread-safe and must not keep
/// per-run state.
pub trait FamilyProvider: Send + Sync {
    /// Family name, e.g. `"surface"`.
    fn family(&self) -> &str;

    /// Layout types this family can generate.
    fn list_layout_types(&self) -> Vec<String>;

    /// Distances this family can place on `device` for a single patch.
    fn list_code_distances(&self, device: &DeviceProfile, layout: &str) -> Vec<u32>;

    /// Generate one patch in local id space.
    fn generate_code_space(&self, layout: &str, distance: u32) -> CodeResult<CodeSpace>;

    /// Logical gates implemented natively by the given layout and distance.
    fn list_supported_logical_gates(&self, layout: &str, distance: u32) -> BTreeSet<String>;

    /// Physical qubits needed by `num_patches` patches.
    fn required_qubits(&self, layout: &str, distance: u32, num_patches: usize) -> usize;

    /// Largest distance that fits `num_patches` patches on `device`.
    fn max_feasible_distance(&self, layout: &str, num_patches: usize, device: &DeviceProfile) -> u32;

    /// Fail with [`CodeError::InsufficientQubits`] if the patches do not fit.
    fn check_capacity(
        &self,
        layout: &str,
        distance: u32,
        num_patches: usize,
        device: &DeviceProfile,
    ) -> CodeResult<()> {
        let num_patches = num_patches.max(1);
        let required = self.required_qubits(layout, distance, num_patches);
        let available = device.max_qubits as usize;
        let max_distance = self.max_feasible_distance(layout, num_patches, device);
        if required > available || distance > max_distance {
            return Err(CodeError::InsufficientQubits {
                layout: layout.to_string(),
                distance,
                num_patches,
                required,
                available,
                max_distance,
            });
        }
        Ok(())
    }

    /// Resolve the `(layout, distance)` of each of `num_patches` patches.
    ///
    /// Missing shapes or distances repeat the last given value; with none
    /// given, the first layout type and [`DEFAULT_DISTANCE`] are used.
    fn resolve_patches(
        &self,
        num_patches: usize,
        patch_distances: &[u32],
        patch_shapes: &[String],
    ) -> CodeResult<Vec<(String, u32)>> {
        let default_layout = self
            .list_layout_types()
            .into_iter()
            .next()
            .ok_or_else(|| {
                CodeError::Configuration(format!("family '{}' has no layouts", self.family()))
            })?;
        Ok((0..num_patches.max(1))
            .map(|i| {
                let layout = patch_shapes
                    .get(i)
                    .or_else(|| patch_shapes.last())
                    .unwrap_or(&default_layout)
                    .clone();
                let distance = patch_distances
                    .get(i)
                    .or_else(|| patch_distances.last())
                    .copied()
                    .unwrap_or(DEFAULT_DISTANCE);
                (layout, distance)
            })
            .collect())
    }

    /// Fail with [`CodeError::InsufficientQubits`] if the patches that
    /// [`generate_multi_patch_layout`](Self::generate_multi_patch_layout)
    /// would build do not fit on `device` together.
    fn check_multi_patch_capacity(
        &self,
        num_patches: usize,
        patch_distances: &[u32],
        patch_shapes: &[String],
        device: &DeviceProfile,
    ) -> CodeResult<()> {
        let patches = self.resolve_patches(num_patches, patch_distances, patch_shapes)?;
        let num_patches = patches.len();
        if let [(layout, distance), rest @ ..] = patches.as_slice() {
            if rest.iter().all(|p| p.0 == *layout && p.1 == *distance) {
                return self.check_capacity(layout, *distance, num_patches, device);
            }
        }

        let required: usize = patches
            .iter()
            .map(|(layout, distance)| self.required_qubits(layout, *distance, 1))
            .sum();
        let available = device.max_qubits as usize;
        if required > available {
            let mut layouts: Vec<&str> = patches.iter().map(|p| p.0.as_str()).collect();
            layouts.dedup();
            return Err(CodeError::InsufficientQubits {
                layout: layouts.join("+"),
                distance: patches.iter().map(|p| p.1).max().unwrap_or(DEFAULT_DISTANCE),
                num_patches,
                required,
                available,
                max_distance: patches
                    .iter()
                    .map(|p| self.max_feasible_distance(&p.0, num_patches, device))
                    .min()
                    .unwrap_or(0),
            });
        }
        Ok(())
    }

    /// Generate `num_patches` patches and combine them, resolving shapes and
    /// distances as [`resolve_patches`](Self::resolve_patches) does.
    fn generate_multi_patch_layout(
        &self,
        num_patches: usize,
        patch_distances: &[u32],
        patch_shapes: &[String],
    ) -> CodeResult<MultiPatchLayout> {
        let code_spaces = self
            .resolve_patches(num_patches, patch_distances, patch_shapes)?
            .iter()
            .map(|(layout, distance)| self.generate_code_space(layout, *distance))
            .collect::<CodeResult<Vec<_>>>()?;
        Ok(MultiPatchLayout::combine(self.family(), code_spaces))
    }

    /// Strategy used to place this family's layouts on hardware.
    fn mapping_strategy(&self) -> &dyn MappingStrategy;

    /// Place `layout` on `device` with [`mapping_strategy`](Self::mapping_strategy).
    ///
    /// Fails unless the mapping is overlap-free and places every code qubit.
    fn map_layout(
        &self,
        layout: &MultiPatchLayout,
        device: &DeviceProfile,
        constraints: &MappingConstraints,
    ) -> CodeResult<Mapping> {
        let mapping = self.mapping_strategy().map(layout, device, constraints)?;
        mapping.verify()?;
        mapping.require_complete()?;
        Ok(mapping)
    }

    /// Generate and map a layout.
    ///
    /// With `distance == None` the provider selects a distance itself.
    fn get_multi_patch_mapping(
        &self,
        distance: Option<u32>,
        layout: &str,
        constraints: &MappingConstraints,
        device: &DeviceProfile,
    ) -> CodeResult<MappedLayout>;
}

/// Odd distances from 3 up to and including `max`.
pub fn odd_distances(max: u32) -> Vec<u32> {
    (DEFAULT_DISTANCE..=max).step_by(2).collect()
}
