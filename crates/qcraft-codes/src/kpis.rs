//! Mapping key performance indicators.

use std::collections::BTreeSet;

use qcraft_ir::DeviceProfile;
use serde::{Deserialize, Serialize};

use crate::provider::MappedLayout;

/// Summary of a mapped layout for logging and reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingKpis {
    pub patch_count: usize,
    /// Distinct physical qubits in use.
    pub physical_qubits: usize,
    pub mapping_present: bool,
    pub has_overlap: bool,
    /// Connected components of the device subgraph induced by the used qubits.
    pub connected_components: usize,
}

impl MappingKpis {
    /// Compute KPIs for `mapped` on `device`.
    pub fn compute(mapped: &MappedLayout, device: &DeviceProfile) -> Self {
        let used: BTreeSet<u32> = mapped.mapping.physical_qubits().into_iter().collect();

        let connected_components = if device.connectivity.is_empty() {
            usize::from(!used.is_empty())
        } else {
            device
                .connectivity
                .induced_subgraph(&used)
                .connected_components()
        };

        Self {
            patch_count: mapped.layout.num_patches(),
            physical_qubits: used.len(),
            mapping_present: !mapped.mapping.is_empty(),
            has_overlap: mapped.mapping.has_overlap,
            connected_components,
        }
    }
}
