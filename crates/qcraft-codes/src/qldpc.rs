//! Quantum LDPC code family.
//!
//! Codes are declared as parity-check data ([`QldpcCodeSpec`]) and matched by
//! `(layout_type, distance)`. The built-in specs are hypergraph products of
//! repetition codes under the `tanner` layout.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use qcraft_ir::{DeviceProfile, QubitGraph};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::code_space::{
    CodeSpace, LogicalOperators, QubitRole, QubitSite, Stabilizer, StabilizerMap,
};
use crate::error::{CodeError, CodeResult};
use crate::mapper::{GreedyMapper, MappingConstraints, MappingStrategy};
use crate::provider::{FamilyProvider, MappedLayout};
use crate::selector::AutoDistanceSelector;

/// Family name.
pub const QLDPC_FAMILY: &str = "qldpc";

/// Layout of the built-in hypergraph product codes.
pub const TANNER_LAYOUT: &str = "tanner";

/// A declared qLDPC code.
///
/// `hx` and `hz` list, for each check, the data qubit indices it acts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QldpcCodeSpec {
    pub layout_type: String,
    pub distance: u32,
    /// Number of data qubits.
    pub n: u32,
    pub hx: Vec<Vec<u32>>,
    pub hz: Vec<Vec<u32>>,
    /// Extra couplings between data qubits.
    #[serde(default)]
    pub data_adjacency: Vec<(u32, u32)>,
    #[serde(default)]
    pub logical_operators: LogicalOperators,
}

impl QldpcCodeSpec {
    /// Hypergraph product of the length-`d` repetition code with itself.
    ///
    /// The `d^2` left-sector qubits come first, then the `(d-1)^2`
    /// right-sector qubits.
    pub fn hypergraph_product(distance: u32) -> Self {
        let d = distance.max(1);
        let m = d - 1;
        let left = |a: u32, b: u32| a * d + b;
        let right = |i: u32, j: u32| d * d + i * m + j;
        // Checks of the repetition code touching bit `b`.
        let checks_on = |b: u32| (b.saturating_sub(1)..(b + 1).min(m)).collect::<Vec<_>>();

        let mut hx = Vec::new();
        for i in 0..m {
            for b in 0..d {
                let mut row = vec![left(i, b), left(i + 1, b)];
                row.extend(checks_on(b).into_iter().map(|j| right(i, j)));
                row.sort_unstable();
                hx.push(row);
            }
        }
        let mut hz = Vec::new();
        for a in 0..d {
            for j in 0..m {
                let mut row = vec![left(a, j), left(a, j + 1)];
                row.extend(checks_on(a).into_iter().map(|i| right(i, j)));
                row.sort_unstable();
                hz.push(row);
            }
        }

        let mut pairs = BTreeSet::new();
        for row in hx.iter().chain(hz.iter()) {
            for (k, &a) in row.iter().enumerate() {
                for &b in &row[k + 1..] {
                    pairs.insert((a.min(b), a.max(b)));
                }
            }
        }

        Self {
            layout_type: TANNER_LAYOUT.to_string(),
            distance,
            n: d * d + m * m,
            hx,
            hz,
            data_adjacency: pairs.into_iter().collect(),
            logical_operators: LogicalOperators {
                x: (0..d).map(|b| left(0, b)).collect(),
                z: (0..d).map(|a| left(a, 0)).collect(),
            },
        }
    }

    /// Data plus ancilla qubits of one patch.
    pub fn num_qubits(&self) -> usize {
        self.n as usize + self.hx.len() + self.hz.len()
    }

    fn validate(&self) -> CodeResult<()> {
        let out_of_range = self
            .hx
            .iter()
            .chain(self.hz.iter())
            .flatten()
            .chain(self.logical_operators.x.iter())
            .chain(self.logical_operators.z.iter())
            .chain(self.data_adjacency.iter().flat_map(|(a, b)| [a, b]))
            .find(|&&q| q >= self.n);
        match out_of_range {
            Some(q) => Err(CodeError::Configuration(format!(
                "qldpc {} d={} references data qubit {} but n={}",
                self.layout_type, self.distance, q, self.n
            ))),
            None => Ok(()),
        }
    }

    /// Build the code space for this spec.
    pub fn to_code_space(&self, supported_logical_gates: BTreeSet<String>) -> CodeResult<CodeSpace> {
        self.validate()?;
        let width = ((f64::from(self.n)).sqrt().floor() as u32).max(1);
        let data_rows = self.n.div_ceil(width);
        let coords = |k: u32| ((k % width) as i32, (k / width) as i32);

        let mut qubit_layout = BTreeMap::new();
        let mut adjacency = QubitGraph::new();
        for q in 0..self.n {
            let (x, y) = coords(q);
            qubit_layout.insert(q, QubitSite::new(x, y, QubitRole::Data));
            adjacency.add_node(q);
        }
        for &(a, b) in &self.data_adjacency {
            adjacency.add_edge(a, b);
        }

        let mut stabilizer_map = StabilizerMap::default();
        let checks = self
            .hx
            .iter()
            .map(|row| (row, QubitRole::AncillaX))
            .chain(self.hz.iter().map(|row| (row, QubitRole::AncillaZ)));
        for (k, (row, role)) in checks.enumerate() {
            let k = k as u32;
            let ancilla = self.n + k;
            let (x, y) = coords(k);
            qubit_layout.insert(ancilla, QubitSite::new(x, y + data_rows as i32, role));
            for &q in row {
                adjacency.add_edge(ancilla, q);
            }
            let stab = Stabilizer {
                ancilla,
                data_qubits: row.clone(),
            };
            match role {
                QubitRole::AncillaX => stabilizer_map.x.push(stab),
                _ => stabilizer_map.z.push(stab),
            }
        }

        Ok(CodeSpace {
            family: String::new(),
            layout_type: self.layout_type.clone(),
            code_distance: self.distance,
            qubit_layout,
            stabilizer_map,
            logical_operators: self.logical_operators.clone(),
            adjacency,
            supported_logical_gates,
        })
    }
}

/// qLDPC family configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QldpcConfig {
    /// Advertised layouts; empty means every layout that has a code spec.
    pub layouts: Vec<String>,
    pub codes: Vec<QldpcCodeSpec>,
    pub supported_logical_gates: BTreeSet<String>,
}

impl Default for QldpcConfig {
    fn default() -> Self {
        Self {
            layouts: vec![TANNER_LAYOUT.to_string()],
            codes: vec![
                QldpcCodeSpec::hypergraph_product(3),
                QldpcCodeSpec::hypergraph_product(5),
            ],
            supported_logical_gates: ["X", "Z", "CNOT", "H", "S", "MEASURE"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// The qLDPC family provider.
#[derive(Debug, Clone)]
pub struct QldpcProvider {
    config: QldpcConfig,
    selector: AutoDistanceSelector,
    mapper: Arc<dyn MappingStrategy>,
}

impl QldpcProvider {
    /// Create a provider with the built-in codes.
    pub fn new() -> Self {
        Self::with_config(QldpcConfig::default())
    }

    /// Create a provider from explicit configuration.
    pub fn with_config(config: QldpcConfig) -> Self {
        Self {
            config,
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

    /// Find the spec for `(layout, distance)`.
    pub fn code_spec(&self, layout: &str, distance: u32) -> CodeResult<&QldpcCodeSpec> {
        self.config
            .codes
            .iter()
            .find(|c| c.layout_type == layout && c.distance == distance)
            .ok_or_else(|| {
                CodeError::Configuration(format!(
                    "no qldpc code spec for layout '{layout}' at distance {distance}"
                ))
            })
    }

    fn specs_for<'a>(&'a self, layout: &'a str) -> impl Iterator<Item = &'a QldpcCodeSpec> + 'a {
        self.config.codes.iter().filter(move |c| c.layout_type == layout)
    }
}

impl Default for QldpcProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FamilyProvider for QldpcProvider {
    fn family(&self) -> &str {
        QLDPC_FAMILY
    }

    fn list_layout_types(&self) -> Vec<String> {
        if !self.config.layouts.is_empty() {
            return self.config.layouts.clone();
        }
        let mut layouts: Vec<String> = Vec::new();
        for code in &self.config.codes {
            if !layouts.contains(&code.layout_type) {
                layouts.push(code.layout_type.clone());
            }
        }
        layouts
    }

    fn list_code_distances(&self, device: &DeviceProfile, layout: &str) -> Vec<u32> {
        let distances: BTreeSet<u32> = self
            .specs_for(layout)
            .filter(|c| c.num_qubits() <= device.max_qubits as usize)
            .map(|c| c.distance)
            .collect();
        distances.into_iter().collect()
    }

    fn generate_code_space(&self, layout: &str, distance: u32) -> CodeResult<CodeSpace> {
        let spec = self.code_spec(layout, distance)?;
        let code_space = spec.to_code_space(self.config.supported_logical_gates.clone())?;
        debug!(
            "Generated qldpc {} patch at distance {} ({} qubits)",
            layout,
            distance,
            code_space.num_qubits()
        );
        Ok(code_space)
    }

    fn list_supported_logical_gates(&self, _layout: &str, _distance: u32) -> BTreeSet<String> {
        self.config.supported_logical_gates.clone()
    }

    fn required_qubits(&self, layout: &str, distance: u32, num_patches: usize) -> usize {
        self.code_spec(layout, distance)
            .map_or(0, |c| num_patches.max(1) * c.num_qubits())
    }

    fn max_feasible_distance(&self, layout: &str, num_patches: usize, device: &DeviceProfile) -> u32 {
        let budget = device.max_qubits as usize;
        self.specs_for(layout)
            .filter(|c| num_patches.max(1) * c.num_qubits() <= budget)
            .map(|c| c.distance)
            .max()
            .unwrap_or(0)
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

        self.code_spec(layout, distance)?;
        let num_patches = constraints.resolved_num_patches();
        self.check_capacity(layout, distance, num_patches, device)?;
        let shapes = vec![layout.to_string(); num_patches];
        let generated = self.generate_multi_patch_layout(num_patches, &[distance], &shapes)?;
        let mapping = self.map_layout(&generated, device, constraints)?;
        Ok(MappedLayout {
            layout: generated,
            mapping,
            distance,
            estimated_ler: None,
        })
    }
}
