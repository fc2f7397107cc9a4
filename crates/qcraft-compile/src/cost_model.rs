//! Dual-path compilation cost model.
//!
//! Two strategies are compared:
//! - **Path A**: decompose, then encode, then map.
//! - **Path B**: encode, then synthesize, then decompose and map. Encoding
//!   inflates the two-qubit count and the depth before routing.
//!
//! Both estimates come from the same multiplicative error model over device
//! error rates and an average-shortest-path swap overhead. The result ranks
//! strategies; it is not a calibrated logical error rate.

use qcraft_ir::{CircuitIr, DeviceProfile};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CompileError, CompileResult};

/// Tunable parameters of the cost model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModelConfig {
    /// Two-qubit error rate when the device has no `cx` entry.
    pub default_cx_error: f64,
    /// One-qubit error rate when the device has no `x` entry.
    pub default_single_error: f64,
    /// Readout error when no qubit has calibration data.
    pub default_readout_error: f64,
    /// Duration of one two-qubit layer in nanoseconds.
    pub twoq_layer_ns: u64,
    /// Duration of one single-qubit gate in nanoseconds.
    pub oneq_layer_ns: u64,
    /// Path B growth of the two-qubit gate count.
    pub path_b_twoq_factor: f64,
    /// Path B growth of the depth.
    pub path_b_depth_factor: f64,
}

impl Default for CostModelConfig {
    fn default() -> Self {
        Self {
            default_cx_error: 0.01,
            default_single_error: 0.001,
            default_readout_error: 0.02,
            twoq_layer_ns: 200,
            oneq_layer_ns: 20,
            path_b_twoq_factor: 1.3,
            path_b_depth_factor: 1.25,
        }
    }
}

/// Compilation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Decompose, encode, map.
    A,
    /// Encode, synthesize, decompose, map.
    B,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::A => write!(f, "A"),
            Strategy::B => write!(f, "B"),
        }
    }
}

/// Gate counts and depth the estimate is based on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitFeatures {
    pub twoq: u64,
    pub oneq: u64,
    pub measure: u64,
    pub depth: u64,
}

impl CircuitFeatures {
    /// Count gates and compute the layer depth of `circuit`.
    ///
    /// Gates on two or more qubits are two-qubit gates; a one-qubit `MEASURE`
    /// is a measurement. Each gate lands one layer after the latest layer of
    /// any of its qubits.
    pub fn of(circuit: &CircuitIr) -> Self {
        let mut features = Self::default();
        let mut last_layer = rustc_hash::FxHashMap::<u32, u64>::default();

        for g in &circuit.gates {
            match g.qubits.len() {
                0 => {}
                1 if g.name.trim().eq_ignore_ascii_case("MEASURE") => features.measure += 1,
                1 => features.oneq += 1,
                _ => features.twoq += 1,
            }
            let layer = g
                .qubits
                .iter()
                .map(|q| last_layer.get(q).copied().unwrap_or(0))
                .max()
                .unwrap_or(0)
                + 1;
            for &q in &g.qubits {
                last_layer.insert(q, layer);
            }
            features.depth = features.depth.max(layer);
        }
        features
    }
}

/// Cost estimate for one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub strategy: Strategy,
    /// Probability that at least one operation fails, in `[0, 1]`.
    pub expected_error: f64,
    pub latency_ns: u64,
    pub estimated_swaps: u64,
    /// Features after any strategy-specific transformation.
    pub circuit_features: CircuitFeatures,
}

/// Both estimates and the chosen strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySelection {
    pub selected: Strategy,
    pub path_a: CostEstimate,
    pub path_b: CostEstimate,
}

/// Dual-path cost model bound to one device.
#[derive(Debug, Clone)]
pub struct CostModel<'a> {
    device: &'a DeviceProfile,
    cx_error: f64,
    single_error: f64,
    readout_error: f64,
    config: CostModelConfig,
}

fn check_rate(name: &str, value: f64) -> CompileResult<f64> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(CompileError::CostModel(format!(
            "error rate '{name}' = {value} outside [0, 1]"
        )))
    }
}

impl<'a> CostModel<'a> {
    /// Create a cost model for `device`.
    ///
    /// Fails with [`CompileError::CostModel`] if any device or default error
    /// rate is outside `[0, 1]`.
    pub fn new(device: &'a DeviceProfile, config: &CostModelConfig) -> CompileResult<Self> {
        for (name, &rate) in &device.gate_error_rates {
            check_rate(name, rate)?;
        }
        for (q, props) in &device.qubit_properties {
            if let Some(rate) = props.readout_error {
                check_rate(&format!("readout[{q}]"), rate)?;
            }
        }
        let cx_error = check_rate(
            "cx",
            device.gate_error("cx").unwrap_or(config.default_cx_error),
        )?;
        let single_error = check_rate(
            "x",
            device.gate_error("x").unwrap_or(config.default_single_error),
        )?;
        let readout_error = check_rate(
            "readout",
            device
                .mean_readout_error()
                .unwrap_or(config.default_readout_error),
        )?;

        Ok(Self {
            device,
            cx_error,
            single_error,
            readout_error,
            config: config.clone(),
        })
    }

    /// Estimate path A.
    pub fn estimate_path_a(&self, circuit: &CircuitIr) -> CompileResult<CostEstimate> {
        let features = self.features(circuit)?;
        Ok(self.estimate(Strategy::A, features, Self::logical_qubits(circuit)))
    }

    /// Estimate path B.
    pub fn estimate_path_b(&self, circuit: &CircuitIr) -> CompileResult<CostEstimate> {
        let base = self.features(circuit)?;
        let encoded = CircuitFeatures {
            twoq: scale(base.twoq, self.config.path_b_twoq_factor),
            depth: scale(base.depth, self.config.path_b_depth_factor),
            ..base
        };
        Ok(self.estimate(Strategy::B, encoded, Self::logical_qubits(circuit)))
    }

    /// Estimate both paths and select the one with the lower expected error.
    ///
    /// Ties go to path A.
    pub fn select_strategy(&self, circuit: &CircuitIr) -> CompileResult<StrategySelection> {
        let path_a = self.estimate_path_a(circuit)?;
        let path_b = self.estimate_path_b(circuit)?;
        let selected = if path_a.expected_error <= path_b.expected_error {
            Strategy::A
        } else {
            Strategy::B
        };
        debug!(
            "Strategy {} selected (A: {:.6}, B: {:.6})",
            selected, path_a.expected_error, path_b.expected_error
        );
        Ok(StrategySelection {
            selected,
            path_a,
            path_b,
        })
    }

    /// Average shortest-path length between the first few device qubits.
    ///
    /// The first `min(n, max(logical_qubits, 2))` qubits in ascending id
    /// order are compared pairwise; unreachable pairs count as `max(n/2, 1)`.
    pub fn average_shortest_path(&self, logical_qubits: usize) -> f64 {
        let graph = &self.device.connectivity;
        let nodes: Vec<u32> = graph.nodes().collect();
        if nodes.len() <= 1 {
            return 1.0;
        }
        let unreachable = (nodes.len() / 2).max(1) as f64;
        let m = nodes.len().min(logical_qubits.max(2));

        let mut total = 0.0;
        let mut pairs = 0_u32;
        for (i, &a) in nodes.iter().enumerate().take(m) {
            let distances = graph.bfs_distances(a);
            for &b in &nodes[i + 1..m] {
                total += distances.get(&b).map_or(unreachable, |&d| f64::from(d));
                pairs += 1;
            }
        }
        if pairs == 0 {
            1.0
        } else {
            total / f64::from(pairs)
        }
    }

    fn features(&self, circuit: &CircuitIr) -> CompileResult<CircuitFeatures> {
        circuit
            .validate()
            .map_err(|e| CompileError::CostModel(e.to_string()))?;
        Ok(CircuitFeatures::of(circuit))
    }

    fn logical_qubits(circuit: &CircuitIr) -> usize {
        circuit.num_qubits().max(1)
    }

    fn estimate(&self, strategy: Strategy, features: CircuitFeatures, logical: usize) -> CostEstimate {
        let overhead = (self.average_shortest_path(logical) - 1.0).max(0.0);
        let swaps = (features.twoq as f64 * overhead).round_ties_even() as u64;

        let survive = (1.0 - self.cx_error).powf((features.twoq + swaps) as f64)
            * (1.0 - self.single_error).powf((features.oneq + swaps) as f64)
            * (1.0 - self.readout_error).powf(features.measure as f64);
        let expected_error = (1.0 - survive).clamp(0.0, 1.0);

        let latency_ns = self.config.twoq_layer_ns * (features.depth + 2 * swaps)
            + self.config.oneq_layer_ns * features.oneq;

        CostEstimate {
            strategy,
            expected_error,
            latency_ns,
            estimated_swaps: swaps,
            circuit_features: features,
        }
    }
}

fn scale(value: u64, factor: f64) -> u64 {
    (value as f64 * factor).round_ties_even() as u64
}
