//! Static circuit analysis.

use std::collections::{BTreeMap, BTreeSet};

use qcraft_ir::{CircuitIr, gate};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// Gates reported in [`CircuitAnalysis::non_clifford`].
const REPORTED_NON_CLIFFORD: [&str; 6] = ["T", "TDG", "CCX", "CS", "CSDG", "RZ"];

/// Which metrics appear in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportToggles {
    pub t_count: bool,
    pub t_depth: bool,
    pub non_clifford: bool,
    pub entangling_graph: bool,
    pub depth_layers: bool,
    pub locality_score: bool,
    pub parallelism_score: bool,
}

impl Default for ReportToggles {
    fn default() -> Self {
        Self {
            t_count: true,
            t_depth: true,
            non_clifford: true,
            entangling_graph: true,
            depth_layers: true,
            locality_score: true,
            parallelism_score: true,
        }
    }
}

/// Alert thresholds. An unset threshold never alerts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub high_t_count: Option<u64>,
    pub high_t_depth: Option<u64>,
    /// Fraction of gates that are entangling two-qubit gates.
    pub high_twoq_density: Option<f64>,
}

/// Analysis configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub report: ReportToggles,
    pub thresholds: AlertThresholds,
}

/// Alert raised by a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisAlert {
    HighTCount,
    HighTDepth,
    HighTwoqDensity,
}

/// Static metrics of a logical circuit. Disabled metrics are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CircuitAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t_count: Option<u64>,
    /// Largest number of T gates on any single qubit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t_depth: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_clifford: Option<BTreeSet<String>>,
    /// Entangling gate count per qubit pair, keyed `"a-b"` with `a <= b`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twoq_edges: Option<BTreeMap<String, u64>>,
    /// Number of layer breaks under greedy layering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth_proxy: Option<u64>,
    /// Mean of `count / max(1, |a - b|)` over entangled pairs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality_score: Option<f64>,
    /// Fraction of gates that fit into the layer being built.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<AnalysisAlert>,
}

impl CircuitAnalysis {
    /// T depth for scheduling, `0` when not reported.
    pub fn t_depth_or_zero(&self) -> u64 {
        self.t_depth.unwrap_or(0)
    }
}

/// Analyze `circuit`.
pub fn analyze_circuit(circuit: &CircuitIr, config: &AnalysisConfig) -> CircuitAnalysis {
    let mut t_count = 0_u64;
    let mut t_layers: FxHashMap<u32, u64> = FxHashMap::default();
    let mut non_clifford = BTreeSet::new();
    let mut edges: BTreeMap<(u32, u32), u64> = BTreeMap::new();
    let mut depth_proxy = 0_u64;
    let mut busy: FxHashSet<u32> = FxHashSet::default();

    for g in &circuit.gates {
        if g.qubits.iter().any(|q| busy.contains(q)) {
            depth_proxy += 1;
            busy.clear();
        }
        busy.extend(g.qubits.iter().copied());

        let name = gate::canonical_name(&g.name);
        if REPORTED_NON_CLIFFORD.contains(&name.as_str()) {
            non_clifford.insert(name.clone());
        }
        if gate::is_t_like(&name) && !g.qubits.is_empty() {
            t_count += 1;
            for &q in &g.qubits {
                *t_layers.entry(q).or_default() += 1;
            }
        }
        if let [a, b] = g.qubits[..] {
            if gate::is_entangling(&name) {
                *edges.entry((a.min(b), a.max(b))).or_default() += 1;
            }
        }
    }
    let t_depth = t_layers.values().copied().max().unwrap_or(0);

    let locality_score = if edges.is_empty() {
        0.0
    } else {
        let sum: f64 = edges
            .iter()
            .map(|(&(a, b), &count)| count as f64 / f64::from((b - a).max(1)))
            .sum();
        sum / edges.len() as f64
    };

    let mut parallel = 0_u64;
    busy.clear();
    for g in &circuit.gates {
        if g.qubits.iter().any(|q| busy.contains(q)) {
            busy = g.qubits.iter().copied().collect();
        } else {
            parallel += 1;
            busy.extend(g.qubits.iter().copied());
        }
    }
    let parallelism = parallel as f64 / circuit.gates.len().max(1) as f64;

    let thresholds = &config.thresholds;
    let mut alerts = Vec::new();
    if thresholds.high_t_count.is_some_and(|limit| t_count >= limit) {
        alerts.push(AnalysisAlert::HighTCount);
    }
    if thresholds.high_t_depth.is_some_and(|limit| t_depth >= limit) {
        alerts.push(AnalysisAlert::HighTDepth);
    }
    if let Some(limit) = thresholds.high_twoq_density {
        let density = if circuit.gates.is_empty() {
            0.0
        } else {
            edges.values().sum::<u64>() as f64 / circuit.gates.len() as f64
        };
        if density >= limit {
            alerts.push(AnalysisAlert::HighTwoqDensity);
        }
    }

    let report = &config.report;
    CircuitAnalysis {
        t_count: report.t_count.then_some(t_count),
        t_depth: report.t_depth.then_some(t_depth),
        non_clifford: report.non_clifford.then_some(non_clifford),
        twoq_edges: report.entangling_graph.then(|| {
            edges
                .iter()
                .map(|(&(a, b), &c)| (format!("{a}-{b}"), c))
                .collect()
        }),
        depth_proxy: report.depth_layers.then_some(depth_proxy),
        locality_score: report.locality_score.then_some(locality_score),
        parallelism: report.parallelism_score.then_some(parallelism),
        alerts,
    }
}
