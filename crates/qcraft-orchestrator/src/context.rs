//! Typed, append-only pipeline context.
//!
//! Every stage reads the outputs of earlier stages and fills its own slot.
//! No stage rewrites another stage's output: `co_optimize` records its best
//! mapping next to the `mapper` output, and consumers pick the most
//! refined one through accessors such as [`PipelineContext::best_mapping`].

use qcraft_codes::{MappedLayout, MappingConstraints, MappingKpis, MultiPatchLayout};
use qcraft_compile::{
    CircuitAnalysis, CostEstimate, DecoderPlan, Discovery, ErrorProfile, FtCircuit,
    OptimizationReport, ResourceSchedule, Strategy, StrategySelection, SwitchPoint,
    ValidationReport,
};
use qcraft_export::{ExportedJob, ProvenanceManifest};
use qcraft_ir::{CircuitIr, DeviceCapabilities};
use serde::{Deserialize, Serialize};

use crate::stage::Stage;

/// Strategy chosen by the cost model, or `auto` when estimation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyChoice {
    A,
    B,
    #[serde(rename = "auto")]
    Auto,
}

impl From<Strategy> for StrategyChoice {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::A => StrategyChoice::A,
            Strategy::B => StrategyChoice::B,
        }
    }
}

impl std::fmt::Display for StrategyChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyChoice::A => f.write_str("A"),
            StrategyChoice::B => f.write_str("B"),
            StrategyChoice::Auto => f.write_str("auto"),
        }
    }
}

/// Dual-path strategy outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyOutcome {
    pub selected: StrategyChoice,
    pub path_a: Option<CostEstimate>,
    pub path_b: Option<CostEstimate>,
}

impl StrategyOutcome {
    /// Outcome used when the cost model cannot run.
    pub fn auto() -> Self {
        Self {
            selected: StrategyChoice::Auto,
            path_a: None,
            path_b: None,
        }
    }
}

impl From<StrategySelection> for StrategyOutcome {
    fn from(selection: StrategySelection) -> Self {
        Self {
            selected: selection.selected.into(),
            path_a: Some(selection.path_a),
            path_b: Some(selection.path_b),
        }
    }
}

/// Code family, layout and distance chosen by `surface_code`, with the
/// generated combined layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeSelection {
    pub family: String,
    pub layout_type: String,
    pub distance: u32,
    pub constraints: MappingConstraints,
    pub layout: MultiPatchLayout,
}

/// Output of the `mapper` stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapperOutput {
    pub mapped: MappedLayout,
    pub kpis: MappingKpis,
}

/// Output of the `co_optimize` stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoOptimization {
    /// Candidate mappings evaluated.
    pub evaluated: usize,
    /// Best mapping found, with its estimated logical error rate.
    pub best: MappedLayout,
}

/// Which circuit the optimizer worked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationTarget {
    Logical,
    FaultTolerant,
}

/// Output of the `optimizer` stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Optimized {
    pub target: OptimizationTarget,
    pub circuit: CircuitIr,
    pub report: OptimizationReport,
}

/// Output of the `executor` stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packaged {
    pub capabilities: DeviceCapabilities,
    pub job: ExportedJob,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance: Option<ProvenanceManifest>,
}

/// A stage whose failure was absorbed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedStage {
    pub stage: Stage,
    pub error: String,
}

/// Results accumulated over one workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineContext {
    pub circuit: CircuitIr,
    pub strategy: StrategyOutcome,
    pub discovery: Discovery,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<CircuitAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_profile: Option<ErrorProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeSelection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ft_circuit: Option<FtCircuit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<MapperOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co_optimization: Option<CoOptimization>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimized: Option<Optimized>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ResourceSchedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoder_plan: Option<DecoderPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_switching: Option<Vec<SwitchPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<Packaged>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<DegradedStage>,
}

impl PipelineContext {
    /// Context for `circuit` before any stage has run.
    pub fn new(circuit: CircuitIr) -> Self {
        Self {
            circuit,
            strategy: StrategyOutcome::auto(),
            discovery: Discovery::default(),
            analysis: None,
            error_profile: None,
            code: None,
            ft_circuit: None,
            mapping: None,
            co_optimization: None,
            optimized: None,
            schedule: None,
            decoder_plan: None,
            validation: None,
            code_switching: None,
            package: None,
            degraded: Vec::new(),
        }
    }

    /// The logical circuit to lower: optimized if the optimizer ran on it.
    pub fn logical_circuit(&self) -> &CircuitIr {
        match &self.optimized {
            Some(o) if o.target == OptimizationTarget::Logical => &o.circuit,
            _ => &self.circuit,
        }
    }

    /// The most refined circuit available.
    ///
    /// An optimized fault-tolerant circuit, then the fault-tolerant circuit,
    /// then the logical circuit.
    pub fn output_circuit(&self) -> &CircuitIr {
        match (&self.optimized, &self.ft_circuit) {
            (Some(o), _) if o.target == OptimizationTarget::FaultTolerant => &o.circuit,
            (_, Some(ft)) => &ft.circuit,
            _ => self.logical_circuit(),
        }
    }

    /// The co-optimized mapping if one was found, else the mapper output.
    pub fn best_mapping(&self) -> Option<&MappedLayout> {
        self.co_optimization
            .as_ref()
            .map(|c| &c.best)
            .or_else(|| self.mapping.as_ref().map(|m| &m.mapped))
    }

    /// Whether `stage` failed and was absorbed.
    pub fn is_degraded(&self, stage: Stage) -> bool {
        self.degraded.iter().any(|d| d.stage == stage)
    }
}
