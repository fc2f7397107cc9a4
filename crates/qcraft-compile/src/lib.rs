//! QCraft compilation stages.
//!
//! This crate holds the pure building blocks the orchestrator sequences:
//!
//! - [`CostModel`]: dual-path (A/B) error and latency estimates
//! - [`PatchDiscoverer`]: ranks family × layout × distance candidates
//! - [`select_protocol`]: protocol choice for non-transversal gates
//! - [`analyze_circuit`] and [`ErrorProfile`]: static circuit and device summaries
//! - [`FtBuilder`]: lowers logical gates onto mapped patches
//! - [`optimize_circuit`]: self-inverse pair cancellation
//! - [`ResourceSchedule`] and [`DecoderPlan`]: syndrome cadence and decoder placement
//! - [`validate_circuit`]: cost-model or estimator based fidelity check
//!
//! # Example
//!
//! ```rust
//! use qcraft_codes::FamilyRegistry;
//! use qcraft_compile::{CostModel, CostModelConfig, PatchDiscoverer};
//! use qcraft_ir::{CircuitIr, DeviceProfile, QubitGraph};
//!
//! let device = DeviceProfile::new("sim", "grid", 64).with_connectivity(QubitGraph::grid(8, 8));
//! let circuit = CircuitIr::new(2).gate("H", [0]).gate("CX", [0, 1]);
//!
//! let model = CostModel::new(&device, &CostModelConfig::default()).unwrap();
//! let selection = model.select_strategy(&circuit).unwrap();
//! println!("strategy {}", selection.selected);
//!
//! let registry = FamilyRegistry::with_builtin_families();
//! let discovery = PatchDiscoverer::new(&registry, &device).discover(&circuit).unwrap();
//! assert_eq!(discovery.hints.num_patches, Some(2));
//! ```

pub mod analysis;
pub mod cost_model;
pub mod discoverer;
pub mod error;
pub mod ft_builder;
pub mod optimizer;
pub mod policy;
pub mod profile;
pub mod schedule;
pub mod validation;

pub use analysis::{
    AlertThresholds, AnalysisAlert, AnalysisConfig, CircuitAnalysis, ReportToggles, analyze_circuit,
};
pub use cost_model::{
    CircuitFeatures, CostEstimate, CostModel, CostModelConfig, Strategy, StrategySelection,
};
pub use discoverer::{
    CodeSelectionPolicy, Discovery, PatchCandidate, PatchDiscoverer, PatchResources,
    SurfaceCodeDecision, SurfaceCodePreferences, decide_surface_code,
};
pub use error::{CompileError, CompileResult};
pub use ft_builder::{FtBuilder, FtCircuit, ProtocolDecision};
pub use optimizer::{OptimizationReport, optimize_circuit};
pub use policy::{
    Protocol, ProtocolPreferences, SwitchPoint, plan_code_switching, select_protocol,
};
pub use profile::{ErrorProfile, ProfilerConfig, Uncertainty};
pub use schedule::{DecoderPlacement, DecoderPlan, ResourceSchedule};
pub use validation::{ValidationReport, validate_circuit};
