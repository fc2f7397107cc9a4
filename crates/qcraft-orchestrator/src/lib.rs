//! Workflow orchestration for QCraft.
//!
//! This crate sequences the compilation stages of `qcraft-compile`,
//! `qcraft-codes` and `qcraft-export` into one workflow: cost estimation,
//! patch discovery, code selection, fault-tolerant assembly, mapping,
//! scheduling, validation and packaging.
//!
//! # Example
//!
//! ```rust,no_run
//! use qcraft_ir::{CircuitIr, DeviceProfile, QubitGraph};
//! use qcraft_orchestrator::{Orchestrator, OrchestratorConfig, RunOptions};
//!
//! let config = OrchestratorConfig::load(None)?;
//! let device = DeviceProfile::new("sim", "line", 64).with_connectivity(QubitGraph::linear(64));
//! let orchestrator = Orchestrator::new(&config, device)?;
//!
//! let circuit = CircuitIr::new(2).gate("h", [0]).gate("cx", [0, 1]);
//! let outcome = orchestrator.run_workflow(&circuit, &RunOptions::default());
//! println!("{}: {:?}", outcome.status, outcome.steps);
//! # Ok::<(), qcraft_orchestrator::OrchestratorError>(())
//! ```
//!
//! # Failure handling
//!
//! Stage failures are classified by [`FailurePolicy::for_stage`]: most
//! stages degrade gracefully, while code selection, mapping and infeasible
//! fault-tolerant assembly fail the workflow. `run_workflow` itself never
//! returns an error.

pub mod config;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod stage;
pub mod store;
pub mod workflow;

pub use config::{
    DEFAULT_MODULE_SEQUENCE, OrchestratorConfig, PrivacyConfig, WorkflowPolicy,
};
pub use context::{
    CoOptimization, CodeSelection, DegradedStage, MapperOutput, OptimizationTarget, Optimized,
    Packaged, PipelineContext, StrategyChoice, StrategyOutcome,
};
pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::{Orchestrator, RunOptions, WorkflowOutcome};
pub use stage::{Disposition, FailurePolicy, Stage, StageError};
pub use store::{ResultStore, WorkflowStore};
pub use workflow::{Step, WorkflowId, WorkflowState, WorkflowStatus};
