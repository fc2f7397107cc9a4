//! The workflow orchestrator.
//!
//! [`Orchestrator::run_workflow`] drives one circuit through the configured
//! module sequence. Each stage returns `Result<_, StageError>`; the
//! [`FailurePolicy`] table decides whether a failure is absorbed or fails the
//! workflow. Panics inside a stage are caught and fail the workflow, so the
//! caller always receives a [`WorkflowOutcome`].

use std::any::Any;
use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

use qcraft_codes::surface::SURFACE_FAMILY;
use qcraft_codes::{
    CodeError, FamilyRegistry, LogicalErrorEstimator, MappedLayout, MappingConstraints,
    MappingKpis, NoiseModel, ThresholdEstimator,
};
use qcraft_compile::{
    CostModel, DecoderPlan, ErrorProfile, FtBuilder, PatchDiscoverer, ProtocolPreferences,
    ResourceSchedule, SurfaceCodePreferences, analyze_circuit, decide_surface_code,
    optimize_circuit, plan_code_switching, validate_circuit,
};
use qcraft_export::{ExportedJob, JobPackager, ProvenanceManifest};
use qcraft_ir::{CircuitIr, DeviceCapabilities, DeviceProfile, detect_capabilities};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{OrchestratorConfig, WorkflowPolicy};
use crate::context::{
    CoOptimization, CodeSelection, DegradedStage, MapperOutput, OptimizationTarget, Optimized,
    Packaged, PipelineContext, StrategyChoice, StrategyOutcome,
};
use crate::error::OrchestratorResult;
use crate::stage::{Disposition, FailurePolicy, Stage, StageError};
use crate::store::{ResultStore, WorkflowStore};
use crate::workflow::{Step, WorkflowId, WorkflowState, WorkflowStatus};

/// Per-run options supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Patch constraints layered over the discovery hints.
    pub multi_patch: Option<MappingConstraints>,

    /// Explicit code layout or distance. When set, the surface code decision
    /// replaces the discovered candidate.
    pub code: SurfaceCodePreferences,

    /// Protocol preferences for non-transversal gates.
    pub protocols: ProtocolPreferences,

    /// Comments attached to the job package metadata.
    pub comments: Option<String>,
}

/// Structured result of a workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowOutcome {
    pub workflow_id: WorkflowId,
    pub status: WorkflowStatus,
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub context: PipelineContext,
}

/// Provenance metadata signed for every package.
#[derive(Debug, Clone, Serialize)]
struct ProvenanceMetadata<'a> {
    device: &'a str,
    provider: &'a str,
    strategy: StrategyChoice,
    selected_layout: Option<&'a str>,
    code_distance: Option<u32>,
}

/// A stage failure that ended the workflow.
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
struct PipelineAbort {
    stage: Stage,
    source: StageError,
}

/// Runs compilation workflows against one device.
///
/// The orchestrator is `Sync`: concurrent runs each own their workflow
/// entry, while the device, registry and configuration are shared
/// read-only.
pub struct Orchestrator {
    config: OrchestratorConfig,
    device: DeviceProfile,
    capabilities: DeviceCapabilities,
    registry: FamilyRegistry,
    estimator: Arc<dyn LogicalErrorEstimator>,
    workflows: WorkflowStore,
    results: Option<ResultStore>,
    policy: RwLock<WorkflowPolicy>,
}

impl Orchestrator {
    /// Create an orchestrator for `device`.
    ///
    /// Creates the result directory when `config.results_dir` is set.
    pub fn new(config: &OrchestratorConfig, device: DeviceProfile) -> OrchestratorResult<Self> {
        config.validate()?;
        device.validate()?;
        let results = config.results_dir.as_ref().map(ResultStore::new).transpose()?;
        let capabilities = detect_capabilities(&device);
        info!(
            "Orchestrator ready for {}/{} ({} qubits, families: {:?})",
            device.provider_name,
            device.device_name,
            device.max_qubits,
            config.families.iter().filter(|f| f.enabled).map(|f| &f.name).collect::<Vec<_>>()
        );
        Ok(Self {
            registry: config.family_registry(),
            policy: RwLock::new(config.workflow_policy.clone()),
            config: config.clone(),
            device,
            capabilities,
            estimator: Arc::new(ThresholdEstimator::default()),
            workflows: WorkflowStore::new(),
            results,
        })
    }

    /// Use a custom logical error estimator for co-optimization and
    /// simulator validation.
    #[must_use]
    pub fn with_estimator(mut self, estimator: Arc<dyn LogicalErrorEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Use a custom family registry.
    #[must_use]
    pub fn with_registry(mut self, registry: FamilyRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn device(&self) -> &DeviceProfile {
        &self.device
    }

    pub fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn registry(&self) -> &FamilyRegistry {
        &self.registry
    }

    /// Run `circuit` through the configured pipeline.
    ///
    /// Never returns an error and never panics outward: failures are
    /// reported through the outcome's `status` and `error`.
    #[instrument(skip_all, fields(device = %self.device.device_name, gates = circuit.num_gates()))]
    pub fn run_workflow(&self, circuit: &CircuitIr, options: &RunOptions) -> WorkflowOutcome {
        let id = WorkflowId::new();
        self.workflows.begin(id);
        info!(workflow_id = %id, qubits = circuit.num_qubits(), "workflow_started");

        let policy = self.get_workflow_policy();
        let mut ctx = PipelineContext::new(circuit.clone());
        let run = panic::catch_unwind(AssertUnwindSafe(|| {
            self.run_pipeline(&id, &policy, options, &mut ctx)
        }));

        let failure = match run {
            Ok(Ok(())) => None,
            Ok(Err(abort)) => Some(abort.to_string()),
            Err(payload) => Some(format!("stage panicked: {}", panic_message(payload.as_ref()))),
        };

        match failure {
            None => {
                if self.workflows.transition(&id, WorkflowStatus::Completed, None) {
                    info!(workflow_id = %id, "workflow_completed");
                } else {
                    info!(workflow_id = %id, "Workflow finished after reaching a terminal state");
                }
            }
            Some(message) => {
                error!(workflow_id = %id, error = %message, "workflow_failed");
                self.workflows
                    .transition(&id, WorkflowStatus::Failed, Some(message));
            }
        }

        let state = self.workflows.get(&id).unwrap_or_else(WorkflowState::unknown);
        let outcome = WorkflowOutcome {
            workflow_id: id,
            status: state.status,
            steps: state.steps,
            error: state.error,
            context: ctx,
        };
        self.persist(&outcome);
        outcome
    }

    /// Status, completed steps and error of a workflow; `unknown` for ids
    /// never seen.
    pub fn get_workflow_status(&self, id: &WorkflowId) -> WorkflowState {
        self.workflows.get(id).unwrap_or_else(WorkflowState::unknown)
    }

    /// Mark a running workflow cancelled.
    ///
    /// Cooperative: a run in progress is not interrupted, but its status
    /// stays `cancelled`. Returns `false` for unknown or finished workflows.
    pub fn cancel_workflow(&self, id: &WorkflowId) -> bool {
        let cancelled = self.workflows.transition(id, WorkflowStatus::Cancelled, None);
        if cancelled {
            info!(workflow_id = %id, "workflow_cancelled");
        }
        cancelled
    }

    /// Replace the workflow policy used by subsequent runs.
    pub fn set_workflow_policy(&self, policy: WorkflowPolicy) {
        debug!("Updating workflow policy: {:?}", policy.module_sequence);
        *self.policy.write().unwrap_or_else(|e| e.into_inner()) = policy;
    }

    /// The current workflow policy.
    pub fn get_workflow_policy(&self) -> WorkflowPolicy {
        self.policy.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Load a persisted outcome.
    pub fn stored_result(&self, id: &WorkflowId) -> OrchestratorResult<Option<WorkflowOutcome>> {
        match &self.results {
            Some(store) => store.load(id),
            None => Ok(None),
        }
    }

    fn persist(&self, outcome: &WorkflowOutcome) {
        if let Some(store) = &self.results {
            if let Err(e) = store.save(&outcome.workflow_id, outcome) {
                warn!(workflow_id = %outcome.workflow_id, error = %e, "Failed to store workflow result");
            }
        }
    }

    fn run_pipeline(
        &self,
        id: &WorkflowId,
        policy: &WorkflowPolicy,
        options: &RunOptions,
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineAbort> {
        self.workflows.record_step(id, Step::named("device_loaded"));

        ctx.strategy = match CostModel::new(&self.device, &self.config.cost_model)
            .and_then(|model| model.select_strategy(&ctx.circuit))
        {
            Ok(selection) => {
                info!(
                    workflow_id = %id,
                    selected = %selection.selected,
                    error_a = selection.path_a.expected_error,
                    error_b = selection.path_b.expected_error,
                    "strategy_selected"
                );
                StrategyOutcome::from(selection)
            }
            Err(e) => {
                warn!(workflow_id = %id, error = %e, "strategy_error");
                StrategyOutcome::auto()
            }
        };

        ctx.discovery = match PatchDiscoverer::new(&self.registry, &self.device)
            .with_cost_config(self.config.cost_model.clone())
            .discover(&ctx.circuit)
        {
            Ok(discovery) => {
                info!(
                    workflow_id = %id,
                    candidates = discovery.candidates.len(),
                    best = ?discovery.best().map(|c| (&c.family, &c.layout_type, c.distance)),
                    "patch_discovery"
                );
                discovery
            }
            Err(e) => {
                warn!(workflow_id = %id, error = %e, "patch_discovery_error");
                Default::default()
            }
        };

        for (index, module) in policy.module_sequence.iter().enumerate() {
            info!(workflow_id = %id, module = %module, step = index, "module_started");
            let Some(stage) = Stage::from_module(module) else {
                warn!(workflow_id = %id, module = %module, "Unknown module");
                self.workflows
                    .record_step(id, Step::named(format!("unknown_module_{module}")));
                continue;
            };

            match self.run_stage(stage, id, policy, options, ctx) {
                Ok(steps) => {
                    for step in steps {
                        self.workflows.record_step(id, step);
                    }
                }
                Err(e) => match FailurePolicy::for_stage(stage).disposition(&e) {
                    Disposition::Absorb => {
                        warn!(workflow_id = %id, module = %stage, error = %e, "module_degraded");
                        ctx.degraded.push(DegradedStage {
                            stage,
                            error: e.to_string(),
                        });
                        self.workflows
                            .record_step(id, Step::named(format!("{stage}_degraded")));
                    }
                    Disposition::Abort => return Err(PipelineAbort { stage, source: e }),
                },
            }
            info!(workflow_id = %id, module = %stage, step = index, "module_completed");
        }
        Ok(())
    }

    fn run_stage(
        &self,
        stage: Stage,
        id: &WorkflowId,
        policy: &WorkflowPolicy,
        options: &RunOptions,
        ctx: &mut PipelineContext,
    ) -> Result<Vec<Step>, StageError> {
        match stage {
            Stage::Analysis => {
                let analysis = analyze_circuit(&ctx.circuit, &self.config.analysis);
                for alert in &analysis.alerts {
                    warn!(workflow_id = %id, alert = ?alert, "analysis_alert");
                }
                ctx.analysis = Some(analysis);
                Ok(vec![Step::named("analyzed")])
            }
            Stage::Profiler => {
                let profile = ErrorProfile::build(&self.device, &self.config.profiler);
                debug!("Error profile uncertainty: {:?}", profile.uncertainty);
                ctx.error_profile = Some(profile);
                Ok(vec![Step::named("profiled")])
            }
            Stage::SurfaceCode => self.select_code(options, ctx).map(|step| vec![step]),
            Stage::FtBuilder => self.build_ft_circuit(options, ctx),
            Stage::Mapper => self.map_layout(id, ctx),
            Stage::CoOptimize => self.co_optimize(policy, ctx),
            Stage::Optimizer => {
                let (target, input) = match &ctx.ft_circuit {
                    Some(ft) => (OptimizationTarget::FaultTolerant, &ft.circuit),
                    None => (OptimizationTarget::Logical, ctx.logical_circuit()),
                };
                let (circuit, report) = optimize_circuit(input);
                debug!(
                    "Optimized {:?} circuit: {} -> {} gates",
                    target, report.gates_before, report.gates_after
                );
                ctx.optimized = Some(Optimized {
                    target,
                    circuit,
                    report,
                });
                Ok(vec![Step::named("circuit_optimized")])
            }
            Stage::Scheduler => {
                if ctx.ft_circuit.is_some() {
                    let t_depth = ctx.analysis.as_ref().map_or(0, |a| a.t_depth_or_zero());
                    ctx.schedule = Some(ResourceSchedule::new(t_depth, self.device.max_qubits));
                }
                Ok(vec![Step::named("scheduled")])
            }
            Stage::DecoderPlacement => {
                ctx.decoder_plan = Some(DecoderPlan::new(&self.capabilities, ctx.schedule.as_ref()));
                Ok(vec![Step::named("decoder_placed")])
            }
            Stage::Validation => {
                let estimator: Option<(&dyn LogicalErrorEstimator, &NoiseModel)> =
                    if policy.use_simulator {
                        Some((self.estimator.as_ref(), &self.config.noise))
                    } else {
                        None
                    };
                let report = validate_circuit(
                    ctx.output_circuit(),
                    &self.device,
                    &self.config.cost_model,
                    estimator,
                    ctx.best_mapping(),
                )?;
                ctx.validation = Some(report);
                Ok(vec![Step::named("validated")])
            }
            Stage::CodeSwitcher => {
                if !policy.enable_code_switching {
                    return Ok(vec![Step::named("code_switching_skipped")]);
                }
                let code = ctx.code.as_ref().ok_or(StageError::MissingInput {
                    stage,
                    missing: "a code selection",
                })?;
                let supported = common_logical_gates(code);
                let plan = plan_code_switching(
                    ctx.logical_circuit(),
                    &supported,
                    &self.capabilities,
                    &options.protocols,
                );
                info!(workflow_id = %id, switch_points = plan.len(), "code_switching_planned");
                ctx.code_switching = Some(plan);
                Ok(vec![Step::named("code_switching_planned")])
            }
            Stage::Executor => Ok(self.package(id, policy, options, ctx)),
        }
    }

    /// Choose family, layout and distance, then generate the combined layout.
    fn select_code(&self, options: &RunOptions, ctx: &mut PipelineContext) -> Result<Step, StageError> {
        let user_choice = options.code.layout.is_some() || options.code.distance.is_some();
        let (family, layout_type, distance) = match ctx.discovery.best() {
            Some(best) if !user_choice => (best.family.clone(), best.layout_type.clone(), best.distance),
            _ => {
                let decision =
                    decide_surface_code(&self.device, &self.config.code_selection, &options.code);
                (SURFACE_FAMILY.to_string(), decision.layout, decision.distance)
            }
        };

        let user = options.multi_patch.clone().unwrap_or_default();
        let constraints = MappingConstraints {
            num_logical_qubits: Some(ctx.circuit.num_qubits().max(1)),
            ..MappingConstraints::default()
        }
        .merged_with(&ctx.discovery.hints)
        .merged_with(&user);

        let num_patches = constraints.resolved_num_patches();
        let shapes = if user.patch_shapes.len() == num_patches {
            user.patch_shapes.clone()
        } else {
            vec![layout_type.clone(); num_patches]
        };
        let distances = if user.patch_distances.is_empty() {
            vec![distance]
        } else {
            user.patch_distances.clone()
        };

        let provider = self.registry.get_family_api(&family)?;
        provider.check_multi_patch_capacity(num_patches, &distances, &shapes, &self.device)?;
        let layout = provider.generate_multi_patch_layout(num_patches, &distances, &shapes)?;
        debug!(
            "Selected {} {} d={} with {} patch(es), {} qubits",
            family,
            layout_type,
            distance,
            num_patches,
            layout.total_qubits()
        );

        let step = Step::CodeSelected {
            code_family: family.clone(),
            layout: layout_type.clone(),
            distance,
        };
        ctx.code = Some(CodeSelection {
            family,
            layout_type,
            distance,
            constraints,
            layout,
        });
        Ok(step)
    }

    /// Map the selected code onto the device and log its KPIs.
    fn map_layout(&self, id: &WorkflowId, ctx: &mut PipelineContext) -> Result<Vec<Step>, StageError> {
        let code = ctx.code.as_ref().ok_or(StageError::MissingInput {
            stage: Stage::Mapper,
            missing: "a code selection",
        })?;
        let provider = self.registry.get_family_api(&code.family)?;
        let mapping = provider.map_layout(&code.layout, &self.device, &code.constraints)?;
        let mapped = MappedLayout {
            layout: code.layout.clone(),
            mapping,
            distance: code.distance,
            estimated_ler: None,
        };

        let kpis = MappingKpis::compute(&mapped, &self.device);
        info!(
            workflow_id = %id,
            patches = kpis.patch_count,
            physical_qubits = kpis.physical_qubits,
            components = kpis.connected_components,
            has_overlap = kpis.has_overlap,
            "mapping_kpis"
        );
        ctx.mapping = Some(MapperOutput { mapped, kpis });
        Ok(vec![Step::named("circuit_mapped")])
    }

    /// Assemble the fault-tolerant circuit.
    ///
    /// Uses the best mapping so far, or a fresh mapping of the selected
    /// layout by the family's strategy when the mapper has not run yet.
    fn build_ft_circuit(
        &self,
        options: &RunOptions,
        ctx: &mut PipelineContext,
    ) -> Result<Vec<Step>, StageError> {
        let code = ctx.code.as_ref().ok_or(StageError::MissingInput {
            stage: Stage::FtBuilder,
            missing: "a code selection",
        })?;

        let fresh;
        let (layout, mapping) = match ctx.best_mapping() {
            Some(mapped) => (&mapped.layout, &mapped.mapping),
            None => {
                fresh = self
                    .registry
                    .get_family_api(&code.family)?
                    .mapping_strategy()
                    .map(&code.layout, &self.device, &code.constraints)?;
                (&code.layout, &fresh)
            }
        };

        let ft = FtBuilder::new(self.capabilities)
            .with_preferences(options.protocols.clone())
            .assemble(ctx.logical_circuit(), layout, mapping)?;
        debug!(
            "Built fault-tolerant circuit: {} gates, {} transversal, {} protocol decisions",
            ft.circuit.num_gates(),
            ft.transversal_gates(),
            ft.decisions.len()
        );
        ctx.ft_circuit = Some(ft);
        Ok(vec![Step::named("ft_circuit_built")])
    }

    /// Try up to `co_optimization_iterations` distances from the selected one
    /// upward and keep the mapping with the lowest estimated logical error.
    fn co_optimize(&self, policy: &WorkflowPolicy, ctx: &mut PipelineContext) -> Result<Vec<Step>, StageError> {
        let iterations = policy.co_optimization_iterations as usize;
        if iterations == 0 {
            return Ok(vec![Step::named("co_optimized")]);
        }
        let code = ctx.code.as_ref().ok_or(StageError::MissingInput {
            stage: Stage::CoOptimize,
            missing: "a code selection",
        })?;
        let provider = self.registry.get_family_api(&code.family)?;

        let mut best: Option<(f64, MappedLayout)> = None;
        let mut evaluated = 0;
        let mut consider = |mut mapped: MappedLayout| {
            match self.estimator.estimate(&mapped.layout, &mapped.mapping, &self.config.noise) {
                Ok(ler) => {
                    evaluated += 1;
                    mapped.estimated_ler = Some(ler);
                    if best.as_ref().is_none_or(|(b, _)| ler < *b) {
                        best = Some((ler, mapped));
                    }
                }
                Err(e) => debug!("Skipping d={}: {}", mapped.distance, e),
            }
        };

        if let Some(current) = ctx.mapping.as_ref() {
            consider(current.mapped.clone());
        }
        let distances: Vec<u32> = provider
            .list_code_distances(&self.device, &code.layout_type)
            .into_iter()
            .filter(|d| *d >= code.distance)
            .take(iterations)
            .collect();
        for distance in distances {
            match provider.get_multi_patch_mapping(
                Some(distance),
                &code.layout_type,
                &code.constraints,
                &self.device,
            ) {
                Ok(mapped) => consider(mapped),
                Err(e) => debug!("Skipping d={}: {}", distance, e),
            }
        }

        let (ler, best) = best.ok_or_else(|| CodeError::NoFeasibleDistance {
            layout: code.layout_type.clone(),
            num_patches: code.constraints.resolved_num_patches(),
        })?;
        debug!(
            "Co-optimization kept d={} (LER {:.3e}) out of {} candidates",
            best.distance, ler, evaluated
        );
        ctx.co_optimization = Some(CoOptimization { evaluated, best });
        Ok(vec![Step::named("co_optimized")])
    }

    /// Package the output circuit, apply the export policy and sign the
    /// provenance manifest.
    fn package(
        &self,
        id: &WorkflowId,
        policy: &WorkflowPolicy,
        options: &RunOptions,
        ctx: &mut PipelineContext,
    ) -> Vec<Step> {
        let mut packager = JobPackager::new(&self.device, self.capabilities);
        if let Some(comments) = &options.comments {
            packager = packager.with_comments(comments.clone());
        }
        let package = packager.package(ctx.output_circuit());

        let export_policy = self.config.privacy.export_policy;
        let (job, blocked) = ExportedJob::from_policy(export_policy, package);
        if let Some(e) = blocked {
            warn!(workflow_id = %id, policy = %export_policy, error = %e, "export_blocked");
        }

        let metadata = ProvenanceMetadata {
            device: &self.device.device_name,
            provider: &self.device.provider_name,
            strategy: ctx.strategy.selected,
            selected_layout: ctx.code.as_ref().map(|c| c.layout_type.as_str()),
            code_distance: ctx.code.as_ref().map(|c| c.distance),
        };
        let provenance = match ProvenanceManifest::generate(&metadata) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                warn!(workflow_id = %id, error = %e, "Failed to sign provenance manifest");
                None
            }
        };

        ctx.package = Some(Packaged {
            capabilities: self.capabilities,
            job,
            provenance,
        });

        let mut steps = vec![Step::named("packaged")];
        if policy.enable_execution {
            steps.push(Step::named("execution_skipped"));
        }
        steps
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("device", &self.device.device_name)
            .field("registry", &self.registry)
            .field("workflows", &self.workflows.len())
            .finish()
    }
}

/// Logical gates every patch of the selection implements.
fn common_logical_gates(code: &CodeSelection) -> BTreeSet<String> {
    let mut spaces = code.layout.code_spaces.iter();
    let Some(first) = spaces.next() else {
        return BTreeSet::new();
    };
    spaces.fold(first.supported_logical_gates.clone(), |acc, cs| {
        acc.intersection(&cs.supported_logical_gates).cloned().collect()
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
