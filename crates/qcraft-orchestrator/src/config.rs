//! Configuration for the QCraft orchestrator.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with QCRAFT_ prefix)
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use qcraft_codes::registry::default_descriptors;
use qcraft_codes::{FamilyDescriptor, FamilyRegistry, NoiseModel, QldpcConfig};
use qcraft_compile::{AnalysisConfig, CodeSelectionPolicy, CostModelConfig, ProfilerConfig};
use qcraft_export::ExportPolicy;
use serde::{Deserialize, Serialize};

use crate::error::{OrchestratorError, OrchestratorResult};

/// Module sequence run when the configuration names none.
pub const DEFAULT_MODULE_SEQUENCE: [&str; 12] = [
    "analysis",
    "profiler",
    "surface_code",
    "ft_builder",
    "mapper",
    "co_optimize",
    "optimizer",
    "scheduler",
    "decoder_placement",
    "validation",
    "code_switcher",
    "executor",
];

/// Environment variable overriding [`PrivacyConfig::export_policy`].
pub const ENV_EXPORT_POLICY: &str = "QCRAFT_EXPORT_POLICY";
/// Environment variable overriding [`OrchestratorConfig::results_dir`].
pub const ENV_RESULTS_DIR: &str = "QCRAFT_RESULTS_DIR";
/// Environment variable overriding [`WorkflowPolicy::co_optimization_iterations`].
pub const ENV_CO_OPTIMIZE_ITERATIONS: &str = "QCRAFT_CO_OPTIMIZE_ITERATIONS";

/// Policy controlling which modules run and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowPolicy {
    /// Modules to run, in order.
    pub module_sequence: Vec<String>,

    /// Extra layout and mapping candidates tried by `co_optimize`.
    pub co_optimization_iterations: u32,

    /// Validate with the logical error estimator instead of the cost model.
    pub use_simulator: bool,

    /// Plan code switching for gates the selected code lacks.
    pub enable_code_switching: bool,

    /// Request execution after packaging. Execution itself is out of scope
    /// and is recorded as skipped.
    pub enable_execution: bool,
}

impl Default for WorkflowPolicy {
    fn default() -> Self {
        Self {
            module_sequence: DEFAULT_MODULE_SEQUENCE.iter().map(|m| (*m).to_string()).collect(),
            co_optimization_iterations: 0,
            use_simulator: false,
            enable_code_switching: true,
            enable_execution: false,
        }
    }
}

/// Privacy settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacyConfig {
    /// Policy applied to job packages before they leave the orchestrator.
    pub export_policy: ExportPolicy,
}

/// Complete orchestrator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub workflow_policy: WorkflowPolicy,

    /// Code families in preference order.
    pub families: Vec<FamilyDescriptor>,

    pub analysis: AnalysisConfig,

    pub profiler: ProfilerConfig,

    pub privacy: PrivacyConfig,

    pub cost_model: CostModelConfig,

    /// qLDPC code specifications.
    pub qldpc: QldpcConfig,

    /// Fallback code selection when discovery finds no candidate.
    pub code_selection: CodeSelectionPolicy,

    /// Physical noise used for logical error estimates.
    pub noise: NoiseModel,

    /// Directory for per-workflow result files. Results are kept in memory
    /// only when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_dir: Option<PathBuf>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            workflow_policy: WorkflowPolicy::default(),
            families: default_descriptors(),
            analysis: AnalysisConfig::default(),
            profiler: ProfilerConfig::default(),
            privacy: PrivacyConfig::default(),
            cost_model: CostModelConfig::default(),
            qldpc: QldpcConfig::default(),
            code_selection: CodeSelectionPolicy::default(),
            noise: NoiseModel::default(),
            results_dir: None,
        }
    }
}

impl OrchestratorConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> OrchestratorResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    /// Parse configuration from a YAML document.
    pub fn from_yaml_str(yaml: &str) -> OrchestratorResult<Self> {
        let config: OrchestratorConfig = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with full precedence handling.
    ///
    /// Defaults, then the YAML file if given, then `QCRAFT_*` environment
    /// variables.
    pub fn load(config_file: Option<&str>) -> OrchestratorResult<Self> {
        let config = if let Some(path) = config_file {
            Self::from_file(path)?
        } else {
            OrchestratorConfig::default()
        };

        let config = config.merge_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides.
    ///
    /// Only variables that are set override the current values.
    pub fn merge_env(self) -> OrchestratorResult<Self> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up through `var`.
    pub fn merge_vars(mut self, var: impl Fn(&str) -> Option<String>) -> OrchestratorResult<Self> {
        if let Some(v) = var(ENV_EXPORT_POLICY) {
            self.privacy.export_policy = v.parse().map_err(|_| {
                OrchestratorError::Config(format!("{ENV_EXPORT_POLICY}: unknown export policy '{v}'"))
            })?;
        }
        if let Some(v) = var(ENV_RESULTS_DIR) {
            self.results_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = var(ENV_CO_OPTIMIZE_ITERATIONS) {
            if let Ok(val) = v.parse() {
                self.workflow_policy.co_optimization_iterations = val;
            }
        }
        Ok(self)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> OrchestratorResult<()> {
        if self.workflow_policy.module_sequence.is_empty() {
            return Err(OrchestratorError::Config(
                "workflow_policy.module_sequence must not be empty".into(),
            ));
        }

        let mut seen = BTreeSet::new();
        for family in &self.families {
            if family.name.is_empty() {
                return Err(OrchestratorError::Config("family name must not be empty".into()));
            }
            if !seen.insert(family.name.as_str()) {
                return Err(OrchestratorError::Config(format!(
                    "duplicate family: {}",
                    family.name
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.noise.p) {
            return Err(OrchestratorError::Config(format!(
                "noise.p must be within [0, 1], got {}",
                self.noise.p
            )));
        }
        Ok(())
    }

    /// Family registry with the built-in providers and the configured
    /// descriptors.
    pub fn family_registry(&self) -> FamilyRegistry {
        FamilyRegistry::with_builtin_families_config(self.qldpc.clone())
            .with_descriptors(self.families.clone())
    }
}
