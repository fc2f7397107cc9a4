//! Pipeline stages and their failure policies.

use qcraft_codes::CodeError;
use qcraft_compile::CompileError;
use qcraft_export::ExportError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A pipeline module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Analysis,
    Profiler,
    SurfaceCode,
    FtBuilder,
    Mapper,
    CoOptimize,
    Optimizer,
    Scheduler,
    DecoderPlacement,
    Validation,
    CodeSwitcher,
    Executor,
}

impl Stage {
    /// All stages in default pipeline order.
    pub const ALL: [Stage; 12] = [
        Stage::Analysis,
        Stage::Profiler,
        Stage::SurfaceCode,
        Stage::FtBuilder,
        Stage::Mapper,
        Stage::CoOptimize,
        Stage::Optimizer,
        Stage::Scheduler,
        Stage::DecoderPlacement,
        Stage::Validation,
        Stage::CodeSwitcher,
        Stage::Executor,
    ];

    /// Resolve a configured module name.
    pub fn from_module(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }

    /// Module name as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Analysis => "analysis",
            Stage::Profiler => "profiler",
            Stage::SurfaceCode => "surface_code",
            Stage::FtBuilder => "ft_builder",
            Stage::Mapper => "mapper",
            Stage::CoOptimize => "co_optimize",
            Stage::Optimizer => "optimizer",
            Stage::Scheduler => "scheduler",
            Stage::DecoderPlacement => "decoder_placement",
            Stage::Validation => "validation",
            Stage::CodeSwitcher => "code_switcher",
            Stage::Executor => "executor",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by a stage.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StageError {
    #[error(transparent)]
    Code(#[from] CodeError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Export(#[from] ExportError),

    /// The stage depends on output of a stage that has not run.
    #[error("{stage} requires {missing}")]
    MissingInput {
        stage: Stage,
        missing: &'static str,
    },
}

impl StageError {
    /// Whether the requested qubits or code distance cannot fit the device.
    pub fn is_infeasible(&self) -> bool {
        match self {
            StageError::Compile(e) => e.is_infeasible(),
            StageError::Code(e) => matches!(
                e,
                CodeError::InsufficientQubits { .. }
                    | CodeError::NoFeasibleDistance { .. }
                    | CodeError::IncompleteMapping { .. }
            ),
            _ => false,
        }
    }
}

/// What the orchestrator does when a stage fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the stage as degraded and continue.
    Absorb,
    /// Fail the workflow.
    Abort,
    /// Fail the workflow on infeasible capacity, absorb anything else.
    AbortIfInfeasible,
}

/// Outcome of applying a [`FailurePolicy`] to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Absorb,
    Abort,
}

impl FailurePolicy {
    /// The policy table.
    pub fn for_stage(stage: Stage) -> Self {
        match stage {
            Stage::SurfaceCode | Stage::Mapper => FailurePolicy::Abort,
            Stage::FtBuilder => FailurePolicy::AbortIfInfeasible,
            Stage::Analysis
            | Stage::Profiler
            | Stage::CoOptimize
            | Stage::Optimizer
            | Stage::Scheduler
            | Stage::DecoderPlacement
            | Stage::Validation
            | Stage::CodeSwitcher
            | Stage::Executor => FailurePolicy::Absorb,
        }
    }

    /// Decide how to handle `error`.
    pub fn disposition(&self, error: &StageError) -> Disposition {
        match self {
            FailurePolicy::Absorb => Disposition::Absorb,
            FailurePolicy::Abort => Disposition::Abort,
            FailurePolicy::AbortIfInfeasible if error.is_infeasible() => Disposition::Abort,
            FailurePolicy::AbortIfInfeasible => Disposition::Absorb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_names_roundtrip() {
        for stage in Stage::ALL {
            assert_eq!(Stage::from_module(stage.as_str()), Some(stage));
        }
        assert_eq!(Stage::from_module("quantum_magic"), None);
        assert_eq!(Stage::from_module("Analysis"), None);
    }

    #[test]
    fn test_policy_table() {
        let aborting: Vec<Stage> = Stage::ALL
            .into_iter()
            .filter(|s| FailurePolicy::for_stage(*s) == FailurePolicy::Abort)
            .collect();
        assert_eq!(aborting, vec![Stage::SurfaceCode, Stage::Mapper]);
        assert_eq!(
            FailurePolicy::for_stage(Stage::FtBuilder),
            FailurePolicy::AbortIfInfeasible
        );
        assert_eq!(FailurePolicy::for_stage(Stage::Executor), FailurePolicy::Absorb);
    }

    #[test]
    fn test_ft_builder_disposition() {
        let policy = FailurePolicy::for_stage(Stage::FtBuilder);
        let infeasible = StageError::Compile(CompileError::Infeasible("3 logical, 2 patches".into()));
        assert_eq!(policy.disposition(&infeasible), Disposition::Abort);

        let capacity = StageError::Code(CodeError::InsufficientQubits {
            layout: "planar".into(),
            distance: 5,
            num_patches: 2,
            required: 98,
            available: 50,
            max_distance: 3,
        });
        assert_eq!(policy.disposition(&capacity), Disposition::Abort);

        let missing = StageError::MissingInput {
            stage: Stage::FtBuilder,
            missing: "a code selection",
        };
        assert_eq!(policy.disposition(&missing), Disposition::Absorb);
        assert_eq!(missing.to_string(), "ft_builder requires a code selection");
    }

    #[test]
    fn test_absorbing_stage_never_aborts() {
        let error = StageError::Code(CodeError::NoFeasibleDistance {
            layout: "planar".into(),
            num_patches: 1,
        });
        assert_eq!(
            FailurePolicy::for_stage(Stage::Validation).disposition(&error),
            Disposition::Absorb
        );
    }
}
