// crates/gateforge-engine/src/error.rs
// ============================================================================
// Module: GateForge Engine Errors
// Description: Error taxonomy for the regression engine, orchestrator,
//              repair loop, review ledger, governance, and promotion chain.
// Dependencies: gateforge-backend, gateforge-config, gateforge-core, thiserror
// ============================================================================

use gateforge_backend::BackendError;
use gateforge_config::ConfigError;
use gateforge_core::CoreError;
use gateforge_core::ExitCode;

/// Errors raised anywhere in the engine's decision subroutines.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// An artifact could not be read, written, or validated.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Config, policy, or baseline resolution failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A backend invocation failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A planner backend is not implemented or not configured.
    #[error("planner_backend_unavailable: {0}")]
    PlannerUnavailable(String),

    /// A planner or change-plan output failed schema validation.
    #[error("planner_output_invalid: {0}")]
    PlannerOutputInvalid(String),

    /// A change-set failed to apply cleanly.
    #[error("change_set_apply_failed: {0}")]
    ChangeSetApplyFailed(String),

    /// A constraint (promotion margin, explanation, review ticket, ...) was
    /// not met.
    #[error("constraint violated: {0}")]
    Constraint(String),
}

impl EngineError {
    /// Maps this error onto a contract exit code.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Constraint(_) => ExitCode::LogicalFailure,
            _ => ExitCode::UsageError,
        }
    }
}
