// crates/gateforge-config/src/error.rs
// ============================================================================
// Module: GateForge Config Errors
// Description: Error taxonomy for config, policy, and baseline-index loading.
// Dependencies: gateforge-core, thiserror
// ============================================================================

use gateforge_core::CoreError;
use gateforge_core::ExitCode;

/// Errors raised while resolving configuration, policy, or baselines.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The underlying artifact could not be read or parsed as JSON.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A TOML config document could not be parsed.
    #[error("invalid config at {path}: {source}")]
    InvalidToml {
        /// Path of the offending config file.
        path: String,
        /// Underlying TOML parse failure.
        #[source]
        source: toml::de::Error,
    },

    /// A named policy profile could not be resolved to a file.
    #[error("unknown policy profile: {0}")]
    UnknownPolicyProfile(String),

    /// No baseline entry exists for the given `(backend, model_script)` pair.
    #[error("baseline_not_found: no baseline for backend={backend} model_script={model_script}")]
    BaselineNotFound {
        /// Backend the caller requested a baseline for.
        backend: String,
        /// Model script the caller requested a baseline for.
        model_script: String,
    },
}

impl ConfigError {
    /// Maps this error onto a contract exit code. Every config error is an
    /// input error: malformed config, unknown profile, or unresolvable
    /// baseline are all usage errors, never a logical gate outcome.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::UsageError
    }
}
