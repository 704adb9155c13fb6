// crates/gateforge-cli/src/error.rs
// ============================================================================
// Module: CLI Error Type
// Description: The top-level error every command function returns, and the
//              mapping from error to the §6 exit code contract.
// Purpose: Give `main` a single place to turn any failure into one of the
//          three contract exit codes (0/1/2).
// Dependencies: gateforge-core, gateforge-config, gateforge-engine, thiserror
// ============================================================================

//! ## Overview
//! Every command function returns `Result<ExitCode, CliError>`. A command
//! whose *decision* is FAIL or NEEDS_REVIEW is not an error — the command
//! function computes the right [`ExitCode`] itself and returns `Ok`. A
//! [`CliError`] is reserved for cases where the command could not complete
//! at all: an artifact failed to read or parse, a policy profile could not
//! be resolved, or the command was invoked with an invalid flag
//! combination clap's own validation does not cover.

use gateforge_core::ExitCode as ContractExitCode;

/// Errors surfaced by a GateForge command.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// An artifact or ledger operation failed at the `gateforge-core` layer.
    #[error("{preamble}: {source}", preamble = crate::strings::READ_FAILED)]
    Core {
        /// Underlying core error.
        #[source]
        source: gateforge_core::CoreError,
    },
    /// Configuration, policy, or baseline resolution failed.
    #[error("{preamble}: {source}", preamble = crate::strings::CONFIG_FAILED)]
    Config {
        /// Underlying config error.
        #[source]
        source: gateforge_config::ConfigError,
    },
    /// An engine-level operation failed.
    #[error("{source}")]
    Engine {
        /// Underlying engine error.
        #[source]
        source: gateforge_engine::error::EngineError,
    },
    /// The command was invoked with an invalid combination of flags or
    /// arguments that clap's own parser does not reject.
    #[error("usage error: {0}")]
    Usage(String),
}

impl From<gateforge_core::CoreError> for CliError {
    fn from(source: gateforge_core::CoreError) -> Self {
        Self::Core { source }
    }
}

impl From<gateforge_config::ConfigError> for CliError {
    fn from(source: gateforge_config::ConfigError) -> Self {
        Self::Config { source }
    }
}

impl From<gateforge_engine::error::EngineError> for CliError {
    fn from(source: gateforge_engine::error::EngineError) -> Self {
        Self::Engine { source }
    }
}

impl CliError {
    /// Maps this error to the §6 exit code contract.
    #[must_use]
    pub fn exit_code(&self) -> ContractExitCode {
        match self {
            Self::Core { source } => source.exit_code(),
            Self::Config { source } => source.exit_code(),
            Self::Engine { source } => source.exit_code(),
            Self::Usage(_) => ContractExitCode::UsageError,
        }
    }
}
