// crates/gateforge-core/src/error.rs
// ============================================================================
// Module: GateForge Core Errors
// Description: Shared error taxonomy for artifact I/O, schema validation, and
//              canonical hashing.
// Purpose: Give every crate in the workspace a common mapping from error to
//          CLI exit code.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every error in the workspace ultimately maps to one of the three contract
//! exit codes: `0` (success), `1` (logical failure — a proposal was rejected,
//! a regression was found), or `2` (usage error — bad arguments, malformed
//! artifacts, I/O failures). [`ExitCode`] is the shared vocabulary; each
//! crate's own error enum implements [`CoreError::exit_code`] to report where
//! it lands.

use crate::hashing::HashError;
use crate::time::TimestampError;

/// The three contract exit codes a GateForge command may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// The command completed and the gate outcome was a pass.
    Success,
    /// The command completed but the gate outcome was a logical failure.
    LogicalFailure,
    /// The command could not run at all: bad arguments, malformed input, I/O.
    UsageError,
}

impl ExitCode {
    /// Converts to the `std::process::ExitCode` value a `main` returns.
    #[must_use]
    pub fn as_process_code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::LogicalFailure => 1,
            Self::UsageError => 2,
        }
    }
}

/// Errors shared by artifact loading, schema validation, and hashing that any
/// crate in the workspace may surface.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Reading or writing a file on disk failed.
    #[error("io error at {path}: {source}")]
    Io {
        /// Path the operation was attempted against.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed or did not satisfy its schema.
    #[error("invalid artifact at {path}: {message}")]
    InvalidArtifact {
        /// Path of the offending artifact.
        path: String,
        /// Human-readable validation failure.
        message: String,
    },

    /// Canonical hashing failed.
    #[error(transparent)]
    Hash(#[from] HashError),

    /// A timestamp could not be parsed or formatted.
    #[error(transparent)]
    Timestamp(#[from] TimestampError),

    /// An advisory file lock could not be acquired.
    #[error("failed to lock {path}: {source}")]
    Lock {
        /// Path of the file that could not be locked.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

impl CoreError {
    /// Maps this error onto a contract exit code. Core errors are always
    /// usage errors: they represent inputs the command could not process,
    /// never a logical gate outcome.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::UsageError
    }
}
