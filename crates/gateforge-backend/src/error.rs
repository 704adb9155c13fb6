// crates/gateforge-backend/src/error.rs
// ============================================================================
// Module: GateForge Backend Errors
// Description: Error taxonomy for backend adapter invocations.
// Dependencies: thiserror
// ============================================================================

/// Errors raised while invoking a backend adapter.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend's container image or runtime could not be started.
    #[error("backend_unavailable: {0}")]
    Unavailable(String),

    /// The backend's supporting container/docker tool could not run.
    #[error("docker_error: {0}")]
    DockerError(String),

    /// The backend exceeded its configured wall-clock timeout.
    #[error("candidate_timeout_detected: exceeded {timeout_seconds}s")]
    Timeout {
        /// Configured timeout, in seconds.
        timeout_seconds: u64,
    },

    /// The scoped workspace could not be created or cleaned up.
    #[error("workspace error: {0}")]
    Workspace(#[from] std::io::Error),
}
