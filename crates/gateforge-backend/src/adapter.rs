// crates/gateforge-backend/src/adapter.rs
// ============================================================================
// Module: Backend Adapter Trait
// Description: The contract every backend (mock, OpenModelica, ...) satisfies.
// Purpose: Let the run orchestrator invoke any configured backend uniformly.
// Dependencies: gateforge-core
// ============================================================================

use gateforge_core::model::evidence::Evidence;
use gateforge_core::model::proposal::Proposal;

use crate::error::BackendError;
use crate::workspace::ScopedWorkspace;

/// Inputs to one backend invocation.
#[derive(Debug, Clone)]
pub struct BackendRequest<'a> {
    /// The proposal this run is driven by.
    pub proposal: &'a Proposal,
    /// Wall-clock timeout, in seconds, after which the invocation must
    /// report `candidate_timeout_detected`.
    pub timeout_seconds: u64,
}

/// A backend adapter produces candidate [`Evidence`] for a proposal.
pub trait BackendAdapter {
    /// Runs the backend against `request` inside a freshly scoped workspace,
    /// returning the resulting evidence.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the backend cannot run, times out, or
    /// its supporting tooling is unavailable.
    fn run(&self, request: &BackendRequest<'_>, workspace: &ScopedWorkspace) -> Result<Evidence, BackendError>;

    /// Returns this adapter's name, as recorded in `Evidence::backend`.
    fn name(&self) -> &'static str;
}
