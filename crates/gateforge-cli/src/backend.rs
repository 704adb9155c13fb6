// crates/gateforge-cli/src/backend.rs
// ============================================================================
// Module: Backend Resolution
// Description: Resolves a proposal's declared backend name to a concrete
//              `BackendAdapter`.
// Purpose: Keep the `mock` vs `openmodelica` selection in one place rather
//          than repeating it in every command that runs a backend.
// Dependencies: gateforge-backend
// ============================================================================

use gateforge_backend::mock::MockBackend;
use gateforge_backend::openmodelica::OpenModelicaBackend;
use gateforge_backend::BackendAdapter;

use crate::error::CliError;

/// Resolves `name` (a proposal's `backend` field) to a boxed adapter. The
/// `Sync` bound lets the same adapter be shared across repair-batch worker
/// threads without cloning.
///
/// # Errors
///
/// Returns [`CliError::Usage`] when `name` does not match a known backend.
pub fn resolve(name: &str) -> Result<Box<dyn BackendAdapter + Sync>, CliError> {
    match name {
        "mock" => Ok(Box::new(MockBackend)),
        "openmodelica" => Ok(Box::new(OpenModelicaBackend::from_env(None, None))),
        other => Err(CliError::Usage(format!("unknown backend '{other}'"))),
    }
}
