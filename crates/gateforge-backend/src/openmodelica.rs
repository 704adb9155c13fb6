// crates/gateforge-backend/src/openmodelica.rs
// ============================================================================
// Module: OpenModelica Backend Adapter
// Description: Shells out to a configured Docker image/script to execute a
//              real simulation.
// Purpose: Implement the non-mock half of §4.4's backend adapter contract
//          using the environment variable hints from §6
//          (`GATEFORGE_OM_IMAGE`, `GATEFORGE_OM_SCRIPT`).
// Dependencies: gateforge-core, std::process
// ============================================================================

//! ## Overview
//! This adapter is a thin process-spawning wrapper: it resolves the
//! container image and entry script from configuration (falling back to
//! environment variables), runs the script inside the scoped workspace with
//! a wall-clock timeout via a blocking wait loop, and classifies the result.
//! A missing `docker` binary or a non-zero `docker` exit before the
//! simulation itself starts surfaces as `docker_error`; an unset image/script
//! pair surfaces as `backend_unavailable` rather than attempting a spawn
//! that is guaranteed to fail. GateForge's own tests exercise this adapter
//! only through its error paths, since a real OpenModelica install isn't
//! available to the test suite the way the mock backend is.

use std::process::Command;
use std::process::Stdio;
use std::time::Duration;
use std::time::Instant;

use gateforge_core::identifiers::RunId;
use gateforge_core::model::evidence::Evidence;
use gateforge_core::model::evidence::EvidenceArtifacts;
use gateforge_core::model::evidence::FailureType;
use gateforge_core::model::evidence::Gate;
use gateforge_core::model::evidence::Metrics;
use gateforge_core::model::evidence::RunStatus;
use gateforge_core::model::evidence::Toolchain;
use gateforge_core::model::evidence::TriState;

use crate::adapter::BackendAdapter;
use crate::adapter::BackendRequest;
use crate::error::BackendError;
use crate::workspace::ScopedWorkspace;

/// Environment variable naming the OpenModelica container image.
pub const ENV_OM_IMAGE: &str = "GATEFORGE_OM_IMAGE";
/// Environment variable naming the OpenModelica entry script.
pub const ENV_OM_SCRIPT: &str = "GATEFORGE_OM_SCRIPT";

/// Adapter that shells out to a Docker-packaged OpenModelica toolchain.
#[derive(Debug, Clone)]
pub struct OpenModelicaBackend {
    /// Container image to run, resolved from config or `GATEFORGE_OM_IMAGE`.
    pub docker_image: Option<String>,
    /// Entry script path inside the image, resolved from config or
    /// `GATEFORGE_OM_SCRIPT`.
    pub entry_script: Option<String>,
}

impl OpenModelicaBackend {
    /// Builds an adapter, falling back to the recognized environment
    /// variables for any field not supplied explicitly.
    #[must_use]
    pub fn from_env(docker_image: Option<String>, entry_script: Option<String>) -> Self {
        Self {
            docker_image: docker_image.or_else(|| std::env::var(ENV_OM_IMAGE).ok()),
            entry_script: entry_script.or_else(|| std::env::var(ENV_OM_SCRIPT).ok()),
        }
    }
}

impl BackendAdapter for OpenModelicaBackend {
    fn run(&self, request: &BackendRequest<'_>, workspace: &ScopedWorkspace) -> Result<Evidence, BackendError> {
        let (Some(image), Some(script)) = (&self.docker_image, &self.entry_script) else {
            return Err(BackendError::Unavailable(
                "GATEFORGE_OM_IMAGE/GATEFORGE_OM_SCRIPT not configured".to_string(),
            ));
        };

        let deadline = Instant::now() + Duration::from_secs(request.timeout_seconds);
        let mut child = Command::new("docker")
            .args(["run", "--rm", "-v", &format!("{}:/workspace", workspace.path().display()), image, script])
            .arg(&request.proposal.model_script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| BackendError::DockerError(err.to_string()))?;

        loop {
            if let Some(status) = child.try_wait().map_err(|err| BackendError::DockerError(err.to_string()))? {
                return Ok(self.evidence_from_exit(request, status.code().unwrap_or(-1)));
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                return Err(BackendError::Timeout { timeout_seconds: request.timeout_seconds });
            }
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    fn name(&self) -> &'static str {
        "openmodelica"
    }
}

impl OpenModelicaBackend {
    fn evidence_from_exit(&self, request: &BackendRequest<'_>, exit_code: i32) -> Evidence {
        let success = exit_code == 0;
        Evidence {
            schema_version: "1".to_string(),
            run_id: RunId::new(format!("om-{}", request.proposal.proposal_id)),
            backend: self.name().to_string(),
            model_script: request.proposal.model_script.clone(),
            status: if success { RunStatus::Success } else { RunStatus::Failure },
            failure_type: if success { FailureType::None } else { FailureType::NonZeroExit },
            gate: if success { Gate::Pass } else { Gate::Fail },
            check_ok: if success { TriState::True } else { TriState::False },
            simulate_ok: if success { TriState::True } else { TriState::False },
            metrics: Metrics::default(),
            exit_code,
            toolchain: Toolchain {
                backend_version: None,
                docker_image: self.docker_image.clone(),
                policy_profile: None,
                policy_version: None,
            },
            artifacts: EvidenceArtifacts::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use gateforge_core::decision::RiskLevel;
    use gateforge_core::identifiers::ProposalId;
    use gateforge_core::model::proposal::Proposal;
    use gateforge_core::model::proposal::RequestedAction;

    use super::OpenModelicaBackend;
    use crate::adapter::BackendAdapter;
    use crate::adapter::BackendRequest;
    use crate::workspace::ScopedWorkspace;

    #[test]
    fn missing_image_and_script_is_backend_unavailable() {
        let backend = OpenModelicaBackend { docker_image: None, entry_script: None };
        let proposal = Proposal {
            proposal_id: ProposalId::new("p-1"),
            schema_version: "1".to_string(),
            backend: "openmodelica".to_string(),
            model_script: "s.mo".to_string(),
            requested_actions: BTreeSet::from([RequestedAction::Simulate]),
            risk_level: RiskLevel::Low,
            checkers: Vec::new(),
            checker_config: Default::default(),
            change_set: None,
            physical_invariants: Vec::new(),
        };
        let workspace = ScopedWorkspace::new().expect("workspace");
        let result = backend.run(&BackendRequest { proposal: &proposal, timeout_seconds: 1 }, &workspace);
        assert!(matches!(result, Err(crate::error::BackendError::Unavailable(_))));
    }
}
