// crates/gateforge-backend/src/mock.rs
// ============================================================================
// Module: Mock Backend Adapter
// Description: Deterministic backend used by every scenario test and by
//              callers who want to gate a change-set without a real
//              simulation toolchain.
// Purpose: Produce evidence deterministically from a proposal's own
//          `checker_config._runtime.mock_metrics` override, or a trivial
//          always-succeeding default when none is given.
// Dependencies: gateforge-core, serde_json
// ============================================================================

//! ## Overview
//! The mock backend never shells out. It exists so the run orchestrator, the
//! repair loop, and the CLI scenario tests can exercise the full pipeline
//! without a real OpenModelica install. Callers seed its output via
//! `proposal.checker_config["_runtime"]["mock_metrics"]`, a JSON object
//! merged onto the [`Metrics`] default; `proposal.checker_config["_runtime"]["mock_status"]`
//! set to `"failure"` makes the run fail outright (used to test
//! `candidate_timeout_detected`-style scenarios without an actual timeout).

use gateforge_core::model::evidence::Evidence;
use gateforge_core::model::evidence::EvidenceArtifacts;
use gateforge_core::model::evidence::FailureType;
use gateforge_core::model::evidence::Gate;
use gateforge_core::model::evidence::Metrics;
use gateforge_core::model::evidence::RunStatus;
use gateforge_core::model::evidence::Toolchain;
use gateforge_core::model::evidence::TriState;
use gateforge_core::identifiers::RunId;

use crate::adapter::BackendAdapter;
use crate::adapter::BackendRequest;
use crate::error::BackendError;
use crate::workspace::ScopedWorkspace;

/// A deterministic backend that never spawns a child process.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockBackend;

impl BackendAdapter for MockBackend {
    fn run(&self, request: &BackendRequest<'_>, workspace: &ScopedWorkspace) -> Result<Evidence, BackendError> {
        // The mock backend still scopes a workspace per §5, even though it
        // writes nothing into it, so orchestrator code paths that assume a
        // workspace exists behave identically for every adapter.
        let _ = workspace.path();

        let runtime = request.proposal.checker_config.get("_runtime");
        let forced_failure =
            runtime.and_then(|r| r.get("mock_status")).and_then(|v| v.as_str()) == Some("failure");

        let metrics = runtime
            .and_then(|r| r.get("mock_metrics"))
            .and_then(|v| serde_json::from_value::<Metrics>(v.clone()).ok())
            .unwrap_or_else(default_metrics);

        if forced_failure {
            return Ok(Evidence {
                schema_version: "1".to_string(),
                run_id: RunId::new(format!("mock-{}", request.proposal.proposal_id)),
                backend: self.name().to_string(),
                model_script: request.proposal.model_script.clone(),
                status: RunStatus::Failure,
                failure_type: FailureType::Other,
                gate: Gate::Fail,
                check_ok: TriState::False,
                simulate_ok: TriState::False,
                metrics,
                exit_code: 1,
                toolchain: default_toolchain(),
                artifacts: EvidenceArtifacts::default(),
            });
        }

        Ok(Evidence {
            schema_version: "1".to_string(),
            run_id: RunId::new(format!("mock-{}", request.proposal.proposal_id)),
            backend: self.name().to_string(),
            model_script: request.proposal.model_script.clone(),
            status: RunStatus::Success,
            failure_type: FailureType::None,
            gate: Gate::Pass,
            check_ok: TriState::True,
            simulate_ok: TriState::True,
            metrics,
            exit_code: 0,
            toolchain: default_toolchain(),
            artifacts: EvidenceArtifacts::default(),
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

fn default_metrics() -> Metrics {
    Metrics {
        runtime_seconds: Some(1.0),
        events: Some(1),
        overshoot: Some(0.0),
        settling_time: Some(0.0),
        steady_state_error: Some(0.0),
        energy: Some(0.0),
        extra: Default::default(),
    }
}

fn default_toolchain() -> Toolchain {
    Toolchain {
        backend_version: Some("mock-0".to_string()),
        docker_image: None,
        policy_profile: None,
        policy_version: None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::collections::BTreeSet;

    use gateforge_core::decision::RiskLevel;
    use gateforge_core::identifiers::ProposalId;
    use gateforge_core::model::evidence::RunStatus;
    use gateforge_core::model::proposal::Proposal;
    use gateforge_core::model::proposal::RequestedAction;
    use serde_json::json;

    use super::MockBackend;
    use crate::adapter::BackendAdapter;
    use crate::adapter::BackendRequest;
    use crate::workspace::ScopedWorkspace;

    fn proposal(checker_config: BTreeMap<String, serde_json::Value>) -> Proposal {
        Proposal {
            proposal_id: ProposalId::new("p-1"),
            schema_version: "1".to_string(),
            backend: "mock".to_string(),
            model_script: "s.mo".to_string(),
            requested_actions: BTreeSet::from([RequestedAction::Simulate]),
            risk_level: RiskLevel::Low,
            checkers: Vec::new(),
            checker_config,
            change_set: None,
            physical_invariants: Vec::new(),
        }
    }

    #[test]
    fn default_run_succeeds_with_baseline_runtime() {
        let proposal = proposal(BTreeMap::new());
        let workspace = ScopedWorkspace::new().expect("workspace");
        let evidence = MockBackend
            .run(&BackendRequest { proposal: &proposal, timeout_seconds: 30 }, &workspace)
            .expect("run");
        assert_eq!(evidence.status, RunStatus::Success);
        assert_eq!(evidence.metrics.runtime_seconds, Some(1.0));
    }

    #[test]
    fn mock_metrics_override_is_honored() {
        let mut checker_config = BTreeMap::new();
        checker_config.insert(
            "_runtime".to_string(),
            json!({"mock_metrics": {"runtime_seconds": 1.6, "events": 16}}),
        );
        let proposal = proposal(checker_config);
        let workspace = ScopedWorkspace::new().expect("workspace");
        let evidence = MockBackend
            .run(&BackendRequest { proposal: &proposal, timeout_seconds: 30 }, &workspace)
            .expect("run");
        assert_eq!(evidence.metrics.runtime_seconds, Some(1.6));
        assert_eq!(evidence.metrics.events, Some(16));
    }

    #[test]
    fn forced_failure_status_reports_failure() {
        let mut checker_config = BTreeMap::new();
        checker_config.insert("_runtime".to_string(), json!({"mock_status": "failure"}));
        let proposal = proposal(checker_config);
        let workspace = ScopedWorkspace::new().expect("workspace");
        let evidence = MockBackend
            .run(&BackendRequest { proposal: &proposal, timeout_seconds: 30 }, &workspace)
            .expect("run");
        assert_eq!(evidence.status, RunStatus::Failure);
    }
}
