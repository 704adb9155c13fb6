// crates/gateforge-engine/src/orchestrator.rs
// ============================================================================
// Module: Run Orchestrator
// Description: Drives one proposal through init, change-set apply, backend
//              execution, regression comparison, and policy overlay to
//              produce a RunSummary.
// Dependencies: gateforge-backend, gateforge-config, gateforge-core
// ============================================================================

//! ## Overview
//! [`run`] is the single entry point every CLI command that executes a
//! proposal (`check`, `simulate`, `regress`) goes through. It always follows
//! the same state sequence: `init` → `validate_proposal` → `apply_change_set`
//! (only when the proposal carries one) → `smoke` (only when `simulate` is
//! requested) → `regress` (only when `regress` is requested) →
//! `policy_overlay` → `finalize`. Steps not requested by
//! `proposal.requested_actions` are skipped, not executed with a vacuous
//! result, so a `check`-only run never touches a backend.

use std::path::Path;

use gateforge_backend::BackendAdapter;
use gateforge_backend::BackendRequest;
use gateforge_backend::ScopedWorkspace;
use gateforge_config::BaselineIndex;
use gateforge_config::Policy;
use gateforge_core::io::read_json;
use gateforge_core::io::write_json_atomic;
use gateforge_core::model::evidence::Evidence;
use gateforge_core::model::evidence::FailureType;
use gateforge_core::model::evidence::Gate;
use gateforge_core::model::proposal::Proposal;
use gateforge_core::model::proposal::RequestedAction;
use gateforge_core::model::run_summary::ChangeApplyStatus;
use gateforge_core::model::run_summary::GuardrailDecision;
use gateforge_core::model::run_summary::GuardrailViolation;
use gateforge_core::model::run_summary::RunStatus;
use gateforge_core::model::run_summary::RunSummary;

use crate::changeset::ChangeSet;
use crate::error::EngineError;
use crate::regression;

/// Inputs to one orchestrated run.
pub struct OrchestratorInput<'a> {
    /// The proposal being run.
    pub proposal: &'a Proposal,
    /// Directory the proposal document and its change-set are relative to.
    pub proposal_dir: &'a Path,
    /// Backend adapter used for the `simulate` step.
    pub backend: &'a dyn BackendAdapter,
    /// Wall-clock timeout handed to the backend.
    pub timeout_seconds: u64,
    /// Baseline index used to auto-resolve the comparison baseline.
    pub baseline_index: Option<&'a BaselineIndex>,
    /// Directory `baseline_index`'s relative paths are resolved against.
    pub baseline_index_dir: &'a Path,
    /// Policy overlay document applied during `regress`.
    pub policy: &'a Policy,
    /// Path to the policy document, recorded on the regression summary.
    pub policy_path: &'a str,
    /// Fractional runtime regression threshold.
    pub runtime_threshold: f64,
    /// Directory candidate/regression artifacts are written into.
    pub output_dir: &'a Path,
    /// Path roots the proposal's change-set is allowed to touch.
    pub change_set_allowed_roots: &'a [String],
    /// Guardrail outcome for a planner-proposed change-plan, when this run
    /// was driven by one; `(NotApplicable, [])` for a plain run.
    pub planner_guardrail: (GuardrailDecision, Vec<GuardrailViolation>),
}

/// Runs one proposal through the full orchestrator state sequence.
///
/// # Errors
///
/// Returns [`EngineError`] when the change-set fails preflight or apply, the
/// backend invocation fails, or an artifact cannot be read or written.
pub fn run(input: &OrchestratorInput<'_>) -> Result<RunSummary, EngineError> {
    let mut summary = init(input.proposal);
    validate_proposal(input.proposal)?;

    let (planner_guardrail_decision, planner_guardrail_violations) = input.planner_guardrail.clone();
    summary.planner_guardrail_decision = planner_guardrail_decision;
    summary.planner_guardrail_violations = planner_guardrail_violations;
    if summary.planner_guardrail_decision == GuardrailDecision::Rejected {
        summary.status = RunStatus::Fail;
        summary.fail_reasons.push("planner_guardrail_rejected".to_string());
        return Ok(summary);
    }

    apply_change_set(input, &mut summary)?;

    let candidate = if input.proposal.requested_actions.contains(&RequestedAction::Simulate) {
        Some(smoke(input, &mut summary)?)
    } else {
        None
    };

    if input.proposal.requested_actions.contains(&RequestedAction::Regress) {
        let Some(candidate) = candidate.as_ref() else {
            return Err(EngineError::Constraint(
                "regress requested without simulate; no candidate evidence to compare".to_string(),
            ));
        };
        regress(input, &mut summary, candidate)?;
    } else if let Some(candidate) = candidate.as_ref() {
        finalize_from_evidence(&mut summary, candidate);
    }

    finalize(&mut summary);
    Ok(summary)
}

fn init(proposal: &Proposal) -> RunSummary {
    RunSummary {
        proposal_id: proposal.proposal_id.clone(),
        status: RunStatus::Unknown,
        policy_decision: None,
        policy_reasons: Vec::new(),
        fail_reasons: Vec::new(),
        required_human_checks: Vec::new(),
        candidate_path: None,
        baseline_path: None,
        regression_path: None,
        change_apply_status: ChangeApplyStatus::Skipped,
        change_set_hash: None,
        planner_guardrail_decision: GuardrailDecision::NotApplicable,
        planner_guardrail_violations: Vec::new(),
        toolchain: None,
    }
}

fn validate_proposal(proposal: &Proposal) -> Result<(), EngineError> {
    if proposal.requested_actions.is_empty() {
        return Err(EngineError::Constraint("proposal requests no actions".to_string()));
    }
    Ok(())
}

fn apply_change_set(input: &OrchestratorInput<'_>, summary: &mut RunSummary) -> Result<(), EngineError> {
    let Some(change_set_ref) = &input.proposal.change_set else {
        return Ok(());
    };
    let change_set_path = input.proposal_dir.join(&change_set_ref.path);
    let change_set = ChangeSet::load(&change_set_path)?;
    change_set.preflight(input.change_set_allowed_roots)?;
    summary.change_set_hash = Some(change_set.compute_hash().as_str().to_string());

    match change_set.apply(input.proposal_dir) {
        Ok(_applied) => {
            summary.change_apply_status = ChangeApplyStatus::Applied;
            Ok(())
        }
        Err(err) => {
            summary.change_apply_status = ChangeApplyStatus::Failed;
            Err(err)
        }
    }
}

fn smoke(input: &OrchestratorInput<'_>, summary: &mut RunSummary) -> Result<Evidence, EngineError> {
    let workspace = ScopedWorkspace::new()?;
    let request = BackendRequest { proposal: input.proposal, timeout_seconds: input.timeout_seconds };
    let candidate = input.backend.run(&request, &workspace)?;

    let candidate_path = input.output_dir.join("candidate.json");
    write_json_atomic(&candidate_path, &candidate)?;
    summary.candidate_path = Some(candidate_path.display().to_string());
    summary.toolchain = Some(candidate.toolchain.clone());
    Ok(candidate)
}

fn regress(
    input: &OrchestratorInput<'_>,
    summary: &mut RunSummary,
    candidate: &Evidence,
) -> Result<(), EngineError> {
    let Some(baseline_index) = input.baseline_index else {
        return Err(EngineError::Constraint(
            "regress requested but no baseline index was provided".to_string(),
        ));
    };
    let baseline_path = match baseline_index.resolve_path(
        input.baseline_index_dir,
        &input.proposal.backend,
        &input.proposal.model_script,
    ) {
        Ok(path) => path,
        Err(gateforge_config::ConfigError::BaselineNotFound { .. }) => {
            summary.status = RunStatus::Fail;
            summary.fail_reasons.push("baseline_missing".to_string());
            return Ok(());
        }
        Err(other) => return Err(other.into()),
    };
    let baseline: Evidence = read_json(&baseline_path)?;
    summary.baseline_path = Some(baseline_path.display().to_string());

    let regression_summary = regression::compare(
        input.proposal,
        &baseline,
        candidate,
        input.policy,
        input.policy_path,
        input.runtime_threshold,
    );

    let regression_path = input.output_dir.join("regression.json");
    write_json_atomic(&regression_path, &regression_summary)?;
    summary.regression_path = Some(regression_path.display().to_string());

    summary.policy_decision = Some(regression_summary.decision);
    summary.policy_reasons = regression_summary.policy_reasons.clone();
    summary.required_human_checks =
        input.policy.required_human_checks_for(regression_summary.decision, input.proposal.risk_level);

    match regression_summary.decision {
        gateforge_core::Decision::Fail => {
            summary.status = RunStatus::Fail;
            summary.fail_reasons = regression_summary.reasons.clone();
        }
        gateforge_core::Decision::NeedsReview => summary.status = RunStatus::NeedsReview,
        gateforge_core::Decision::Pass => summary.status = RunStatus::Pass,
    }
    Ok(())
}

/// Derives a run's final status directly from candidate evidence when
/// `simulate` ran but `regress` was not requested: no baseline comparison,
/// no policy overlay, just the backend's own structural gate.
fn finalize_from_evidence(summary: &mut RunSummary, candidate: &Evidence) {
    match candidate.gate {
        Gate::Pass => summary.status = RunStatus::Pass,
        Gate::Fail => {
            summary.status = RunStatus::Fail;
            summary.fail_reasons.push(failure_reason(candidate.failure_type));
        }
    }
}

fn failure_reason(failure_type: FailureType) -> String {
    match failure_type {
        FailureType::None => "backend_gate_failed".to_string(),
        FailureType::Timeout => "candidate_timeout_detected".to_string(),
        FailureType::NanOrInf => "candidate_nan_or_inf_detected".to_string(),
        FailureType::NonZeroExit => "candidate_non_zero_exit".to_string(),
        FailureType::BackendUnavailable => "backend_unavailable".to_string(),
        FailureType::Other => "backend_failure_other".to_string(),
    }
}

/// Resolves `status=Unknown` to `Pass` when nothing failed it: a `check`-only
/// run (no `simulate`, no `regress`) that reached this point validated its
/// proposal and, if present, applied its change-set cleanly.
fn finalize(summary: &mut RunSummary) {
    if summary.status == RunStatus::Unknown {
        summary.status = RunStatus::Pass;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::collections::BTreeSet;

    use gateforge_backend::mock::MockBackend;
    use gateforge_config::BaselineIndex;
    use gateforge_config::BaselineIndexEntry;
    use gateforge_config::Policy;
    use gateforge_core::identifiers::ProposalId;
    use gateforge_core::model::proposal::Proposal;
    use gateforge_core::model::proposal::RequestedAction;
    use gateforge_core::model::run_summary::RunStatus;
    use gateforge_core::Decision;
    use gateforge_core::RiskLevel;

    use super::run;
    use super::OrchestratorInput;

    fn proposal(actions: &[RequestedAction]) -> Proposal {
        Proposal {
            proposal_id: ProposalId::new("p-1"),
            schema_version: "1".to_string(),
            backend: "mock".to_string(),
            model_script: "script.mo".to_string(),
            requested_actions: actions.iter().copied().collect::<BTreeSet<_>>(),
            risk_level: RiskLevel::Low,
            checkers: Vec::new(),
            checker_config: BTreeMap::new(),
            change_set: None,
            physical_invariants: Vec::new(),
        }
    }

    #[test]
    fn check_only_run_passes_without_touching_backend() {
        let dir = tempfile::tempdir().expect("tempdir");
        let proposal = proposal(&[RequestedAction::Check]);
        let backend = MockBackend;
        let policy = Policy::default();
        let baseline_index = BaselineIndex::default();
        let input = OrchestratorInput {
            proposal: &proposal,
            proposal_dir: dir.path(),
            backend: &backend,
            timeout_seconds: 30,
            baseline_index: Some(&baseline_index),
            baseline_index_dir: dir.path(),
            policy: &policy,
            policy_path: "policies/default.json",
            runtime_threshold: 0.2,
            output_dir: dir.path(),
            change_set_allowed_roots: &[],
            planner_guardrail: (gateforge_core::model::run_summary::GuardrailDecision::NotApplicable, Vec::new()),
        };
        let summary = run(&input).expect("run");
        assert_eq!(summary.status, RunStatus::Pass);
        assert!(summary.candidate_path.is_none());
    }

    #[test]
    fn simulate_and_regress_resolves_baseline_and_writes_artifacts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut proposal = proposal(&[RequestedAction::Simulate, RequestedAction::Regress]);
        proposal.checker_config.insert(
            "_runtime".to_string(),
            serde_json::json!({"mock_metrics": {"runtime_seconds": 1.0}}),
        );
        let backend = MockBackend;

        let baseline_path = dir.path().join("baseline.json");
        let baseline_request = super::BackendRequest { proposal: &proposal, timeout_seconds: 30 };
        let workspace = gateforge_backend::ScopedWorkspace::new().expect("workspace");
        let baseline_evidence =
            gateforge_backend::BackendAdapter::run(&backend, &baseline_request, &workspace).expect("baseline run");
        gateforge_core::io::write_json_atomic(&baseline_path, &baseline_evidence).expect("write baseline");

        let baseline_index = BaselineIndex {
            entries: vec![BaselineIndexEntry {
                backend: "mock".to_string(),
                model_script: "script.mo".to_string(),
                baseline_path: "baseline.json".to_string(),
            }],
        };
        let policy = Policy::default();
        let input = OrchestratorInput {
            proposal: &proposal,
            proposal_dir: dir.path(),
            backend: &backend,
            timeout_seconds: 30,
            baseline_index: Some(&baseline_index),
            baseline_index_dir: dir.path(),
            policy: &policy,
            policy_path: "policies/default.json",
            runtime_threshold: 0.2,
            output_dir: dir.path(),
            change_set_allowed_roots: &[],
            planner_guardrail: (gateforge_core::model::run_summary::GuardrailDecision::NotApplicable, Vec::new()),
        };
        let summary = run(&input).expect("run");
        assert_eq!(summary.status, RunStatus::Pass);
        assert_eq!(summary.policy_decision, Some(Decision::Pass));
        assert!(summary.candidate_path.is_some());
        assert!(summary.regression_path.is_some());
        assert!(summary.satisfies_status_invariant());
    }

    #[test]
    fn rejected_guardrail_fails_run_before_any_execution() {
        let dir = tempfile::tempdir().expect("tempdir");
        let proposal = proposal(&[RequestedAction::Simulate]);
        let backend = MockBackend;
        let policy = Policy::default();
        let baseline_index = BaselineIndex::default();
        let violation = gateforge_core::model::run_summary::GuardrailViolation {
            rule_id: "change_plan_confidence_below_min".to_string(),
            message: "too low".to_string(),
        };
        let input = OrchestratorInput {
            proposal: &proposal,
            proposal_dir: dir.path(),
            backend: &backend,
            timeout_seconds: 30,
            baseline_index: Some(&baseline_index),
            baseline_index_dir: dir.path(),
            policy: &policy,
            policy_path: "policies/default.json",
            runtime_threshold: 0.2,
            output_dir: dir.path(),
            change_set_allowed_roots: &[],
            planner_guardrail: (
                gateforge_core::model::run_summary::GuardrailDecision::Rejected,
                vec![violation],
            ),
        };
        let summary = run(&input).expect("run");
        assert_eq!(summary.status, RunStatus::Fail);
        assert_eq!(summary.fail_reasons, vec!["planner_guardrail_rejected".to_string()]);
        assert!(summary.candidate_path.is_none());
    }

    #[test]
    fn missing_baseline_fails_with_a_reason_instead_of_aborting() {
        let dir = tempfile::tempdir().expect("tempdir");
        let proposal = proposal(&[RequestedAction::Simulate, RequestedAction::Regress]);
        let backend = MockBackend;
        let policy = Policy::default();
        let baseline_index = BaselineIndex::default();
        let input = OrchestratorInput {
            proposal: &proposal,
            proposal_dir: dir.path(),
            backend: &backend,
            timeout_seconds: 30,
            baseline_index: Some(&baseline_index),
            baseline_index_dir: dir.path(),
            policy: &policy,
            policy_path: "policies/default.json",
            runtime_threshold: 0.2,
            output_dir: dir.path(),
            change_set_allowed_roots: &[],
            planner_guardrail: (gateforge_core::model::run_summary::GuardrailDecision::NotApplicable, Vec::new()),
        };
        let summary = run(&input).expect("run");
        assert_eq!(summary.status, RunStatus::Fail);
        assert_eq!(summary.fail_reasons, vec!["baseline_missing".to_string()]);
        assert!(summary.candidate_path.is_some());
        assert!(summary.regression_path.is_none());
    }
}
