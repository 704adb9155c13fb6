// crates/gateforge-engine/src/repair.rs
// ============================================================================
// Module: Repair Loop
// Description: Constrained rerun attempt following a failing or NEEDS_REVIEW
//              run summary, with retry and safety guard, per §4.6.
// Dependencies: gateforge-backend, gateforge-config, gateforge-core
// ============================================================================

//! ## Overview
//! [`run_repair_loop`] drives one repair attempt chain: derive an intent from
//! the source run's reasons ([`crate::planner::rule_based_intent`], with the
//! invariant-triggered branch inserting `invariant_guard` into the effective
//! checker list), execute it through the run orchestrator under the given
//! strategy profile, compare before/after via [`Delta::from_transition`], and
//! apply the safety guard before deciding whether to retry with
//! [`crate::planner::conservative_retry_intent`]. A retry happens only when
//! the attempt still failed and `attempts_used < max_retries`; the safety
//! guard is terminal — once it forces `after.status=FAIL` the loop stops,
//! since retrying past a newly surfaced critical reason would just repeat
//! the same mistake under cover of a "still failing" status.

use std::path::Path;

use gateforge_backend::BackendAdapter;
use gateforge_config::BaselineIndex;
use gateforge_config::Policy;
use gateforge_core::decision::Decision;
use gateforge_core::decision::Delta;
use gateforge_core::model::proposal::Proposal;
use gateforge_core::model::repair::RepairAttempt;
use gateforge_core::model::repair::RepairComparison;
use gateforge_core::model::repair::RepairLoopSummary;
use gateforge_core::model::repair::RepairSnapshot;
use gateforge_core::model::run_summary::RunStatus;
use gateforge_core::model::run_summary::RunSummary;

use crate::error::EngineError;
use crate::orchestrator;
use crate::orchestrator::OrchestratorInput;
use crate::planner::conservative_retry_intent;
use crate::planner::rule_based_intent;
use crate::planner::Guardrails;
use crate::planner::Intent;

/// Inputs to one repair loop execution.
pub struct RepairInput<'a> {
    /// Reasons backing the source run's status, before any repair attempt.
    pub source_reasons: &'a [String],
    /// Decision the source run reached, before any repair attempt.
    pub source_status: Decision,
    /// The proposal the failing run was driven by.
    pub proposal: &'a Proposal,
    /// Directory the proposal document and its change-set are relative to.
    pub proposal_dir: &'a Path,
    /// Backend adapter used for each attempt's `simulate` step.
    pub backend: &'a dyn BackendAdapter,
    /// Wall-clock timeout handed to the backend.
    pub timeout_seconds: u64,
    /// Baseline index used to auto-resolve the comparison baseline.
    pub baseline_index: Option<&'a BaselineIndex>,
    /// Directory `baseline_index`'s relative paths are resolved against.
    pub baseline_index_dir: &'a Path,
    /// Policy overlay document applied under this strategy profile.
    pub policy: &'a Policy,
    /// Path to the policy document, recorded on each attempt's regression summary.
    pub policy_path: &'a str,
    /// Fractional runtime regression threshold.
    pub runtime_threshold: f64,
    /// Directory candidate/regression artifacts are written into.
    pub output_dir: &'a Path,
    /// Path roots the proposal's change-set is allowed to touch.
    pub change_set_allowed_roots: &'a [String],
    /// Guardrails validated against every planner-produced intent.
    pub guardrails: &'a Guardrails,
    /// Maximum number of retries beyond the first attempt.
    pub max_retries: u32,
    /// Prefix that, when matched by a newly surfaced reason, trips the
    /// safety guard.
    pub block_new_reason_prefix: Option<&'a str>,
    /// Configured "new critical reasons" set that also trips the safety
    /// guard when newly surfaced, independent of the prefix match.
    pub new_critical_reasons: &'a [String],
}

/// Runs the repair loop described by §4.6 to completion, returning the
/// before/after summary.
///
/// # Errors
///
/// Returns [`EngineError`] when any attempt's orchestrated run fails to
/// execute (artifact I/O, backend invocation, or change-set apply failure).
pub fn run_repair_loop(input: &RepairInput<'_>) -> Result<RepairLoopSummary, EngineError> {
    let before = RepairSnapshot {
        status: input.source_status,
        reasons: input.source_reasons.to_vec(),
    };
    let invariant_repair_applied = input
        .source_reasons
        .iter()
        .any(|reason| reason.starts_with("physical_invariant_"));

    let mut intent = rule_based_intent(input.proposal.proposal_id.as_str(), input.source_reasons);
    let mut attempts = Vec::new();
    let mut attempt_index = 0u32;

    let (after, safety_guard_triggered) = loop {
        let attempt_proposal = build_attempt_proposal(input.proposal, &intent, invariant_repair_applied);
        let (guardrail_decision, guardrail_violations) = input.guardrails.decide(&intent);

        let orchestrator_input = OrchestratorInput {
            proposal: &attempt_proposal,
            proposal_dir: input.proposal_dir,
            backend: input.backend,
            timeout_seconds: input.timeout_seconds,
            baseline_index: input.baseline_index,
            baseline_index_dir: input.baseline_index_dir,
            policy: input.policy,
            policy_path: input.policy_path,
            runtime_threshold: input.runtime_threshold,
            output_dir: input.output_dir,
            change_set_allowed_roots: input.change_set_allowed_roots,
            planner_guardrail: (guardrail_decision, guardrail_violations),
        };
        let run_summary = orchestrator::run(&orchestrator_input)?;

        let mut status = decision_of_run_summary(&run_summary);
        let mut reasons = reasons_of_run_summary(&run_summary);
        let newly_surfaced: Vec<String> = reasons
            .iter()
            .filter(|reason| !before.reasons.contains(reason))
            .filter(|reason| is_critical_new_reason(reason, input.block_new_reason_prefix, input.new_critical_reasons))
            .cloned()
            .collect();

        let guard_triggered = !newly_surfaced.is_empty();
        if guard_triggered {
            status = Decision::Fail;
            for reason in &newly_surfaced {
                reasons.push(format!("repair_safety_new_critical_reason:{reason}"));
            }
        }

        attempts.push(RepairAttempt {
            attempt_index,
            status,
            reasons: reasons.clone(),
            planner_backend: intent.intent.clone(),
        });

        let can_retry = !guard_triggered && status == Decision::Fail && attempt_index < input.max_retries;
        if !can_retry {
            break (RepairSnapshot { status, reasons }, guard_triggered);
        }

        intent = conservative_retry_intent(&intent);
        attempt_index += 1;
    };

    let retry_used = attempts.len() > 1;
    let retry_analysis = describe_retry_analysis(&attempts, input.max_retries, safety_guard_triggered);
    let comparison = RepairComparison {
        delta: Delta::from_transition(before.status, after.status),
    };

    Ok(RepairLoopSummary {
        before,
        after,
        attempts,
        retry_used,
        retry_analysis,
        comparison,
        safety_guard_triggered,
        invariant_repair_applied: Some(invariant_repair_applied),
    })
}

/// Merges a planner intent's overrides and invariant-repair checker
/// insertion onto a clone of the base proposal for one repair attempt.
fn build_attempt_proposal(base: &Proposal, intent: &Intent, invariant_repair_applied: bool) -> Proposal {
    let mut proposal = base.clone();
    for (key, value) in &intent.overrides {
        proposal.checker_config.insert(key.clone(), value.clone());
    }
    if invariant_repair_applied
        && !proposal.checkers.is_empty()
        && !proposal.checkers.iter().any(|c| c == "invariant_guard")
    {
        proposal.checkers.push("invariant_guard".to_string());
    }
    proposal
}

fn decision_of_run_summary(summary: &RunSummary) -> Decision {
    match summary.status {
        RunStatus::Pass => Decision::Pass,
        RunStatus::NeedsReview => Decision::NeedsReview,
        RunStatus::Fail | RunStatus::Unknown => Decision::Fail,
    }
}

/// A run summary's `fail_reasons` are authoritative on failure; otherwise the
/// policy overlay's own reasons (empty on a clean PASS) are carried through.
fn reasons_of_run_summary(summary: &RunSummary) -> Vec<String> {
    if !summary.fail_reasons.is_empty() {
        summary.fail_reasons.clone()
    } else {
        summary.policy_reasons.clone()
    }
}

fn is_critical_new_reason(reason: &str, block_prefix: Option<&str>, critical_set: &[String]) -> bool {
    let matches_prefix = block_prefix.is_some_and(|prefix| reason.starts_with(prefix));
    let matches_set = critical_set.iter().any(|critical| critical == reason);
    matches_prefix || matches_set
}

fn describe_retry_analysis(attempts: &[RepairAttempt], max_retries: u32, safety_guard_triggered: bool) -> String {
    if safety_guard_triggered {
        return format!(
            "safety guard triggered on attempt {}; no further retries attempted",
            attempts.len() - 1
        );
    }
    match attempts.last() {
        Some(last) if last.status == Decision::Fail && attempts.len() as u32 > max_retries => {
            format!("exhausted {max_retries} retries, still FAIL")
        }
        Some(last) if attempts.len() > 1 => {
            format!("retried until attempt {} reached {}", attempts.len() - 1, last.status)
        }
        _ => "no retry needed; first attempt was conclusive".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::collections::BTreeSet;

    use gateforge_backend::mock::MockBackend;
    use gateforge_config::BaselineIndex;
    use gateforge_config::Policy;
    use gateforge_core::decision::Decision;
    use gateforge_core::decision::RiskLevel;
    use gateforge_core::identifiers::ProposalId;
    use gateforge_core::model::proposal::Proposal;
    use gateforge_core::model::proposal::RequestedAction;

    use super::run_repair_loop;
    use super::RepairInput;
    use crate::planner::Guardrails;

    fn proposal() -> Proposal {
        Proposal {
            proposal_id: ProposalId::new("p-1"),
            schema_version: "1".to_string(),
            backend: "mock".to_string(),
            model_script: "s.mo".to_string(),
            requested_actions: BTreeSet::from([RequestedAction::Check]),
            risk_level: RiskLevel::Low,
            checkers: Vec::new(),
            checker_config: BTreeMap::new(),
            change_set: None,
            physical_invariants: Vec::new(),
        }
    }

    #[test]
    fn single_attempt_sufficient_when_first_run_passes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = MockBackend;
        let policy = Policy::default();
        let baseline_index = BaselineIndex::default();
        let guardrails = Guardrails::default();
        let source_reasons = vec!["runtime_regression:1.3s>1.0s".to_string()];
        let prop = proposal();
        let input = RepairInput {
            source_reasons: &source_reasons,
            source_status: Decision::Fail,
            proposal: &prop,
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
            guardrails: &guardrails,
            max_retries: 2,
            block_new_reason_prefix: None,
            new_critical_reasons: &[],
        };
        let summary = run_repair_loop(&input).expect("repair loop");
        assert_eq!(summary.attempts.len(), 1);
        assert_eq!(summary.after.status, Decision::Pass);
        assert!(summary.satisfies_invariants());
    }

    #[test]
    fn safety_guard_forces_fail_on_newly_surfaced_blocked_reason() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = MockBackend;
        // No critical_reasons configured: absent the safety guard, a lone
        // performance_regression_detected finding would resolve to
        // NEEDS_REVIEW under the policy overlay's catch-all rule.
        let policy = Policy::default();

        let mut prop = proposal();
        prop.requested_actions = BTreeSet::from([RequestedAction::Simulate, RequestedAction::Regress]);
        prop.checker_config.insert(
            "_runtime".to_string(),
            serde_json::json!({"mock_metrics": {"runtime_seconds": 1.6, "events": 16}}),
        );

        let baseline_path = dir.path().join("baseline.json");
        let baseline_backend = MockBackend;
        let baseline_proposal = proposal();
        let baseline_request =
            gateforge_backend::BackendRequest { proposal: &baseline_proposal, timeout_seconds: 30 };
        let workspace = gateforge_backend::ScopedWorkspace::new().expect("workspace");
        let baseline_evidence = gateforge_backend::BackendAdapter::run(&baseline_backend, &baseline_request, &workspace)
            .expect("baseline run");
        gateforge_core::io::write_json_atomic(&baseline_path, &baseline_evidence).expect("write baseline");

        let baseline_index = BaselineIndex {
            entries: vec![gateforge_config::BaselineIndexEntry {
                backend: "mock".to_string(),
                model_script: "s.mo".to_string(),
                baseline_path: "baseline.json".to_string(),
            }],
        };
        let guardrails = Guardrails::default();
        let source_reasons: Vec<String> = Vec::new();
        let input = RepairInput {
            source_reasons: &source_reasons,
            source_status: Decision::Fail,
            proposal: &prop,
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
            guardrails: &guardrails,
            max_retries: 3,
            block_new_reason_prefix: Some("performance_regression"),
            new_critical_reasons: &[],
        };
        let summary = run_repair_loop(&input).expect("repair loop");
        assert!(summary.safety_guard_triggered);
        assert_eq!(summary.after.status, Decision::Fail);
        assert!(summary
            .after
            .reasons
            .iter()
            .any(|r| r.starts_with("repair_safety_new_critical_reason:performance_regression")));
        // The guard is terminal: exactly one attempt was made, not a retry chain.
        assert_eq!(summary.attempts.len(), 1);
        assert!(summary.satisfies_invariants());
    }

    #[test]
    fn is_critical_new_reason_matches_prefix_or_explicit_set() {
        assert!(super::is_critical_new_reason("strict_x", Some("strict_"), &[]));
        assert!(super::is_critical_new_reason("custom", None, &["custom".to_string()]));
        assert!(!super::is_critical_new_reason("benign", Some("strict_"), &[]));
    }
}
