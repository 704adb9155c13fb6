// crates/gateforge-engine/src/regression.rs
// ============================================================================
// Module: Regression Engine
// Description: Compares candidate evidence against a baseline under a
//              proposal's thresholds and policy, per §4.1.
// Purpose: Implement the regression algorithm as one deterministic pipeline
//          so every caller (the orchestrator, the repair loop, profile
//          compare) derives the exact same reasons and decision from the
//          same inputs.
// Dependencies: gateforge-core, gateforge-config
// ============================================================================

//! ## Overview
//! [`compare`] runs the five-step algorithm from §4.1 in order: (1) strict
//! comparability reasons, (2) structural gates, (3) the runtime ratio check,
//! (4) the checker suite ([`crate::checkers::run_all`]), (5) the policy
//! overlay ([`gateforge_config::Policy::overlay`]). Reasons are appended in
//! that emission order and deduplicated by first occurrence
//! ([`push_reason_once`]), which is what makes the resulting reason list a
//! deterministic function of its inputs (Testable Property 3).

use gateforge_config::Policy;
use gateforge_core::model::evidence::Evidence;
use gateforge_core::model::evidence::Gate;
use gateforge_core::model::evidence::RunStatus;
use gateforge_core::model::evidence::TriState;
use gateforge_core::model::proposal::Proposal;
use gateforge_core::model::proposal::RequestedAction;
use gateforge_core::model::regression::push_reason_once;
use gateforge_core::model::regression::RegressionSummary;

use crate::checkers;

const EPSILON: f64 = 1e-9;
/// Default allowed runtime growth ratio above baseline when a proposal does
/// not override it via `checker_config._runtime.runtime_threshold`.
pub const DEFAULT_RUNTIME_THRESHOLD: f64 = 0.20;

/// Compares `candidate` against `baseline` under `proposal`, applying
/// `policy` (already loaded for `proposal.risk_level`'s profile) to collapse
/// the resulting reasons into a [`RegressionSummary`].
///
/// `policy_path` and `policy_version` are carried through verbatim onto the
/// summary for audit purposes; `runtime_threshold` is the configured
/// fractional growth allowance (e.g. `0.20` for +20%).
#[must_use]
pub fn compare(
    proposal: &Proposal,
    baseline: &Evidence,
    candidate: &Evidence,
    policy: &Policy,
    policy_path: &str,
    runtime_threshold: f64,
) -> RegressionSummary {
    let mut reasons = Vec::new();

    // Step 1: strict comparability reasons.
    if baseline.schema_version != candidate.schema_version {
        push_reason_once(&mut reasons, "schema_version_mismatch");
    }
    if proposal.backend != candidate.backend || baseline.backend != candidate.backend {
        push_reason_once(&mut reasons, "backend_mismatch");
    }
    if proposal.model_script != candidate.model_script || baseline.model_script != candidate.model_script {
        push_reason_once(&mut reasons, "model_script_mismatch");
    }

    // Step 2: structural gates, in fixed order.
    if candidate.status != RunStatus::Success {
        push_reason_once(&mut reasons, "status_not_success");
    }
    if candidate.gate != Gate::Pass {
        push_reason_once(&mut reasons, "gate_not_pass");
    }
    if proposal.requested_actions.contains(&RequestedAction::Check) && candidate.check_ok == TriState::False {
        push_reason_once(&mut reasons, "check_regression");
    }
    if proposal.requested_actions.contains(&RequestedAction::Simulate)
        && candidate.simulate_ok == TriState::False
    {
        push_reason_once(&mut reasons, "simulate_regression");
    }

    // Step 3: runtime ratio.
    if let (Some(base_runtime), Some(cand_runtime)) =
        (baseline.metrics.runtime_seconds, candidate.metrics.runtime_seconds)
    {
        let allowed = base_runtime.max(EPSILON) * (1.0 + runtime_threshold);
        if cand_runtime > allowed {
            push_reason_once(
                &mut reasons,
                format!("runtime_regression:{cand_runtime:.3}s>{allowed:.3}s"),
            );
        }
    }

    // Step 4: checker suite.
    let active = checkers::effective_checkers(
        &proposal.checkers,
        proposal.checker_config.get("_runtime"),
    );
    let findings = checkers::run_all(
        &active,
        baseline,
        candidate,
        &proposal.checker_config,
        &proposal.physical_invariants,
    );
    for finding in &findings {
        push_reason_once(&mut reasons, finding.reason.clone());
    }

    // Step 5: policy overlay.
    let overlay = policy.overlay(&reasons, proposal.risk_level);

    RegressionSummary {
        decision: overlay.decision,
        reasons,
        policy_reasons: overlay.policy_reasons,
        findings,
        checkers: active.iter().map(|c| (*c).to_string()).collect(),
        checker_config: proposal.checker_config.clone(),
        policy_path: policy_path.to_string(),
        policy_version: policy.policy_version.clone(),
    }
}
