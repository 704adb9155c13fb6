// crates/gateforge-core/src/model/run_summary.rs
// ============================================================================
// Module: Run Summary Model
// Description: Top-level record produced by the proposal run orchestrator.
// Dependencies: serde
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::decision::Decision;
use crate::identifiers::ProposalId;
use crate::model::evidence::Toolchain;

/// Top-level status of a proposal-driven run. Distinct from [`Decision`]
/// because a run may end `Unknown` (cancelled) without ever reaching a
/// governance decision.
///
/// [`Decision`]: crate::decision::Decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// The run reached a PASS decision.
    Pass,
    /// The run reached a FAIL decision or aborted with an error.
    Fail,
    /// The run reached a NEEDS_REVIEW decision.
    NeedsReview,
    /// The run was cancelled, or ended before a decision could be reached.
    Unknown,
}

/// Outcome of applying the proposal's change-set, if one was attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeApplyStatus {
    /// No change-set was attached; the apply step was skipped.
    Skipped,
    /// The change-set applied successfully.
    Applied,
    /// The change-set failed to apply.
    Failed,
}

/// A single planner guardrail rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailViolation {
    /// Stable rule identifier, e.g. `"change_plan_confidence_below_min"`.
    pub rule_id: String,
    /// Human-readable detail for reviewers.
    pub message: String,
}

/// Outcome of validating a planner-produced change-plan against guardrails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailDecision {
    /// No change-plan was evaluated.
    NotApplicable,
    /// The change-plan satisfied every guardrail.
    Allowed,
    /// The change-plan violated at least one guardrail.
    Rejected,
}

/// Output of the proposal run orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Identifier of the proposal this run was driven by.
    pub proposal_id: ProposalId,
    /// Top-level run status.
    pub status: RunStatus,
    /// Governance decision from the policy overlay, when one was reached.
    pub policy_decision: Option<crate::decision::Decision>,
    /// Reasons contributed by the policy overlay step.
    pub policy_reasons: Vec<String>,
    /// Every reason that caused `status=FAIL`; non-empty iff `status=FAIL`.
    pub fail_reasons: Vec<String>,
    /// Human checks required before a NEEDS_REVIEW run can become final.
    pub required_human_checks: Vec<String>,
    /// Path to the candidate evidence artifact.
    pub candidate_path: Option<String>,
    /// Path to the baseline evidence artifact used for comparison.
    pub baseline_path: Option<String>,
    /// Path to the regression summary artifact.
    pub regression_path: Option<String>,
    /// Outcome of the change-set apply step.
    pub change_apply_status: ChangeApplyStatus,
    /// Stable hash of the applied change-set's ordered operation tuples.
    pub change_set_hash: Option<String>,
    /// Outcome of planner guardrail validation, when a change-plan was used.
    pub planner_guardrail_decision: GuardrailDecision,
    /// Guardrail violations, when `planner_guardrail_decision=rejected`.
    pub planner_guardrail_violations: Vec<GuardrailViolation>,
    /// Version and environment identifiers for the run's backend execution.
    pub toolchain: Option<Toolchain>,
}

impl RunSummary {
    /// Returns `true` when this summary satisfies Testable Property 2:
    /// `status=FAIL ⇔ fail_reasons ≠ ∅` and
    /// `status=NEEDS_REVIEW ⇒ required_human_checks ≠ ∅`.
    #[must_use]
    pub fn satisfies_status_invariant(&self) -> bool {
        let fail_matches = (self.status == RunStatus::Fail) == !self.fail_reasons.is_empty();
        let review_implies_checks =
            self.status != RunStatus::NeedsReview || !self.required_human_checks.is_empty();
        fail_matches && review_implies_checks
    }
}

#[cfg(test)]
mod tests {
    use super::ChangeApplyStatus;
    use super::GuardrailDecision;
    use super::RunStatus;
    use super::RunSummary;
    use crate::identifiers::ProposalId;

    fn base() -> RunSummary {
        RunSummary {
            proposal_id: ProposalId::new("p-1"),
            status: RunStatus::Pass,
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

    #[test]
    fn fail_status_requires_nonempty_fail_reasons() {
        let mut summary = base();
        summary.status = RunStatus::Fail;
        assert!(!summary.satisfies_status_invariant());
        summary.fail_reasons.push("x".to_string());
        assert!(summary.satisfies_status_invariant());
    }

    #[test]
    fn needs_review_status_requires_nonempty_required_checks() {
        let mut summary = base();
        summary.status = RunStatus::NeedsReview;
        assert!(!summary.satisfies_status_invariant());
        summary.required_human_checks.push("manual_review".to_string());
        assert!(summary.satisfies_status_invariant());
    }

    #[test]
    fn pass_status_with_no_reasons_is_valid() {
        assert!(base().satisfies_status_invariant());
    }
}
