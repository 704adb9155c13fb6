// crates/gateforge-core/src/model/review.rs
// ============================================================================
// Module: Review Decision Model
// Description: A human reviewer's resolution of a NEEDS_REVIEW run summary.
// Dependencies: serde
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::ProposalId;
use crate::identifiers::ReviewId;
use crate::time::Timestamp;

/// A reviewer's resolution of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOutcome {
    /// The reviewer approved the proposal.
    Approve,
    /// The reviewer rejected the proposal.
    Reject,
}

/// A human reviewer's resolution of a NEEDS_REVIEW run summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewDecision {
    /// Identifier of this review resolution.
    pub review_id: ReviewId,
    /// Identifier of the proposal being resolved.
    pub proposal_id: ProposalId,
    /// Primary reviewer's identifier.
    pub reviewer: String,
    /// Second reviewer's identifier, required for high-risk approvals.
    pub second_reviewer: Option<String>,
    /// Second reviewer's decision, required for high-risk approvals.
    pub second_decision: Option<ReviewOutcome>,
    /// The primary reviewer's decision.
    pub decision: ReviewOutcome,
    /// Reviewer's rationale for the decision.
    pub rationale: String,
    /// Time the NEEDS_REVIEW run summary was produced.
    pub opened_at: Timestamp,
    /// Time this resolution was recorded.
    pub resolved_at: Timestamp,
    /// Whether every `required_human_checks` entry was confirmed.
    pub all_required_checks_completed: bool,
    /// The `required_human_checks` entries the reviewer confirmed.
    pub confirmed_checks: Vec<String>,
}

/// Outcome of resolving a NEEDS_REVIEW run summary with a review decision,
/// as decided by §4.8's join rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolvedStatus {
    /// The proposal resolved to PASS.
    Pass,
    /// The proposal resolved to FAIL.
    Fail,
    /// The proposal remains NEEDS_REVIEW, typically pending a second reviewer.
    NeedsReview,
}

/// Result of joining a review decision against the proposal's risk level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResolution {
    /// Final resolved status.
    pub status: ResolvedStatus,
    /// Reason codes explaining why `status` was reached, e.g.
    /// `"needs_second_reviewer"`.
    pub reasons: Vec<String>,
}

/// Resolves a review decision against the proposal's risk level, per §4.8:
/// approve ⇒ PASS unless the proposal is high-risk and the second decision
/// is not approve, in which case it stays NEEDS_REVIEW; reject ⇒ FAIL.
#[must_use]
pub fn resolve(decision: &ReviewDecision, is_high_risk: bool) -> ReviewResolution {
    match decision.decision {
        ReviewOutcome::Reject => ReviewResolution {
            status: ResolvedStatus::Fail,
            reasons: Vec::new(),
        },
        ReviewOutcome::Approve => {
            let second_approved = decision.second_decision == Some(ReviewOutcome::Approve);
            if is_high_risk && !second_approved {
                ReviewResolution {
                    status: ResolvedStatus::NeedsReview,
                    reasons: vec!["needs_second_reviewer".to_string()],
                }
            } else {
                ReviewResolution {
                    status: ResolvedStatus::Pass,
                    reasons: Vec::new(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::resolve;
    use super::ResolvedStatus;
    use super::ReviewDecision;
    use super::ReviewOutcome;
    use crate::identifiers::ProposalId;
    use crate::identifiers::ReviewId;
    use crate::time::Timestamp;

    fn base(decision: ReviewOutcome) -> ReviewDecision {
        ReviewDecision {
            review_id: ReviewId::new("rev-1"),
            proposal_id: ProposalId::new("p-1"),
            reviewer: "alice".to_string(),
            second_reviewer: None,
            second_decision: None,
            decision,
            rationale: String::new(),
            opened_at: Timestamp::from_unix_seconds(0),
            resolved_at: Timestamp::from_unix_seconds(10),
            all_required_checks_completed: true,
            confirmed_checks: Vec::new(),
        }
    }

    #[test]
    fn reject_always_resolves_to_fail() {
        let result = resolve(&base(ReviewOutcome::Reject), false);
        assert_eq!(result.status, ResolvedStatus::Fail);
    }

    #[test]
    fn low_risk_approve_resolves_to_pass_without_second_reviewer() {
        let result = resolve(&base(ReviewOutcome::Approve), false);
        assert_eq!(result.status, ResolvedStatus::Pass);
    }

    #[test]
    fn high_risk_approve_without_second_reviewer_stays_needs_review() {
        let result = resolve(&base(ReviewOutcome::Approve), true);
        assert_eq!(result.status, ResolvedStatus::NeedsReview);
        assert_eq!(result.reasons, vec!["needs_second_reviewer".to_string()]);
    }

    #[test]
    fn high_risk_approve_with_second_approval_resolves_to_pass() {
        let mut decision = base(ReviewOutcome::Approve);
        decision.second_reviewer = Some("bob".to_string());
        decision.second_decision = Some(ReviewOutcome::Approve);
        let result = resolve(&decision, true);
        assert_eq!(result.status, ResolvedStatus::Pass);
    }
}
