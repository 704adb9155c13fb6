// crates/gateforge-core/src/model/ledger.rs
// ============================================================================
// Module: Ledger Record Model
// Description: One append-only JSONL line per review resolution.
// Dependencies: serde
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::decision::RiskLevel;
use crate::identifiers::ProposalId;
use crate::model::review::ResolvedStatus;
use crate::model::review::ReviewOutcome;
use crate::model::run_summary::GuardrailDecision;
use crate::time::Timestamp;

/// One JSONL line appended to the review ledger per resolved proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Identifier of the resolved proposal.
    pub proposal_id: ProposalId,
    /// Declared risk level of the proposal.
    pub risk_level: RiskLevel,
    /// Status before resolution (always NEEDS_REVIEW in practice).
    pub source_status: ResolvedStatus,
    /// Status after resolution.
    pub final_status: ResolvedStatus,
    /// Primary reviewer's identifier.
    pub reviewer: String,
    /// Second reviewer's identifier, when one was required.
    pub second_reviewer: Option<String>,
    /// The reviewer's decision.
    pub decision: ReviewOutcome,
    /// Time the run summary entered NEEDS_REVIEW.
    pub opened_at: Timestamp,
    /// Time this resolution was recorded.
    pub resolved_at: Timestamp,
    /// Whole seconds between `opened_at` and `resolved_at`.
    pub resolution_seconds: u64,
    /// Policy profile name applied to the originating run.
    pub policy_profile: Option<String>,
    /// Policy document version applied to the originating run.
    pub policy_version: Option<String>,
    /// Planner guardrail decision recorded on the originating run.
    pub planner_guardrail_decision: GuardrailDecision,
    /// `rule_id`s of planner guardrail violations on the originating run.
    pub planner_guardrail_rule_ids: Vec<String>,
}

impl LedgerRecord {
    /// Builds a record from a resolved review, computing `resolution_seconds`
    /// from the open/resolve timestamps.
    #[must_use]
    #[allow(
        clippy::too_many_arguments,
        reason = "mirrors the flat wire record; grouping would just be indirection"
    )]
    pub fn new(
        proposal_id: ProposalId,
        risk_level: RiskLevel,
        source_status: ResolvedStatus,
        final_status: ResolvedStatus,
        reviewer: String,
        second_reviewer: Option<String>,
        decision: ReviewOutcome,
        opened_at: Timestamp,
        resolved_at: Timestamp,
        policy_profile: Option<String>,
        policy_version: Option<String>,
        planner_guardrail_decision: GuardrailDecision,
        planner_guardrail_rule_ids: Vec<String>,
    ) -> Self {
        let resolution_seconds = resolved_at.saturating_diff_seconds(opened_at);
        Self {
            proposal_id,
            risk_level,
            source_status,
            final_status,
            reviewer,
            second_reviewer,
            decision,
            opened_at,
            resolved_at,
            resolution_seconds,
            policy_profile,
            policy_version,
            planner_guardrail_decision,
            planner_guardrail_rule_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LedgerRecord;
    use super::ResolvedStatus;
    use crate::decision::RiskLevel;
    use crate::identifiers::ProposalId;
    use crate::model::review::ReviewOutcome;
    use crate::model::run_summary::GuardrailDecision;
    use crate::time::Timestamp;

    #[test]
    fn resolution_seconds_is_computed_from_timestamps() {
        let record = LedgerRecord::new(
            ProposalId::new("p-1"),
            RiskLevel::Low,
            ResolvedStatus::NeedsReview,
            ResolvedStatus::Pass,
            "alice".to_string(),
            None,
            ReviewOutcome::Approve,
            Timestamp::from_unix_seconds(0),
            Timestamp::from_unix_seconds(120),
            None,
            None,
            GuardrailDecision::NotApplicable,
            Vec::new(),
        );
        assert_eq!(record.resolution_seconds, 120);
    }
}
