// crates/gateforge-core/src/model/apply.rs
// ============================================================================
// Module: Apply Record Model
// Description: The deterministic promote/hold/block mapping and its audit
//              log row.
// Dependencies: serde
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::decision::Decision;
use crate::time::Timestamp;

/// Action taken against a promotion decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyAction {
    /// The winning profile's change-set is promoted.
    Promote,
    /// The decision is held pending a review ticket.
    HoldForReview,
    /// The decision is blocked outright.
    Block,
}

/// Deterministic mapping from a promotion decision to an apply action and
/// final status, per §4.10.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyRecord {
    /// Final status after applying strict guards.
    pub final_status: Decision,
    /// Action taken against the promotion decision.
    pub apply_action: ApplyAction,
    /// Review ticket identifier, required when `final_status=NeedsReview`.
    pub review_ticket_id: Option<String>,
    /// Whether `--require-ranking-explanation` was set for this apply.
    pub require_ranking_explanation: Option<bool>,
    /// Minimum top-score margin required, when `--require-min-top-score-margin`
    /// was set.
    pub require_min_top_score_margin: Option<f64>,
    /// Minimum explanation quality required, when
    /// `--require-min-explanation-quality` was set.
    pub require_min_explanation_quality: Option<f64>,
    /// Selection-priority explanation carried through from the promotion
    /// decision, for audit purposes.
    pub ranking_selection_priority: Vec<String>,
    /// Best-vs-others explanation rows carried through from the promotion
    /// decision, for audit purposes.
    pub ranking_best_vs_others: Vec<String>,
    /// Reasons explaining `final_status` and `apply_action`.
    pub reasons: Vec<String>,
}

/// Inputs needed to compute an apply record's strict guards.
#[derive(Debug, Clone, Default)]
pub struct StrictGuardInputs {
    /// Set when `--require-ranking-explanation` was passed.
    pub require_ranking_explanation: bool,
    /// Whether a ranking explanation is actually present.
    pub has_ranking_explanation: bool,
    /// Minimum margin required, when `--require-min-top-score-margin` was
    /// passed.
    pub min_top_score_margin: Option<f64>,
    /// Actual top score margin from the promotion decision.
    pub top_score_margin: f64,
    /// Minimum explanation quality required, when
    /// `--require-min-explanation-quality` was passed.
    pub min_explanation_quality: Option<f64>,
    /// Actual explanation quality score from the promotion decision.
    pub explanation_quality: f64,
}

/// Evaluates the strict guard reasons from §4.10: each guard fails the apply
/// when its constraint is not met, appending the stated reason.
#[must_use]
pub fn strict_guard_reasons(inputs: &StrictGuardInputs) -> Vec<String> {
    let mut reasons = Vec::new();
    if inputs.require_ranking_explanation && !inputs.has_ranking_explanation {
        reasons.push("ranking_explanation_required".to_string());
    }
    if let Some(min) = inputs.min_top_score_margin
        && inputs.top_score_margin < min
    {
        reasons.push("top_score_margin_below_min".to_string());
    }
    if let Some(min) = inputs.min_explanation_quality
        && inputs.explanation_quality < min
    {
        reasons.push("explanation_quality_below_min".to_string());
    }
    reasons
}

/// Maps a winning decision and review ticket presence to an apply action and
/// final status, per §4.10's deterministic mapping.
#[must_use]
pub fn map_decision_to_apply(decision: Decision, review_ticket_id: Option<&str>) -> (ApplyAction, Decision, Vec<String>) {
    match decision {
        Decision::Pass => (ApplyAction::Promote, Decision::Pass, Vec::new()),
        Decision::NeedsReview => {
            if review_ticket_id.is_some() {
                (ApplyAction::HoldForReview, Decision::NeedsReview, Vec::new())
            } else {
                (ApplyAction::Block, Decision::Fail, vec!["needs_review_ticket_required".to_string()])
            }
        }
        Decision::Fail => (ApplyAction::Block, Decision::Fail, Vec::new()),
    }
}

/// One JSONL line appended to the decision audit log per `apply` invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionAuditLogRow {
    /// Identity of the caller that invoked `apply`.
    pub actor: String,
    /// Time this row was appended.
    pub timestamp: Timestamp,
    /// Name of the profile the apply decision was computed for.
    pub profile: String,
    /// The resulting apply record.
    pub record: ApplyRecord,
}

#[cfg(test)]
mod tests {
    use super::map_decision_to_apply;
    use super::strict_guard_reasons;
    use super::ApplyAction;
    use super::StrictGuardInputs;
    use crate::decision::Decision;

    #[test]
    fn pass_maps_to_promote() {
        let (action, status, reasons) = map_decision_to_apply(Decision::Pass, None);
        assert_eq!(action, ApplyAction::Promote);
        assert_eq!(status, Decision::Pass);
        assert!(reasons.is_empty());
    }

    #[test]
    fn needs_review_without_ticket_blocks_with_reason() {
        let (action, status, reasons) = map_decision_to_apply(Decision::NeedsReview, None);
        assert_eq!(action, ApplyAction::Block);
        assert_eq!(status, Decision::Fail);
        assert_eq!(reasons, vec!["needs_review_ticket_required".to_string()]);
    }

    #[test]
    fn needs_review_with_ticket_holds_for_review() {
        let (action, status, _) = map_decision_to_apply(Decision::NeedsReview, Some("TICKET-1"));
        assert_eq!(action, ApplyAction::HoldForReview);
        assert_eq!(status, Decision::NeedsReview);
    }

    #[test]
    fn margin_below_min_is_flagged() {
        let inputs = StrictGuardInputs {
            min_top_score_margin: Some(5.0),
            top_score_margin: 2.0,
            ..Default::default()
        };
        assert_eq!(strict_guard_reasons(&inputs), vec!["top_score_margin_below_min".to_string()]);
    }
}
