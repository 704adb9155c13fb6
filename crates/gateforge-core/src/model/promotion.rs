// crates/gateforge-core/src/model/promotion.rs
// ============================================================================
// Module: Promotion Decision Model
// Description: Profile-scored promotion outcome, ranking explanations, and
//              the explanation-quality score derived from them.
// Dependencies: serde
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::decision::Decision;

/// One pairwise row in a promotion compare's ranking explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestVsOthersRow {
    /// Name of the winning profile.
    pub winner_profile: String,
    /// Name of the challenger profile.
    pub challenger_profile: String,
    /// Winner's total score.
    pub winner_total_score: f64,
    /// Challenger's total score.
    pub challenger_total_score: f64,
    /// `winner_total_score - challenger_total_score`.
    pub score_margin: f64,
    /// Whether the winner and challenger tied on total score.
    pub tie_on_total_score: bool,
    /// Human-readable advantages the winner held over the challenger.
    pub winner_advantages: Vec<String>,
}

/// Explanation of why the winning profile was selected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionExplanations {
    /// Ordered list of tie-break criteria actually used to separate the
    /// winner from the field, e.g. `["total_score", "decision"]`.
    pub selection_priority: Vec<String>,
    /// Pairwise comparison rows, winner vs every other profile.
    pub best_vs_others: Vec<BestVsOthersRow>,
}

/// Fraction of explanation completeness checks that passed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationQuality {
    /// Rounded percentage of checks that passed, in `[0, 100]`.
    pub score: u8,
    /// Individual check names mapped to whether they passed.
    pub checks: std::collections::BTreeMap<String, bool>,
}

/// An operator override permitting promotion despite unmet constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideApplied {
    /// Reason the override was granted.
    pub reason: String,
    /// Identity of the approver who granted the override.
    pub approver: String,
    /// Time after which the override is no longer honored.
    pub expiry: crate::time::Timestamp,
}

/// Outcome of scoring a profile against a governance snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionDecision {
    /// Name of the winning profile.
    pub profile: String,
    /// Governance decision carried by the winning profile's snapshot.
    pub decision: Decision,
    /// Reason a promotion constraint blocked this decision, if any.
    pub constraint_reason: Option<String>,
    /// Margin between the best and second-best total scores.
    pub top_score_margin: f64,
    /// Minimum margin required by `--require-min-top-score-margin`, if set.
    pub min_top_score_margin: Option<f64>,
    /// Profile the snapshot recommends; used as the final ranking tiebreak.
    pub recommended_profile: Option<String>,
    /// Explanation of how the winning profile was selected.
    pub decision_explanations: DecisionExplanations,
    /// Completeness score of the explanation.
    pub explanation_quality: ExplanationQuality,
    /// Operator override applied to bypass an unmet constraint, if any.
    pub override_applied: Option<OverrideApplied>,
}

/// Per-profile inputs to the compare scoring formula.
#[derive(Debug, Clone)]
pub struct ProfileScoreInputs {
    /// Profile name, in command-line declaration order.
    pub profile: String,
    /// Decision carried by this profile's snapshot.
    pub decision: Decision,
    /// Process exit code this profile's evaluation produced.
    pub exit_code: i32,
    /// Reasons attached to this profile's snapshot.
    pub reasons: Vec<String>,
}

/// Weight applied per reason in the `reasons_component` term.
const REASON_PENALTY_WEIGHT: f64 = 5.0;
/// Bonus applied when `exit_code == 0`.
const EXIT_ZERO_BONUS: f64 = 10.0;
/// Bonus applied when a profile matches the snapshot's recommended profile.
const RECOMMENDED_PROFILE_BONUS: f64 = 5.0;

/// Computes the total score for one profile per §4.10's formula:
/// `total_score = decision_component + exit_component + reasons_component +
/// recommended_component`.
#[must_use]
pub fn score_profile(inputs: &ProfileScoreInputs, recommended_profile: Option<&str>) -> f64 {
    let decision_component = match inputs.decision {
        Decision::Pass => 100.0,
        Decision::NeedsReview => 50.0,
        Decision::Fail => 0.0,
    };
    let exit_component = if inputs.exit_code == 0 { EXIT_ZERO_BONUS } else { 0.0 };
    #[allow(clippy::cast_precision_loss, reason = "reason counts are small integers")]
    let reasons_component = -REASON_PENALTY_WEIGHT * inputs.reasons.len() as f64;
    let recommended_component =
        if recommended_profile == Some(inputs.profile.as_str()) { RECOMMENDED_PROFILE_BONUS } else { 0.0 };
    decision_component + exit_component + reasons_component + recommended_component
}

#[cfg(test)]
mod tests {
    use super::score_profile;
    use super::ProfileScoreInputs;
    use crate::decision::Decision;

    #[test]
    fn pass_with_no_reasons_and_zero_exit_scores_highest() {
        let inputs = ProfileScoreInputs {
            profile: "default".to_string(),
            decision: Decision::Pass,
            exit_code: 0,
            reasons: Vec::new(),
        };
        assert_eq!(score_profile(&inputs, None), 110.0);
    }

    #[test]
    fn recommended_profile_adds_bonus() {
        let inputs = ProfileScoreInputs {
            profile: "default".to_string(),
            decision: Decision::Pass,
            exit_code: 0,
            reasons: Vec::new(),
        };
        assert_eq!(score_profile(&inputs, Some("default")), 115.0);
    }

    #[test]
    fn each_reason_subtracts_the_penalty_weight() {
        let inputs = ProfileScoreInputs {
            profile: "default".to_string(),
            decision: Decision::Pass,
            exit_code: 0,
            reasons: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(score_profile(&inputs, None), 100.0);
    }
}
