// crates/gateforge-core/src/model/regression.rs
// ============================================================================
// Module: Regression Summary Model
// Description: Structured comparison of candidate vs baseline evidence.
// Dependencies: serde, serde_json
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::decision::Decision;

/// A single checker finding: a reason emitted with its originating checker
/// and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Name of the checker that emitted this finding.
    pub checker: String,
    /// Stable reason string, e.g. `"performance_regression_detected"`.
    pub reason: String,
    /// Human-readable detail for reviewers.
    pub message: String,
}

/// Result of comparing candidate vs baseline evidence under a proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionSummary {
    /// Governance decision derived from `reasons`, `risk_level`, and policy.
    pub decision: Decision,
    /// Ordered, deduplicated reason strings, emitted in deterministic order:
    /// strict comparability, then structural gates, then checker findings,
    /// then policy overlay reasons.
    pub reasons: Vec<String>,
    /// Reasons contributed specifically by the policy overlay step.
    pub policy_reasons: Vec<String>,
    /// Structured findings from the checker suite.
    pub findings: Vec<Finding>,
    /// Effective checker list used for this comparison.
    pub checkers: Vec<String>,
    /// Effective per-checker configuration used for this comparison.
    pub checker_config: BTreeMap<String, Value>,
    /// Path to the policy document applied.
    pub policy_path: String,
    /// Version of the policy document applied.
    pub policy_version: String,
}

/// Appends `reason` to `reasons` unless it is already present, preserving
/// the first-occurrence-wins deduplication rule used throughout the
/// regression engine.
pub fn push_reason_once(reasons: &mut Vec<String>, reason: impl Into<String>) {
    let reason = reason.into();
    if !reasons.iter().any(|existing| existing == &reason) {
        reasons.push(reason);
    }
}

#[cfg(test)]
mod tests {
    use super::push_reason_once;

    #[test]
    fn duplicate_reasons_are_elided_by_first_occurrence() {
        let mut reasons = Vec::new();
        push_reason_once(&mut reasons, "a");
        push_reason_once(&mut reasons, "b");
        push_reason_once(&mut reasons, "a");
        assert_eq!(reasons, vec!["a".to_string(), "b".to_string()]);
    }
}
