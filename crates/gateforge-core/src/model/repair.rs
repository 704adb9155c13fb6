// crates/gateforge-core/src/model/repair.rs
// ============================================================================
// Module: Repair Loop Summary Model
// Description: Before/after record of one repair loop execution, plus the
//              batch and profile-compare aggregates built on top of it.
// Dependencies: serde
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::decision::Decision;
use crate::decision::Delta;

/// Decision and reasons captured at one point in a repair loop (before the
/// first attempt, or after the final one).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairSnapshot {
    /// Decision at this point in the loop.
    pub status: Decision,
    /// Reasons backing `status` at this point in the loop.
    pub reasons: Vec<String>,
}

/// Comparison of before/after snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairComparison {
    /// Movement of `status` from before to after.
    pub delta: Delta,
}

/// One repair attempt's outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairAttempt {
    /// Zero-based attempt index within the loop.
    pub attempt_index: u32,
    /// Decision reached by this attempt.
    pub status: Decision,
    /// Reasons backing this attempt's decision.
    pub reasons: Vec<String>,
    /// Planner backend used for this attempt.
    pub planner_backend: String,
}

/// Result of one repair loop execution: a constrained rerun attempt
/// following a failing or NEEDS_REVIEW run summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairLoopSummary {
    /// Snapshot of the source run summary before any repair attempt.
    pub before: RepairSnapshot,
    /// Snapshot after the final repair attempt.
    pub after: RepairSnapshot,
    /// Every attempt made, in execution order.
    pub attempts: Vec<RepairAttempt>,
    /// Whether a retry beyond the first attempt was used.
    pub retry_used: bool,
    /// Free-form description of why a retry was or was not attempted.
    pub retry_analysis: String,
    /// Comparison of before vs after.
    pub comparison: RepairComparison,
    /// Whether the safety guard forced `after.status=FAIL`.
    pub safety_guard_triggered: bool,
    /// Whether this loop ran the invariant-triggered repair branch.
    pub invariant_repair_applied: Option<bool>,
}

impl RepairLoopSummary {
    /// Returns `true` when this summary satisfies the repair loop invariants
    /// from Testable Property 5: `safety_guard_triggered ⇒ after.status=FAIL`
    /// and at least one attempt was recorded.
    #[must_use]
    pub fn satisfies_invariants(&self) -> bool {
        let safety_guard_implies_fail = !self.safety_guard_triggered || self.after.status == Decision::Fail;
        safety_guard_implies_fail && !self.attempts.is_empty()
    }
}

/// Per-case outcome within a repair batch pack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairBatchCase {
    /// Case name as declared in the pack.
    pub name: String,
    /// Repair loop outcome for this case.
    pub summary: RepairLoopSummary,
}

/// Aggregate outcome of executing a repair batch pack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairBatchSummary {
    /// Identifier of the pack that was executed.
    pub pack_id: String,
    /// Per-case results, in pack declaration order regardless of execution
    /// order across the worker pool.
    pub cases: Vec<RepairBatchCase>,
    /// Count of cases whose delta was `improved`.
    pub improved_count: u32,
    /// Count of cases whose delta was `worse`.
    pub worse_count: u32,
    /// Count of cases whose delta was `unchanged`.
    pub unchanged_count: u32,
    /// Count of cases where the safety guard triggered.
    pub safety_block_count: u32,
}

/// Per-reason occurrence counts for one profile in a profile compare.
pub type ReasonCounts = std::collections::BTreeMap<String, u32>;

/// Result of running a repair batch pack under two policy profiles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileCompareSummary {
    /// First profile name, as declared on the command line.
    pub profile_a: String,
    /// Second profile name, as declared on the command line.
    pub profile_b: String,
    /// Fraction of cases that were PASS under `profile_a` but not under
    /// `profile_b`.
    pub strict_downgrade_rate: f64,
    /// Per-profile reason occurrence counts over the union of reasons seen.
    pub reason_distribution: ReasonDistribution,
    /// Profile recommended by the higher `(pass_count, -fail_count)` tuple.
    pub recommended_profile: String,
}

/// Reason occurrence counts for both profiles in a compare, plus their
/// deltas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonDistribution {
    /// Reason counts under `profile_a`.
    pub counts_a: ReasonCounts,
    /// Reason counts under `profile_b`.
    pub counts_b: ReasonCounts,
    /// Per-reason signed count delta, `counts_b - counts_a`.
    pub delta_counts: std::collections::BTreeMap<String, i64>,
}

#[cfg(test)]
mod tests {
    use super::RepairAttempt;
    use super::RepairComparison;
    use super::RepairLoopSummary;
    use super::RepairSnapshot;
    use crate::decision::Decision;
    use crate::decision::Delta;

    fn attempt(status: Decision) -> RepairAttempt {
        RepairAttempt {
            attempt_index: 0,
            status,
            reasons: Vec::new(),
            planner_backend: "rule".to_string(),
        }
    }

    #[test]
    fn safety_guard_without_fail_after_violates_invariant() {
        let summary = RepairLoopSummary {
            before: RepairSnapshot {
                status: Decision::Fail,
                reasons: Vec::new(),
            },
            after: RepairSnapshot {
                status: Decision::Pass,
                reasons: Vec::new(),
            },
            attempts: vec![attempt(Decision::Pass)],
            retry_used: false,
            retry_analysis: String::new(),
            comparison: RepairComparison {
                delta: Delta::Improved,
            },
            safety_guard_triggered: true,
            invariant_repair_applied: None,
        };
        assert!(!summary.satisfies_invariants());
    }

    #[test]
    fn summary_with_no_attempts_violates_invariant() {
        let summary = RepairLoopSummary {
            before: RepairSnapshot {
                status: Decision::Fail,
                reasons: Vec::new(),
            },
            after: RepairSnapshot {
                status: Decision::Fail,
                reasons: Vec::new(),
            },
            attempts: Vec::new(),
            retry_used: false,
            retry_analysis: String::new(),
            comparison: RepairComparison {
                delta: Delta::Unchanged,
            },
            safety_guard_triggered: false,
            invariant_repair_applied: None,
        };
        assert!(!summary.satisfies_invariants());
    }
}
