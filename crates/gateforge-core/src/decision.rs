// crates/gateforge-core/src/decision.rs
// ============================================================================
// Module: GateForge Decision Vocabulary
// Description: The governance decision enum and the risk levels it is scored
//              against, shared by every artifact in the workspace.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! `Decision` carries the ordering `FAIL < NEEDS_REVIEW < PASS` used
//! throughout the policy overlay, the repair loop's before/after comparison,
//! and promotion scoring. Keeping the ordering on the type itself (via
//! `PartialOrd`/`Ord`) means every caller computing a "worst of" or a delta
//! gets the same total order for free.

use std::cmp::Ordering;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Governance outcome for a proposal, run, or snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// The change-set failed a structural gate, a checker, or policy rule.
    Fail,
    /// The change-set requires a human reviewer before it can be final.
    NeedsReview,
    /// The change-set passed every gate, checker, and policy rule.
    Pass,
}

impl Decision {
    /// Returns the ordinal rank used for ordering and deltas:
    /// `Fail=0 < NeedsReview=1 < Pass=2`.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Fail => 0,
            Self::NeedsReview => 1,
            Self::Pass => 2,
        }
    }

    /// Returns the worse (lower-ranked) of two decisions.
    #[must_use]
    pub fn worst_of(self, other: Self) -> Self {
        if self.rank() <= other.rank() { self } else { other }
    }
}

impl PartialOrd for Decision {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decision {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Fail => "FAIL",
            Self::NeedsReview => "NEEDS_REVIEW",
            Self::Pass => "PASS",
        };
        f.write_str(text)
    }
}

/// Declared risk level of a proposal, used to select policy overlay rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Low-risk change; least conservative policy rows apply.
    Low,
    /// Medium-risk change.
    Medium,
    /// High-risk change; most conservative policy rows apply.
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(text)
    }
}

/// Before/after movement of a decision across a repair attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delta {
    /// The decision's rank increased (moved toward PASS).
    Improved,
    /// The decision's rank stayed the same.
    Unchanged,
    /// The decision's rank decreased (moved toward FAIL).
    Worse,
}

impl Delta {
    /// Derives the delta from a before/after pair of decisions.
    #[must_use]
    pub fn from_transition(before: Decision, after: Decision) -> Self {
        match after.rank().cmp(&before.rank()) {
            Ordering::Greater => Self::Improved,
            Ordering::Equal => Self::Unchanged,
            Ordering::Less => Self::Worse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Decision;
    use super::Delta;

    #[test]
    fn fail_is_worse_than_needs_review_is_worse_than_pass() {
        assert!(Decision::Fail < Decision::NeedsReview);
        assert!(Decision::NeedsReview < Decision::Pass);
    }

    #[test]
    fn worst_of_picks_lower_rank() {
        assert_eq!(Decision::Fail.worst_of(Decision::Pass), Decision::Fail);
        assert_eq!(Decision::Pass.worst_of(Decision::NeedsReview), Decision::NeedsReview);
    }

    #[test]
    fn delta_reflects_rank_movement() {
        assert_eq!(Delta::from_transition(Decision::Fail, Decision::Pass), Delta::Improved);
        assert_eq!(Delta::from_transition(Decision::Pass, Decision::Fail), Delta::Worse);
        assert_eq!(
            Delta::from_transition(Decision::NeedsReview, Decision::NeedsReview),
            Delta::Unchanged
        );
    }
}
