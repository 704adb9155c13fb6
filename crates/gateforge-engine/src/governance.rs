// crates/gateforge-engine/src/governance.rs
// ============================================================================
// Module: Governance Aggregator
// Description: Fuses repair/review/CI inputs into a governance snapshot,
//              computes trend against a previous snapshot, and maintains the
//              JSONL history index, per §4.9.
// Dependencies: gateforge-core
// ============================================================================

//! ## Overview
//! [`build_snapshot`] is the single fusion point: it takes whichever repair
//! signal is on hand (a plain batch run or an A/B profile compare), the
//! review ledger's derived KPIs, and a CI matrix summary, and reduces them to
//! the worst-of [`Decision`] plus an order-stable risk list. [`append_history`]
//! and [`summarize_recent`] wrap the history index primitives already defined
//! on [`gateforge_core::model::governance`], matching the ledger's
//! append/read split in [`crate::review`].

use std::path::Path;

use gateforge_core::decision::Decision;
use gateforge_core::io::append_jsonl_line;
use gateforge_core::io::read_jsonl;
use gateforge_core::model::governance::compute_trend;
use gateforge_core::model::governance::order_stable_risks;
use gateforge_core::model::governance::summarize_window;
use gateforge_core::model::governance::CiMatrixSummary;
use gateforge_core::model::governance::GovernanceHistoryEntry;
use gateforge_core::model::governance::GovernanceHistoryWindow;
use gateforge_core::model::governance::GovernanceKpis;
use gateforge_core::model::governance::GovernanceSnapshot;
use gateforge_core::model::repair::ProfileCompareSummary;
use gateforge_core::model::repair::RepairBatchSummary;
use gateforge_core::time::Timestamp;

use crate::error::EngineError;
use crate::review::ReviewLedgerKpis;

/// Configurable rates the aggregator compares KPIs against to derive status.
#[derive(Debug, Clone)]
pub struct GovernanceThresholds {
    /// Maximum tolerated `strict_downgrade_rate` before repair status is FAIL.
    pub max_strict_downgrade_rate: f64,
    /// Maximum tolerated review ledger `fail_rate` before review status is FAIL.
    pub max_review_fail_rate: f64,
    /// Minimum required `review_recovery_rate` before review status drops to
    /// NEEDS_REVIEW.
    pub min_review_recovery_rate: f64,
}

impl Default for GovernanceThresholds {
    fn default() -> Self {
        Self {
            max_strict_downgrade_rate: 0.10,
            max_review_fail_rate: 0.20,
            min_review_recovery_rate: 0.50,
        }
    }
}

/// The repair-side signal fused into a snapshot: either a plain batch run or
/// an A/B profile compare (`orchestrate-compare`), per §4.9's input list.
#[derive(Debug, Clone)]
pub enum RepairSignal {
    /// A single repair batch run, with no comparison profile.
    Batch(RepairBatchSummary),
    /// A profile compare between two policy profiles.
    Compare(ProfileCompareSummary),
}

/// Every input fused into one governance snapshot.
pub struct GovernanceInputs<'a> {
    /// CI matrix summary for this pass.
    pub ci: &'a CiMatrixSummary,
    /// Repair batch or profile-compare summary.
    pub repair: &'a RepairSignal,
    /// Derived review ledger KPIs.
    pub review: &'a ReviewLedgerKpis,
    /// Invariant-repair profile compare summary, when invariant-triggered
    /// repairs ran as part of this pass.
    pub invariant_repair_compare: Option<&'a ProfileCompareSummary>,
    /// Thresholds used to derive repair/review status from their KPIs.
    pub thresholds: &'a GovernanceThresholds,
}

/// Builds a [`GovernanceSnapshot`] from `inputs`, deriving `status` as the
/// worst of the CI matrix status, the repair compare status, and the review
/// status, per §4.9.
#[must_use]
pub fn build_snapshot(inputs: &GovernanceInputs<'_>) -> GovernanceSnapshot {
    let mut risks_in_order = Vec::new();

    let ci_status = inputs.ci.status();
    for name in inputs.ci.failed_job_names() {
        risks_in_order.push(format!("ci_job_failed:{name}"));
    }

    let (repair_status, recommended_profile, strict_downgrade_rate) = repair_status(inputs.repair, inputs.thresholds, &mut risks_in_order);

    if let Some(invariant_compare) = inputs.invariant_repair_compare
        && invariant_compare.strict_downgrade_rate > inputs.thresholds.max_strict_downgrade_rate
    {
        risks_in_order.push("invariant_repair_strict_downgrade_rate_exceeded".to_string());
    }

    let review_status = review_status(inputs.review, inputs.thresholds, &mut risks_in_order);

    let status = ci_status.worst_of(repair_status).worst_of(review_status);

    let kpis = GovernanceKpis {
        strict_downgrade_rate,
        review_recovery_rate: Some(inputs.review.review_recovery_rate),
        strict_non_pass_rate: Some(inputs.review.strict_non_pass_rate),
        approval_rate: Some(inputs.review.approval_rate),
        fail_rate: Some(inputs.review.fail_rate),
        strategy_compare_relation: repair_relation(inputs.repair),
        recommended_profile,
    };

    GovernanceSnapshot {
        status,
        kpis,
        risks: order_stable_risks(&risks_in_order),
        trend: None,
    }
}

/// Attaches a trend computed against `previous` to an already-built
/// `current` snapshot.
#[must_use]
pub fn with_trend(current: GovernanceSnapshot, previous: &GovernanceSnapshot) -> GovernanceSnapshot {
    let trend = compute_trend(previous, &current);
    GovernanceSnapshot { trend: Some(trend), ..current }
}

fn repair_status(
    repair: &RepairSignal,
    thresholds: &GovernanceThresholds,
    risks_in_order: &mut Vec<String>,
) -> (Decision, Option<String>, Option<f64>) {
    match repair {
        RepairSignal::Batch(batch) => {
            let status = if batch.safety_block_count > 0 {
                risks_in_order.push("repair_safety_guard_triggered".to_string());
                Decision::Fail
            } else if batch.worse_count > 0 {
                risks_in_order.push("repair_cases_worsened".to_string());
                Decision::NeedsReview
            } else {
                Decision::Pass
            };
            (status, None, None)
        }
        RepairSignal::Compare(compare) => {
            let status = if compare.strict_downgrade_rate > thresholds.max_strict_downgrade_rate {
                risks_in_order.push("repair_strict_downgrade_rate_exceeded".to_string());
                Decision::Fail
            } else if compare.reason_distribution.delta_counts.values().any(|delta| *delta > 0) {
                risks_in_order.push("repair_failure_reason_distribution_regressed".to_string());
                Decision::NeedsReview
            } else {
                Decision::Pass
            };
            (status, Some(compare.recommended_profile.clone()), Some(compare.strict_downgrade_rate))
        }
    }
}

fn repair_relation(repair: &RepairSignal) -> Option<String> {
    match repair {
        RepairSignal::Batch(_) => None,
        RepairSignal::Compare(compare) => {
            Some(if compare.strict_downgrade_rate > 0.0 { "a_stricter_than_b".to_string() } else { "comparable".to_string() })
        }
    }
}

fn review_status(
    review: &ReviewLedgerKpis,
    thresholds: &GovernanceThresholds,
    risks_in_order: &mut Vec<String>,
) -> Decision {
    if review.total_records > 0 && review.fail_rate > thresholds.max_review_fail_rate {
        risks_in_order.push("review_fail_rate_exceeded".to_string());
        return Decision::Fail;
    }
    if review.total_records > 0 && review.review_recovery_rate < thresholds.min_review_recovery_rate {
        risks_in_order.push("review_recovery_rate_below_threshold".to_string());
        return Decision::NeedsReview;
    }
    Decision::Pass
}

/// Appends one entry to the governance history index at `path`.
///
/// # Errors
///
/// Returns [`EngineError::Core`] when the append fails.
pub fn append_history(path: &Path, label: String, status: Decision) -> Result<(), EngineError> {
    let entry = GovernanceHistoryEntry { label, timestamp: Timestamp::now(), status };
    append_jsonl_line(path, &entry)?;
    Ok(())
}

/// Reads the history index at `path`, returning an empty vector when it does
/// not yet exist.
///
/// # Errors
///
/// Returns [`EngineError::Core`] when the file exists but cannot be opened.
pub fn read_history(path: &Path) -> Result<Vec<GovernanceHistoryEntry>, EngineError> {
    Ok(read_jsonl(path)?)
}

/// Computes the last-`window_size` transition summary over the history index
/// at `path`, per §4.9.
///
/// # Errors
///
/// Returns [`EngineError::Core`] when the file exists but cannot be opened.
pub fn last_n_summary(
    path: &Path,
    window_size: usize,
    alert_threshold: usize,
) -> Result<Option<GovernanceHistoryWindow>, EngineError> {
    let entries = read_history(path)?;
    let tail_start = entries.len().saturating_sub(window_size);
    Ok(summarize_window(&entries[tail_start ..], alert_threshold))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use gateforge_core::decision::Decision;
    use gateforge_core::model::governance::CiJob;
    use gateforge_core::model::governance::CiJobStatus;
    use gateforge_core::model::governance::CiMatrixSummary;
    use gateforge_core::model::repair::ReasonDistribution;
    use gateforge_core::model::repair::RepairBatchSummary;

    use super::append_history;
    use super::build_snapshot;
    use super::last_n_summary;
    use super::GovernanceInputs;
    use super::GovernanceThresholds;
    use super::RepairSignal;
    use crate::review::ReviewLedgerKpis;

    fn empty_review_kpis() -> ReviewLedgerKpis {
        ReviewLedgerKpis {
            total_records: 0,
            approval_rate: 0.0,
            fail_rate: 0.0,
            risk_status_counts: BTreeMap::new(),
            last_7_days_volume: vec![0; 7],
            avg_resolution_seconds: 0.0,
            p95_resolution_seconds: 0.0,
            sla_breach_rate: 0.0,
            guardrail_fail_rate: 0.0,
            review_recovery_rate: 1.0,
            strict_non_pass_rate: 0.0,
            guardrail_rule_id_counts: BTreeMap::new(),
            policy_profile_counts: BTreeMap::new(),
        }
    }

    fn passing_batch() -> RepairBatchSummary {
        RepairBatchSummary {
            pack_id: "pack-1".to_string(),
            cases: Vec::new(),
            improved_count: 0,
            worse_count: 0,
            unchanged_count: 0,
            safety_block_count: 0,
        }
    }

    #[test]
    fn all_green_inputs_yield_pass_with_no_risks() {
        let ci = CiMatrixSummary { jobs: vec![CiJob { name: "a".to_string(), status: CiJobStatus::Pass }] };
        let repair = RepairSignal::Batch(passing_batch());
        let review = empty_review_kpis();
        let thresholds = GovernanceThresholds::default();
        let inputs = GovernanceInputs { ci: &ci, repair: &repair, review: &review, invariant_repair_compare: None, thresholds: &thresholds };
        let snapshot = build_snapshot(&inputs);
        assert_eq!(snapshot.status, Decision::Pass);
        assert!(snapshot.risks.is_empty());
    }

    #[test]
    fn failed_ci_job_forces_fail_status_with_risk() {
        let ci = CiMatrixSummary {
            jobs: vec![CiJob { name: "mock/a.mo".to_string(), status: CiJobStatus::Fail }],
        };
        let repair = RepairSignal::Batch(passing_batch());
        let review = empty_review_kpis();
        let thresholds = GovernanceThresholds::default();
        let inputs = GovernanceInputs { ci: &ci, repair: &repair, review: &review, invariant_repair_compare: None, thresholds: &thresholds };
        let snapshot = build_snapshot(&inputs);
        assert_eq!(snapshot.status, Decision::Fail);
        assert_eq!(snapshot.risks, vec!["ci_job_failed:mock/a.mo".to_string()]);
    }

    #[test]
    fn safety_guard_triggered_batch_forces_fail() {
        let ci = CiMatrixSummary::default();
        let mut batch = passing_batch();
        batch.safety_block_count = 1;
        let repair = RepairSignal::Batch(batch);
        let review = empty_review_kpis();
        let thresholds = GovernanceThresholds::default();
        let inputs = GovernanceInputs { ci: &ci, repair: &repair, review: &review, invariant_repair_compare: None, thresholds: &thresholds };
        let snapshot = build_snapshot(&inputs);
        assert_eq!(snapshot.status, Decision::Fail);
    }

    #[test]
    fn low_review_recovery_rate_yields_needs_review() {
        let ci = CiMatrixSummary::default();
        let repair = RepairSignal::Batch(passing_batch());
        let mut review = empty_review_kpis();
        review.total_records = 5;
        review.review_recovery_rate = 0.1;
        let thresholds = GovernanceThresholds::default();
        let inputs = GovernanceInputs { ci: &ci, repair: &repair, review: &review, invariant_repair_compare: None, thresholds: &thresholds };
        let snapshot = build_snapshot(&inputs);
        assert_eq!(snapshot.status, Decision::NeedsReview);
    }

    #[test]
    fn history_window_reports_worsening_streak() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("index.jsonl");
        append_history(&path, "build-1".to_string(), Decision::Pass).expect("append 1");
        append_history(&path, "build-2".to_string(), Decision::NeedsReview).expect("append 2");
        append_history(&path, "build-3".to_string(), Decision::Fail).expect("append 3");
        let window = last_n_summary(&path, 10, 3).expect("window").expect("non-empty");
        assert!(window.worsening_streak_alert);
        assert_eq!(window.latest_status, Decision::Fail);
    }

    #[test]
    fn reason_distribution_regression_without_downgrade_is_needs_review() {
        let ci = CiMatrixSummary::default();
        let compare = gateforge_core::model::repair::ProfileCompareSummary {
            profile_a: "a".to_string(),
            profile_b: "b".to_string(),
            strict_downgrade_rate: 0.0,
            reason_distribution: ReasonDistribution {
                counts_a: BTreeMap::new(),
                counts_b: BTreeMap::from([("nan_or_inf_detected".to_string(), 2)]),
                delta_counts: BTreeMap::from([("nan_or_inf_detected".to_string(), 2)]),
            },
            recommended_profile: "a".to_string(),
        };
        let repair = RepairSignal::Compare(compare);
        let review = empty_review_kpis();
        let thresholds = GovernanceThresholds::default();
        let inputs = GovernanceInputs { ci: &ci, repair: &repair, review: &review, invariant_repair_compare: None, thresholds: &thresholds };
        let snapshot = build_snapshot(&inputs);
        assert_eq!(snapshot.status, Decision::NeedsReview);
        assert_eq!(snapshot.kpis.recommended_profile, Some("a".to_string()));
    }
}
