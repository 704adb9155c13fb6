// crates/gateforge-engine/src/review.rs
// ============================================================================
// Module: Review Resolution + Ledger
// Description: Joins a NEEDS_REVIEW run summary with a human review
//              decision, appends the resolution to the review ledger, and
//              derives ledger KPIs, per §4.8.
// Dependencies: gateforge-core
// ============================================================================

//! ## Overview
//! [`resolve_and_append`] is the single entry point every reviewing command
//! goes through: it joins a [`ReviewDecision`] against the proposal's risk
//! level using [`gateforge_core::model::review::resolve`], builds a
//! [`LedgerRecord`] from the join outcome, and appends it as one line to the
//! ledger via [`gateforge_core::io::append_jsonl_line`]. [`query`] reads the
//! ledger back, applies an optional [`LedgerFilter`], and [`derive_kpis`]
//! summarizes a record set the way a dashboard would.

use std::collections::BTreeMap;
use std::path::Path;

use gateforge_core::decision::RiskLevel;
use gateforge_core::identifiers::ProposalId;
use gateforge_core::io::append_jsonl_line;
use gateforge_core::io::read_jsonl;
use gateforge_core::model::ledger::LedgerRecord;
use gateforge_core::model::review::resolve;
use gateforge_core::model::review::ResolvedStatus;
use gateforge_core::model::review::ReviewDecision;
use gateforge_core::model::review::ReviewOutcome;
use gateforge_core::model::review::ReviewResolution;
use gateforge_core::model::run_summary::GuardrailDecision;
use gateforge_core::time::Timestamp;
use serde::Deserialize;
use serde::Serialize;

use crate::error::EngineError;

/// Inputs to one `review_resolve` call.
pub struct ReviewResolveInput<'a> {
    /// The reviewer's decision being resolved.
    pub decision: &'a ReviewDecision,
    /// Declared risk level of the proposal under review.
    pub risk_level: RiskLevel,
    /// Policy profile name applied to the originating run, if known.
    pub policy_profile: Option<String>,
    /// Policy document version applied to the originating run, if known.
    pub policy_version: Option<String>,
    /// Planner guardrail decision recorded on the originating run.
    pub planner_guardrail_decision: GuardrailDecision,
    /// `rule_id`s of planner guardrail violations on the originating run.
    pub planner_guardrail_rule_ids: Vec<String>,
    /// Path to the review ledger JSONL file.
    pub ledger_path: &'a Path,
}

/// Resolves `input.decision` per §4.8's join rules and appends the result to
/// the ledger at `input.ledger_path`.
///
/// # Errors
///
/// Returns [`EngineError::Core`] when the ledger append fails.
pub fn resolve_and_append(input: &ReviewResolveInput<'_>) -> Result<ReviewResolution, EngineError> {
    let is_high_risk = input.risk_level == RiskLevel::High;
    let resolution = resolve(input.decision, is_high_risk);

    let record = LedgerRecord::new(
        input.decision.proposal_id.clone(),
        input.risk_level,
        ResolvedStatus::NeedsReview,
        resolution.status,
        input.decision.reviewer.clone(),
        input.decision.second_reviewer.clone(),
        input.decision.decision,
        input.decision.opened_at,
        input.decision.resolved_at,
        input.policy_profile.clone(),
        input.policy_version.clone(),
        input.planner_guardrail_decision,
        input.planner_guardrail_rule_ids.clone(),
    );
    append_jsonl_line(input.ledger_path, &record)?;
    Ok(resolution)
}

/// A filter applied to the review ledger by [`query`].
#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    /// Restrict to records whose `final_status` matches.
    pub final_status: Option<ResolvedStatus>,
    /// Restrict to records whose `proposal_id` matches.
    pub proposal_id: Option<ProposalId>,
    /// Restrict to records resolved at or after this instant.
    pub since_utc: Option<Timestamp>,
}

impl LedgerFilter {
    fn matches(&self, record: &LedgerRecord) -> bool {
        if let Some(status) = self.final_status
            && record.final_status != status
        {
            return false;
        }
        if let Some(proposal_id) = &self.proposal_id
            && &record.proposal_id != proposal_id
        {
            return false;
        }
        if let Some(since) = self.since_utc
            && record.resolved_at < since
        {
            return false;
        }
        true
    }
}

/// Reads the ledger at `ledger_path`, returning only the records matching
/// `filter` (an empty default filter matches every record).
///
/// # Errors
///
/// Returns [`EngineError::Core`] when the ledger file exists but cannot be
/// opened.
pub fn query(ledger_path: &Path, filter: &LedgerFilter) -> Result<Vec<LedgerRecord>, EngineError> {
    let records: Vec<LedgerRecord> = read_jsonl(ledger_path)?;
    Ok(records.into_iter().filter(|record| filter.matches(record)).collect())
}

/// KPIs derived from a set of ledger records, per §4.8.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewLedgerKpis {
    /// Number of records the KPIs were derived from.
    pub total_records: usize,
    /// Fraction of records whose reviewer decision was approve.
    pub approval_rate: f64,
    /// Fraction of records whose `final_status` is FAIL.
    pub fail_rate: f64,
    /// Count of records by `(risk_level, final_status)`, keyed
    /// `"<risk>/<status>"`.
    pub risk_status_counts: BTreeMap<String, u32>,
    /// One count per day over the trailing 7 days ending on `now`, earliest
    /// first.
    pub last_7_days_volume: Vec<u32>,
    /// Average resolution latency, in seconds.
    pub avg_resolution_seconds: f64,
    /// 95th-percentile resolution latency, in seconds.
    pub p95_resolution_seconds: f64,
    /// Fraction of records whose resolution latency exceeded the configured
    /// SLA.
    pub sla_breach_rate: f64,
    /// Fraction of records whose originating run's planner guardrail
    /// decision was `rejected`.
    pub guardrail_fail_rate: f64,
    /// Fraction of approve decisions that resolved to PASS.
    pub review_recovery_rate: f64,
    /// Fraction of records whose `final_status` is not PASS.
    pub strict_non_pass_rate: f64,
    /// Occurrence counts of planner guardrail `rule_id`s across every
    /// record's originating run.
    pub guardrail_rule_id_counts: BTreeMap<String, u32>,
    /// Occurrence counts of policy profile names across every record.
    pub policy_profile_counts: BTreeMap<String, u32>,
}

/// Derives [`ReviewLedgerKpis`] from `records`, treating `sla_seconds` as the
/// configured SLA and `now` as the instant the trailing-7-day window ends.
#[must_use]
pub fn derive_kpis(records: &[LedgerRecord], sla_seconds: u64, now: Timestamp) -> ReviewLedgerKpis {
    let total_records = records.len();
    if total_records == 0 {
        return ReviewLedgerKpis {
            total_records: 0,
            approval_rate: 0.0,
            fail_rate: 0.0,
            risk_status_counts: BTreeMap::new(),
            last_7_days_volume: vec![0; 7],
            avg_resolution_seconds: 0.0,
            p95_resolution_seconds: 0.0,
            sla_breach_rate: 0.0,
            guardrail_fail_rate: 0.0,
            review_recovery_rate: 0.0,
            strict_non_pass_rate: 0.0,
            guardrail_rule_id_counts: BTreeMap::new(),
            policy_profile_counts: BTreeMap::new(),
        };
    }
    let total = total_records as f64;

    let approvals = records.iter().filter(|r| r.decision == ReviewOutcome::Approve).count();
    let fails = records.iter().filter(|r| r.final_status == ResolvedStatus::Fail).count();
    let non_pass = records.iter().filter(|r| r.final_status != ResolvedStatus::Pass).count();
    let guardrail_rejections =
        records.iter().filter(|r| r.planner_guardrail_decision == GuardrailDecision::Rejected).count();
    let approved_and_passed = records
        .iter()
        .filter(|r| r.decision == ReviewOutcome::Approve && r.final_status == ResolvedStatus::Pass)
        .count();
    let sla_breaches = records.iter().filter(|r| r.resolution_seconds > sla_seconds).count();

    let mut risk_status_counts = BTreeMap::new();
    for record in records {
        let key = format!("{}/{:?}", record.risk_level, record.final_status);
        *risk_status_counts.entry(key).or_insert(0u32) += 1;
    }

    let mut guardrail_rule_id_counts = BTreeMap::new();
    for record in records {
        for rule_id in &record.planner_guardrail_rule_ids {
            *guardrail_rule_id_counts.entry(rule_id.clone()).or_insert(0u32) += 1;
        }
    }

    let mut policy_profile_counts = BTreeMap::new();
    for record in records.iter().filter_map(|r| r.policy_profile.as_ref()) {
        *policy_profile_counts.entry(record.clone()).or_insert(0u32) += 1;
    }

    let mut latencies: Vec<u64> = records.iter().map(|r| r.resolution_seconds).collect();
    latencies.sort_unstable();
    let avg_resolution_seconds = latencies.iter().sum::<u64>() as f64 / total;
    let p95_resolution_seconds = percentile(&latencies, 0.95);

    let last_7_days_volume = volume_by_day(records, now);

    ReviewLedgerKpis {
        total_records,
        approval_rate: approvals as f64 / total,
        fail_rate: fails as f64 / total,
        risk_status_counts,
        last_7_days_volume,
        avg_resolution_seconds,
        p95_resolution_seconds,
        sla_breach_rate: sla_breaches as f64 / total,
        guardrail_fail_rate: guardrail_rejections as f64 / total,
        review_recovery_rate: if approvals == 0 { 0.0 } else { approved_and_passed as f64 / approvals as f64 },
        strict_non_pass_rate: non_pass as f64 / total,
        guardrail_rule_id_counts,
        policy_profile_counts,
    }
}

/// Nearest-rank percentile over an already-sorted slice.
fn percentile(sorted: &[u64], fraction: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = ((sorted.len() as f64) * fraction).ceil() as usize;
    let index = rank.saturating_sub(1).min(sorted.len() - 1);
    sorted[index] as f64
}

/// Counts records per day over the trailing 7 days ending on `now`'s day,
/// earliest first.
fn volume_by_day(records: &[LedgerRecord], now: Timestamp) -> Vec<u32> {
    const SECONDS_PER_DAY: u64 = 86_400;
    let mut counts = vec![0u32; 7];
    for record in records {
        let age_seconds = now.saturating_diff_seconds(record.resolved_at);
        let day_bucket = age_seconds / SECONDS_PER_DAY;
        if day_bucket < 7 {
            // index 0 = 7 days ago (earliest), index 6 = today (latest).
            let index = 6 - day_bucket as usize;
            counts[index] += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use gateforge_core::decision::RiskLevel;
    use gateforge_core::identifiers::ProposalId;
    use gateforge_core::identifiers::ReviewId;
    use gateforge_core::model::review::ReviewDecision;
    use gateforge_core::model::review::ReviewOutcome;
    use gateforge_core::model::run_summary::GuardrailDecision;
    use gateforge_core::time::Timestamp;

    use super::derive_kpis;
    use super::query;
    use super::resolve_and_append;
    use super::LedgerFilter;
    use super::ReviewResolveInput;

    fn decision(outcome: ReviewOutcome, proposal: &str) -> ReviewDecision {
        ReviewDecision {
            review_id: ReviewId::new(format!("rev-{proposal}")),
            proposal_id: ProposalId::new(proposal),
            reviewer: "alice".to_string(),
            second_reviewer: None,
            second_decision: None,
            decision: outcome,
            rationale: "looks fine".to_string(),
            opened_at: Timestamp::from_unix_seconds(0),
            resolved_at: Timestamp::from_unix_seconds(60),
            all_required_checks_completed: true,
            confirmed_checks: Vec::new(),
        }
    }

    #[test]
    fn resolve_and_append_writes_one_ledger_line_per_call() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ledger_path = dir.path().join("ledger.jsonl");

        let approve = decision(ReviewOutcome::Approve, "p-1");
        let input = ReviewResolveInput {
            decision: &approve,
            risk_level: RiskLevel::Low,
            policy_profile: Some("default".to_string()),
            policy_version: Some("1".to_string()),
            planner_guardrail_decision: GuardrailDecision::NotApplicable,
            planner_guardrail_rule_ids: Vec::new(),
            ledger_path: &ledger_path,
        };
        resolve_and_append(&input).expect("resolve 1");

        let reject = decision(ReviewOutcome::Reject, "p-2");
        let input = ReviewResolveInput { decision: &reject, ..input };
        resolve_and_append(&input).expect("resolve 2");

        let records = query(&ledger_path, &LedgerFilter::default()).expect("query");
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn query_filters_by_final_status_and_proposal_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ledger_path = dir.path().join("ledger.jsonl");

        for (proposal, outcome) in [("p-1", ReviewOutcome::Approve), ("p-2", ReviewOutcome::Reject)] {
            let decision = decision(outcome, proposal);
            let input = ReviewResolveInput {
                decision: &decision,
                risk_level: RiskLevel::Low,
                policy_profile: None,
                policy_version: None,
                planner_guardrail_decision: GuardrailDecision::NotApplicable,
                planner_guardrail_rule_ids: Vec::new(),
                ledger_path: &ledger_path,
            };
            resolve_and_append(&input).expect("resolve");
        }

        let filter = LedgerFilter {
            final_status: Some(gateforge_core::model::review::ResolvedStatus::Fail),
            ..LedgerFilter::default()
        };
        let failed = query(&ledger_path, &filter).expect("query");
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].proposal_id, ProposalId::new("p-2"));
    }

    #[test]
    fn kpis_compute_rates_over_a_small_ledger() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ledger_path = dir.path().join("ledger.jsonl");

        for (proposal, outcome) in
            [("p-1", ReviewOutcome::Approve), ("p-2", ReviewOutcome::Approve), ("p-3", ReviewOutcome::Reject)]
        {
            let decision = decision(outcome, proposal);
            let input = ReviewResolveInput {
                decision: &decision,
                risk_level: RiskLevel::Low,
                policy_profile: Some("default".to_string()),
                policy_version: Some("1".to_string()),
                planner_guardrail_decision: GuardrailDecision::NotApplicable,
                planner_guardrail_rule_ids: Vec::new(),
                ledger_path: &ledger_path,
            };
            resolve_and_append(&input).expect("resolve");
        }

        let records = query(&ledger_path, &LedgerFilter::default()).expect("query");
        let kpis = derive_kpis(&records, 3600, Timestamp::from_unix_seconds(60));
        assert_eq!(kpis.total_records, 3);
        assert!((kpis.approval_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!((kpis.fail_rate - 1.0 / 3.0).abs() < 1e-9);
        assert!((kpis.review_recovery_rate - 1.0).abs() < 1e-9);
        assert_eq!(kpis.last_7_days_volume.iter().sum::<u32>(), 3);
    }
}
