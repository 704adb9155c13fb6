// crates/gateforge-core/src/model/governance.rs
// ============================================================================
// Module: Governance Snapshot Model
// Description: Fused status across repair, review, and CI summaries, plus
//              the trend and history aggregates built on top of it.
// Dependencies: serde
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::decision::Decision;
use crate::time::Timestamp;

/// Key performance indicators derived from the inputs fused into a snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GovernanceKpis {
    /// Fraction of PASS-under-profile-A cases that were not PASS under
    /// profile B in the most recent repair compare.
    pub strict_downgrade_rate: Option<f64>,
    /// Fraction of NEEDS_REVIEW proposals ultimately resolved to PASS.
    pub review_recovery_rate: Option<f64>,
    /// Fraction of strict-profile runs that did not resolve PASS.
    pub strict_non_pass_rate: Option<f64>,
    /// Fraction of reviewed proposals resolved to PASS.
    pub approval_rate: Option<f64>,
    /// Fraction of reviewed proposals resolved to FAIL.
    pub fail_rate: Option<f64>,
    /// Relation label between the two compared strategies, when available.
    pub strategy_compare_relation: Option<String>,
    /// Profile recommended by the most recent profile compare, when available.
    pub recommended_profile: Option<String>,
}

impl GovernanceKpis {
    /// Looks up a KPI by its wire field name, for the promotion gate's
    /// configurable `require_kpi_floors` check.
    #[must_use]
    pub fn named(&self, name: &str) -> Option<f64> {
        match name {
            "strict_downgrade_rate" => self.strict_downgrade_rate,
            "review_recovery_rate" => self.review_recovery_rate,
            "strict_non_pass_rate" => self.strict_non_pass_rate,
            "approval_rate" => self.approval_rate,
            "fail_rate" => self.fail_rate,
            _ => None,
        }
    }
}

/// Trend versus a previous snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceTrend {
    /// Label describing the status movement, e.g. `"PASS_to_FAIL"`.
    pub status_transition: String,
    /// Per-KPI signed numeric delta (`current - previous`), by KPI name.
    pub kpi_delta: BTreeMap<String, f64>,
    /// Risks present now but absent from the previous snapshot.
    pub new_risks: Vec<String>,
    /// Risks present in the previous snapshot but absent now.
    pub resolved_risks: Vec<String>,
}

/// Outcome of one selected job in a CI matrix run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CiJobStatus {
    /// The job completed successfully.
    Pass,
    /// The job failed.
    Fail,
    /// The job was not selected for this governance pass.
    Skipped,
}

/// One job row in a CI matrix summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CiJob {
    /// Name of the job, e.g. a `(backend, model_script)` pairing.
    pub name: String,
    /// Outcome of this job.
    pub status: CiJobStatus,
}

/// Summary of a CI matrix run fused into a governance snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CiMatrixSummary {
    /// Jobs in the matrix, in declaration order.
    pub jobs: Vec<CiJob>,
}

impl CiMatrixSummary {
    /// Returns `FAIL` if any selected (non-skipped) job failed, else `PASS`,
    /// per §4.9's CI matrix status rule.
    #[must_use]
    pub fn status(&self) -> Decision {
        if self.jobs.iter().any(|job| job.status == CiJobStatus::Fail) {
            Decision::Fail
        } else {
            Decision::Pass
        }
    }

    /// Names of jobs that failed, in declaration order.
    #[must_use]
    pub fn failed_job_names(&self) -> Vec<String> {
        self.jobs
            .iter()
            .filter(|job| job.status == CiJobStatus::Fail)
            .map(|job| job.name.clone())
            .collect()
    }
}

/// Fused governance status across repair, review, and CI inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceSnapshot {
    /// Worst-of status across every fused input.
    pub status: Decision,
    /// Derived key performance indicators.
    pub kpis: GovernanceKpis,
    /// Order-stable set of risk labels surfaced by the fused inputs.
    pub risks: Vec<String>,
    /// Trend versus a previous snapshot, when one was provided.
    pub trend: Option<GovernanceTrend>,
}

/// Builds the order-stable risk list from a set of risk labels, preserving
/// first-seen order across the inputs that contributed them.
#[must_use]
pub fn order_stable_risks(seen_in_order: &[String]) -> Vec<String> {
    let mut unique = BTreeSet::new();
    let mut ordered = Vec::new();
    for risk in seen_in_order {
        if unique.insert(risk.clone()) {
            ordered.push(risk.clone());
        }
    }
    ordered
}

/// Computes the trend between a previous and current snapshot.
#[must_use]
pub fn compute_trend(previous: &GovernanceSnapshot, current: &GovernanceSnapshot) -> GovernanceTrend {
    let status_transition = format!("{}_to_{}", previous.status, current.status);
    let kpi_delta = kpi_delta(&previous.kpis, &current.kpis);
    let previous_risks: BTreeSet<&String> = previous.risks.iter().collect();
    let current_risks: BTreeSet<&String> = current.risks.iter().collect();
    let new_risks = current.risks.iter().filter(|r| !previous_risks.contains(r)).cloned().collect();
    let resolved_risks =
        previous.risks.iter().filter(|r| !current_risks.contains(r)).cloned().collect();
    GovernanceTrend {
        status_transition,
        kpi_delta,
        new_risks,
        resolved_risks,
    }
}

/// Computes per-KPI numeric deltas between two KPI sets, omitting KPIs
/// missing from either side.
fn kpi_delta(previous: &GovernanceKpis, current: &GovernanceKpis) -> BTreeMap<String, f64> {
    let mut deltas = BTreeMap::new();
    let pairs: [(&str, Option<f64>, Option<f64>); 5] = [
        ("strict_downgrade_rate", previous.strict_downgrade_rate, current.strict_downgrade_rate),
        ("review_recovery_rate", previous.review_recovery_rate, current.review_recovery_rate),
        ("strict_non_pass_rate", previous.strict_non_pass_rate, current.strict_non_pass_rate),
        ("approval_rate", previous.approval_rate, current.approval_rate),
        ("fail_rate", previous.fail_rate, current.fail_rate),
    ];
    for (name, prev, curr) in pairs {
        if let (Some(prev), Some(curr)) = (prev, curr) {
            deltas.insert(name.to_string(), curr - prev);
        }
    }
    deltas
}

/// Per-window aggregate of governance snapshot transitions, computed over
/// the last N entries of the history index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceHistoryWindow {
    /// Count of transitions whose status improved.
    pub better_count: u32,
    /// Count of transitions whose status worsened.
    pub worse_count: u32,
    /// Count of transitions whose status stayed the same.
    pub unchanged_count: u32,
    /// Status of the most recent snapshot in the window.
    pub latest_status: Decision,
    /// Set when the tail of the window is strictly monotonically worse for
    /// at least the configured worsening-streak alert threshold.
    pub worsening_streak_alert: bool,
}

/// One entry in the governance history index (`index.jsonl`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceHistoryEntry {
    /// Caller-supplied label for this snapshot, e.g. a build number.
    pub label: String,
    /// Time this entry was appended.
    pub timestamp: Timestamp,
    /// Status recorded for this entry.
    pub status: Decision,
}

/// Computes the last-N-window summary for a history index, including the
/// worsening-streak alert: the tail sequence is strictly monotonically
/// worse for at least `alert_threshold` consecutive entries.
#[must_use]
pub fn summarize_window(entries: &[GovernanceHistoryEntry], alert_threshold: usize) -> Option<GovernanceHistoryWindow> {
    let latest = entries.last()?;
    let mut better_count = 0;
    let mut worse_count = 0;
    let mut unchanged_count = 0;
    for pair in entries.windows(2) {
        let [previous, current] = pair else {
            continue;
        };
        match current.status.rank().cmp(&previous.status.rank()) {
            std::cmp::Ordering::Greater => better_count += 1,
            std::cmp::Ordering::Less => worse_count += 1,
            std::cmp::Ordering::Equal => unchanged_count += 1,
        }
    }
    let worsening_streak_alert = tail_worsening_streak(entries) >= alert_threshold;
    Some(GovernanceHistoryWindow {
        better_count,
        worse_count,
        unchanged_count,
        latest_status: latest.status,
        worsening_streak_alert,
    })
}

/// Counts the number of trailing entries forming a strictly monotonically
/// worsening streak, i.e. each entry's rank is strictly lower than the one
/// before it, reading from the end backward.
fn tail_worsening_streak(entries: &[GovernanceHistoryEntry]) -> usize {
    if entries.len() < 2 {
        return 0;
    }
    let mut streak = 1;
    for pair in entries.windows(2).rev() {
        let [previous, current] = pair else {
            break;
        };
        if current.status.rank() < previous.status.rank() {
            streak += 1;
        } else {
            break;
        }
    }
    if streak >= 2 { streak } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::order_stable_risks;
    use super::summarize_window;
    use super::CiJob;
    use super::CiJobStatus;
    use super::CiMatrixSummary;
    use super::GovernanceHistoryEntry;
    use crate::decision::Decision;
    use crate::time::Timestamp;

    #[test]
    fn ci_matrix_fails_when_any_selected_job_fails() {
        let matrix = CiMatrixSummary {
            jobs: vec![
                CiJob { name: "mock/a.mo".to_string(), status: CiJobStatus::Pass },
                CiJob { name: "mock/b.mo".to_string(), status: CiJobStatus::Fail },
                CiJob { name: "mock/c.mo".to_string(), status: CiJobStatus::Skipped },
            ],
        };
        assert_eq!(matrix.status(), Decision::Fail);
        assert_eq!(matrix.failed_job_names(), vec!["mock/b.mo".to_string()]);
    }

    #[test]
    fn ci_matrix_passes_when_no_job_fails() {
        let matrix = CiMatrixSummary {
            jobs: vec![CiJob { name: "mock/a.mo".to_string(), status: CiJobStatus::Pass }],
        };
        assert_eq!(matrix.status(), Decision::Pass);
    }

    #[test]
    fn order_stable_risks_preserves_first_seen_order_and_dedups() {
        let risks = order_stable_risks(&["b".to_string(), "a".to_string(), "b".to_string()]);
        assert_eq!(risks, vec!["b".to_string(), "a".to_string()]);
    }

    fn entry(status: Decision) -> GovernanceHistoryEntry {
        GovernanceHistoryEntry {
            label: "build".to_string(),
            timestamp: Timestamp::from_unix_seconds(0),
            status,
        }
    }

    #[test]
    fn three_entry_worsening_streak_triggers_default_threshold() {
        let entries = vec![entry(Decision::Pass), entry(Decision::NeedsReview), entry(Decision::Fail)];
        let window = summarize_window(&entries, 3).expect("window");
        assert!(window.worsening_streak_alert);
    }

    #[test]
    fn improving_tail_does_not_trigger_alert() {
        let entries = vec![entry(Decision::Fail), entry(Decision::Pass)];
        let window = summarize_window(&entries, 3).expect("window");
        assert!(!window.worsening_streak_alert);
        assert_eq!(window.better_count, 1);
    }
}
