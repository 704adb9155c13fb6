// crates/gateforge-engine/src/promotion.rs
// ============================================================================
// Module: Promotion Chain
// Description: Scores candidate profiles against a governance snapshot and a
//              promotion gate, ranks them, and maps the winner onto an apply
//              action with strict guards and an audit log, per §4.10.
// Dependencies: gateforge-core
// ============================================================================

//! ## Overview
//! [`rank_profiles`] is the combined Promote + Compare step: each
//! [`PromotionCandidate`] is first checked against its own promotion gate
//! (`require_status`, `require_kpi_floors`, `require_no_risks`); a failed
//! gate forces that candidate's scoring decision to FAIL (so an unmet
//! constraint never wins the ranking by accident) while still recording the
//! specific `constraint_reason` on the winner if it is the one that failed.
//! [`promote`] layers an optional operator [`PromotionOverride`] on top.
//! [`apply`] maps the resulting [`PromotionDecision`] onto an
//! [`ApplyRecord`], evaluates the strict guards from §4.10, and appends one
//! row to the decision audit log — the promotion-chain analogue of
//! [`crate::review::resolve_and_append`].

use std::collections::BTreeMap;
use std::path::Path;

use gateforge_core::decision::Decision;
use gateforge_core::io::append_jsonl_line;
use gateforge_core::io::read_jsonl;
use gateforge_core::model::apply::map_decision_to_apply;
use gateforge_core::model::apply::strict_guard_reasons;
use gateforge_core::model::apply::ApplyAction;
use gateforge_core::model::apply::ApplyRecord;
use gateforge_core::model::apply::DecisionAuditLogRow;
use gateforge_core::model::apply::StrictGuardInputs;
use gateforge_core::model::governance::GovernanceSnapshot;
use gateforge_core::model::promotion::score_profile;
use gateforge_core::model::promotion::BestVsOthersRow;
use gateforge_core::model::promotion::DecisionExplanations;
use gateforge_core::model::promotion::ExplanationQuality;
use gateforge_core::model::promotion::OverrideApplied;
use gateforge_core::model::promotion::ProfileScoreInputs;
use gateforge_core::model::promotion::PromotionDecision;
use gateforge_core::time::Timestamp;

use crate::error::EngineError;

/// A promotion gate: requirements a governance snapshot must satisfy for its
/// profile to promote cleanly, per §4.10's `Promote` step.
#[derive(Debug, Clone, Default)]
pub struct PromotionProfile {
    /// Statuses the snapshot's `status` must be one of; empty means any.
    pub require_status: Vec<Decision>,
    /// Minimum values required for named KPIs (see [`GovernanceKpis::named`]).
    ///
    /// [`GovernanceKpis::named`]: gateforge_core::model::governance::GovernanceKpis::named
    pub require_kpi_floors: BTreeMap<String, f64>,
    /// Risk labels that must not appear in the snapshot's risk list.
    pub require_no_risks: Vec<String>,
    /// When set, a NEEDS_REVIEW status satisfies `require_status` even if
    /// NEEDS_REVIEW is not explicitly listed.
    pub allow_promote_even_if_needs_review: bool,
}

/// Evaluates `profile`'s gate against `snapshot`, returning the stable
/// constraint reason for the first unmet requirement, or `None` if every
/// requirement is satisfied.
#[must_use]
pub fn evaluate_gate(snapshot: &GovernanceSnapshot, profile: &PromotionProfile) -> Option<String> {
    let status_ok = profile.require_status.is_empty()
        || profile.require_status.contains(&snapshot.status)
        || (profile.allow_promote_even_if_needs_review && snapshot.status == Decision::NeedsReview);
    if !status_ok {
        return Some("required_status_not_met".to_string());
    }
    for (kpi_name, floor) in &profile.require_kpi_floors {
        match snapshot.kpis.named(kpi_name) {
            Some(value) if value < *floor => return Some(format!("kpi_floor_not_met:{kpi_name}")),
            Some(_) => {}
            None => return Some(format!("kpi_missing:{kpi_name}")),
        }
    }
    for risk in &profile.require_no_risks {
        if snapshot.risks.contains(risk) {
            return Some(format!("forbidden_risk_present:{risk}"));
        }
    }
    None
}

/// An operator override permitting promotion despite an unmet gate.
#[derive(Debug, Clone)]
pub struct PromotionOverride {
    /// Whether the override grants promotion.
    pub allow_promote: bool,
    /// Reason the override was granted.
    pub reason: String,
    /// Identity of the approver who granted the override.
    pub approver: String,
    /// Time after which the override is no longer honored.
    pub expiry: Timestamp,
}

impl PromotionOverride {
    fn is_active(&self, now: Timestamp) -> bool {
        self.allow_promote && now <= self.expiry
    }
}

/// One profile's snapshot, gate, and recorded process exit code, as declared
/// on the command line (declaration order drives tie-breaking and
/// `best_vs_others` ordering).
#[derive(Debug, Clone)]
pub struct PromotionCandidate {
    /// Profile name, as declared on the command line.
    pub profile: String,
    /// Governance snapshot evaluated under this profile.
    pub snapshot: GovernanceSnapshot,
    /// Promotion gate this profile's snapshot is checked against.
    pub gate: PromotionProfile,
    /// Process exit code this profile's evaluation produced.
    pub exit_code: i32,
}

struct Scored<'a> {
    candidate: &'a PromotionCandidate,
    decision: Decision,
    reasons: Vec<String>,
    constraint_reason: Option<String>,
    total_score: f64,
}

/// Ranks `candidates` per §4.10's scoring formula and tie-break order
/// (`total_score` → `decision` → `exit_code` → match on the snapshot's
/// `recommended_profile`), returning the winning profile's
/// [`PromotionDecision`].
///
/// # Panics
///
/// Never panics for a non-empty `candidates`; returns a degenerate decision
/// with an empty profile name if `candidates` is empty.
#[must_use]
pub fn rank_profiles(candidates: &[PromotionCandidate]) -> PromotionDecision {
    let recommended_profile =
        candidates.iter().find_map(|candidate| candidate.snapshot.kpis.recommended_profile.clone());

    let mut scored: Vec<Scored<'_>> = candidates
        .iter()
        .map(|candidate| {
            let constraint_reason = evaluate_gate(&candidate.snapshot, &candidate.gate);
            let decision = if constraint_reason.is_some() { Decision::Fail } else { candidate.snapshot.status };
            let reasons = match &constraint_reason {
                Some(reason) => vec![reason.clone()],
                None => candidate.snapshot.risks.clone(),
            };
            let inputs = ProfileScoreInputs {
                profile: candidate.profile.clone(),
                decision,
                exit_code: candidate.exit_code,
                reasons: reasons.clone(),
            };
            let total_score = score_profile(&inputs, recommended_profile.as_deref());
            Scored { candidate, decision, reasons, constraint_reason, total_score }
        })
        .collect();

    scored.sort_by(|a, b| {
        let key = |s: &Scored<'_>| {
            let is_recommended = recommended_profile.as_deref() == Some(s.candidate.profile.as_str());
            (s.total_score, s.decision, std::cmp::Reverse(s.exit_code), is_recommended)
        };
        key(b).partial_cmp(&key(a)).unwrap_or(std::cmp::Ordering::Equal)
    });

    if scored.is_empty() {
        return PromotionDecision {
            profile: String::new(),
            decision: Decision::Fail,
            constraint_reason: Some("no_candidates".to_string()),
            top_score_margin: 0.0,
            min_top_score_margin: None,
            recommended_profile,
            decision_explanations: DecisionExplanations::default(),
            explanation_quality: ExplanationQuality { score: 0, checks: BTreeMap::new() },
            override_applied: None,
        };
    }

    let winner = &scored[0];
    let second_score = scored.get(1).map_or(winner.total_score, |s| s.total_score);
    let top_score_margin = winner.total_score - second_score;

    let selection_priority = scored
        .get(1)
        .map(|runner_up| selection_priority_for(winner, runner_up, recommended_profile.as_deref()))
        .unwrap_or_default();

    let best_vs_others: Vec<BestVsOthersRow> = scored[1 ..]
        .iter()
        .map(|challenger| best_vs_others_row(winner, challenger, recommended_profile.as_deref()))
        .collect();

    let decision_explanations = DecisionExplanations { selection_priority, best_vs_others };
    let explanation_quality = score_explanation_quality(&decision_explanations, top_score_margin);

    PromotionDecision {
        profile: winner.candidate.profile.clone(),
        decision: winner.decision,
        constraint_reason: winner.constraint_reason.clone(),
        top_score_margin,
        min_top_score_margin: None,
        recommended_profile,
        decision_explanations,
        explanation_quality,
        override_applied: None,
    }
}

fn selection_priority_for(winner: &Scored<'_>, runner_up: &Scored<'_>, recommended: Option<&str>) -> Vec<String> {
    let mut priority = Vec::new();
    if (winner.total_score - runner_up.total_score).abs() > f64::EPSILON {
        priority.push("total_score".to_string());
        return priority;
    }
    priority.push("total_score".to_string());
    if winner.decision != runner_up.decision {
        priority.push("decision".to_string());
        return priority;
    }
    priority.push("decision".to_string());
    if winner.candidate.exit_code != runner_up.candidate.exit_code {
        priority.push("exit_code".to_string());
        return priority;
    }
    priority.push("exit_code".to_string());
    priority.push("recommended_profile_tiebreak".to_string());
    let _ = recommended;
    priority
}

fn best_vs_others_row(winner: &Scored<'_>, challenger: &Scored<'_>, recommended: Option<&str>) -> BestVsOthersRow {
    let score_margin = winner.total_score - challenger.total_score;
    let mut advantages = Vec::new();
    if winner.decision > challenger.decision {
        advantages.push(format!("higher_decision:{}>{}", winner.decision, challenger.decision));
    }
    if winner.candidate.exit_code < challenger.candidate.exit_code {
        advantages.push("lower_exit_code".to_string());
    }
    if winner.reasons.len() < challenger.reasons.len() {
        advantages.push("fewer_reasons".to_string());
    }
    if recommended == Some(winner.candidate.profile.as_str()) && recommended != Some(challenger.candidate.profile.as_str())
    {
        advantages.push("is_recommended_profile".to_string());
    }
    BestVsOthersRow {
        winner_profile: winner.candidate.profile.clone(),
        challenger_profile: challenger.candidate.profile.clone(),
        winner_total_score: winner.total_score,
        challenger_total_score: challenger.total_score,
        score_margin,
        tie_on_total_score: score_margin.abs() < f64::EPSILON,
        winner_advantages: advantages,
    }
}

fn score_explanation_quality(explanations: &DecisionExplanations, top_score_margin: f64) -> ExplanationQuality {
    let mut checks = BTreeMap::new();
    checks.insert("has_selection_priority".to_string(), !explanations.selection_priority.is_empty());
    checks.insert("has_best_vs_others_rows".to_string(), !explanations.best_vs_others.is_empty());
    checks.insert(
        "every_row_has_advantages".to_string(),
        explanations.best_vs_others.iter().all(|row| !row.winner_advantages.is_empty()),
    );
    checks.insert("margin_non_negative".to_string(), top_score_margin >= 0.0);

    let passed = checks.values().filter(|ok| **ok).count();
    let total = checks.len().max(1);
    #[allow(clippy::cast_possible_truncation, reason = "percentage is bounded to [0, 100]")]
    let score = ((passed as f64 / total as f64) * 100.0).round() as u8;
    ExplanationQuality { score, checks }
}

/// The combined Promote step: ranks `candidates` and layers `override_file`
/// on top when the winner's gate failed.
#[must_use]
pub fn promote(
    candidates: &[PromotionCandidate],
    override_file: Option<&PromotionOverride>,
    now: Timestamp,
) -> PromotionDecision {
    let mut decision = rank_profiles(candidates);
    if decision.constraint_reason.is_some()
        && let Some(override_file) = override_file
        && override_file.is_active(now)
    {
        decision.constraint_reason = None;
        decision.decision = Decision::Pass;
        decision.override_applied = Some(OverrideApplied {
            reason: override_file.reason.clone(),
            approver: override_file.approver.clone(),
            expiry: override_file.expiry,
        });
    }
    decision
}

/// Flags controlling the strict guards evaluated by [`apply`].
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Review ticket identifier, required for a NEEDS_REVIEW apply to hold.
    pub review_ticket_id: Option<String>,
    /// Whether `--require-ranking-explanation` was passed.
    pub require_ranking_explanation: bool,
    /// Minimum top-score margin required, when
    /// `--require-min-top-score-margin` was passed.
    pub min_top_score_margin: Option<f64>,
    /// Minimum explanation quality percentage required, when
    /// `--require-min-explanation-quality` was passed.
    pub min_explanation_quality: Option<f64>,
}

/// Maps `decision` onto an [`ApplyRecord`] per §4.10's deterministic mapping
/// and strict guards, then appends one row to the decision audit log at
/// `audit_log_path`.
///
/// # Errors
///
/// Returns [`EngineError::Core`] when the audit log append fails.
pub fn apply(
    decision: &PromotionDecision,
    options: &ApplyOptions,
    actor: &str,
    audit_log_path: &Path,
) -> Result<ApplyRecord, EngineError> {
    let (mut apply_action, mut final_status, mut reasons) =
        map_decision_to_apply(decision.decision, options.review_ticket_id.as_deref());
    if let Some(constraint_reason) = &decision.constraint_reason {
        reasons.insert(0, constraint_reason.clone());
    }

    let guard_inputs = StrictGuardInputs {
        require_ranking_explanation: options.require_ranking_explanation,
        has_ranking_explanation: !decision.decision_explanations.selection_priority.is_empty(),
        min_top_score_margin: options.min_top_score_margin,
        top_score_margin: decision.top_score_margin,
        min_explanation_quality: options.min_explanation_quality,
        explanation_quality: f64::from(decision.explanation_quality.score),
    };
    let guard_reasons = strict_guard_reasons(&guard_inputs);
    if !guard_reasons.is_empty() {
        reasons.extend(guard_reasons);
        final_status = Decision::Fail;
        apply_action = ApplyAction::Block;
    }

    let record = ApplyRecord {
        final_status,
        apply_action,
        review_ticket_id: options.review_ticket_id.clone(),
        require_ranking_explanation: Some(options.require_ranking_explanation),
        require_min_top_score_margin: options.min_top_score_margin,
        require_min_explanation_quality: options.min_explanation_quality,
        ranking_selection_priority: decision.decision_explanations.selection_priority.clone(),
        ranking_best_vs_others: decision
            .decision_explanations
            .best_vs_others
            .iter()
            .map(|row| format!("{} over {} (margin {:.2})", row.winner_profile, row.challenger_profile, row.score_margin))
            .collect(),
        reasons,
    };

    let row = DecisionAuditLogRow {
        actor: actor.to_string(),
        timestamp: Timestamp::now(),
        profile: decision.profile.clone(),
        record: record.clone(),
    };
    append_jsonl_line(audit_log_path, &row)?;
    Ok(record)
}

/// Reads every row of the decision audit log at `path`.
///
/// # Errors
///
/// Returns [`EngineError::Core`] when the file exists but cannot be opened.
pub fn read_audit_log(path: &Path) -> Result<Vec<DecisionAuditLogRow>, EngineError> {
    Ok(read_jsonl(path)?)
}
