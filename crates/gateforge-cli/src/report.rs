// crates/gateforge-cli/src/report.rs
// ============================================================================
// Module: Markdown Report Rendering
// Description: Pure functions turning a summary into a markdown string.
// Purpose: Back the `--report` flag on every command without making
//          markdown the source of truth for any decision.
// Dependencies: gateforge-core
// ============================================================================

//! ## Overview
//! Per §9's design note, markdown rendering is presentation only: each
//! function here is a pure `&T -> String` mapping with no side effects and
//! no influence on the JSON artifact a command writes. Tests assert against
//! the JSON artifacts, never against this module's output.

use gateforge_core::decision::Delta;
use gateforge_core::model::governance::GovernanceSnapshot;
use gateforge_core::model::promotion::PromotionDecision;
use gateforge_core::model::regression::RegressionSummary;
use gateforge_core::model::repair::RepairLoopSummary;
use gateforge_core::model::review::ReviewResolution;
use gateforge_core::model::run_summary::RunSummary;

fn delta_label(delta: Delta) -> &'static str {
    match delta {
        Delta::Improved => "improved",
        Delta::Unchanged => "unchanged",
        Delta::Worse => "worse",
    }
}

/// Renders a [`RunSummary`] as a markdown report.
#[must_use]
pub fn run_summary(summary: &RunSummary) -> String {
    let mut out = format!("# Run Summary: {}\n\n", summary.proposal_id);
    out.push_str(&format!("- status: `{}`\n", summary.status));
    if let Some(decision) = summary.policy_decision {
        out.push_str(&format!("- policy_decision: `{decision}`\n"));
    }
    render_list(&mut out, "fail_reasons", &summary.fail_reasons);
    render_list(&mut out, "policy_reasons", &summary.policy_reasons);
    render_list(&mut out, "required_human_checks", &summary.required_human_checks);
    out
}

/// Renders a [`RegressionSummary`] as a markdown report.
#[must_use]
pub fn regression_summary(summary: &RegressionSummary) -> String {
    let mut out = format!("# Regression Summary\n\n- decision: `{}`\n", summary.decision);
    render_list(&mut out, "reasons", &summary.reasons);
    render_list(&mut out, "policy_reasons", &summary.policy_reasons);
    if !summary.findings.is_empty() {
        out.push_str("\n## Findings\n\n");
        for finding in &summary.findings {
            out.push_str(&format!("- `{}`: {} ({})\n", finding.checker, finding.reason, finding.message));
        }
    }
    out
}

/// Renders a [`RepairLoopSummary`] as a markdown report.
#[must_use]
pub fn repair_loop_summary(summary: &RepairLoopSummary) -> String {
    let mut out = String::from("# Repair Loop Summary\n\n");
    out.push_str(&format!("- before: `{}`\n", summary.before.status));
    out.push_str(&format!("- after: `{}`\n", summary.after.status));
    out.push_str(&format!("- delta: `{}`\n", delta_label(summary.comparison.delta)));
    out.push_str(&format!("- retry_used: `{}`\n", summary.retry_used));
    out.push_str(&format!("- safety_guard_triggered: `{}`\n", summary.safety_guard_triggered));
    out.push_str(&format!("- attempts: {}\n", summary.attempts.len()));
    out
}

/// Renders a [`GovernanceSnapshot`] as a markdown report.
#[must_use]
pub fn governance_snapshot(snapshot: &GovernanceSnapshot) -> String {
    let mut out = format!("# Governance Snapshot\n\n- status: `{}`\n", snapshot.status);
    render_list(&mut out, "risks", &snapshot.risks);
    if let Some(trend) = &snapshot.trend {
        out.push_str(&format!("\n## Trend\n\n- transition: `{}`\n", trend.status_transition));
        render_list(&mut out, "new_risks", &trend.new_risks);
        render_list(&mut out, "resolved_risks", &trend.resolved_risks);
    }
    out
}

/// Renders a [`PromotionDecision`] as a markdown report.
#[must_use]
pub fn promotion_decision(decision: &PromotionDecision) -> String {
    let mut out = format!("# Promotion Decision\n\n- profile: `{}`\n", decision.profile);
    out.push_str(&format!("- decision: `{}`\n", decision.decision));
    out.push_str(&format!("- top_score_margin: {:.2}\n", decision.top_score_margin));
    out.push_str(&format!("- explanation_quality: {}\n", decision.explanation_quality.score));
    if let Some(reason) = &decision.constraint_reason {
        out.push_str(&format!("- constraint_reason: `{reason}`\n"));
    }
    out
}

/// Renders a [`ReviewResolution`] as a markdown report.
#[must_use]
pub fn review_resolution(resolution: &ReviewResolution) -> String {
    let mut out = format!("# Review Resolution\n\n- status: `{}`\n", resolution.status);
    render_list(&mut out, "reasons", &resolution.reasons);
    out
}

fn render_list(out: &mut String, label: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push_str(&format!("\n## {label}\n\n"));
    for item in items {
        out.push_str(&format!("- {item}\n"));
    }
}
