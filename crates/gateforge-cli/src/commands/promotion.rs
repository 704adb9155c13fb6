// crates/gateforge-cli/src/commands/promotion.rs
// ============================================================================
// Module: `promotion` Command
// Description: Ranks candidate profiles against governance snapshots,
//              optionally layers an operator override, and applies the
//              winning decision with strict guards and an audit log, per
//              §4.10.
// Dependencies: gateforge-core, gateforge-engine
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Subcommand;
use gateforge_core::decision::Decision;
use gateforge_core::model::governance::GovernanceSnapshot;
use gateforge_core::model::promotion::PromotionDecision;
use gateforge_core::time::Timestamp;
use gateforge_engine::promotion;
use gateforge_engine::promotion::ApplyOptions;
use gateforge_engine::promotion::PromotionCandidate;
use gateforge_engine::promotion::PromotionOverride;
use gateforge_engine::promotion::PromotionProfile;
use serde::Deserialize;

use super::emit_json;
use super::emit_report;
use super::read_json;
use crate::error::CliError;
use crate::report;

/// Subcommands under `promotion`.
#[derive(Subcommand, Debug)]
pub enum PromotionCommand {
    /// Ranks candidate profiles and returns the winning decision.
    Rank(RankArgs),
    /// Ranks candidate profiles, layering an operator override on top.
    Promote(PromoteArgs),
    /// Applies a promotion decision's strict guards and appends the audit log.
    Apply(ApplyArgs),
    /// Reads every row of the decision audit log.
    AuditLog(AuditLogArgs),
}

/// One promotion gate requirement, as read from a [`CandidateInput`]
/// document.
#[derive(Debug, Deserialize, Default)]
pub struct GateInput {
    /// Statuses the snapshot's `status` must be one of; empty means any.
    #[serde(default)]
    pub require_status: Vec<Decision>,
    /// Minimum values required for named KPIs.
    #[serde(default)]
    pub require_kpi_floors: std::collections::BTreeMap<String, f64>,
    /// Risk labels that must not appear in the snapshot's risk list.
    #[serde(default)]
    pub require_no_risks: Vec<String>,
    /// When set, a NEEDS_REVIEW status satisfies `require_status`.
    #[serde(default)]
    pub allow_promote_even_if_needs_review: bool,
}

impl From<GateInput> for PromotionProfile {
    fn from(gate: GateInput) -> Self {
        Self {
            require_status: gate.require_status,
            require_kpi_floors: gate.require_kpi_floors,
            require_no_risks: gate.require_no_risks,
            allow_promote_even_if_needs_review: gate.allow_promote_even_if_needs_review,
        }
    }
}

/// One candidate profile in a `promotion rank`/`promote` input document.
#[derive(Debug, Deserialize)]
pub struct CandidateInput {
    /// Profile name, as declared on the command line.
    pub profile: String,
    /// Governance snapshot evaluated under this profile.
    pub snapshot: GovernanceSnapshot,
    /// Promotion gate this profile's snapshot is checked against.
    #[serde(default)]
    pub gate: GateInput,
    /// Process exit code this profile's evaluation produced.
    #[serde(default)]
    pub exit_code: i32,
}

impl From<CandidateInput> for PromotionCandidate {
    fn from(candidate: CandidateInput) -> Self {
        Self {
            profile: candidate.profile,
            snapshot: candidate.snapshot,
            gate: candidate.gate.into(),
            exit_code: candidate.exit_code,
        }
    }
}

/// Input document for `promotion rank`/`promote`: the candidate profiles.
#[derive(Debug, Deserialize)]
pub struct RankInput {
    /// Candidate profiles, in command-line declaration order.
    pub candidates: Vec<CandidateInput>,
}

/// An operator override, as read from a `promotion promote` document.
#[derive(Debug, Deserialize)]
pub struct OverrideInput {
    /// Whether the override grants promotion.
    pub allow_promote: bool,
    /// Reason the override was granted.
    pub reason: String,
    /// Identity of the approver who granted the override.
    pub approver: String,
    /// RFC3339 instant after which the override is no longer honored.
    pub expiry: String,
}

/// Arguments for `promotion rank`.
#[derive(Args, Debug)]
pub struct RankArgs {
    /// Path to a [`RankInput`] document.
    #[arg(long = "in")]
    pub input: PathBuf,
    /// Write the Promotion Decision to this path in addition to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Write a markdown report to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Arguments for `promotion promote`.
#[derive(Args, Debug)]
pub struct PromoteArgs {
    /// Path to a [`RankInput`] document.
    #[arg(long = "in")]
    pub input: PathBuf,
    /// Path to an [`OverrideInput`] document, when an operator override is
    /// to be considered.
    #[arg(long)]
    pub r#override: Option<PathBuf>,
    /// Write the Promotion Decision to this path in addition to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Write a markdown report to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Arguments for `promotion apply`.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Path to a [`PromotionDecision`] document.
    #[arg(long = "in")]
    pub input: PathBuf,
    /// Review ticket identifier, required for a NEEDS_REVIEW apply to hold.
    #[arg(long)]
    pub review_ticket_id: Option<String>,
    /// Require a non-empty ranking selection-priority explanation.
    #[arg(long)]
    pub require_ranking_explanation: bool,
    /// Minimum top-score margin required.
    #[arg(long)]
    pub require_min_top_score_margin: Option<f64>,
    /// Minimum explanation-quality percentage required.
    #[arg(long)]
    pub require_min_explanation_quality: Option<f64>,
    /// Identity of the caller invoking this apply, recorded on the audit log.
    #[arg(long)]
    pub actor: String,
    /// Path to the decision audit log JSONL file.
    #[arg(long)]
    pub audit_log: PathBuf,
    /// Write the Apply Record to this path in addition to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Arguments for `promotion audit-log`.
#[derive(Args, Debug)]
pub struct AuditLogArgs {
    /// Path to the decision audit log JSONL file.
    #[arg(long)]
    pub audit_log: PathBuf,
    /// Write the rows to this path in addition to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

fn decision_exit_code_or_block(decision: Decision) -> gateforge_core::ExitCode {
    if decision == Decision::Pass {
        gateforge_core::ExitCode::Success
    } else {
        gateforge_core::ExitCode::LogicalFailure
    }
}

/// Dispatches a `promotion` subcommand.
///
/// # Errors
///
/// Returns [`CliError`] when an input document cannot be read or the audit
/// log cannot be appended to or read.
pub fn execute(command: &PromotionCommand) -> Result<ExitCode, CliError> {
    match command {
        PromotionCommand::Rank(args) => rank(args),
        PromotionCommand::Promote(args) => promote(args),
        PromotionCommand::Apply(args) => apply(args),
        PromotionCommand::AuditLog(args) => audit_log(args),
    }
}

fn load_candidates(path: &PathBuf) -> Result<Vec<PromotionCandidate>, CliError> {
    let input: RankInput = read_json(path)?;
    Ok(input.candidates.into_iter().map(PromotionCandidate::from).collect())
}

fn rank(args: &RankArgs) -> Result<ExitCode, CliError> {
    let candidates = load_candidates(&args.input)?;
    let decision = promotion::rank_profiles(&candidates);
    let exit_code = decision_exit_code_or_block(decision.decision);
    emit_json(&decision, args.out.as_deref())?;
    emit_report(Some(report::promotion_decision(&decision)), args.report.as_deref())?;
    Ok(ExitCode::from(exit_code.as_process_code()))
}

fn promote(args: &PromoteArgs) -> Result<ExitCode, CliError> {
    let candidates = load_candidates(&args.input)?;
    let override_input: Option<OverrideInput> = args.r#override.as_ref().map(|path| read_json(path)).transpose()?;
    let override_value = override_input
        .map(|raw| -> Result<PromotionOverride, CliError> {
            Ok(PromotionOverride {
                allow_promote: raw.allow_promote,
                reason: raw.reason,
                approver: raw.approver,
                expiry: Timestamp::parse(&raw.expiry).map_err(gateforge_core::CoreError::Timestamp)?,
            })
        })
        .transpose()?;
    let decision = promotion::promote(&candidates, override_value.as_ref(), Timestamp::now());
    let exit_code = decision_exit_code_or_block(decision.decision);
    emit_json(&decision, args.out.as_deref())?;
    emit_report(Some(report::promotion_decision(&decision)), args.report.as_deref())?;
    Ok(ExitCode::from(exit_code.as_process_code()))
}

fn apply(args: &ApplyArgs) -> Result<ExitCode, CliError> {
    let decision: PromotionDecision = read_json(&args.input)?;
    let options = ApplyOptions {
        review_ticket_id: args.review_ticket_id.clone(),
        require_ranking_explanation: args.require_ranking_explanation,
        min_top_score_margin: args.require_min_top_score_margin,
        min_explanation_quality: args.require_min_explanation_quality,
    };
    let record = promotion::apply(&decision, &options, &args.actor, &args.audit_log)?;
    let exit_code = decision_exit_code_or_block(record.final_status);
    emit_json(&record, args.out.as_deref())?;
    Ok(ExitCode::from(exit_code.as_process_code()))
}

fn audit_log(args: &AuditLogArgs) -> Result<ExitCode, CliError> {
    let rows = promotion::read_audit_log(&args.audit_log)?;
    emit_json(&rows, args.out.as_deref())?;
    Ok(ExitCode::SUCCESS)
}
