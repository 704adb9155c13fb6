// crates/gateforge-cli/src/commands/review.rs
// ============================================================================
// Module: `review` Command
// Description: Resolves a NEEDS_REVIEW proposal and queries the review
//              ledger, per §4.8.
// Dependencies: gateforge-core, gateforge-engine
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Subcommand;
use gateforge_core::identifiers::ProposalId;
use gateforge_core::model::review::ReviewDecision;
use gateforge_core::model::run_summary::GuardrailDecision;
use gateforge_core::time::Timestamp;
use gateforge_engine::review;
use gateforge_engine::review::LedgerFilter;
use gateforge_engine::review::ReviewResolveInput;
use serde::Deserialize;

use super::emit_json;
use super::emit_report;
use super::read_json;
use crate::error::CliError;
use crate::report;

/// Subcommands under `review`.
#[derive(Subcommand, Debug)]
pub enum ReviewCommand {
    /// Resolves a reviewer's decision against a proposal's risk level and
    /// appends it to the ledger.
    Resolve(ResolveArgs),
    /// Queries the review ledger.
    Query(QueryArgs),
    /// Derives dashboard KPIs from the review ledger.
    Kpis(KpisArgs),
}

/// Input document for `review resolve`: the reviewer's decision plus the
/// context carried over from the originating run summary.
#[derive(Debug, Deserialize)]
pub struct ResolveInput {
    /// The reviewer's decision.
    pub decision: ReviewDecision,
    /// Declared risk level of the proposal.
    pub risk_level: gateforge_core::decision::RiskLevel,
    /// Policy profile name applied to the originating run, if known.
    #[serde(default)]
    pub policy_profile: Option<String>,
    /// Policy document version applied to the originating run, if known.
    #[serde(default)]
    pub policy_version: Option<String>,
    /// Planner guardrail decision recorded on the originating run.
    #[serde(default = "default_guardrail_decision")]
    pub planner_guardrail_decision: GuardrailDecision,
    /// `rule_id`s of planner guardrail violations on the originating run.
    #[serde(default)]
    pub planner_guardrail_rule_ids: Vec<String>,
}

fn default_guardrail_decision() -> GuardrailDecision {
    GuardrailDecision::NotApplicable
}

/// Arguments for `review resolve`.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Path to a [`ResolveInput`] document.
    #[arg(long = "in")]
    pub input: PathBuf,
    /// Path to the review ledger JSONL file.
    #[arg(long)]
    pub ledger: PathBuf,
    /// Write the resolution to this path in addition to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Write a markdown report to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Arguments for `review query`.
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Path to the review ledger JSONL file.
    #[arg(long)]
    pub ledger: PathBuf,
    /// Restrict to records with this final status.
    #[arg(long)]
    pub final_status: Option<String>,
    /// Restrict to records for this proposal.
    #[arg(long)]
    pub proposal_id: Option<String>,
    /// Restrict to records resolved at or after this RFC3339 instant.
    #[arg(long)]
    pub since_utc: Option<String>,
    /// Write the matching records to this path in addition to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Arguments for `review kpis`.
#[derive(Args, Debug)]
pub struct KpisArgs {
    /// Path to the review ledger JSONL file.
    #[arg(long)]
    pub ledger: PathBuf,
    /// SLA in seconds used for `sla_breach_rate`.
    #[arg(long, default_value_t = 86400)]
    pub sla_seconds: u64,
    /// Write the KPI document to this path in addition to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

fn parse_final_status(raw: &str) -> Result<gateforge_core::model::review::ResolvedStatus, CliError> {
    use gateforge_core::model::review::ResolvedStatus;
    match raw.to_ascii_uppercase().as_str() {
        "PASS" => Ok(ResolvedStatus::Pass),
        "FAIL" => Ok(ResolvedStatus::Fail),
        "NEEDS_REVIEW" => Ok(ResolvedStatus::NeedsReview),
        other => Err(CliError::Usage(format!("unknown final status '{other}'"))),
    }
}

/// Dispatches a `review` subcommand.
///
/// # Errors
///
/// Returns [`CliError`] when the input document, ledger, or filter
/// arguments cannot be read or parsed.
pub fn execute(command: &ReviewCommand) -> Result<ExitCode, CliError> {
    match command {
        ReviewCommand::Resolve(args) => resolve(args),
        ReviewCommand::Query(args) => query(args),
        ReviewCommand::Kpis(args) => kpis(args),
    }
}

fn resolve(args: &ResolveArgs) -> Result<ExitCode, CliError> {
    let input: ResolveInput = read_json(&args.input)?;
    let resolve_input = ReviewResolveInput {
        decision: &input.decision,
        risk_level: input.risk_level,
        policy_profile: input.policy_profile,
        policy_version: input.policy_version,
        planner_guardrail_decision: input.planner_guardrail_decision,
        planner_guardrail_rule_ids: input.planner_guardrail_rule_ids,
        ledger_path: &args.ledger,
    };
    let resolution = review::resolve_and_append(&resolve_input)?;
    let exit_code = if resolution.status == gateforge_core::model::review::ResolvedStatus::Pass {
        gateforge_core::ExitCode::Success
    } else {
        gateforge_core::ExitCode::LogicalFailure
    };
    emit_json(&resolution, args.out.as_deref())?;
    emit_report(Some(report::review_resolution(&resolution)), args.report.as_deref())?;
    Ok(ExitCode::from(exit_code.as_process_code()))
}

fn query(args: &QueryArgs) -> Result<ExitCode, CliError> {
    let mut filter = LedgerFilter::default();
    if let Some(raw) = &args.final_status {
        filter.final_status = Some(parse_final_status(raw)?);
    }
    if let Some(proposal_id) = &args.proposal_id {
        filter.proposal_id = Some(ProposalId::new(proposal_id.clone()));
    }
    if let Some(since) = &args.since_utc {
        filter.since_utc = Some(Timestamp::parse(since).map_err(gateforge_core::CoreError::Timestamp)?);
    }
    let records = review::query(&args.ledger, &filter)?;
    emit_json(&records, args.out.as_deref())?;
    Ok(ExitCode::SUCCESS)
}

fn kpis(args: &KpisArgs) -> Result<ExitCode, CliError> {
    let filter = LedgerFilter::default();
    let records = review::query(&args.ledger, &filter)?;
    let kpis = review::derive_kpis(&records, args.sla_seconds, Timestamp::now());
    emit_json(&kpis, args.out.as_deref())?;
    Ok(ExitCode::SUCCESS)
}
