// crates/gateforge-cli/src/commands/governance.rs
// ============================================================================
// Module: `governance` Command
// Description: Fuses CI, repair, and review inputs into a governance
//              snapshot and maintains its JSONL history index, per §4.9.
// Dependencies: gateforge-core, gateforge-engine
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Subcommand;
use gateforge_core::decision::Decision;
use gateforge_core::model::governance::CiMatrixSummary;
use gateforge_core::model::governance::GovernanceSnapshot;
use gateforge_core::model::repair::ProfileCompareSummary;
use gateforge_core::model::repair::RepairBatchSummary;
use gateforge_engine::governance;
use gateforge_engine::governance::GovernanceInputs;
use gateforge_engine::governance::GovernanceThresholds;
use gateforge_engine::governance::RepairSignal;
use gateforge_engine::review::ReviewLedgerKpis;

use super::emit_json;
use super::emit_report;
use super::read_json;
use crate::error::CliError;
use crate::report;

/// Subcommands under `governance`.
#[derive(Subcommand, Debug)]
pub enum GovernanceCommand {
    /// Builds a governance snapshot from fused CI, repair, and review inputs.
    Snapshot(SnapshotArgs),
    /// Appends one entry to the governance history index.
    HistoryAppend(HistoryAppendArgs),
    /// Summarizes the last N entries of the governance history index.
    HistorySummary(HistorySummaryArgs),
}

/// Threshold flags shared by `governance snapshot`.
#[derive(Args, Debug)]
pub struct ThresholdArgs {
    /// Maximum tolerated `strict_downgrade_rate` before repair status is FAIL.
    #[arg(long)]
    pub max_strict_downgrade_rate: Option<f64>,
    /// Maximum tolerated review ledger `fail_rate` before review status is FAIL.
    #[arg(long)]
    pub max_review_fail_rate: Option<f64>,
    /// Minimum required `review_recovery_rate` before review status drops.
    #[arg(long)]
    pub min_review_recovery_rate: Option<f64>,
}

impl ThresholdArgs {
    fn to_thresholds(&self) -> GovernanceThresholds {
        let defaults = GovernanceThresholds::default();
        GovernanceThresholds {
            max_strict_downgrade_rate: self.max_strict_downgrade_rate.unwrap_or(defaults.max_strict_downgrade_rate),
            max_review_fail_rate: self.max_review_fail_rate.unwrap_or(defaults.max_review_fail_rate),
            min_review_recovery_rate: self.min_review_recovery_rate.unwrap_or(defaults.min_review_recovery_rate),
        }
    }
}

/// Arguments for `governance snapshot`.
#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Path to a [`CiMatrixSummary`] document.
    #[arg(long)]
    pub ci: PathBuf,
    /// Path to the repair-side signal document: a Repair Batch Summary or a
    /// Profile Compare Summary, depending on `--repair-kind`.
    #[arg(long)]
    pub repair: PathBuf,
    /// Kind of document `--repair` points at.
    #[arg(long, default_value = "batch")]
    pub repair_kind: String,
    /// Path to a [`ReviewLedgerKpis`] document.
    #[arg(long)]
    pub review: PathBuf,
    /// Path to an invariant-repair Profile Compare Summary, when available.
    #[arg(long)]
    pub invariant_repair_compare: Option<PathBuf>,
    #[command(flatten)]
    pub thresholds: ThresholdArgs,
    /// Path to a previous [`GovernanceSnapshot`] document to compute trend
    /// against.
    #[arg(long)]
    pub previous: Option<PathBuf>,
    /// Write the snapshot to this path in addition to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Write a markdown report to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Arguments for `governance history-append`.
#[derive(Args, Debug)]
pub struct HistoryAppendArgs {
    /// Path to the governance history JSONL index.
    #[arg(long)]
    pub history: PathBuf,
    /// Label for this history entry, e.g. the CI run identifier.
    #[arg(long)]
    pub label: String,
    /// Status to record.
    #[arg(long)]
    pub status: String,
}

/// Arguments for `governance history-summary`.
#[derive(Args, Debug)]
pub struct HistorySummaryArgs {
    /// Path to the governance history JSONL index.
    #[arg(long)]
    pub history: PathBuf,
    /// Number of trailing entries to summarize.
    #[arg(long, default_value_t = 10)]
    pub window_size: usize,
    /// Number of consecutive worsening transitions that trips the alert.
    #[arg(long, default_value_t = gateforge_config::config::DEFAULT_WORSENING_STREAK_ALERT_THRESHOLD)]
    pub alert_threshold: usize,
    /// Write the summary to this path in addition to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

fn parse_decision(raw: &str) -> Result<Decision, CliError> {
    match raw.to_ascii_uppercase().as_str() {
        "PASS" => Ok(Decision::Pass),
        "FAIL" => Ok(Decision::Fail),
        "NEEDS_REVIEW" => Ok(Decision::NeedsReview),
        other => Err(CliError::Usage(format!("unknown decision '{other}'"))),
    }
}

/// Dispatches a `governance` subcommand.
///
/// # Errors
///
/// Returns [`CliError`] when an input document or the history index cannot
/// be read, or the history index cannot be appended to.
pub fn execute(command: &GovernanceCommand) -> Result<ExitCode, CliError> {
    match command {
        GovernanceCommand::Snapshot(args) => snapshot(args),
        GovernanceCommand::HistoryAppend(args) => history_append(args),
        GovernanceCommand::HistorySummary(args) => history_summary(args),
    }
}

fn snapshot(args: &SnapshotArgs) -> Result<ExitCode, CliError> {
    let ci: CiMatrixSummary = read_json(&args.ci)?;
    let review: ReviewLedgerKpis = read_json(&args.review)?;
    let invariant_repair_compare: Option<ProfileCompareSummary> =
        args.invariant_repair_compare.as_ref().map(|path| read_json(path)).transpose()?;
    let thresholds = args.thresholds.to_thresholds();

    let repair_signal = match args.repair_kind.as_str() {
        "batch" => RepairSignal::Batch(read_json::<RepairBatchSummary>(&args.repair)?),
        "compare" => RepairSignal::Compare(read_json::<ProfileCompareSummary>(&args.repair)?),
        other => return Err(CliError::Usage(format!("unknown repair kind '{other}'"))),
    };

    let inputs = GovernanceInputs {
        ci: &ci,
        repair: &repair_signal,
        review: &review,
        invariant_repair_compare: invariant_repair_compare.as_ref(),
        thresholds: &thresholds,
    };
    let mut snapshot = governance::build_snapshot(&inputs);
    if let Some(previous_path) = &args.previous {
        let previous: GovernanceSnapshot = read_json(previous_path)?;
        snapshot = governance::with_trend(snapshot, &previous);
    }

    let exit_code = if snapshot.status == Decision::Pass {
        gateforge_core::ExitCode::Success
    } else {
        gateforge_core::ExitCode::LogicalFailure
    };
    emit_json(&snapshot, args.out.as_deref())?;
    emit_report(Some(report::governance_snapshot(&snapshot)), args.report.as_deref())?;
    Ok(ExitCode::from(exit_code.as_process_code()))
}

fn history_append(args: &HistoryAppendArgs) -> Result<ExitCode, CliError> {
    let status = parse_decision(&args.status)?;
    governance::append_history(&args.history, args.label.clone(), status)?;
    Ok(ExitCode::SUCCESS)
}

fn history_summary(args: &HistorySummaryArgs) -> Result<ExitCode, CliError> {
    let summary = governance::last_n_summary(&args.history, args.window_size, args.alert_threshold)?;
    emit_json(&summary, args.out.as_deref())?;
    Ok(ExitCode::SUCCESS)
}
