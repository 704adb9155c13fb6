// crates/gateforge-cli/src/commands/regress.rs
// ============================================================================
// Module: `regress` Command
// Description: Standalone baseline-vs-candidate comparison, per §4.1.
// Dependencies: gateforge-config, gateforge-core, gateforge-engine
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use gateforge_config::GateForgeConfig;
use gateforge_core::model::evidence::Evidence;
use gateforge_core::model::proposal::Proposal;
use gateforge_engine::regression;

use super::decision_exit_code;
use super::emit_json;
use super::emit_report;
use super::load_policy;
use crate::error::CliError;
use crate::report;

/// Arguments for the `regress` command: baseline and candidate evidence in,
/// a Regression Summary out.
#[derive(Args, Debug)]
pub struct RegressArgs {
    /// Path to the proposal document.
    #[arg(long)]
    pub proposal: PathBuf,
    /// Path to the baseline evidence document.
    #[arg(long)]
    pub baseline: PathBuf,
    /// Path to the candidate evidence document.
    #[arg(long = "in")]
    pub candidate: PathBuf,
    /// Explicit policy document path, overriding `--policy-profile`.
    #[arg(long)]
    pub policy: Option<PathBuf>,
    /// Policy profile name, resolved against `--policies-dir`.
    #[arg(long)]
    pub policy_profile: Option<String>,
    /// Directory containing policy profile documents.
    #[arg(long, default_value = "policies")]
    pub policies_dir: PathBuf,
    /// Fractional runtime regression threshold, overriding the config default.
    #[arg(long)]
    pub runtime_threshold: Option<f64>,
    /// Write the Regression Summary to this path in addition to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Write a markdown report to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Executes the `regress` command.
///
/// # Errors
///
/// Returns [`CliError`] when the proposal, evidence documents, or policy
/// cannot be loaded.
pub fn execute(args: &RegressArgs) -> Result<ExitCode, CliError> {
    let proposal_schema = gateforge_core::schemas::proposal_schema();
    let evidence_schema = gateforge_core::schemas::evidence_schema();
    let proposal: Proposal = super::read_validated_json(&args.proposal, &proposal_schema)?;
    let baseline: Evidence = super::read_validated_json(&args.baseline, &evidence_schema)?;
    let candidate: Evidence = super::read_validated_json(&args.candidate, &evidence_schema)?;

    let config = GateForgeConfig::default().with_env_overrides();
    let runtime_threshold = config.resolve_runtime_threshold(args.runtime_threshold);
    let policy_profile = config.resolve_policy_profile(args.policy_profile.as_deref());
    let (policy, policy_path) =
        load_policy(args.policy.as_deref(), Some(policy_profile), &args.policies_dir)?;

    let summary = regression::compare(&proposal, &baseline, &candidate, &policy, &policy_path, runtime_threshold);
    let exit_code = decision_exit_code(summary.decision);
    emit_json(&summary, args.out.as_deref())?;
    emit_report(Some(report::regression_summary(&summary)), args.report.as_deref())?;
    Ok(ExitCode::from(exit_code.as_process_code()))
}
