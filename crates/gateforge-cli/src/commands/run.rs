// crates/gateforge-cli/src/commands/run.rs
// ============================================================================
// Module: `run` Command
// Description: Drives a proposal through the full run orchestrator, per §4.4.
// Dependencies: gateforge-backend, gateforge-config, gateforge-core,
//               gateforge-engine
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use gateforge_config::BaselineIndex;
use gateforge_config::GateForgeConfig;
use gateforge_core::model::proposal::Proposal;
use gateforge_core::model::run_summary::GuardrailDecision;
use gateforge_engine::orchestrator;
use gateforge_engine::orchestrator::OrchestratorInput;

use super::emit_json;
use super::emit_report;
use super::load_policy;
use super::parent_dir;
use super::run_status_exit_code;
use crate::backend;
use crate::error::CliError;
use crate::report;

/// Arguments for the `run` command: proposal in, Run Summary out.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the proposal document.
    #[arg(long)]
    pub proposal: PathBuf,
    /// Path to `baselines/index.json`; omit to skip baseline auto-resolution.
    #[arg(long)]
    pub baseline_index: Option<PathBuf>,
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
    /// Wall-clock timeout handed to the backend, in seconds.
    #[arg(long, default_value_t = 60)]
    pub timeout_seconds: u64,
    /// Directory candidate/regression artifacts are written into.
    #[arg(long, default_value = "artifacts")]
    pub output_dir: PathBuf,
    /// Path roots the proposal's change-set is allowed to touch; unset means
    /// any root is allowed.
    #[arg(long = "change-plan-allowed-root")]
    pub change_plan_allowed_roots: Vec<String>,
    /// Write the Run Summary to this path in addition to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Write a markdown report to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Executes the `run` command.
///
/// # Errors
///
/// Returns [`CliError`] when the proposal, baseline index, or policy cannot
/// be loaded, or when the orchestrator itself fails before emitting a
/// summary.
pub fn execute(args: &RunArgs) -> Result<ExitCode, CliError> {
    let proposal: Proposal =
        super::read_validated_json(&args.proposal, &gateforge_core::schemas::proposal_schema())?;
    let proposal_dir = parent_dir(&args.proposal);
    let adapter = backend::resolve(&proposal.backend)?;

    let baseline_index = args
        .baseline_index
        .as_ref()
        .map(|path| BaselineIndex::load(path))
        .transpose()?;
    let baseline_index_dir: PathBuf =
        args.baseline_index.as_ref().map(|path| parent_dir(path)).unwrap_or_else(|| proposal_dir.clone());

    let config = GateForgeConfig::default().with_env_overrides();
    let runtime_threshold = config.resolve_runtime_threshold(args.runtime_threshold);
    let policy_profile = config.resolve_policy_profile(args.policy_profile.as_deref());
    let (policy, policy_path) =
        load_policy(args.policy.as_deref(), Some(policy_profile), &args.policies_dir)?;

    std::fs::create_dir_all(&args.output_dir).map_err(|source| gateforge_core::CoreError::Io {
        path: args.output_dir.display().to_string(),
        source,
    })?;

    let input = OrchestratorInput {
        proposal: &proposal,
        proposal_dir: &proposal_dir,
        backend: adapter.as_ref(),
        timeout_seconds: args.timeout_seconds,
        baseline_index: baseline_index.as_ref(),
        baseline_index_dir: &baseline_index_dir,
        policy: &policy,
        policy_path: &policy_path,
        runtime_threshold,
        output_dir: &args.output_dir,
        change_set_allowed_roots: &args.change_plan_allowed_roots,
        planner_guardrail: (GuardrailDecision::NotApplicable, Vec::new()),
    };

    let summary = orchestrator::run(&input)?;
    let exit_code = run_status_exit_code(summary.status);
    emit_json(&summary, args.out.as_deref())?;
    emit_report(Some(report::run_summary(&summary)), args.report.as_deref())?;
    Ok(ExitCode::from(exit_code.as_process_code()))
}

#[cfg(test)]
fn _assert_path_helper_used(_: &Path) {}
