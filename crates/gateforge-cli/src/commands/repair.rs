// crates/gateforge-cli/src/commands/repair.rs
// ============================================================================
// Module: `repair` Command
// Description: Drives a single repair loop, a repair batch, or an A/B
//              policy profile compare, per §4.6 and §4.7.
// Dependencies: gateforge-backend, gateforge-config, gateforge-core,
//               gateforge-engine
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Subcommand;
use gateforge_config::BaselineIndex;
use gateforge_config::Policy;
use gateforge_core::decision::Decision;
use gateforge_core::model::proposal::Proposal;
use gateforge_engine::planner::Guardrails;
use gateforge_engine::repair::run_repair_loop;
use gateforge_engine::repair::RepairInput;
use gateforge_engine::repair_batch::compare_profiles;
use gateforge_engine::repair_batch::run_repair_batch;
use gateforge_engine::repair_batch::RepairBatchCaseSpec;
use gateforge_engine::repair_batch::RepairBatchContextTemplate;
use gateforge_engine::repair_batch::RepairBatchPack;
use serde::Deserialize;

use super::emit_json;
use super::emit_report;
use super::load_policy;
use super::parent_dir;
use super::read_json;
use crate::backend;
use crate::error::CliError;
use crate::report;

/// Subcommands under `repair`.
#[derive(Subcommand, Debug)]
pub enum RepairCommand {
    /// Runs a single repair loop.
    Loop(LoopArgs),
    /// Runs a repair batch pack over a bounded worker pool.
    Batch(BatchArgs),
    /// Runs a repair batch pack once per policy profile and compares them.
    CompareProfiles(CompareProfilesArgs),
}

/// Guardrail flags shared by every `repair` subcommand.
#[derive(Args, Debug)]
pub struct GuardrailArgs {
    /// Minimum accepted change-plan confidence.
    #[arg(long, default_value_t = 0.0)]
    pub confidence_min: f64,
    /// Maximum accepted change-plan confidence.
    #[arg(long, default_value_t = 1.0)]
    pub confidence_max: f64,
    /// Allowed path-root prefixes for a planner's change-plan.
    #[arg(long = "guardrail-allowed-root")]
    pub allowed_roots: Vec<String>,
    /// Allowed path suffixes for a planner's change-plan.
    #[arg(long = "guardrail-allowed-suffix")]
    pub allowed_suffixes: Vec<String>,
    /// Exact-path whitelist for a planner's change-plan.
    #[arg(long = "guardrail-allowed-file")]
    pub allowed_files: Vec<String>,
}

impl GuardrailArgs {
    fn to_guardrails(&self) -> Guardrails {
        Guardrails {
            confidence_min: self.confidence_min,
            confidence_max: self.confidence_max,
            allowed_roots: self.allowed_roots.clone(),
            allowed_suffixes: self.allowed_suffixes.clone(),
            allowed_files: self.allowed_files.clone(),
        }
    }
}

/// Input document for `repair loop`: the source run's decision and reasons,
/// plus the repair parameters for this attempt chain.
#[derive(Debug, Deserialize)]
pub struct LoopInput {
    /// Decision the source run reached, before any repair attempt.
    pub source_status: Decision,
    /// Reasons backing the source run's status.
    pub source_reasons: Vec<String>,
    /// Maximum number of retries beyond the first attempt.
    #[serde(default)]
    pub max_retries: u32,
    /// Prefix that, when matched by a newly surfaced reason, trips the
    /// safety guard.
    #[serde(default)]
    pub block_new_reason_prefix: Option<String>,
    /// Configured critical-reasons set that also trips the safety guard.
    #[serde(default)]
    pub new_critical_reasons: Vec<String>,
}

/// Arguments for `repair loop`.
#[derive(Args, Debug)]
pub struct LoopArgs {
    /// Path to a [`LoopInput`] document.
    #[arg(long = "in")]
    pub input: PathBuf,
    /// Path to the proposal document the failing run was driven by.
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
    /// Path roots the proposal's change-set is allowed to touch.
    #[arg(long = "change-plan-allowed-root")]
    pub change_plan_allowed_roots: Vec<String>,
    #[command(flatten)]
    pub guardrails: GuardrailArgs,
    /// Write the Repair Loop Summary to this path in addition to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Write a markdown report to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// One case in a repair batch pack document.
#[derive(Debug, Deserialize)]
pub struct PackCaseInput {
    /// Case name.
    pub name: String,
    /// Decision the source run reached, before any repair attempt.
    pub source_status: Decision,
    /// Reasons backing the source run's status.
    pub source_reasons: Vec<String>,
    /// The proposal this case's failing run was driven by.
    pub proposal: Proposal,
    /// Maximum number of retries beyond the first attempt, for this case.
    #[serde(default)]
    pub max_retries: u32,
    /// Prefix tripping the safety guard, for this case.
    #[serde(default)]
    pub block_new_reason_prefix: Option<String>,
    /// Configured critical-reasons set, for this case.
    #[serde(default)]
    pub new_critical_reasons: Vec<String>,
}

/// A repair batch pack document: an ordered list of independent cases.
#[derive(Debug, Deserialize)]
pub struct PackInput {
    /// Identifier of the pack.
    pub pack_id: String,
    /// Cases, in declaration order.
    pub cases: Vec<PackCaseInput>,
}

impl From<PackCaseInput> for RepairBatchCaseSpec {
    fn from(case: PackCaseInput) -> Self {
        Self {
            name: case.name,
            source_status: case.source_status,
            source_reasons: case.source_reasons,
            proposal: case.proposal,
            max_retries: case.max_retries,
            block_new_reason_prefix: case.block_new_reason_prefix,
            new_critical_reasons: case.new_critical_reasons,
        }
    }
}

impl From<PackInput> for RepairBatchPack {
    fn from(pack: PackInput) -> Self {
        Self { pack_id: pack.pack_id, cases: pack.cases.into_iter().map(RepairBatchCaseSpec::from).collect() }
    }
}

/// Context flags shared by `repair batch` and `repair compare-profiles`.
#[derive(Args, Debug)]
pub struct BatchContextArgs {
    /// Path to the repair batch pack document.
    #[arg(long)]
    pub pack: PathBuf,
    /// Backend adapter every case in the pack runs against.
    #[arg(long, default_value = "mock")]
    pub backend: String,
    /// Path to `baselines/index.json`; omit to skip baseline auto-resolution.
    #[arg(long)]
    pub baseline_index: Option<PathBuf>,
    /// Fractional runtime regression threshold, overriding the config default.
    #[arg(long)]
    pub runtime_threshold: Option<f64>,
    /// Wall-clock timeout handed to the backend, in seconds.
    #[arg(long, default_value_t = 60)]
    pub timeout_seconds: u64,
    /// Directory candidate/regression artifacts are written into.
    #[arg(long, default_value = "artifacts")]
    pub output_dir: PathBuf,
    /// Path roots every case's change-set is allowed to touch.
    #[arg(long = "change-plan-allowed-root")]
    pub change_plan_allowed_roots: Vec<String>,
    /// Worker pool size; clamped to at least 1 and at most the case count.
    #[arg(long, default_value_t = 1)]
    pub worker_count: usize,
    #[command(flatten)]
    pub guardrails: GuardrailArgs,
}

/// Arguments for `repair batch`.
#[derive(Args, Debug)]
pub struct BatchArgs {
    #[command(flatten)]
    pub context: BatchContextArgs,
    /// Explicit policy document path, overriding `--policy-profile`.
    #[arg(long)]
    pub policy: Option<PathBuf>,
    /// Policy profile name, resolved against `--policies-dir`.
    #[arg(long)]
    pub policy_profile: Option<String>,
    /// Directory containing policy profile documents.
    #[arg(long, default_value = "policies")]
    pub policies_dir: PathBuf,
    /// Write the Repair Batch Summary to this path in addition to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Arguments for `repair compare-profiles`.
#[derive(Args, Debug)]
pub struct CompareProfilesArgs {
    #[command(flatten)]
    pub context: BatchContextArgs,
    /// First policy profile name.
    #[arg(long)]
    pub profile_a: String,
    /// Second policy profile name.
    #[arg(long)]
    pub profile_b: String,
    /// Directory containing policy profile documents.
    #[arg(long, default_value = "policies")]
    pub policies_dir: PathBuf,
    /// Write the Profile Compare Summary to this path in addition to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Dispatches a `repair` subcommand.
///
/// # Errors
///
/// Returns [`CliError`] when a proposal, pack, baseline index, or policy
/// cannot be loaded, or when a repair attempt fails to execute.
pub fn execute(command: &RepairCommand) -> Result<ExitCode, CliError> {
    match command {
        RepairCommand::Loop(args) => repair_loop(args),
        RepairCommand::Batch(args) => batch(args),
        RepairCommand::CompareProfiles(args) => compare(args),
    }
}

fn repair_loop(args: &LoopArgs) -> Result<ExitCode, CliError> {
    let input: LoopInput = read_json(&args.input)?;
    let proposal: Proposal =
        super::read_validated_json(&args.proposal, &gateforge_core::schemas::proposal_schema())?;
    let proposal_dir = parent_dir(&args.proposal);
    let adapter = backend::resolve(&proposal.backend)?;

    let baseline_index =
        args.baseline_index.as_ref().map(|path| BaselineIndex::load(path)).transpose()?;
    let baseline_index_dir: PathBuf =
        args.baseline_index.as_ref().map(|path| parent_dir(path)).unwrap_or_else(|| proposal_dir.clone());

    let (policy, policy_path) =
        load_policy(args.policy.as_deref(), args.policy_profile.as_deref(), &args.policies_dir)?;
    let guardrails = args.guardrails.to_guardrails();

    std::fs::create_dir_all(&args.output_dir).map_err(|source| gateforge_core::CoreError::Io {
        path: args.output_dir.display().to_string(),
        source,
    })?;

    let repair_input = RepairInput {
        source_reasons: &input.source_reasons,
        source_status: input.source_status,
        proposal: &proposal,
        proposal_dir: &proposal_dir,
        backend: adapter.as_ref(),
        timeout_seconds: args.timeout_seconds,
        baseline_index: baseline_index.as_ref(),
        baseline_index_dir: &baseline_index_dir,
        policy: &policy,
        policy_path: &policy_path,
        runtime_threshold: gateforge_config::GateForgeConfig::default()
            .with_env_overrides()
            .resolve_runtime_threshold(args.runtime_threshold),
        output_dir: &args.output_dir,
        change_set_allowed_roots: &args.change_plan_allowed_roots,
        guardrails: &guardrails,
        max_retries: input.max_retries,
        block_new_reason_prefix: input.block_new_reason_prefix.as_deref(),
        new_critical_reasons: &input.new_critical_reasons,
    };

    let summary = run_repair_loop(&repair_input)?;
    let exit_code = if summary.after.status == Decision::Pass {
        gateforge_core::ExitCode::Success
    } else {
        gateforge_core::ExitCode::LogicalFailure
    };
    emit_json(&summary, args.out.as_deref())?;
    emit_report(Some(report::repair_loop_summary(&summary)), args.report.as_deref())?;
    Ok(ExitCode::from(exit_code.as_process_code()))
}

fn build_pack(path: &Path) -> Result<RepairBatchPack, CliError> {
    let pack_input: PackInput = read_json(path)?;
    Ok(RepairBatchPack::from(pack_input))
}

fn batch(args: &BatchArgs) -> Result<ExitCode, CliError> {
    let pack = build_pack(&args.context.pack)?;
    let pack_dir = parent_dir(&args.context.pack);
    let adapter = backend::resolve(&args.context.backend)?;
    let baseline_index =
        args.context.baseline_index.as_ref().map(|path| BaselineIndex::load(path)).transpose()?;
    let baseline_index_dir: PathBuf =
        args.context.baseline_index.as_ref().map(|path| parent_dir(path)).unwrap_or_else(|| pack_dir.clone());
    let (policy, policy_path) =
        load_policy(args.policy.as_deref(), args.policy_profile.as_deref(), &args.policies_dir)?;
    let guardrails = args.context.guardrails.to_guardrails();
    let runtime_threshold = gateforge_config::GateForgeConfig::default()
        .with_env_overrides()
        .resolve_runtime_threshold(args.context.runtime_threshold);

    std::fs::create_dir_all(&args.context.output_dir).map_err(|source| gateforge_core::CoreError::Io {
        path: args.context.output_dir.display().to_string(),
        source,
    })?;

    let ctx = gateforge_engine::repair_batch::RepairBatchContext {
        proposal_dir: &pack_dir,
        backend: adapter.as_ref(),
        timeout_seconds: args.context.timeout_seconds,
        baseline_index: baseline_index.as_ref(),
        baseline_index_dir: &baseline_index_dir,
        policy: &policy,
        policy_path: &policy_path,
        runtime_threshold,
        output_dir: &args.context.output_dir,
        change_set_allowed_roots: &args.context.change_plan_allowed_roots,
        guardrails: &guardrails,
        worker_count: args.context.worker_count,
    };

    let summary = run_repair_batch(&pack, &ctx)?;
    let exit_code =
        if summary.worse_count == 0 && summary.safety_block_count == 0 {
            gateforge_core::ExitCode::Success
        } else {
            gateforge_core::ExitCode::LogicalFailure
        };
    emit_json(&summary, args.out.as_deref())?;
    Ok(ExitCode::from(exit_code.as_process_code()))
}

fn compare(args: &CompareProfilesArgs) -> Result<ExitCode, CliError> {
    let pack = build_pack(&args.context.pack)?;
    let pack_dir = parent_dir(&args.context.pack);
    let adapter = backend::resolve(&args.context.backend)?;
    let baseline_index =
        args.context.baseline_index.as_ref().map(|path| BaselineIndex::load(path)).transpose()?;
    let baseline_index_dir: PathBuf =
        args.context.baseline_index.as_ref().map(|path| parent_dir(path)).unwrap_or_else(|| pack_dir.clone());
    let guardrails = args.context.guardrails.to_guardrails();
    let runtime_threshold = gateforge_config::GateForgeConfig::default()
        .with_env_overrides()
        .resolve_runtime_threshold(args.context.runtime_threshold);

    std::fs::create_dir_all(&args.context.output_dir).map_err(|source| gateforge_core::CoreError::Io {
        path: args.context.output_dir.display().to_string(),
        source,
    })?;

    let policy_a = Policy::load_profile(&args.policies_dir, &args.profile_a)?;
    let policy_b = Policy::load_profile(&args.policies_dir, &args.profile_b)?;

    let template = RepairBatchContextTemplate {
        proposal_dir: &pack_dir,
        backend: adapter.as_ref(),
        timeout_seconds: args.context.timeout_seconds,
        baseline_index: baseline_index.as_ref(),
        baseline_index_dir: &baseline_index_dir,
        runtime_threshold,
        output_dir: &args.context.output_dir,
        change_set_allowed_roots: &args.context.change_plan_allowed_roots,
        guardrails: &guardrails,
        worker_count: args.context.worker_count,
    };

    let summary = compare_profiles(&pack, &args.profile_a, &policy_a, &args.profile_b, &policy_b, &template)?;
    emit_json(&summary, args.out.as_deref())?;
    Ok(ExitCode::SUCCESS)
}
