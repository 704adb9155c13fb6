// crates/gateforge-cli/src/commands/policy.rs
// ============================================================================
// Module: `policy` Command
// Description: Loads and applies a policy overlay document standalone, per
//              §4.3.
// Dependencies: gateforge-config, gateforge-core
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Subcommand;
use gateforge_core::decision::RiskLevel;
use serde::Deserialize;

use super::decision_exit_code;
use super::emit_json;
use super::load_policy;
use super::read_json;
use crate::error::CliError;

/// Subcommands under `policy`.
#[derive(Subcommand, Debug)]
pub enum PolicyCommand {
    /// Loads and prints a policy document, resolved by profile or path.
    Show(ShowArgs),
    /// Applies a policy overlay to a declared set of reasons and risk level.
    Overlay(OverlayArgs),
}

/// Arguments shared by every `policy` subcommand for resolving the document.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Explicit policy document path, overriding `--policy-profile`.
    #[arg(long)]
    pub policy: Option<PathBuf>,
    /// Policy profile name, resolved against `--policies-dir`.
    #[arg(long)]
    pub policy_profile: Option<String>,
    /// Directory containing policy profile documents.
    #[arg(long, default_value = "policies")]
    pub policies_dir: PathBuf,
    /// Write the policy document to this path in addition to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Input document for `policy overlay`: the reasons and risk level to
/// evaluate against the resolved policy.
#[derive(Debug, Deserialize)]
pub struct OverlayInput {
    /// Reasons to evaluate.
    pub reasons: Vec<String>,
    /// Declared risk level of the proposal.
    pub risk_level: RiskLevel,
}

/// Arguments for `policy overlay`.
#[derive(Args, Debug)]
pub struct OverlayArgs {
    /// Path to an [`OverlayInput`] document.
    #[arg(long = "in")]
    pub input: PathBuf,
    /// Explicit policy document path, overriding `--policy-profile`.
    #[arg(long)]
    pub policy: Option<PathBuf>,
    /// Policy profile name, resolved against `--policies-dir`.
    #[arg(long)]
    pub policy_profile: Option<String>,
    /// Directory containing policy profile documents.
    #[arg(long, default_value = "policies")]
    pub policies_dir: PathBuf,
    /// Write the overlay result document to this path in addition to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Dispatches a `policy` subcommand.
///
/// # Errors
///
/// Returns [`CliError`] when the policy document or overlay input cannot be
/// loaded.
pub fn execute(command: &PolicyCommand) -> Result<ExitCode, CliError> {
    match command {
        PolicyCommand::Show(args) => show(args),
        PolicyCommand::Overlay(args) => overlay(args),
    }
}

fn show(args: &ShowArgs) -> Result<ExitCode, CliError> {
    let (policy, _path) = load_policy(args.policy.as_deref(), args.policy_profile.as_deref(), &args.policies_dir)?;
    emit_json(&policy, args.out.as_deref())?;
    Ok(ExitCode::SUCCESS)
}

fn overlay(args: &OverlayArgs) -> Result<ExitCode, CliError> {
    let input: OverlayInput = read_json(&args.input)?;
    let (policy, _path) = load_policy(args.policy.as_deref(), args.policy_profile.as_deref(), &args.policies_dir)?;
    let result = policy.overlay(&input.reasons, input.risk_level);
    let exit_code = decision_exit_code(result.decision);
    emit_json(&OverlayResultDto::from(result), args.out.as_deref())?;
    Ok(ExitCode::from(exit_code.as_process_code()))
}

#[derive(Debug, serde::Serialize)]
struct OverlayResultDto {
    decision: gateforge_core::Decision,
    policy_reasons: Vec<String>,
    required_human_checks: Vec<String>,
}

impl From<gateforge_config::PolicyOverlayResult> for OverlayResultDto {
    fn from(result: gateforge_config::PolicyOverlayResult) -> Self {
        Self {
            decision: result.decision,
            policy_reasons: result.policy_reasons,
            required_human_checks: result.required_human_checks,
        }
    }
}
