// crates/gateforge-cli/src/commands/planner.rs
// ============================================================================
// Module: `planner` Command
// Description: Drives a planner backend to an intent, validates it against
//              its schema, and checks it against guardrails, per §4.5.
// Dependencies: gateforge-engine
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Subcommand;
use gateforge_engine::planner;
use gateforge_engine::planner::Guardrails;
use gateforge_engine::planner::Intent;
use gateforge_engine::planner::PlannerBackend;
use serde::Serialize;
use serde_json::Value;

use super::emit_json;
use super::read_json;
use crate::error::CliError;

/// Subcommands under `planner`.
#[derive(Subcommand, Debug)]
pub enum PlannerCommand {
    /// Derives an intent from a planner backend.
    Plan(PlanArgs),
    /// Derives a conservative retry intent from a prior attempt's intent.
    RetryIntent(RetryIntentArgs),
    /// Validates a raw intent document against the planner output schema.
    ValidateIntent(ValidateIntentArgs),
    /// Checks an intent against guardrail confidence and file whitelist
    /// rules.
    CheckGuardrails(CheckGuardrailsArgs),
}

/// Arguments for `planner plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Planner backend: `rule`, `gemini`, or `openai`.
    #[arg(long, default_value = "rule")]
    pub backend: String,
    /// Proposal identifier the intent is derived for.
    #[arg(long)]
    pub proposal_id: String,
    /// Reasons backing the source run's status; consulted only by `rule`.
    #[arg(long = "reason")]
    pub reasons: Vec<String>,
    /// Goal text handed to the `gemini` backend.
    #[arg(long, default_value = "")]
    pub goal: String,
    /// Write the intent document to this path in addition to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Arguments for `planner retry-intent`.
#[derive(Args, Debug)]
pub struct RetryIntentArgs {
    /// Path to the prior attempt's intent document.
    #[arg(long = "in")]
    pub input: PathBuf,
    /// Write the retry intent document to this path in addition to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Arguments for `planner validate-intent`.
#[derive(Args, Debug)]
pub struct ValidateIntentArgs {
    /// Path to a raw intent document.
    #[arg(long = "in")]
    pub input: PathBuf,
}

/// Arguments for `planner check-guardrails`.
#[derive(Args, Debug)]
pub struct CheckGuardrailsArgs {
    /// Path to the intent document to validate.
    #[arg(long = "in")]
    pub input: PathBuf,
    /// Minimum accepted change-plan confidence.
    #[arg(long, default_value_t = 0.0)]
    pub confidence_min: f64,
    /// Maximum accepted change-plan confidence.
    #[arg(long, default_value_t = 1.0)]
    pub confidence_max: f64,
    /// Allowed path-root prefixes; empty means any root is allowed.
    #[arg(long = "allowed-root")]
    pub allowed_roots: Vec<String>,
    /// Allowed path suffixes; empty means no suffix restriction.
    #[arg(long = "allowed-suffix")]
    pub allowed_suffixes: Vec<String>,
    /// Exact-path whitelist, always allowed regardless of root/suffix.
    #[arg(long = "allowed-file")]
    pub allowed_files: Vec<String>,
    /// Write the guardrail decision document to this path in addition to
    /// stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct GuardrailCheckResult {
    decision: gateforge_core::model::run_summary::GuardrailDecision,
    violations: Vec<gateforge_core::model::run_summary::GuardrailViolation>,
}

/// Dispatches a `planner` subcommand.
///
/// # Errors
///
/// Returns [`CliError`] when the planner backend fails, an input document
/// cannot be read, or an intent fails schema validation.
pub fn execute(command: &PlannerCommand) -> Result<ExitCode, CliError> {
    match command {
        PlannerCommand::Plan(args) => plan(args),
        PlannerCommand::RetryIntent(args) => retry_intent(args),
        PlannerCommand::ValidateIntent(args) => validate_intent(args),
        PlannerCommand::CheckGuardrails(args) => check_guardrails(args),
    }
}

fn plan(args: &PlanArgs) -> Result<ExitCode, CliError> {
    let backend = PlannerBackend::parse(&args.backend)
        .ok_or_else(|| CliError::Usage(format!("unknown planner backend '{}'", args.backend)))?;
    let intent = planner::plan(backend, &args.proposal_id, &args.reasons, &args.goal)?;
    emit_json(&intent, args.out.as_deref())?;
    Ok(ExitCode::SUCCESS)
}

fn retry_intent(args: &RetryIntentArgs) -> Result<ExitCode, CliError> {
    let previous: Intent = read_json(&args.input)?;
    let retried = planner::conservative_retry_intent(&previous);
    emit_json(&retried, args.out.as_deref())?;
    Ok(ExitCode::SUCCESS)
}

fn validate_intent(args: &ValidateIntentArgs) -> Result<ExitCode, CliError> {
    let raw: Value = read_json(&args.input)?;
    planner::validate_intent_schema(&raw)?;
    Ok(ExitCode::SUCCESS)
}

fn check_guardrails(args: &CheckGuardrailsArgs) -> Result<ExitCode, CliError> {
    let intent: Intent = read_json(&args.input)?;
    let guardrails = Guardrails {
        confidence_min: args.confidence_min,
        confidence_max: args.confidence_max,
        allowed_roots: args.allowed_roots.clone(),
        allowed_suffixes: args.allowed_suffixes.clone(),
        allowed_files: args.allowed_files.clone(),
    };
    let (decision, violations) = guardrails.decide(&intent);
    let exit_code = match decision {
        gateforge_core::model::run_summary::GuardrailDecision::Rejected => gateforge_core::ExitCode::LogicalFailure,
        _ => gateforge_core::ExitCode::Success,
    };
    emit_json(&GuardrailCheckResult { decision, violations }, args.out.as_deref())?;
    Ok(ExitCode::from(exit_code.as_process_code()))
}
