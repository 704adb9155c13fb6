// crates/gateforge-cli/src/main.rs
// ============================================================================
// Module: CLI Entry Point
// Description: Parses arguments, dispatches to one command family, and maps
//              the command's result onto the §6 exit code contract.
// Dependencies: clap, tracing-subscriber, gateforge-core
// ============================================================================

mod backend;
mod commands;
mod error;
mod report;
mod strings;

use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;

use crate::commands::baseline;
use crate::commands::changeset::ChangeSetCommand;
use crate::commands::governance::GovernanceCommand;
use crate::commands::planner::PlannerCommand;
use crate::commands::policy::PolicyCommand;
use crate::commands::promotion::PromotionCommand;
use crate::commands::regress::RegressArgs;
use crate::commands::repair::RepairCommand;
use crate::commands::review::ReviewCommand;
use crate::commands::run::RunArgs;
use crate::error::CliError;

/// GateForge: a governance pipeline that checks, repairs, and promotes
/// simulation-model change proposals.
#[derive(Parser, Debug)]
#[command(name = "gateforge", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drives a proposal through the full run orchestrator.
    Run(RunArgs),
    /// Standalone baseline-vs-candidate regression comparison.
    Regress(RegressArgs),
    /// Resolves reviews and queries the review ledger.
    #[command(subcommand)]
    Review(ReviewCommand),
    /// Resolves an adapter/model-script pair against a baseline index.
    #[command(subcommand)]
    Baseline(BaselineCommand),
    /// Validates, hashes, or applies a change-set document.
    #[command(subcommand)]
    Changeset(ChangeSetCommand),
    /// Shows or applies a policy overlay document.
    #[command(subcommand)]
    Policy(PolicyCommand),
    /// Derives, retries, validates, and guardrail-checks planner intents.
    #[command(subcommand)]
    Planner(PlannerCommand),
    /// Drives a single repair loop, a repair batch, or an A/B profile compare.
    #[command(subcommand)]
    Repair(RepairCommand),
    /// Builds a governance snapshot and maintains its history index.
    #[command(subcommand)]
    Governance(GovernanceCommand),
    /// Ranks, promotes, and applies promotion decisions.
    #[command(subcommand)]
    Promotion(PromotionCommand),
}

#[derive(Subcommand, Debug)]
enum BaselineCommand {
    /// Resolves a `(backend, model_script)` pair against a baseline index.
    Resolve(baseline::ResolveArgs),
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn dispatch(command: &Command) -> Result<ExitCode, CliError> {
    match command {
        Command::Run(args) => crate::commands::run::execute(args),
        Command::Regress(args) => crate::commands::regress::execute(args),
        Command::Review(command) => crate::commands::review::execute(command),
        Command::Baseline(BaselineCommand::Resolve(args)) => crate::commands::baseline::execute(args),
        Command::Changeset(command) => crate::commands::changeset::execute(command),
        Command::Policy(command) => crate::commands::policy::execute(command),
        Command::Planner(command) => crate::commands::planner::execute(command),
        Command::Repair(command) => crate::commands::repair::execute(command),
        Command::Governance(command) => crate::commands::governance::execute(command),
        Command::Promotion(command) => crate::commands::promotion::execute(command),
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match dispatch(&cli.command) {
        Ok(exit_code) => exit_code,
        Err(error) => {
            crate::commands::write_stderr_line(&format!("error: {error}"));
            ExitCode::from(error.exit_code().as_process_code())
        }
    }
}
