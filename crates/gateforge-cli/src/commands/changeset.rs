// crates/gateforge-cli/src/commands/changeset.rs
// ============================================================================
// Module: `changeset` Command
// Description: Preflight validation, hashing, and direct application of a
//              change-set document, per §4.4's change-set applier.
// Dependencies: gateforge-engine
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Subcommand;
use gateforge_engine::changeset::ChangeSet;
use serde::Serialize;

use super::emit_json;
use crate::error::CliError;

/// Subcommands under `changeset`.
#[derive(Subcommand, Debug)]
pub enum ChangeSetCommand {
    /// Validates every operation's path against the allowed roots without
    /// applying anything.
    Preflight(PreflightArgs),
    /// Computes the change-set's stable hash.
    Hash(HashArgs),
    /// Applies the change-set under a workspace root.
    Apply(ApplyArgs),
}

/// Arguments shared by every `changeset` subcommand.
#[derive(Args, Debug)]
pub struct PreflightArgs {
    /// Path to the change-set document.
    #[arg(long)]
    pub change_set: PathBuf,
    /// Path roots the change-set is allowed to touch; unset means any root
    /// is allowed.
    #[arg(long = "allowed-root")]
    pub allowed_roots: Vec<String>,
}

/// Arguments for `changeset hash`.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Path to the change-set document.
    #[arg(long)]
    pub change_set: PathBuf,
    /// Write the hash document to this path in addition to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Arguments for `changeset apply`.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Path to the change-set document.
    #[arg(long)]
    pub change_set: PathBuf,
    /// Path roots the change-set is allowed to touch; unset means any root
    /// is allowed.
    #[arg(long = "allowed-root")]
    pub allowed_roots: Vec<String>,
    /// Workspace root the change-set's paths are applied under.
    #[arg(long)]
    pub workspace_root: PathBuf,
    /// Write the apply result document to this path in addition to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct HashResult {
    hash: String,
}

#[derive(Debug, Serialize)]
struct ApplyResult {
    operations_applied: u64,
    hash: String,
}

/// Dispatches a `changeset` subcommand.
///
/// # Errors
///
/// Returns [`CliError`] when the change-set document cannot be read, fails
/// preflight validation, or fails to apply cleanly.
pub fn execute(command: &ChangeSetCommand) -> Result<ExitCode, CliError> {
    match command {
        ChangeSetCommand::Preflight(args) => preflight(args),
        ChangeSetCommand::Hash(args) => hash(args),
        ChangeSetCommand::Apply(args) => apply(args),
    }
}

fn preflight(args: &PreflightArgs) -> Result<ExitCode, CliError> {
    let change_set = ChangeSet::load(&args.change_set)?;
    change_set.preflight(&args.allowed_roots)?;
    Ok(ExitCode::SUCCESS)
}

fn hash(args: &HashArgs) -> Result<ExitCode, CliError> {
    let change_set = ChangeSet::load(&args.change_set)?;
    let result = HashResult { hash: change_set.compute_hash().to_string() };
    emit_json(&result, args.out.as_deref())?;
    Ok(ExitCode::SUCCESS)
}

fn apply(args: &ApplyArgs) -> Result<ExitCode, CliError> {
    let change_set = ChangeSet::load(&args.change_set)?;
    change_set.preflight(&args.allowed_roots)?;
    let operations_applied = change_set.apply(&args.workspace_root)?;
    let result = ApplyResult { operations_applied, hash: change_set.compute_hash().to_string() };
    emit_json(&result, args.out.as_deref())?;
    Ok(ExitCode::SUCCESS)
}
