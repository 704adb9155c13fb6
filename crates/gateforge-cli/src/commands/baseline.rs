// crates/gateforge-cli/src/commands/baseline.rs
// ============================================================================
// Module: `baseline` Command
// Description: Resolves a `(backend, model_script)` pair against a baseline
//              index, per §4.1.
// Dependencies: gateforge-config
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use gateforge_config::BaselineIndex;
use serde::Serialize;

use super::emit_json;
use super::parent_dir;
use crate::error::CliError;

/// Arguments for the `baseline resolve` command.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Path to `baselines/index.json`.
    #[arg(long)]
    pub index: PathBuf,
    /// Backend adapter name to resolve for.
    #[arg(long)]
    pub backend: String,
    /// Model script path to resolve for.
    #[arg(long)]
    pub model_script: String,
    /// Write the resolved path document to this path in addition to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ResolvedBaseline {
    backend: String,
    model_script: String,
    baseline_path: String,
}

/// Executes the `baseline resolve` command.
///
/// # Errors
///
/// Returns [`CliError`] when the index cannot be loaded or no entry matches
/// the requested `(backend, model_script)` pair.
pub fn execute(args: &ResolveArgs) -> Result<ExitCode, CliError> {
    let index = BaselineIndex::load(&args.index)?;
    let index_dir = parent_dir(&args.index);
    let resolved_path = index.resolve_path(&index_dir, &args.backend, &args.model_script)?;
    let resolved = ResolvedBaseline {
        backend: args.backend.clone(),
        model_script: args.model_script.clone(),
        baseline_path: resolved_path.display().to_string(),
    };
    emit_json(&resolved, args.out.as_deref())?;
    Ok(ExitCode::SUCCESS)
}
