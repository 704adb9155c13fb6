// crates/gateforge-cli/src/commands/mod.rs
// ============================================================================
// Module: Command Implementations
// Description: One submodule per CLI command family, plus the shared
//              input/output helpers they all use.
// Purpose: Keep `main.rs` to argument parsing and dispatch; every command's
//          actual work calls straight into `gateforge-engine`.
// Dependencies: gateforge-core, serde, serde_json
// ============================================================================

pub mod baseline;
pub mod changeset;
pub mod governance;
pub mod planner;
pub mod policy;
pub mod promotion;
pub mod regress;
pub mod repair;
pub mod review;
pub mod run;

use std::io::Write as _;
use std::path::Path;

use gateforge_core::io::write_json_atomic;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CliError;

/// Reads and deserializes a JSON artifact, wrapping failures as
/// [`CliError::Core`] the way every other crate's `read_json` does.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    Ok(gateforge_core::io::read_json(path)?)
}

/// Reads a JSON artifact, rejects it against `schema` before deserializing,
/// and only then parses it into `T`. Used for the artifacts the §6 wire
/// contract names a schema for: proposals and evidence.
pub fn read_validated_json<T: DeserializeOwned>(
    path: &Path,
    schema: &serde_json::Value,
) -> Result<T, CliError> {
    let raw: serde_json::Value = gateforge_core::io::read_json(path)?;
    if let Some(message) = gateforge_core::schemas::first_error(schema, &raw) {
        return Err(CliError::Usage(format!("{}: schema validation failed: {message}", path.display())));
    }
    serde_json::from_value(raw)
        .map_err(|err| CliError::Usage(format!("{}: {err}", path.display())))
}

/// Writes `value` as the command's JSON result: always echoed to stdout as
/// pretty-printed JSON, and additionally persisted atomically to `out` when
/// given.
pub fn emit_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<(), CliError> {
    if let Some(path) = out {
        write_json_atomic(path, value)?;
    }
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
    write_stdout_line(&pretty);
    Ok(())
}

/// Writes a markdown report to `path` when `--report` was given. Rendering
/// itself is a pure function in [`crate::report`]; this just persists it.
pub fn emit_report(markdown: Option<String>, path: Option<&Path>) -> Result<(), CliError> {
    let (Some(markdown), Some(path)) = (markdown, path) else {
        return Ok(());
    };
    std::fs::write(path, markdown).map_err(|source| gateforge_core::CoreError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(())
}

/// Writes one line to stdout, ignoring a closed pipe the way a CLI tool
/// should (no panic on `| head`).
pub fn write_stdout_line(line: &str) {
    let mut stdout = std::io::stdout();
    let _ = writeln!(stdout, "{line}");
}

/// Writes one line to stderr, ignoring a closed pipe.
pub fn write_stderr_line(line: &str) {
    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "{line}");
}

/// The directory a path lives in, or `.` when `path` has no parent.
pub fn parent_dir(path: &Path) -> std::path::PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_else(|| std::path::PathBuf::from("."))
}

/// Resolves a policy document from an explicit `--policy` path or a
/// `--policy-profile` name against `policies_dir`, returning the policy
/// together with the path string recorded on every artifact it produces.
pub fn load_policy(
    policy_path: Option<&Path>,
    policy_profile: Option<&str>,
    policies_dir: &Path,
) -> Result<(gateforge_config::Policy, String), CliError> {
    if let Some(path) = policy_path {
        let policy = gateforge_config::Policy::load_path(path)?;
        return Ok((policy, path.display().to_string()));
    }
    let profile = policy_profile.unwrap_or("default");
    let policy = gateforge_config::Policy::load_profile(policies_dir, profile)?;
    Ok((policy, policies_dir.join(format!("{profile}.json")).display().to_string()))
}

/// Maps a [`gateforge_core::Decision`] to the §6 exit code contract: only
/// PASS is a clean success.
#[must_use]
pub fn decision_exit_code(decision: gateforge_core::Decision) -> gateforge_core::ExitCode {
    if decision == gateforge_core::Decision::Pass {
        gateforge_core::ExitCode::Success
    } else {
        gateforge_core::ExitCode::LogicalFailure
    }
}

/// Maps a [`gateforge_core::model::run_summary::RunStatus`] to the §6 exit
/// code contract: only PASS is a clean success.
#[must_use]
pub fn run_status_exit_code(status: gateforge_core::model::run_summary::RunStatus) -> gateforge_core::ExitCode {
    if status == gateforge_core::model::run_summary::RunStatus::Pass {
        gateforge_core::ExitCode::Success
    } else {
        gateforge_core::ExitCode::LogicalFailure
    }
}
