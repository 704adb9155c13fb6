// crates/gateforge-engine/src/changeset.rs
// ============================================================================
// Module: Change-Set Applier
// Description: Deterministic, hashable file patch with preflight validation.
// Dependencies: gateforge-core
// ============================================================================

//! ## Overview
//! A [`ChangeSet`] is an ordered list of file operations a proposal asks the
//! orchestrator to apply before running a backend. `preflight` rejects
//! anything that would write outside the declared workspace or clobber a
//! path it shouldn't; `compute_hash` derives a stable digest over the
//! ordered operation tuples so two equivalent change-sets always hash
//! identically; `apply` performs the writes with the same write-to-sibling
//! then rename pattern used elsewhere for atomic artifact writes.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use gateforge_core::hashing::hash_ordered_strings;
use gateforge_core::hashing::HashDigest;
use serde::Deserialize;
use serde::Serialize;

use crate::error::EngineError;

/// A single file operation within a change-set, applied in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ChangeOperation {
    /// Writes `contents` to `path`, creating parent directories as needed.
    WriteFile {
        /// Path relative to the workspace root.
        path: String,
        /// Full file contents to write.
        contents: String,
    },
    /// Deletes the file at `path` if it exists; a no-op otherwise.
    DeleteFile {
        /// Path relative to the workspace root.
        path: String,
    },
}

impl ChangeOperation {
    fn path(&self) -> &str {
        match self {
            Self::WriteFile { path, .. } | Self::DeleteFile { path } => path,
        }
    }

    /// Renders this operation as a stable tuple string used for hashing.
    fn as_hash_tuple(&self) -> String {
        match self {
            Self::WriteFile { path, contents } => {
                format!("write_file\x1f{path}\x1f{contents}")
            }
            Self::DeleteFile { path } => format!("delete_file\x1f{path}"),
        }
    }
}

/// An ordered set of file operations attached to a proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Operations applied in declaration order.
    #[serde(default)]
    pub operations: Vec<ChangeOperation>,
}

impl ChangeSet {
    /// Loads a change-set document from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Core`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        gateforge_core::io::read_json(path).map_err(EngineError::from)
    }

    /// Validates every operation's path against `allowed_roots`: each path
    /// must be relative, contain no `..` component, and start with one of
    /// the allowed root prefixes (an empty `allowed_roots` permits any
    /// relative path).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ChangeSetApplyFailed`] naming the first
    /// offending path.
    pub fn preflight(&self, allowed_roots: &[String]) -> Result<(), EngineError> {
        for operation in &self.operations {
            let path = operation.path();
            let candidate = Path::new(path);
            if candidate.is_absolute() {
                return Err(EngineError::ChangeSetApplyFailed(format!(
                    "absolute path not allowed: {path}"
                )));
            }
            if candidate.components().any(|c| c.as_os_str() == "..") {
                return Err(EngineError::ChangeSetApplyFailed(format!(
                    "path traversal not allowed: {path}"
                )));
            }
            if !allowed_roots.is_empty() && !allowed_roots.iter().any(|root| path.starts_with(root.as_str())) {
                return Err(EngineError::ChangeSetApplyFailed(format!(
                    "path outside allowed roots: {path}"
                )));
            }
        }
        let mut seen = BTreeSet::new();
        for operation in &self.operations {
            if !seen.insert(operation.path().to_string()) {
                return Err(EngineError::ChangeSetApplyFailed(format!(
                    "duplicate path in change-set: {}",
                    operation.path()
                )));
            }
        }
        Ok(())
    }

    /// Computes a stable hash over the ordered operation tuples, so two
    /// change-sets with the same operations in the same order always hash
    /// identically regardless of how they were loaded.
    #[must_use]
    pub fn compute_hash(&self) -> HashDigest {
        let tuples: Vec<String> = self.operations.iter().map(ChangeOperation::as_hash_tuple).collect();
        hash_ordered_strings(tuples.iter().map(String::as_str))
    }

    /// Applies every operation under `workspace_root`, in order, and returns
    /// the number of operations applied. Writes are made atomic by writing
    /// to a sibling file first and renaming it into place, so a crash
    /// mid-apply never leaves a partially-written file visible at its final
    /// path.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ChangeSetApplyFailed`] on the first operation
    /// that fails; operations already applied are not rolled back.
    pub fn apply(&self, workspace_root: &Path) -> Result<u64, EngineError> {
        let mut applied = 0u64;
        for operation in &self.operations {
            match operation {
                ChangeOperation::WriteFile { path, contents } => {
                    write_file_atomic(&workspace_root.join(path), contents)?;
                }
                ChangeOperation::DeleteFile { path } => {
                    let target = workspace_root.join(path);
                    if target.exists() {
                        fs::remove_file(&target).map_err(|err| {
                            EngineError::ChangeSetApplyFailed(format!("delete {path} failed: {err}"))
                        })?;
                    }
                }
            }
            applied += 1;
        }
        Ok(applied)
    }
}

fn write_file_atomic(target: &Path, contents: &str) -> Result<(), EngineError> {
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .map_err(|err| EngineError::ChangeSetApplyFailed(format!("mkdir {}: {err}", parent.display())))?;
    let sibling = sibling_path(target);
    fs::write(&sibling, contents)
        .map_err(|err| EngineError::ChangeSetApplyFailed(format!("write {}: {err}", sibling.display())))?;
    fs::rename(&sibling, target).map_err(|err| {
        let _ = fs::remove_file(&sibling);
        EngineError::ChangeSetApplyFailed(format!("rename into {}: {err}", target.display()))
    })
}

fn sibling_path(target: &Path) -> PathBuf {
    let file_name = target.file_name().and_then(|n| n.to_str()).unwrap_or("changeset-write");
    target.with_file_name(format!(".{file_name}.gateforge-tmp"))
}
