// crates/gateforge-backend/src/workspace.rs
// ============================================================================
// Module: Scoped Backend Workspace
// Description: A temp directory allocated per backend invocation and
//              released on every exit path.
// Purpose: Satisfy §5's requirement that a backend run "owns its workspace"
//          and mutates nothing outside it.
// Dependencies: tempfile
// ============================================================================

//! ## Overview
//! [`ScopedWorkspace`] wraps a [`tempfile::TempDir`]. Its `Drop`
//! implementation is `tempfile`'s own best-effort recursive removal, so the
//! workspace is released whether the backend invocation returned success,
//! failure, or unwound through an early return — no explicit cleanup call
//! is required at any call site, matching the teacher's source/sink tests'
//! reliance on `tempfile`'s drop-based cleanup rather than hand-rolled
//! teardown.

use std::path::Path;
use std::path::PathBuf;

use tempfile::TempDir;

use crate::error::BackendError;

/// A temp-directory workspace scoped to one backend invocation.
pub struct ScopedWorkspace {
    dir: TempDir,
}

impl ScopedWorkspace {
    /// Allocates a fresh workspace under the system temp directory.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Workspace`] if the directory cannot be
    /// created.
    pub fn new() -> Result<Self, BackendError> {
        let dir = tempfile::Builder::new().prefix("gateforge-run-").tempdir()?;
        Ok(Self { dir })
    }

    /// Returns the workspace's root path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Joins `relative` against the workspace root.
    #[must_use]
    pub fn join(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::ScopedWorkspace;

    #[test]
    fn workspace_directory_exists_while_held() {
        let workspace = ScopedWorkspace::new().expect("workspace");
        assert!(workspace.path().exists());
    }

    #[test]
    fn workspace_directory_is_removed_on_drop() {
        let workspace = ScopedWorkspace::new().expect("workspace");
        let path = workspace.path().to_path_buf();
        drop(workspace);
        assert!(!path.exists());
    }
}
