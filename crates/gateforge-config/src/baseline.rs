// crates/gateforge-config/src/baseline.rs
// ============================================================================
// Module: Baseline Resolver
// Description: Maps (backend, model_script) to a baseline evidence path.
// Purpose: Implement §4.4's `auto` baseline resolution as a pure function of
//          `baselines/index.json` and the requested (backend, model_script).
// Dependencies: gateforge-core, serde, serde_json
// ============================================================================

//! ## Overview
//! `baselines/index.json` is a flat array of entries, each naming the
//! `(backend, model_script)` pair it covers and the baseline evidence path
//! to use. Resolution is a pure lookup (Testable Property 9): the same
//! index and request always resolve to the same path, and a miss surfaces
//! as `baseline_not_found` rather than a panic or an empty-baseline guess.

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;

/// One entry in the baseline index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineIndexEntry {
    /// Backend adapter this baseline was recorded for.
    pub backend: String,
    /// Model script this baseline was recorded for.
    pub model_script: String,
    /// Path to the baseline evidence artifact, relative to the index file.
    pub baseline_path: String,
}

/// The full baseline index: every known `(backend, model_script)` mapping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BaselineIndex {
    /// Every recorded baseline entry.
    #[serde(default)]
    pub entries: Vec<BaselineIndexEntry>,
}

impl BaselineIndex {
    /// Loads the baseline index from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Core`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        gateforge_core::io::read_json(path).map_err(ConfigError::from)
    }

    /// Resolves the baseline path for `(backend, model_script)`, relative to
    /// this index's declared directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BaselineNotFound`] when no entry matches.
    pub fn resolve(&self, backend: &str, model_script: &str) -> Result<&str, ConfigError> {
        self.entries
            .iter()
            .find(|entry| entry.backend == backend && entry.model_script == model_script)
            .map(|entry| entry.baseline_path.as_str())
            .ok_or_else(|| ConfigError::BaselineNotFound {
                backend: backend.to_string(),
                model_script: model_script.to_string(),
            })
    }

    /// Resolves the baseline path and joins it against `index_dir` to
    /// produce an absolute-or-relative filesystem path callers can read
    /// directly.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BaselineNotFound`] when no entry matches.
    pub fn resolve_path(
        &self,
        index_dir: &Path,
        backend: &str,
        model_script: &str,
    ) -> Result<PathBuf, ConfigError> {
        let relative = self.resolve(backend, model_script)?;
        Ok(index_dir.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::BaselineIndex;
    use super::BaselineIndexEntry;

    fn sample() -> BaselineIndex {
        BaselineIndex {
            entries: vec![BaselineIndexEntry {
                backend: "mock".to_string(),
                model_script: "script.mo".to_string(),
                baseline_path: "evidence/mock-script.json".to_string(),
            }],
        }
    }

    #[test]
    fn resolves_known_pair() {
        let index = sample();
        assert_eq!(index.resolve("mock", "script.mo").expect("resolve"), "evidence/mock-script.json");
    }

    #[test]
    fn unknown_pair_is_baseline_not_found() {
        let index = sample();
        assert!(index.resolve("mock", "other.mo").is_err());
    }
}
