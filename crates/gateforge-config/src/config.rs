// crates/gateforge-config/src/config.rs
// ============================================================================
// Module: GateForge Runtime Configuration
// Description: Layered defaults for thresholds, paths, and worker pool size.
// Purpose: Resolve runtime settings in precedence order: CLI flag >
//          environment variable > config file > built-in default.
// Dependencies: gateforge-core, serde, toml
// ============================================================================

//! ## Overview
//! [`GateForgeConfig`] is the TOML-loadable struct backing every numeric
//! threshold and path default the engine needs. Resolution follows the
//! teacher's layered-default style: construct the built-in defaults, merge
//! a config file's overrides on top if one is given, then let each call site
//! apply its own environment-variable and CLI-flag overrides via the
//! `resolve_*` helpers below, since those overrides are command-specific
//! (e.g. `--runtime-threshold` only exists on `regress`).

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;

/// Recognized environment variable overriding the default policy profile.
pub const ENV_POLICY_PROFILE: &str = "POLICY_PROFILE";
/// Recognized environment variable overriding the default runtime threshold.
pub const ENV_RUNTIME_THRESHOLD: &str = "GATEFORGE_RUNTIME_THRESHOLD";
/// Recognized environment variable enabling strict model-script comparison.
pub const ENV_STRICT_MODEL_SCRIPT: &str = "GATEFORGE_STRICT_MODEL_SCRIPT";
/// Recognized environment variable naming the OpenModelica container image.
pub const ENV_OM_IMAGE: &str = "GATEFORGE_OM_IMAGE";
/// Recognized environment variable naming the OpenModelica entry script.
pub const ENV_OM_SCRIPT: &str = "GATEFORGE_OM_SCRIPT";

/// Default fractional runtime regression threshold (+20%).
pub const DEFAULT_RUNTIME_THRESHOLD: f64 = 0.20;
/// Default worker pool size for repair batch / profile compare execution.
pub const DEFAULT_WORKER_POOL_SIZE: usize = 1;
/// Default worsening-streak alert threshold for governance history windows,
/// per the §9 Open Question this expansion pins at 3.
pub const DEFAULT_WORSENING_STREAK_ALERT_THRESHOLD: usize = 3;
/// Default policy profile name when no flag or environment override applies.
pub const DEFAULT_POLICY_PROFILE: &str = "default";

/// Layered runtime configuration for the GateForge engine and CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateForgeConfig {
    /// Default fractional runtime regression threshold.
    pub runtime_threshold: f64,
    /// Default policy profile name.
    pub default_policy_profile: String,
    /// Path to the baseline index (`baselines/index.json`).
    pub baseline_index_path: PathBuf,
    /// Directory containing policy documents.
    pub policies_dir: PathBuf,
    /// Worker pool size for repair batch / profile compare execution.
    pub worker_pool_size: usize,
    /// Worsening-streak alert threshold for governance history windows.
    pub worsening_streak_alert_threshold: usize,
    /// Whether strict model-script comparison is enabled by default.
    pub strict_model_script: bool,
}

impl Default for GateForgeConfig {
    fn default() -> Self {
        Self {
            runtime_threshold: DEFAULT_RUNTIME_THRESHOLD,
            default_policy_profile: DEFAULT_POLICY_PROFILE.to_string(),
            baseline_index_path: PathBuf::from("baselines/index.json"),
            policies_dir: PathBuf::from("policies"),
            worker_pool_size: DEFAULT_WORKER_POOL_SIZE,
            worsening_streak_alert_threshold: DEFAULT_WORSENING_STREAK_ALERT_THRESHOLD,
            strict_model_script: false,
        }
    }
}

impl GateForgeConfig {
    /// Loads configuration from a TOML file, falling back to built-in
    /// defaults for any field the file omits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Core`] if the file cannot be read, or
    /// [`ConfigError::InvalidToml`] if its contents are not valid TOML for
    /// this struct.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| {
            ConfigError::Core(gateforge_core::CoreError::Io {
                path: path.display().to_string(),
                source,
            })
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::InvalidToml {
            path: path.display().to_string(),
            source,
        })
    }

    /// Applies the recognized environment variable overrides on top of this
    /// configuration, returning the merged result. CLI flags still take
    /// final precedence and are applied by the caller after this step.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var(ENV_POLICY_PROFILE) {
            self.default_policy_profile = value;
        }
        if let Ok(value) = std::env::var(ENV_RUNTIME_THRESHOLD)
            && let Ok(parsed) = value.parse::<f64>()
        {
            self.runtime_threshold = parsed;
        }
        if let Ok(value) = std::env::var(ENV_STRICT_MODEL_SCRIPT) {
            self.strict_model_script = is_truthy(&value);
        }
        self
    }

    /// Resolves the effective runtime threshold given an optional CLI flag
    /// value, which wins over every other source when present.
    #[must_use]
    pub fn resolve_runtime_threshold(&self, cli_flag: Option<f64>) -> f64 {
        cli_flag.unwrap_or(self.runtime_threshold)
    }

    /// Resolves the effective policy profile name given an optional CLI
    /// flag value, which wins over every other source when present.
    #[must_use]
    pub fn resolve_policy_profile<'a>(&'a self, cli_flag: Option<&'a str>) -> &'a str {
        cli_flag.unwrap_or(&self.default_policy_profile)
    }

    /// Resolves the effective strict model-script flag given an optional
    /// CLI flag value, which wins over every other source when present.
    #[must_use]
    pub fn resolve_strict_model_script(&self, cli_flag: Option<bool>) -> bool {
        cli_flag.unwrap_or(self.strict_model_script)
    }
}

/// Parses common truthy spellings (`1`, `true`, `yes`, `on`) case-insensitively.
fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::GateForgeConfig;

    #[test]
    fn cli_flag_wins_over_config_default() {
        let config = GateForgeConfig::default();
        assert!((config.resolve_runtime_threshold(Some(0.5)) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn config_default_wins_when_no_cli_flag() {
        let config = GateForgeConfig::default();
        assert!(
            (config.resolve_runtime_threshold(None) - super::DEFAULT_RUNTIME_THRESHOLD).abs()
                < f64::EPSILON
        );
    }

    #[test]
    fn load_merges_partial_toml_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gateforge.toml");
        std::fs::write(&path, "runtime_threshold = 0.3\n").expect("write config");
        let config = GateForgeConfig::load(&path).expect("load");
        assert!((config.runtime_threshold - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.baseline_index_path, PathBuf::from("baselines/index.json"));
    }
}
