// crates/gateforge-config/src/policy.rs
// ============================================================================
// Module: Policy Overlay Document
// Description: The declarative reason+risk → decision map and its by-name
//              or by-path loader.
// Purpose: Implement §4.3's policy schema and derivation rules as a table
//          lookup rather than string-matching logic, per the §9 design note
//          "policy tables become declarative maps indexed by reason and
//          risk; new reasons are added by editing the map, not the overlay
//          logic."
// Dependencies: gateforge-core, serde, serde_json
// ============================================================================

//! ## Overview
//! A [`Policy`] document is loaded once per command invocation, either by
//! profile name (resolved against `policies_dir/<profile>.json`) or by an
//! explicit path. [`Policy::overlay`] is the single function implementing
//! the four-rule derivation from §4.3, shared by every caller (`regress`,
//! the repair loop, profile compare) so the overlay's behavior never drifts
//! between call sites.

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use gateforge_core::Decision;
use gateforge_core::RiskLevel;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;

/// Per-risk decision row, keyed by the lowercase risk level name.
pub type ByRisk<T> = BTreeMap<String, T>;

/// A policy overlay document: reasons + risk level → decision, per §4.3.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Policy {
    /// Reasons that always force FAIL regardless of risk level.
    #[serde(default)]
    pub critical_reasons: Vec<String>,
    /// Decision to apply when the only reasons present are `runtime_regression:*`,
    /// keyed by risk level.
    #[serde(default)]
    pub runtime_only_policy_by_risk: ByRisk<Decision>,
    /// Per-reason, per-risk decision contribution.
    #[serde(default)]
    pub reason_to_decision_by_risk: BTreeMap<String, ByRisk<Decision>>,
    /// Human checks required on a NEEDS_REVIEW decision, keyed by risk level.
    #[serde(default)]
    pub required_human_checks_by_risk: ByRisk<Vec<String>>,
    /// Human checks suggested in dry-run mode, keyed by risk level.
    #[serde(default)]
    pub dry_run_human_checks_by_risk: ByRisk<Vec<String>>,
    /// Minimum planner confidence to auto-apply a change-plan without review.
    #[serde(default)]
    pub min_confidence_auto_apply: Option<f64>,
    /// Minimum planner confidence to accept a change-plan at all.
    #[serde(default)]
    pub min_confidence_accept: Option<f64>,
    /// Policy document version, surfaced on every artifact it produced.
    #[serde(default = "default_policy_version")]
    pub policy_version: String,
}

fn default_policy_version() -> String {
    "0".to_string()
}

/// Outcome of applying a policy overlay to a set of reasons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyOverlayResult {
    /// Decision derived from the reasons, risk level, and policy document.
    pub decision: Decision,
    /// Reasons the overlay itself contributed (e.g. none today, but kept
    /// distinct from the checker/structural reasons it was handed).
    pub policy_reasons: Vec<String>,
    /// Human checks required, non-empty iff `decision=NeedsReview`.
    pub required_human_checks: Vec<String>,
}

impl Policy {
    /// Loads a policy document from an explicit file path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Core`] when the file cannot be read or parsed.
    pub fn load_path(path: &Path) -> Result<Self, ConfigError> {
        gateforge_core::io::read_json(path).map_err(ConfigError::from)
    }

    /// Resolves a policy profile name against `policies_dir/<profile>.json`
    /// and loads it. Profile names are taken verbatim (per §9's Open
    /// Question: `industrial_strict` and `industrial_strict_v0` are
    /// distinct file names even though they denote the same logical
    /// profile; this resolver never aliases one to the other).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownPolicyProfile`] when no such file
    /// exists, or [`ConfigError::Core`] when it exists but fails to parse.
    pub fn load_profile(policies_dir: &Path, profile: &str) -> Result<Self, ConfigError> {
        let path = profile_path(policies_dir, profile);
        if !path.exists() {
            return Err(ConfigError::UnknownPolicyProfile(profile.to_string()));
        }
        Self::load_path(&path)
    }

    /// Applies the four derivation rules from §4.3, first match wins:
    /// 1. any reason in `critical_reasons` ⇒ FAIL;
    /// 2. reason-specific by-risk contributions, worst wins;
    /// 3. runtime-only reasons ⇒ `runtime_only_policy_by_risk[risk]`;
    /// 4. no reasons ⇒ PASS.
    #[must_use]
    pub fn overlay(&self, reasons: &[String], risk: RiskLevel) -> PolicyOverlayResult {
        let risk_key = risk.to_string();

        if reasons.iter().any(|reason| self.critical_reasons.contains(reason)) {
            return self.finish(Decision::Fail, &risk_key);
        }

        let mut contributions: Vec<Decision> = Vec::new();
        for reason in reasons {
            if let Some(by_risk) = self.reason_to_decision_by_risk.get(reason)
                && let Some(decision) = by_risk.get(&risk_key)
            {
                contributions.push(*decision);
            }
        }
        if let Some(worst) = contributions.into_iter().reduce(Decision::worst_of) {
            return self.finish(worst, &risk_key);
        }

        if !reasons.is_empty() && reasons.iter().all(|reason| is_runtime_reason(reason)) {
            let decision =
                self.runtime_only_policy_by_risk.get(&risk_key).copied().unwrap_or(Decision::Pass);
            return self.finish(decision, &risk_key);
        }

        if reasons.is_empty() {
            return self.finish(Decision::Pass, &risk_key);
        }

        // Reasons were present but none matched a critical, by-risk, or
        // runtime-only rule: default to NEEDS_REVIEW so an unrecognized
        // reason never silently resolves to PASS.
        self.finish(Decision::NeedsReview, &risk_key)
    }

    fn finish(&self, decision: Decision, risk_key: &str) -> PolicyOverlayResult {
        PolicyOverlayResult {
            decision,
            policy_reasons: Vec::new(),
            required_human_checks: self.required_human_checks_for(decision, risk_key),
        }
    }

    /// Returns the human checks required for `decision` at `risk`'s profile
    /// row, by the same lookup `overlay` uses internally. Non-empty only
    /// when `decision=NeedsReview`. Exposed so callers that already hold a
    /// decision (e.g. the run orchestrator building a `RunSummary`) can
    /// derive this without re-running the full overlay.
    #[must_use]
    pub fn required_human_checks_for(&self, decision: Decision, risk: impl ToString) -> Vec<String> {
        if decision != Decision::NeedsReview {
            return Vec::new();
        }
        self.required_human_checks_by_risk.get(&risk.to_string()).cloned().unwrap_or_default()
    }
}

/// Returns `true` for reasons of the form `runtime_regression:*`.
fn is_runtime_reason(reason: &str) -> bool {
    reason.starts_with("runtime_regression:")
}

fn profile_path(policies_dir: &Path, profile: &str) -> PathBuf {
    policies_dir.join(format!("{profile}.json"))
}
