// crates/gateforge-engine/src/checkers/mod.rs
// ============================================================================
// Module: Checker Suite
// Description: Pluggable regression checkers over (baseline, candidate)
//              evidence pairs, per §4.2.
// Purpose: Give the regression engine a stable, config-driven set of pure
//          functions it can run in a fixed order.
// Dependencies: gateforge-core
// ============================================================================

//! ## Overview
//! Every built-in checker is a pure function over `(baseline, candidate,
//! config, invariants)` returning zero or more [`Finding`]s. The suite is
//! run in a fixed declared order ([`BUILTIN_CHECKERS`]) so reasons and
//! findings are emitted deterministically (Testable Property 3). Checker
//! selection (`proposal.checkers`, `_runtime.enable`/`disable`) and
//! per-checker config lookup both happen in [`effective_checkers`] and
//! [`checker_config_for`], shared by every caller so selection logic lives
//! in one place rather than being re-derived per command.

mod control_behavior_regression;
mod event_explosion;
mod invariant_guard;
mod nan_inf;
mod performance_regression;
mod steady_state_regression;
mod timeout;

use gateforge_core::model::evidence::Evidence;
use gateforge_core::model::proposal::PhysicalInvariant;
use gateforge_core::model::regression::Finding;
use serde_json::Value;

/// Inputs available to every checker.
pub struct CheckerContext<'a> {
    /// Baseline evidence.
    pub baseline: &'a Evidence,
    /// Candidate evidence.
    pub candidate: &'a Evidence,
    /// This checker's resolved configuration (or `Value::Null` if absent).
    pub config: &'a Value,
    /// Physical invariants declared on the proposal, consulted only by
    /// `invariant_guard`.
    pub invariants: &'a [PhysicalInvariant],
}

/// A checker function: pure over its [`CheckerContext`], returning findings.
pub type CheckerFn = fn(&CheckerContext<'_>) -> Vec<Finding>;

/// The built-in checkers in their fixed emission order, per §4.2's table.
pub const BUILTIN_CHECKERS: &[(&str, CheckerFn)] = &[
    ("timeout", timeout::check),
    ("nan_inf", nan_inf::check),
    ("performance_regression", performance_regression::check),
    ("event_explosion", event_explosion::check),
    ("steady_state_regression", steady_state_regression::check),
    ("control_behavior_regression", control_behavior_regression::check),
    ("invariant_guard", invariant_guard::check),
];

/// Resolves the effective checker list per §4.2: `proposal.checkers` is the
/// declared set; `_runtime.enable`/`disable` (an array of checker names
/// under `checker_config["_runtime"]`) adjusts it; an empty declared set
/// means every built-in is active.
#[must_use]
pub fn effective_checkers(declared: &[String], runtime_config: Option<&Value>) -> Vec<&'static str> {
    let mut active: Vec<&'static str> = if declared.is_empty() {
        BUILTIN_CHECKERS.iter().map(|(name, _)| *name).collect()
    } else {
        BUILTIN_CHECKERS
            .iter()
            .filter(|(name, _)| declared.iter().any(|d| d == name))
            .map(|(name, _)| *name)
            .collect()
    };

    if let Some(runtime) = runtime_config {
        if let Some(enabled) = runtime.get("enable").and_then(Value::as_array) {
            for name in enabled.iter().filter_map(Value::as_str) {
                if let Some((canonical, _)) = BUILTIN_CHECKERS.iter().find(|(n, _)| *n == name)
                    && !active.contains(canonical)
                {
                    active.push(canonical);
                }
            }
        }
        if let Some(disabled) = runtime.get("disable").and_then(Value::as_array) {
            let disabled_names: Vec<&str> = disabled.iter().filter_map(Value::as_str).collect();
            active.retain(|name| !disabled_names.contains(name));
        }
    }

    // Preserve the fixed declared order regardless of how `active` was
    // assembled above.
    BUILTIN_CHECKERS.iter().map(|(name, _)| *name).filter(|name| active.contains(name)).collect()
}

/// Looks up a checker's resolved configuration from
/// `proposal.checker_config[name]`, returning `Value::Null` when absent.
#[must_use]
pub fn checker_config_for<'a>(
    checker_config: &'a std::collections::BTreeMap<String, Value>,
    name: &str,
) -> &'a Value {
    const NULL: &Value = &Value::Null;
    checker_config.get(name).unwrap_or(NULL)
}

/// Runs every checker in `active` (in their fixed suite order) against
/// `baseline`/`candidate`, returning the combined findings in emission order.
#[must_use]
pub fn run_all(
    active: &[&'static str],
    baseline: &Evidence,
    candidate: &Evidence,
    checker_config: &std::collections::BTreeMap<String, Value>,
    invariants: &[PhysicalInvariant],
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (name, checker) in BUILTIN_CHECKERS {
        if !active.contains(name) {
            continue;
        }
        let context = CheckerContext {
            baseline,
            candidate,
            config: checker_config_for(checker_config, name),
            invariants,
        };
        findings.extend(checker(&context));
    }
    findings
}

/// Reads a named metric from an evidence's metrics, checking named fields
/// first and then the `extra` map (coerced to `f64`).
#[must_use]
pub fn metric_value(evidence: &Evidence, name: &str) -> Option<f64> {
    let metrics = &evidence.metrics;
    match name {
        "runtime_seconds" => metrics.runtime_seconds,
        "events" => metrics.events.map(|v| v as f64),
        "overshoot" => metrics.overshoot,
        "settling_time" => metrics.settling_time,
        "steady_state_error" => metrics.steady_state_error,
        "energy" => metrics.energy,
        other => metrics.extra.get(other).and_then(Value::as_f64),
    }
}

/// Builds a `<name>_metric_missing` informational finding.
#[must_use]
pub fn metric_missing(checker: &str, metric: &str) -> Finding {
    Finding {
        checker: checker.to_string(),
        reason: format!("{checker}_metric_missing"),
        message: format!("required metric '{metric}' was not present on the candidate or baseline"),
    }
}

/// Shared evidence fixtures for checker unit tests.
#[cfg(test)]
pub(crate) mod tests_support {
    use gateforge_core::identifiers::RunId;
    use gateforge_core::model::evidence::Evidence;
    use gateforge_core::model::evidence::EvidenceArtifacts;
    use gateforge_core::model::evidence::FailureType;
    use gateforge_core::model::evidence::Gate;
    use gateforge_core::model::evidence::Metrics;
    use gateforge_core::model::evidence::RunStatus;
    use gateforge_core::model::evidence::Toolchain;
    use gateforge_core::model::evidence::TriState;

    /// Builds a passing evidence fixture with the given runtime and event
    /// count, every other metric zeroed.
    pub(crate) fn evidence(runtime_seconds: f64, events: u64) -> Evidence {
        Evidence {
            schema_version: "1".to_string(),
            run_id: RunId::new("r-1"),
            backend: "mock".to_string(),
            model_script: "s.mo".to_string(),
            status: RunStatus::Success,
            failure_type: FailureType::None,
            gate: Gate::Pass,
            check_ok: TriState::True,
            simulate_ok: TriState::True,
            metrics: Metrics {
                runtime_seconds: Some(runtime_seconds),
                events: Some(events),
                overshoot: Some(0.0),
                settling_time: Some(0.0),
                steady_state_error: Some(0.0),
                energy: Some(0.0),
                extra: Default::default(),
            },
            exit_code: 0,
            toolchain: Toolchain {
                backend_version: None,
                docker_image: None,
                policy_profile: None,
                policy_version: None,
            },
            artifacts: EvidenceArtifacts::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::effective_checkers;
    use super::BUILTIN_CHECKERS;

    #[test]
    fn empty_declared_set_activates_every_builtin() {
        let active = effective_checkers(&[], None);
        assert_eq!(active.len(), BUILTIN_CHECKERS.len());
    }

    #[test]
    fn declared_subset_restricts_active_checkers() {
        let declared = vec!["timeout".to_string(), "nan_inf".to_string()];
        let active = effective_checkers(&declared, None);
        assert_eq!(active, vec!["timeout", "nan_inf"]);
    }

    #[test]
    fn runtime_disable_removes_a_checker() {
        let runtime = json!({"disable": ["nan_inf"]});
        let active = effective_checkers(&[], Some(&runtime));
        assert!(!active.contains(&"nan_inf"));
    }

    #[test]
    fn active_checkers_preserve_fixed_suite_order() {
        let declared = vec!["invariant_guard".to_string(), "timeout".to_string()];
        let active = effective_checkers(&declared, None);
        assert_eq!(active, vec!["timeout", "invariant_guard"]);
    }
}
