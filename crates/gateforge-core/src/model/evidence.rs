// crates/gateforge-core/src/model/evidence.rs
// ============================================================================
// Module: Evidence Model
// Description: Output of a single backend run, the unit compared by the
//              regression engine.
// Dependencies: serde, serde_json
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::identifiers::RunId;

/// Outcome of a backend invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The backend completed without error.
    Success,
    /// The backend failed; see [`Evidence::failure_type`].
    Failure,
}

/// Structural gate outcome: boolean pass/fail on a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gate {
    /// The run satisfied every structural gate.
    Pass,
    /// The run failed at least one structural gate.
    Fail,
}

/// Taxonomy of backend failure causes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureType {
    /// The run succeeded; there is no failure to classify.
    None,
    /// The backend exceeded its wall-clock timeout.
    Timeout,
    /// The backend produced NaN or infinite values.
    NanOrInf,
    /// The backend process exited with a non-zero code.
    NonZeroExit,
    /// The backend container image or runtime could not be started.
    BackendUnavailable,
    /// An unclassified failure; `metrics`/`artifacts` may carry detail.
    Other,
}

/// Ternary smoke-check outcome: a step may be skipped when its prerequisite
/// action was not requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriState {
    /// The step ran and passed.
    True,
    /// The step ran and failed.
    False,
    /// The step was not applicable because its action was not requested.
    Na,
}

/// Measured metrics from one backend run. Known fields are named; anything
/// else the backend reports is preserved under `extra` so checkers that read
/// backend-specific metrics keep working without a schema change here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metrics {
    /// Wall-clock seconds the backend spent executing.
    pub runtime_seconds: Option<f64>,
    /// Count of discrete events the backend recorded.
    pub events: Option<u64>,
    /// Peak overshoot observed in a controlled quantity.
    pub overshoot: Option<f64>,
    /// Time to settle within tolerance of a controlled quantity.
    pub settling_time: Option<f64>,
    /// Steady-state error of a controlled quantity.
    pub steady_state_error: Option<f64>,
    /// Total energy consumed or dissipated.
    pub energy: Option<f64>,
    /// Backend-specific metrics not named above.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Version and environment identifiers for one backend run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Toolchain {
    /// Backend version string.
    pub backend_version: Option<String>,
    /// Container image the backend ran in, if any.
    pub docker_image: Option<String>,
    /// Policy profile name applied to this run's evaluation.
    pub policy_profile: Option<String>,
    /// Policy document version applied to this run's evaluation.
    pub policy_version: Option<String>,
}

/// Backend-produced side artifacts attached to evidence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceArtifacts {
    /// Tail of the backend's log output, when captured.
    pub log_excerpt: Option<String>,
}

/// Structured record of one backend execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    /// Schema version this document was authored against.
    pub schema_version: String,
    /// Identifier of the run that produced this evidence.
    pub run_id: RunId,
    /// Backend adapter that produced this evidence.
    pub backend: String,
    /// Model script the backend executed.
    pub model_script: String,
    /// Whether the backend invocation itself succeeded.
    pub status: RunStatus,
    /// Classification of the failure when `status=failure`.
    pub failure_type: FailureType,
    /// Structural gate outcome.
    pub gate: Gate,
    /// Whether the `check` step passed.
    pub check_ok: TriState,
    /// Whether the `simulate` step passed.
    pub simulate_ok: TriState,
    /// Measured metrics from the run.
    pub metrics: Metrics,
    /// Backend process exit code.
    pub exit_code: i32,
    /// Version and environment identifiers for this run.
    pub toolchain: Toolchain,
    /// Backend-produced side artifacts.
    #[serde(default)]
    pub artifacts: EvidenceArtifacts,
}

impl Evidence {
    /// Returns `true` when this evidence satisfies Testable Property 1:
    /// `gate=PASS ⇔ status=success ∧ check_ok ∧ simulate_ok` and
    /// `failure_type=none ⇔ status=success`.
    #[must_use]
    pub fn satisfies_gate_invariant(&self) -> bool {
        let checks_pass = self.status == RunStatus::Success
            && self.check_ok != TriState::False
            && self.simulate_ok != TriState::False;
        let gate_matches_checks = (self.gate == Gate::Pass) == checks_pass;
        let failure_matches_status =
            (self.failure_type == FailureType::None) == (self.status == RunStatus::Success);
        gate_matches_checks && failure_matches_status
    }
}

#[cfg(test)]
mod tests {
    use super::Evidence;
    use super::EvidenceArtifacts;
    use super::FailureType;
    use super::Gate;
    use super::Metrics;
    use super::RunStatus;
    use super::Toolchain;
    use super::TriState;
    use crate::identifiers::RunId;

    fn base(status: RunStatus, gate: Gate, failure_type: FailureType) -> Evidence {
        Evidence {
            schema_version: "1".to_string(),
            run_id: RunId::new("r-1"),
            backend: "mock".to_string(),
            model_script: "s.mo".to_string(),
            status,
            failure_type,
            gate,
            check_ok: TriState::True,
            simulate_ok: TriState::True,
            metrics: Metrics::default(),
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

    #[test]
    fn success_with_pass_gate_satisfies_invariant() {
        assert!(base(RunStatus::Success, Gate::Pass, FailureType::None).satisfies_gate_invariant());
    }

    #[test]
    fn pass_gate_with_failure_status_violates_invariant() {
        assert!(
            !base(RunStatus::Failure, Gate::Pass, FailureType::Timeout).satisfies_gate_invariant()
        );
    }

    #[test]
    fn success_status_with_failure_type_set_violates_invariant() {
        assert!(
            !base(RunStatus::Success, Gate::Fail, FailureType::Timeout).satisfies_gate_invariant()
        );
    }
}
