// crates/gateforge-core/src/model/proposal.rs
// ============================================================================
// Module: Proposal Model
// Description: The declared intent that enters the governance pipeline.
// Dependencies: serde, serde_json
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::decision::RiskLevel;
use crate::identifiers::ProposalId;

/// A pipeline action a run may be asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestedAction {
    /// Validate the proposal and its change-set without executing a backend.
    Check,
    /// Execute the backend to produce evidence.
    Simulate,
    /// Compare the resulting evidence against a baseline.
    Regress,
}

/// A reference to a change-set artifact attached to a proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeSetRef {
    /// Path to the change-set document, relative to the proposal's directory.
    pub path: String,
}

/// A single physical invariant a candidate's metrics must satisfy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PhysicalInvariant {
    /// The named metric must fall within `[min, max]`.
    Range {
        /// Metric name the invariant constrains.
        metric: String,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },
    /// The named metric must move monotonically in the given direction.
    Monotonic {
        /// Metric name the invariant constrains.
        metric: String,
        /// Required direction of travel.
        direction: MonotonicDirection,
    },
    /// The named metric must not change by more than `max_delta` from baseline.
    BoundedDelta {
        /// Metric name the invariant constrains.
        metric: String,
        /// Maximum allowed absolute change from the baseline value.
        max_delta: f64,
    },
}

/// Direction a `Monotonic` invariant requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonotonicDirection {
    /// Candidate value must be greater than or equal to baseline.
    NonDecreasing,
    /// Candidate value must be less than or equal to baseline.
    NonIncreasing,
}

/// Declared intent to run a simulation change through the governance
/// pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    /// Stable identifier carried by every artifact derived from this proposal.
    pub proposal_id: ProposalId,
    /// Schema version this document was authored against.
    pub schema_version: String,
    /// Backend adapter the proposal targets, e.g. `"mock"` or `"openmodelica"`.
    pub backend: String,
    /// Model script path the backend should execute.
    pub model_script: String,
    /// Pipeline actions this run should perform.
    pub requested_actions: BTreeSet<RequestedAction>,
    /// Declared risk level, required whenever a policy overlay decision is derived.
    pub risk_level: RiskLevel,
    /// Declared set of checkers to run; absent/empty means all built-ins.
    #[serde(default)]
    pub checkers: Vec<String>,
    /// Per-checker configuration, keyed by checker name or `"_runtime"`.
    #[serde(default)]
    pub checker_config: BTreeMap<String, Value>,
    /// Optional reference to a change-set document to apply before running.
    #[serde(default)]
    pub change_set: Option<ChangeSetRef>,
    /// Physical invariants the candidate's metrics must satisfy.
    #[serde(default)]
    pub physical_invariants: Vec<PhysicalInvariant>,
}

impl Proposal {
    /// Returns `true` when `name` is an allowed key in `checker_config`: a
    /// declared checker name or the reserved `_runtime` key.
    #[must_use]
    pub fn allows_checker_config_key(&self, name: &str) -> bool {
        name == "_runtime" || self.checkers.is_empty() || self.checkers.iter().any(|c| c == name)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::Proposal;
    use super::RequestedAction;
    use crate::decision::RiskLevel;
    use crate::identifiers::ProposalId;

    fn sample() -> Proposal {
        Proposal {
            proposal_id: ProposalId::new("p-1"),
            schema_version: "1".to_string(),
            backend: "mock".to_string(),
            model_script: "script.mo".to_string(),
            requested_actions: BTreeSet::from([RequestedAction::Check, RequestedAction::Regress]),
            risk_level: RiskLevel::Low,
            checkers: vec!["timeout".to_string()],
            checker_config: Default::default(),
            change_set: None,
            physical_invariants: Vec::new(),
        }
    }

    #[test]
    fn runtime_key_always_allowed() {
        assert!(sample().allows_checker_config_key("_runtime"));
    }

    #[test]
    fn undeclared_checker_key_is_rejected_when_checkers_is_explicit() {
        assert!(!sample().allows_checker_config_key("nan_inf"));
    }
}
