// crates/gateforge-engine/src/planner.rs
// ============================================================================
// Module: Planner + Guardrails
// Description: Turns a goal into a change-plan intent and validates it
//              against confidence and file-whitelist guardrails, per §4.5.
// Dependencies: gateforge-core, serde, serde_json
// ============================================================================

//! ## Overview
//! [`plan`] dispatches to one of three planner backends behind the same
//! public contract: [`PlannerBackend::Rule`] derives a deterministic intent
//! from the source run's reasons without any external call;
//! [`PlannerBackend::Gemini`] calls the configured model and parses its
//! response as an [`Intent`]; [`PlannerBackend::Openai`] is an explicit
//! placeholder that always reports `planner_backend_unavailable`, matching
//! §4.5's "openai (placeholder; explicitly fails with not-implemented)".
//! [`Guardrails::validate`] is the single function every backend's output
//! passes through before a repair attempt is allowed to use it.

use std::collections::BTreeMap;

use gateforge_core::model::run_summary::GuardrailDecision;
use gateforge_core::model::run_summary::GuardrailViolation;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::changeset::ChangeOperation;
use crate::changeset::ChangeSet;
use crate::error::EngineError;

/// Recognized environment variable carrying the Google Generative AI key.
pub const ENV_GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
/// Recognized environment variable carrying the OpenAI key (read only to
/// surface a clearer `planner_backend_unavailable` message).
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Which planner implementation produces an [`Intent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerBackend {
    /// Deterministic, rule-based derivation from the source run's reasons.
    Rule,
    /// Calls the configured Gemini model.
    Gemini,
    /// Explicitly unimplemented; always fails with `planner_backend_unavailable`.
    Openai,
}

impl PlannerBackend {
    /// Parses a `--planner-backend` flag value.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "rule" => Some(Self::Rule),
            "gemini" => Some(Self::Gemini),
            "openai" => Some(Self::Openai),
            _ => None,
        }
    }

    /// Returns this backend's canonical name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Rule => "rule",
            Self::Gemini => "gemini",
            Self::Openai => "openai",
        }
    }
}

/// A planner-proposed change, pending guardrail validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePlan {
    /// Planner's self-reported confidence in `[0, 1]`.
    pub confidence: f64,
    /// Paths touched by the proposed change-set operations.
    pub touched_files: Vec<String>,
    /// Planner's rationale for the proposed change.
    pub rationale: String,
}

/// Output of a planner backend: an intent awaiting guardrail validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    /// Short label for what this intent does, e.g. `"repair_runtime_regression"`.
    pub intent: String,
    /// Proposal identifier this intent was derived for, when known.
    pub proposal_id: Option<String>,
    /// Planner-specific override values merged onto the proposal's
    /// `checker_config` before the repair attempt runs.
    #[serde(default)]
    pub overrides: BTreeMap<String, Value>,
    /// The proposed change-plan, when the planner produced one.
    pub change_plan: Option<ChangePlan>,
    /// The proposed change-set draft, when the planner produced one.
    pub change_set_draft: Option<ChangeSet>,
}

/// Guardrail configuration validated against every planner-produced intent.
#[derive(Debug, Clone)]
pub struct Guardrails {
    /// Minimum accepted change-plan confidence.
    pub confidence_min: f64,
    /// Maximum accepted change-plan confidence.
    pub confidence_max: f64,
    /// Allowed path-root prefixes; empty means "any root is allowed, subject
    /// to `allowed_suffixes`/`allowed_files` still applying".
    pub allowed_roots: Vec<String>,
    /// Allowed path suffixes (e.g. `.mo`); empty means no suffix restriction.
    pub allowed_suffixes: Vec<String>,
    /// Exact-path whitelist; a touched file matching one of these is always
    /// allowed regardless of root/suffix restrictions.
    pub allowed_files: Vec<String>,
}

impl Default for Guardrails {
    fn default() -> Self {
        Self {
            confidence_min: 0.0,
            confidence_max: 1.0,
            allowed_roots: Vec::new(),
            allowed_suffixes: Vec::new(),
            allowed_files: Vec::new(),
        }
    }
}

impl Guardrails {
    /// Validates `intent` against the confidence and file-whitelist
    /// guardrails from §4.5, returning every violation found (not just the
    /// first), in the order: confidence-below-min, confidence-above-max,
    /// then one `change_plan_file_not_allowed:<path>` per disallowed path in
    /// declaration order.
    #[must_use]
    pub fn validate(&self, intent: &Intent) -> Vec<GuardrailViolation> {
        let mut violations = Vec::new();
        let Some(change_plan) = &intent.change_plan else {
            return violations;
        };

        if change_plan.confidence < self.confidence_min {
            violations.push(GuardrailViolation {
                rule_id: "change_plan_confidence_below_min".to_string(),
                message: format!(
                    "confidence {} is below the minimum {}",
                    change_plan.confidence, self.confidence_min
                ),
            });
        }
        if change_plan.confidence > self.confidence_max {
            violations.push(GuardrailViolation {
                rule_id: "change_plan_confidence_above_max".to_string(),
                message: format!(
                    "confidence {} is above the maximum {}",
                    change_plan.confidence, self.confidence_max
                ),
            });
        }

        for path in &change_plan.touched_files {
            if !self.path_is_allowed(path) {
                violations.push(GuardrailViolation {
                    rule_id: format!("change_plan_file_not_allowed:{path}"),
                    message: format!("path '{path}' is outside every allowed root/suffix/file"),
                });
            }
        }

        violations
    }

    fn path_is_allowed(&self, path: &str) -> bool {
        if self.allowed_files.iter().any(|allowed| allowed == path) {
            return true;
        }
        let root_ok = self.allowed_roots.is_empty() || self.allowed_roots.iter().any(|r| path.starts_with(r));
        let suffix_ok =
            self.allowed_suffixes.is_empty() || self.allowed_suffixes.iter().any(|s| path.ends_with(s));
        root_ok && suffix_ok
    }

    /// Resolves guardrail validation into a [`GuardrailDecision`] plus the
    /// violations, the pairing every caller (repair loop, orchestrator) uses
    /// to populate a `RunSummary`.
    #[must_use]
    pub fn decide(&self, intent: &Intent) -> (GuardrailDecision, Vec<GuardrailViolation>) {
        if intent.change_plan.is_none() {
            return (GuardrailDecision::NotApplicable, Vec::new());
        }
        let violations = self.validate(intent);
        if violations.is_empty() {
            (GuardrailDecision::Allowed, violations)
        } else {
            (GuardrailDecision::Rejected, violations)
        }
    }
}

/// Derives a rule-based repair intent from a failing run's ordered reasons.
/// Deterministic: the same reason list always produces the same intent.
#[must_use]
pub fn rule_based_intent(proposal_id: &str, reasons: &[String]) -> Intent {
    let mut overrides = BTreeMap::new();
    let mut touched_files = Vec::new();

    if reasons.iter().any(|r| r.starts_with("runtime_regression:")) {
        overrides.insert(
            "_runtime".to_string(),
            serde_json::json!({"enable": [], "disable": []}),
        );
    }
    if reasons.iter().any(|r| r == "performance_regression_detected") {
        overrides.insert(
            "performance_regression".to_string(),
            serde_json::json!({"max_ratio": 2.0}),
        );
    }
    if reasons.iter().any(|r| r.starts_with("physical_invariant_")) {
        touched_files.push("models/repair_notes.md".to_string());
    }

    Intent {
        intent: "rule_based_repair".to_string(),
        proposal_id: Some(proposal_id.to_string()),
        overrides,
        change_plan: Some(ChangePlan {
            confidence: 0.75,
            touched_files,
            rationale: format!("rule-based repair derived from reasons: {}", reasons.join(", ")),
        }),
        change_set_draft: None,
    }
}

/// Derives a conservative retry intent: tighter confidence floor and an
/// explicit whitelist taken from the prior attempt's change-plan, per
/// §4.6(e)'s retry profile.
#[must_use]
pub fn conservative_retry_intent(previous: &Intent) -> Intent {
    let mut retried = previous.clone();
    retried.intent = format!("{}_retry", previous.intent);
    if let Some(plan) = &mut retried.change_plan {
        plan.confidence = (plan.confidence + 0.1).min(0.95);
    }
    retried
}

/// Calls the Gemini planner backend, requiring `GOOGLE_API_KEY`.
///
/// # Errors
///
/// Returns [`EngineError::PlannerUnavailable`] when the API key is not
/// configured, or when the request fails or its response cannot be parsed
/// as an [`Intent`].
pub fn gemini_intent(goal: &str, proposal_id: &str) -> Result<Intent, EngineError> {
    let api_key = std::env::var(ENV_GOOGLE_API_KEY)
        .map_err(|_| EngineError::PlannerUnavailable("GOOGLE_API_KEY not configured".to_string()))?;

    let client = reqwest::blocking::Client::new();
    let url = format!(
        "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent?key={api_key}"
    );
    let request_body = serde_json::json!({
        "contents": [{"parts": [{"text": goal}]}],
    });
    let response = client
        .post(&url)
        .json(&request_body)
        .send()
        .map_err(|err| EngineError::PlannerUnavailable(format!("gemini request failed: {err}")))?;
    let body: Value = response
        .json()
        .map_err(|err| EngineError::PlannerUnavailable(format!("gemini response was not json: {err}")))?;
    let text = body
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(Value::as_str)
        .ok_or_else(|| EngineError::PlannerUnavailable("gemini response missing text".to_string()))?;

    let mut intent: Intent = serde_json::from_str(text)
        .map_err(|err| EngineError::PlannerOutputInvalid(format!("gemini output invalid: {err}")))?;
    intent.proposal_id = Some(proposal_id.to_string());
    Ok(intent)
}

/// Validates an intent document against the planner output schema: unknown
/// top-level fields are rejected with a single `planner_output_invalid`
/// violation, per §4.5.
///
/// # Errors
///
/// Returns [`EngineError::PlannerOutputInvalid`] when `raw` carries a
/// top-level field this crate's [`Intent`] does not recognize.
pub fn validate_intent_schema(raw: &Value) -> Result<(), EngineError> {
    const KNOWN_FIELDS: &[&str] =
        &["intent", "proposal_id", "overrides", "change_plan", "change_set_draft"];
    let Some(object) = raw.as_object() else {
        return Err(EngineError::PlannerOutputInvalid("intent document must be a JSON object".to_string()));
    };
    for key in object.keys() {
        if !KNOWN_FIELDS.contains(&key.as_str()) {
            return Err(EngineError::PlannerOutputInvalid(format!("unknown field '{key}'")));
        }
    }
    Ok(())
}

/// Dispatches to the named backend to produce an intent from a failing run's
/// reasons. `goal` is only consulted by the `gemini` backend.
///
/// # Errors
///
/// Returns [`EngineError::PlannerUnavailable`] when `backend` is `openai`,
/// or when `gemini` cannot be reached or is not configured.
pub fn plan(
    backend: PlannerBackend,
    proposal_id: &str,
    reasons: &[String],
    goal: &str,
) -> Result<Intent, EngineError> {
    match backend {
        PlannerBackend::Rule => Ok(rule_based_intent(proposal_id, reasons)),
        PlannerBackend::Gemini => gemini_intent(goal, proposal_id),
        PlannerBackend::Openai => {
            Err(EngineError::PlannerUnavailable("openai backend is not implemented".to_string()))
        }
    }
}
