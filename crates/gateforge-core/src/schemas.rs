// crates/gateforge-core/src/schemas.rs
// ============================================================================
// Module: GateForge Artifact Schemas
// Description: JSON Schema builders for the wire artifacts commands exchange.
// Purpose: Provide canonical validation schemas for proposals, evidence, and
//          planner intents from a single source.
// Dependencies: jsonschema, serde_json
// ============================================================================

//! ## Overview
//! Every artifact a command reads from disk (a proposal, a piece of
//! evidence, a planner intent) is validated against a JSON Schema before it
//! is deserialized into a typed struct, so malformed input is rejected with a
//! usage error rather than surfacing as a confusing downstream panic.

use jsonschema::Validator;
use serde_json::Value;
use serde_json::json;

/// Returns the JSON schema for a `Proposal` artifact.
#[must_use]
pub fn proposal_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "gateforge://core/schemas/proposal.schema.json",
        "title": "GateForge Proposal",
        "description": "Declared intent to run a simulation-model change through the governance pipeline.",
        "type": "object",
        "required": ["proposal_id", "schema_version", "backend", "model_script", "requested_actions", "risk_level"],
        "properties": {
            "proposal_id": { "type": "string", "minLength": 1 },
            "schema_version": { "type": "string", "minLength": 1 },
            "backend": { "type": "string", "minLength": 1 },
            "model_script": { "type": "string", "minLength": 1 },
            "requested_actions": {
                "type": "array",
                "items": { "enum": ["check", "simulate", "regress"] }
            },
            "risk_level": { "enum": ["low", "medium", "high"] },
            "checkers": { "type": "array", "items": { "type": "string" } },
            "checker_config": { "type": "object" },
            "change_set": { "type": "object" },
            "physical_invariants": { "type": "array", "items": { "type": "object" } }
        },
        "additionalProperties": true
    })
}

/// Returns the JSON schema for an `Evidence` artifact.
#[must_use]
pub fn evidence_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "gateforge://core/schemas/evidence.schema.json",
        "title": "GateForge Evidence",
        "description": "Output of one backend run of a proposal's model script.",
        "type": "object",
        "required": ["schema_version", "run_id", "backend", "model_script", "status", "failure_type", "gate",
            "check_ok", "simulate_ok", "metrics", "exit_code", "toolchain"],
        "properties": {
            "schema_version": { "type": "string", "minLength": 1 },
            "run_id": { "type": "string", "minLength": 1 },
            "backend": { "type": "string", "minLength": 1 },
            "model_script": { "type": "string", "minLength": 1 },
            "status": { "enum": ["success", "failure"] },
            "failure_type": { "type": "string" },
            "gate": { "enum": ["PASS", "FAIL"] },
            "check_ok": { "type": ["boolean", "string", "null"] },
            "simulate_ok": { "type": ["boolean", "string", "null"] },
            "metrics": { "type": "object" },
            "exit_code": { "type": "integer" },
            "toolchain": { "type": "object" },
            "artifacts": { "type": "object" }
        },
        "additionalProperties": true
    })
}

/// Returns the JSON schema for a planner `Intent` artifact.
#[must_use]
pub fn intent_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "gateforge://core/schemas/intent.schema.json",
        "title": "GateForge Planner Intent",
        "description": "A planner-proposed change-set awaiting guardrail validation.",
        "type": "object",
        "properties": {
            "intent": { "type": "string" },
            "proposal_id": { "type": ["string", "null"] },
            "overrides": { "type": "object" },
            "change_plan": { "type": ["object", "null"] },
            "change_set_draft": { "type": ["object", "null"] }
        },
        "additionalProperties": false
    })
}

/// Returns the JSON schema for a demo-bundle summary artifact.
#[must_use]
pub fn demo_bundle_summary_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "gateforge://core/schemas/demo_bundle_summary.schema.json",
        "title": "GateForge Demo Bundle Summary",
        "description": "A rolled-up record of the scenarios exercised by a demo bundle run.",
        "type": "object",
        "required": ["scenarios"],
        "properties": {
            "scenarios": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["name", "status"],
                    "properties": {
                        "name": { "type": "string", "minLength": 1 },
                        "status": { "enum": ["PASS", "FAIL", "NEEDS_REVIEW"] },
                        "exit_code": { "type": "integer" }
                    },
                    "additionalProperties": true
                }
            }
        },
        "additionalProperties": true
    })
}

/// Compiles a schema document into a reusable [`Validator`].
///
/// # Errors
///
/// Returns an error if the schema document itself is not a valid JSON
/// Schema.
pub fn compile(schema: &Value) -> Result<Validator, Box<jsonschema::ValidationError<'static>>> {
    jsonschema::validator_for(schema).map_err(|err| Box::new(err.to_owned()))
}

/// Validates `instance` against `schema`, returning the first validation
/// error message when invalid.
#[must_use]
pub fn first_error(schema: &Value, instance: &Value) -> Option<String> {
    let validator = compile(schema).ok()?;
    validator.iter_errors(instance).next().map(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::evidence_schema;
    use super::first_error;
    use super::proposal_schema;

    #[test]
    fn proposal_missing_required_field_is_rejected() {
        let instance = json!({"proposal_id": "p-1"});
        assert!(first_error(&proposal_schema(), &instance).is_some());
    }

    #[test]
    fn proposal_with_required_fields_is_accepted() {
        let instance = json!({
            "proposal_id": "p-1",
            "schema_version": "1",
            "backend": "mock",
            "model_script": "model.mo",
            "requested_actions": ["check", "simulate", "regress"],
            "risk_level": "low"
        });
        assert!(first_error(&proposal_schema(), &instance).is_none());
    }

    #[test]
    fn evidence_without_metrics_is_rejected() {
        let instance = json!({"run_id": "r-1", "schema_version": "1"});
        assert!(first_error(&evidence_schema(), &instance).is_some());
    }
}
