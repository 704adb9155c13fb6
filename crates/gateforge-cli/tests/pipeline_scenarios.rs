// crates/gateforge-cli/tests/pipeline_scenarios.rs
// ============================================================================
// Module: CLI Pipeline Scenario Tests
// Description: End-to-end invocations of the compiled `gateforge` binary
//              covering the governance pipeline's named scenarios: a clean
//              pass, a checker-driven review gate, the repair loop's safety
//              guard, invariant-driven risk stratification, the promotion
//              chain's strict ranking guard, and the review ledger's
//              high-risk quorum rule.
// Dependencies: gateforge-cli binary, tempfile, serde_json
// ============================================================================
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only fixture construction and assertions."
)]

// ============================================================================
// SECTION: Helpers
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use serde_json::json;
use serde_json::Value;

fn gateforge_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_gateforge"))
}

fn write_json(path: &Path, value: &Value) {
    std::fs::write(path, serde_json::to_string_pretty(value).expect("serialize fixture")).expect("write fixture");
}

fn run_cli(dir: &Path, args: &[&str]) -> Output {
    Command::new(gateforge_bin()).args(args).current_dir(dir).output().expect("spawn gateforge")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is a JSON document")
}

fn mock_evidence(run_id: &str, model_script: &str, metrics: Value) -> Value {
    json!({
        "schema_version": "1",
        "run_id": run_id,
        "backend": "mock",
        "model_script": model_script,
        "status": "success",
        "failure_type": "none",
        "gate": "PASS",
        "check_ok": "na",
        "simulate_ok": "na",
        "metrics": metrics,
        "exit_code": 0,
        "toolchain": {
            "backend_version": "mock-0",
            "docker_image": null,
            "policy_profile": null,
            "policy_version": null
        }
    })
}

// ============================================================================
// SECTION: S1 - happy path PASS
// ============================================================================

#[test]
fn s1_check_only_proposal_passes_cleanly() {
    let dir = tempfile::tempdir().expect("tempdir");

    write_json(
        &dir.path().join("proposal.json"),
        &json!({
            "proposal_id": "p-s1",
            "schema_version": "1",
            "backend": "mock",
            "model_script": "models/s1.mo",
            "requested_actions": ["check"],
            "risk_level": "low"
        }),
    );
    write_json(&dir.path().join("policy.json"), &json!({}));

    let output = run_cli(
        dir.path(),
        &[
            "run",
            "--proposal",
            "proposal.json",
            "--policy",
            "policy.json",
            "--output-dir",
            "artifacts",
        ],
    );

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let summary = stdout_json(&output);
    assert_eq!(summary["status"], "PASS");
    assert_eq!(summary["fail_reasons"], json!([]));
}

// ============================================================================
// SECTION: S2 - checker findings drive a NEEDS_REVIEW gate
// ============================================================================

#[test]
fn s2_checker_findings_resolve_needs_review_under_policy() {
    let dir = tempfile::tempdir().expect("tempdir");

    write_json(
        &dir.path().join("proposal.json"),
        &json!({
            "proposal_id": "p-s2",
            "schema_version": "1",
            "backend": "mock",
            "model_script": "models/s2.mo",
            "requested_actions": ["simulate", "regress"],
            "risk_level": "medium",
            "checker_config": {"performance_regression": {"max_ratio": 1.5}}
        }),
    );
    write_json(
        &dir.path().join("baseline.json"),
        &mock_evidence(
            "mock-baseline",
            "models/s2.mo",
            json!({"runtime_seconds": 1.0, "events": 10, "overshoot": 0.0, "settling_time": 0.0, "steady_state_error": 0.0, "energy": 0.0}),
        ),
    );
    write_json(
        &dir.path().join("candidate.json"),
        &mock_evidence(
            "mock-candidate",
            "models/s2.mo",
            json!({"runtime_seconds": 1.6, "events": 30, "overshoot": 0.0, "settling_time": 0.0, "steady_state_error": 0.0, "energy": 0.0}),
        ),
    );
    write_json(
        &dir.path().join("policy.json"),
        &json!({
            "reason_to_decision_by_risk": {
                "performance_regression_detected": {"medium": "NEEDS_REVIEW"},
                "event_explosion_detected": {"medium": "NEEDS_REVIEW"}
            }
        }),
    );

    let output = run_cli(
        dir.path(),
        &[
            "regress",
            "--proposal",
            "proposal.json",
            "--baseline",
            "baseline.json",
            "--in",
            "candidate.json",
            "--policy",
            "policy.json",
        ],
    );

    assert_eq!(output.status.code(), Some(1), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let summary = stdout_json(&output);
    assert_eq!(summary["decision"], "NEEDS_REVIEW");
    let reasons: Vec<String> =
        summary["reasons"].as_array().unwrap().iter().map(|v| v.as_str().unwrap().to_string()).collect();
    assert!(reasons.contains(&"performance_regression_detected".to_string()));
    assert!(reasons.contains(&"event_explosion_detected".to_string()));
}

// ============================================================================
// SECTION: S3 - repair loop safety guard forces FAIL
// ============================================================================

#[test]
fn s3_repair_loop_safety_guard_blocks_newly_surfaced_reason() {
    let dir = tempfile::tempdir().expect("tempdir");

    write_json(
        &dir.path().join("proposal.json"),
        &json!({
            "proposal_id": "p-s3",
            "schema_version": "1",
            "backend": "mock",
            "model_script": "s3.mo",
            "requested_actions": ["simulate", "regress"],
            "risk_level": "low",
            "checker_config": {
                "_runtime": {"mock_metrics": {"runtime_seconds": 1.6, "events": 16}}
            }
        }),
    );
    write_json(
        &dir.path().join("baseline.json"),
        &mock_evidence(
            "mock-baseline",
            "s3.mo",
            json!({"runtime_seconds": 1.0, "events": 1, "overshoot": 0.0, "settling_time": 0.0, "steady_state_error": 0.0, "energy": 0.0}),
        ),
    );
    write_json(
        &dir.path().join("policy.json"),
        &json!({"critical_reasons": ["performance_regression_detected"]}),
    );
    write_json(
        &dir.path().join("loop_input.json"),
        &json!({
            "source_status": "FAIL",
            "source_reasons": [],
            "max_retries": 3,
            "block_new_reason_prefix": "performance_regression",
            "new_critical_reasons": []
        }),
    );

    std::fs::create_dir_all(dir.path().join("baselines")).expect("baselines dir");
    write_json(
        &dir.path().join("baselines/index.json"),
        &json!({
            "entries": [{"backend": "mock", "model_script": "s3.mo", "baseline_path": "../baseline.json"}]
        }),
    );

    let output = run_cli(
        dir.path(),
        &[
            "repair",
            "loop",
            "--in",
            "loop_input.json",
            "--proposal",
            "proposal.json",
            "--baseline-index",
            "baselines/index.json",
            "--policy",
            "policy.json",
            "--output-dir",
            "artifacts",
        ],
    );

    assert_eq!(output.status.code(), Some(1), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let summary = stdout_json(&output);
    assert_eq!(summary["safety_guard_triggered"], true);
    assert_eq!(summary["after"]["status"], "FAIL");
    assert_eq!(summary["attempts"].as_array().unwrap().len(), 1);
    let reasons: Vec<String> =
        summary["after"]["reasons"].as_array().unwrap().iter().map(|v| v.as_str().unwrap().to_string()).collect();
    assert!(reasons.iter().any(|r| r.starts_with("repair_safety_new_critical_reason:performance_regression")));
}

// ============================================================================
// SECTION: S4 - physical invariant violation stratifies by risk level
// ============================================================================

fn s4_proposal(risk_level: &str) -> Value {
    json!({
        "proposal_id": format!("p-s4-{risk_level}"),
        "schema_version": "1",
        "backend": "mock",
        "model_script": "s4.mo",
        "requested_actions": ["regress"],
        "risk_level": risk_level,
        "physical_invariants": [
            {"type": "range", "metric": "overshoot", "min": 0.0, "max": 0.1}
        ]
    })
}

#[test]
fn s4_invariant_violation_stratifies_by_risk_level() {
    let dir = tempfile::tempdir().expect("tempdir");

    write_json(
        &dir.path().join("baseline.json"),
        &mock_evidence(
            "mock-baseline",
            "s4.mo",
            json!({"runtime_seconds": 1.0, "events": 5, "overshoot": 0.05, "settling_time": 0.0, "steady_state_error": 0.0, "energy": 0.0}),
        ),
    );
    write_json(
        &dir.path().join("candidate.json"),
        &mock_evidence(
            "mock-candidate",
            "s4.mo",
            json!({"runtime_seconds": 1.0, "events": 5, "overshoot": 0.25, "settling_time": 0.0, "steady_state_error": 0.0, "energy": 0.0}),
        ),
    );
    write_json(
        &dir.path().join("policy.json"),
        &json!({
            "reason_to_decision_by_risk": {
                "physical_invariant_range_violated:overshoot": {"medium": "NEEDS_REVIEW", "high": "FAIL"}
            }
        }),
    );

    write_json(&dir.path().join("proposal_medium.json"), &s4_proposal("medium"));
    let medium_output = run_cli(
        dir.path(),
        &[
            "regress",
            "--proposal",
            "proposal_medium.json",
            "--baseline",
            "baseline.json",
            "--in",
            "candidate.json",
            "--policy",
            "policy.json",
        ],
    );
    assert_eq!(medium_output.status.code(), Some(1));
    assert_eq!(stdout_json(&medium_output)["decision"], "NEEDS_REVIEW");

    write_json(&dir.path().join("proposal_high.json"), &s4_proposal("high"));
    let high_output = run_cli(
        dir.path(),
        &[
            "regress",
            "--proposal",
            "proposal_high.json",
            "--baseline",
            "baseline.json",
            "--in",
            "candidate.json",
            "--policy",
            "policy.json",
        ],
    );
    assert_eq!(high_output.status.code(), Some(1));
    assert_eq!(stdout_json(&high_output)["decision"], "FAIL");
}

// ============================================================================
// SECTION: S5 - promotion ranking explanation and strict apply guard
// ============================================================================

fn snapshot(status: &str) -> Value {
    json!({
        "status": status,
        "kpis": {
            "strict_downgrade_rate": null,
            "review_recovery_rate": null,
            "strict_non_pass_rate": null,
            "approval_rate": null,
            "fail_rate": null,
            "strategy_compare_relation": null,
            "recommended_profile": null
        },
        "risks": [],
        "trend": null
    })
}

#[test]
fn s5_apply_requires_a_runner_up_to_satisfy_the_ranking_guard() {
    let dir = tempfile::tempdir().expect("tempdir");

    write_json(
        &dir.path().join("rank_solo_in.json"),
        &json!({
            "candidates": [
                {"profile": "solo", "snapshot": snapshot("PASS"), "gate": {}, "exit_code": 0}
            ]
        }),
    );
    let rank_solo = run_cli(dir.path(), &["promotion", "rank", "--in", "rank_solo_in.json"]);
    assert!(rank_solo.status.success());
    write_json(&dir.path().join("decision_solo.json"), &stdout_json(&rank_solo));

    let apply_solo = run_cli(
        dir.path(),
        &[
            "promotion",
            "apply",
            "--in",
            "decision_solo.json",
            "--require-ranking-explanation",
            "--actor",
            "ci-bot",
            "--audit-log",
            "audit_solo.jsonl",
        ],
    );
    assert_eq!(apply_solo.status.code(), Some(1));
    let record_solo = stdout_json(&apply_solo);
    assert_eq!(record_solo["final_status"], "FAIL");
    assert!(record_solo["reasons"]
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r.as_str() == Some("ranking_explanation_required")));

    write_json(
        &dir.path().join("rank_pair_in.json"),
        &json!({
            "candidates": [
                {"profile": "a", "snapshot": snapshot("PASS"), "gate": {}, "exit_code": 0},
                {"profile": "b", "snapshot": snapshot("PASS"), "gate": {}, "exit_code": 1}
            ]
        }),
    );
    let rank_pair = run_cli(dir.path(), &["promotion", "rank", "--in", "rank_pair_in.json"]);
    assert!(rank_pair.status.success());
    let decision_pair = stdout_json(&rank_pair);
    assert!(!decision_pair["decision_explanations"]["selection_priority"].as_array().unwrap().is_empty());
    write_json(&dir.path().join("decision_pair.json"), &decision_pair);

    let apply_pair = run_cli(
        dir.path(),
        &[
            "promotion",
            "apply",
            "--in",
            "decision_pair.json",
            "--require-ranking-explanation",
            "--actor",
            "ci-bot",
            "--audit-log",
            "audit_pair.jsonl",
        ],
    );
    assert!(apply_pair.status.success(), "stderr: {}", String::from_utf8_lossy(&apply_pair.stderr));
    let record_pair = stdout_json(&apply_pair);
    assert_eq!(record_pair["final_status"], "PASS");
    assert_eq!(record_pair["apply_action"], "promote");
}

// ============================================================================
// SECTION: S6 - high-risk review resolution requires a second reviewer
// ============================================================================

fn resolve_input(second_reviewer: Option<&str>, second_decision: Option<&str>) -> Value {
    json!({
        "decision": {
            "review_id": "rev-s6",
            "proposal_id": "p-s6",
            "reviewer": "alice",
            "second_reviewer": second_reviewer,
            "second_decision": second_decision,
            "decision": "approve",
            "rationale": "reviewed the run summary",
            "opened_at": "2026-07-29T00:00:00Z",
            "resolved_at": "2026-07-29T01:00:00Z",
            "all_required_checks_completed": true,
            "confirmed_checks": []
        },
        "risk_level": "high"
    })
}

#[test]
fn s6_high_risk_approval_needs_a_second_reviewer_before_it_passes() {
    let dir = tempfile::tempdir().expect("tempdir");

    write_json(&dir.path().join("resolve_1.json"), &resolve_input(None, None));
    let first = run_cli(
        dir.path(),
        &["review", "resolve", "--in", "resolve_1.json", "--ledger", "ledger.jsonl"],
    );
    assert_eq!(first.status.code(), Some(1), "stderr: {}", String::from_utf8_lossy(&first.stderr));
    let resolution_1 = stdout_json(&first);
    assert_eq!(resolution_1["status"], "NEEDS_REVIEW");
    assert_eq!(resolution_1["reasons"], json!(["needs_second_reviewer"]));

    write_json(&dir.path().join("resolve_2.json"), &resolve_input(Some("bob"), Some("approve")));
    let second = run_cli(
        dir.path(),
        &["review", "resolve", "--in", "resolve_2.json", "--ledger", "ledger.jsonl"],
    );
    assert!(second.status.success(), "stderr: {}", String::from_utf8_lossy(&second.stderr));
    let resolution_2 = stdout_json(&second);
    assert_eq!(resolution_2["status"], "PASS");
    assert_eq!(resolution_2["reasons"], json!([]));
}
