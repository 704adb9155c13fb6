// crates/gateforge-engine/src/checkers/control_behavior_regression.rs
// ============================================================================
// Module: Control Behavior Regression Checker
// Description: Flags overshoot, settling-time, and steady-state regressions
//              in a controlled quantity, per §4.2's combined checker row.
// Dependencies: gateforge-core, serde_json
// ============================================================================

use gateforge_core::model::regression::Finding;

use super::metric_missing;
use super::metric_value;
use super::CheckerContext;

/// Default `max_overshoot_abs_delta` when the checker config omits it.
pub const DEFAULT_MAX_OVERSHOOT_ABS_DELTA: f64 = 0.05;
/// Default `max_settling_time_ratio` when the checker config omits it.
pub const DEFAULT_MAX_SETTLING_TIME_RATIO: f64 = 1.25;
/// Default `max_steady_state_abs_delta` when the checker config omits it.
pub const DEFAULT_MAX_STEADY_STATE_ABS_DELTA: f64 = 0.02;
const EPSILON: f64 = 1e-9;

/// Emits up to three reasons: `overshoot_regression_detected`,
/// `settling_time_regression_detected`, and
/// `steady_state_regression_detected`, in that order.
#[must_use]
pub fn check(ctx: &CheckerContext<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();

    match (metric_value(ctx.baseline, "overshoot"), metric_value(ctx.candidate, "overshoot")) {
        (Some(baseline), Some(candidate)) => {
            let max_delta = ctx
                .config
                .get("max_overshoot_abs_delta")
                .and_then(serde_json::Value::as_f64)
                .unwrap_or(DEFAULT_MAX_OVERSHOOT_ABS_DELTA);
            if (candidate - baseline).abs() > max_delta {
                findings.push(finding("overshoot_regression_detected", "overshoot regressed beyond the configured absolute delta"));
            }
        }
        _ => findings.push(metric_missing("control_behavior_regression", "overshoot")),
    }

    match (metric_value(ctx.baseline, "settling_time"), metric_value(ctx.candidate, "settling_time")) {
        (Some(baseline), Some(candidate)) => {
            let max_ratio = ctx
                .config
                .get("max_settling_time_ratio")
                .and_then(serde_json::Value::as_f64)
                .unwrap_or(DEFAULT_MAX_SETTLING_TIME_RATIO);
            if candidate / baseline.max(EPSILON) > max_ratio {
                findings.push(finding(
                    "settling_time_regression_detected",
                    "settling time grew beyond the configured ratio over baseline",
                ));
            }
        }
        _ => findings.push(metric_missing("control_behavior_regression", "settling_time")),
    }

    match (
        metric_value(ctx.baseline, "steady_state_error"),
        metric_value(ctx.candidate, "steady_state_error"),
    ) {
        (Some(baseline), Some(candidate)) => {
            let max_delta = ctx
                .config
                .get("max_steady_state_abs_delta")
                .and_then(serde_json::Value::as_f64)
                .unwrap_or(DEFAULT_MAX_STEADY_STATE_ABS_DELTA);
            if (candidate - baseline).abs() > max_delta {
                findings.push(finding(
                    "steady_state_regression_detected",
                    "steady-state error regressed beyond the configured absolute delta",
                ));
            }
        }
        _ => findings.push(metric_missing("control_behavior_regression", "steady_state_error")),
    }

    findings
}

fn finding(reason: &str, message: &str) -> Finding {
    Finding {
        checker: "control_behavior_regression".to_string(),
        reason: reason.to_string(),
        message: message.to_string(),
    }
}
