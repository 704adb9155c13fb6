// crates/gateforge-engine/src/checkers/performance_regression.rs
// ============================================================================
// Module: Performance Regression Checker
// Description: Flags a candidate whose runtime grew beyond a configurable
//              ratio of the baseline's runtime.
// Dependencies: gateforge-core, serde_json
// ============================================================================

use gateforge_core::model::regression::Finding;

use super::metric_missing;
use super::metric_value;
use super::CheckerContext;

/// Default `max_ratio` when the checker config omits it.
pub const DEFAULT_MAX_RATIO: f64 = 1.5;
/// Floor used to avoid division by zero when the baseline runtime is zero.
const EPSILON: f64 = 1e-9;

/// Emits `performance_regression_detected` when
/// `candidate.runtime_seconds / max(baseline.runtime_seconds, epsilon)`
/// exceeds `max_ratio`.
#[must_use]
pub fn check(ctx: &CheckerContext<'_>) -> Vec<Finding> {
    let (Some(baseline), Some(candidate)) = (
        metric_value(ctx.baseline, "runtime_seconds"),
        metric_value(ctx.candidate, "runtime_seconds"),
    ) else {
        return vec![metric_missing("performance_regression", "runtime_seconds")];
    };

    let max_ratio = ctx.config.get("max_ratio").and_then(serde_json::Value::as_f64).unwrap_or(DEFAULT_MAX_RATIO);
    let ratio = candidate / baseline.max(EPSILON);

    if ratio > max_ratio {
        vec![Finding {
            checker: "performance_regression".to_string(),
            reason: "performance_regression_detected".to_string(),
            message: format!("runtime ratio {ratio:.3} exceeds max_ratio {max_ratio:.3}"),
        }]
    } else {
        Vec::new()
    }
}
