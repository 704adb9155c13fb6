// crates/gateforge-engine/src/checkers/steady_state_regression.rs
// ============================================================================
// Module: Steady-State Regression Checker
// Description: Flags a candidate whose steady-state error moved beyond a
//              configured absolute delta from baseline.
// Dependencies: gateforge-core, serde_json
// ============================================================================

use gateforge_core::model::regression::Finding;

use super::metric_missing;
use super::metric_value;
use super::CheckerContext;

/// Default `max_abs_delta` when the checker config omits it.
pub const DEFAULT_MAX_ABS_DELTA: f64 = 0.02;

/// Emits `steady_state_regression_detected` when
/// `|candidate.steady_state_error - baseline.steady_state_error|` exceeds
/// `max_abs_delta`.
#[must_use]
pub fn check(ctx: &CheckerContext<'_>) -> Vec<Finding> {
    let (Some(baseline), Some(candidate)) = (
        metric_value(ctx.baseline, "steady_state_error"),
        metric_value(ctx.candidate, "steady_state_error"),
    ) else {
        return vec![metric_missing("steady_state_regression", "steady_state_error")];
    };

    let max_abs_delta =
        ctx.config.get("max_abs_delta").and_then(serde_json::Value::as_f64).unwrap_or(DEFAULT_MAX_ABS_DELTA);
    let delta = (candidate - baseline).abs();

    if delta > max_abs_delta {
        vec![Finding {
            checker: "steady_state_regression".to_string(),
            reason: "steady_state_regression_detected".to_string(),
            message: format!("steady-state error delta {delta:.4} exceeds max_abs_delta {max_abs_delta:.4}"),
        }]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::check;
    use crate::checkers::tests_support::evidence;
    use crate::checkers::CheckerContext;

    #[test]
    fn delta_within_bound_is_not_flagged() {
        let baseline = evidence(1.0, 10);
        let candidate = evidence(1.0, 10);
        let ctx =
            CheckerContext { baseline: &baseline, candidate: &candidate, config: &json!({}), invariants: &[] };
        assert!(check(&ctx).is_empty());
    }

    #[test]
    fn delta_over_bound_is_flagged() {
        let baseline = evidence(1.0, 10);
        let mut candidate = evidence(1.0, 10);
        candidate.metrics.steady_state_error = Some(0.1);
        let config = json!({"max_abs_delta": 0.02});
        let ctx =
            CheckerContext { baseline: &baseline, candidate: &candidate, config: &config, invariants: &[] };
        assert_eq!(check(&ctx).len(), 1);
    }
}
