// crates/gateforge-engine/src/checkers/event_explosion.rs
// ============================================================================
// Module: Event Explosion Checker
// Description: Flags a candidate whose discrete event count grew far beyond
//              the baseline's.
// Dependencies: gateforge-core, serde_json
// ============================================================================

use gateforge_core::model::regression::Finding;

use super::metric_missing;
use super::metric_value;
use super::CheckerContext;

/// Default `max_ratio` when the checker config omits it.
pub const DEFAULT_MAX_RATIO: f64 = 2.0;
/// Default absolute threshold used when the baseline reported zero events.
pub const DEFAULT_ABS_THRESHOLD_IF_BASELINE_ZERO: f64 = 10.0;

/// Emits `event_explosion_detected` when the candidate's event count grows
/// beyond `max_ratio` times the baseline's, or beyond
/// `abs_threshold_if_baseline_zero` when the baseline recorded zero events.
#[must_use]
pub fn check(ctx: &CheckerContext<'_>) -> Vec<Finding> {
    let (Some(baseline), Some(candidate)) =
        (metric_value(ctx.baseline, "events"), metric_value(ctx.candidate, "events"))
    else {
        return vec![metric_missing("event_explosion", "events")];
    };

    let exploded = if baseline <= 0.0 {
        let abs_threshold = ctx
            .config
            .get("abs_threshold_if_baseline_zero")
            .and_then(serde_json::Value::as_f64)
            .unwrap_or(DEFAULT_ABS_THRESHOLD_IF_BASELINE_ZERO);
        candidate > abs_threshold
    } else {
        let max_ratio =
            ctx.config.get("max_ratio").and_then(serde_json::Value::as_f64).unwrap_or(DEFAULT_MAX_RATIO);
        candidate / baseline > max_ratio
    };

    if exploded {
        vec![Finding {
            checker: "event_explosion".to_string(),
            reason: "event_explosion_detected".to_string(),
            message: format!("candidate event count {candidate} grew beyond the configured bound over baseline {baseline}"),
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
    fn ratio_over_bound_is_flagged() {
        let baseline = evidence(1.0, 10);
        let candidate = evidence(1.0, 16);
        let config = json!({"max_ratio": 1.5});
        let ctx =
            CheckerContext { baseline: &baseline, candidate: &candidate, config: &config, invariants: &[] };
        assert_eq!(check(&ctx).len(), 1);
    }

    #[test]
    fn zero_baseline_uses_absolute_threshold() {
        let baseline = evidence(1.0, 0);
        let candidate = evidence(1.0, 20);
        let config = json!({"abs_threshold_if_baseline_zero": 5.0});
        let ctx =
            CheckerContext { baseline: &baseline, candidate: &candidate, config: &config, invariants: &[] };
        assert_eq!(check(&ctx).len(), 1);
    }

    #[test]
    fn zero_baseline_under_threshold_is_not_flagged() {
        let baseline = evidence(1.0, 0);
        let candidate = evidence(1.0, 3);
        let config = json!({"abs_threshold_if_baseline_zero": 5.0});
        let ctx =
            CheckerContext { baseline: &baseline, candidate: &candidate, config: &config, invariants: &[] };
        assert!(check(&ctx).is_empty());
    }
}
