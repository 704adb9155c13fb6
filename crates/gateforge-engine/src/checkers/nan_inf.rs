// crates/gateforge-engine/src/checkers/nan_inf.rs
// ============================================================================
// Module: NaN/Inf Checker
// Description: Flags a candidate whose measured metrics contain a NaN or
//              infinite value.
// Dependencies: gateforge-core, serde_json
// ============================================================================

use gateforge_core::model::regression::Finding;
use serde_json::Value;

use super::CheckerContext;

const NAMED_METRICS: &[&str] =
    &["runtime_seconds", "overshoot", "settling_time", "steady_state_error", "energy"];

/// Emits `nan_or_inf_detected` when any named metric, or any extra metric
/// the backend reported, is NaN or infinite.
#[must_use]
pub fn check(ctx: &CheckerContext<'_>) -> Vec<Finding> {
    let metrics = &ctx.candidate.metrics;
    let named_bad = NAMED_METRICS.iter().any(|name| super::metric_value(ctx.candidate, name).is_some_and(is_bad));
    let extra_bad = metrics.extra.values().any(|value| value.as_f64().is_some_and(is_bad));

    if named_bad || extra_bad {
        vec![Finding {
            checker: "nan_inf".to_string(),
            reason: "nan_or_inf_detected".to_string(),
            message: "candidate metrics contain a NaN or infinite value".to_string(),
        }]
    } else {
        Vec::new()
    }
}

fn is_bad(value: f64) -> bool {
    value.is_nan() || value.is_infinite()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::check;
    use crate::checkers::tests_support::evidence;
    use crate::checkers::CheckerContext;

    #[test]
    fn clean_metrics_are_not_flagged() {
        let baseline = evidence(1.0, 10);
        let candidate = evidence(1.0, 10);
        let ctx =
            CheckerContext { baseline: &baseline, candidate: &candidate, config: &json!({}), invariants: &[] };
        assert!(check(&ctx).is_empty());
    }

    #[test]
    fn nan_runtime_is_flagged() {
        let baseline = evidence(1.0, 10);
        let mut candidate = evidence(1.0, 10);
        candidate.metrics.runtime_seconds = Some(f64::NAN);
        let ctx =
            CheckerContext { baseline: &baseline, candidate: &candidate, config: &json!({}), invariants: &[] };
        assert_eq!(check(&ctx).len(), 1);
    }

    #[test]
    fn infinite_overshoot_is_flagged() {
        let baseline = evidence(1.0, 10);
        let mut candidate = evidence(1.0, 10);
        candidate.metrics.overshoot = Some(f64::INFINITY);
        let ctx =
            CheckerContext { baseline: &baseline, candidate: &candidate, config: &json!({}), invariants: &[] };
        assert_eq!(check(&ctx).len(), 1);
    }
}
