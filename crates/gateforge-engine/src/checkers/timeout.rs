// crates/gateforge-engine/src/checkers/timeout.rs
// ============================================================================
// Module: Timeout Checker
// Description: Flags a candidate that timed out or exceeded a configured
//              wall-clock ceiling.
// Dependencies: gateforge-core
// ============================================================================

use gateforge_core::model::evidence::FailureType;
use gateforge_core::model::regression::Finding;

use super::CheckerContext;

/// Emits `candidate_timeout_detected` when the candidate's backend run
/// reported a timeout failure, or when its measured runtime exceeds
/// `max_runtime_seconds` from this checker's config.
#[must_use]
pub fn check(ctx: &CheckerContext<'_>) -> Vec<Finding> {
    let backend_reported_timeout = ctx.candidate.failure_type == FailureType::Timeout;

    let exceeded_ceiling = ctx
        .config
        .get("max_runtime_seconds")
        .and_then(serde_json::Value::as_f64)
        .zip(ctx.candidate.metrics.runtime_seconds)
        .is_some_and(|(ceiling, runtime)| runtime > ceiling);

    if backend_reported_timeout || exceeded_ceiling {
        vec![Finding {
            checker: "timeout".to_string(),
            reason: "candidate_timeout_detected".to_string(),
            message: "candidate run timed out or exceeded the configured runtime ceiling".to_string(),
        }]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use gateforge_core::model::evidence::FailureType;
    use serde_json::json;

    use super::check;
    use crate::checkers::CheckerContext;
    use crate::checkers::tests_support::evidence;

    #[test]
    fn backend_timeout_failure_is_flagged() {
        let baseline = evidence(1.0, 10);
        let mut candidate = evidence(1.0, 10);
        candidate.failure_type = FailureType::Timeout;
        let ctx = CheckerContext {
            baseline: &baseline,
            candidate: &candidate,
            config: &json!({}),
            invariants: &[],
        };
        assert_eq!(check(&ctx).len(), 1);
    }

    #[test]
    fn runtime_over_ceiling_is_flagged() {
        let baseline = evidence(1.0, 10);
        let candidate = evidence(5.0, 10);
        let config = json!({"max_runtime_seconds": 3.0});
        let ctx =
            CheckerContext { baseline: &baseline, candidate: &candidate, config: &config, invariants: &[] };
        assert_eq!(check(&ctx).len(), 1);
    }

    #[test]
    fn runtime_within_ceiling_is_not_flagged() {
        let baseline = evidence(1.0, 10);
        let candidate = evidence(1.0, 10);
        let config = json!({"max_runtime_seconds": 3.0});
        let ctx =
            CheckerContext { baseline: &baseline, candidate: &candidate, config: &config, invariants: &[] };
        assert!(check(&ctx).is_empty());
    }
}
