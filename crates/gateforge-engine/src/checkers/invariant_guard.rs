// crates/gateforge-engine/src/checkers/invariant_guard.rs
// ============================================================================
// Module: Invariant Guard Checker
// Description: Evaluates a proposal's declared physical invariants against
//              candidate (and, for bounded-delta/monotonic, baseline) metrics.
// Dependencies: gateforge-core
// ============================================================================

use gateforge_core::model::proposal::MonotonicDirection;
use gateforge_core::model::proposal::PhysicalInvariant;
use gateforge_core::model::regression::Finding;

use super::metric_missing;
use super::metric_value;
use super::CheckerContext;

/// Evaluates every invariant in `ctx.invariants`, emitting
/// `physical_invariant_<type>_violated:<metric>` for each one the candidate
/// (or candidate/baseline pair) fails to satisfy.
#[must_use]
pub fn check(ctx: &CheckerContext<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();
    for invariant in ctx.invariants {
        match invariant {
            PhysicalInvariant::Range { metric, min, max } => {
                let Some(candidate) = metric_value(ctx.candidate, metric) else {
                    findings.push(metric_missing("invariant_guard", metric));
                    continue;
                };
                if candidate < *min || candidate > *max {
                    findings.push(violation(
                        "range",
                        metric,
                        format!("value {candidate} outside declared range [{min}, {max}]"),
                    ));
                }
            }
            PhysicalInvariant::Monotonic { metric, direction } => {
                let (Some(baseline), Some(candidate)) =
                    (metric_value(ctx.baseline, metric), metric_value(ctx.candidate, metric))
                else {
                    findings.push(metric_missing("invariant_guard", metric));
                    continue;
                };
                let satisfied = match direction {
                    MonotonicDirection::NonDecreasing => candidate >= baseline,
                    MonotonicDirection::NonIncreasing => candidate <= baseline,
                };
                if !satisfied {
                    findings.push(violation(
                        "monotonic",
                        metric,
                        format!("value moved from {baseline} to {candidate}, violating declared direction"),
                    ));
                }
            }
            PhysicalInvariant::BoundedDelta { metric, max_delta } => {
                let (Some(baseline), Some(candidate)) =
                    (metric_value(ctx.baseline, metric), metric_value(ctx.candidate, metric))
                else {
                    findings.push(metric_missing("invariant_guard", metric));
                    continue;
                };
                let delta = (candidate - baseline).abs();
                if delta > *max_delta {
                    findings.push(violation(
                        "bounded_delta",
                        metric,
                        format!("delta {delta} exceeds declared max_delta {max_delta}"),
                    ));
                }
            }
        }
    }
    findings
}

fn violation(kind: &str, metric: &str, message: String) -> Finding {
    Finding {
        checker: "invariant_guard".to_string(),
        reason: format!("physical_invariant_{kind}_violated:{metric}"),
        message,
    }
}
