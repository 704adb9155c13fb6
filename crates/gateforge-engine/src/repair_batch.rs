// crates/gateforge-engine/src/repair_batch.rs
// ============================================================================
// Module: Repair Batch + Profile Compare
// Description: Executes a pack of repair-loop cases over a bounded worker
//              pool, and compares a pack's outcome under two policy
//              profiles, per §4.7.
// Dependencies: gateforge-backend, gateforge-config, gateforge-core
// ============================================================================

//! ## Overview
//! A [`RepairBatchPack`] is an ordered list of independent repair-loop
//! cases. [`run_repair_batch`] executes every case through
//! [`crate::repair::run_repair_loop`], optionally spread across a bounded
//! worker pool (`ctx.worker_count`, default 1), and always returns cases in
//! pack declaration order regardless of which worker finished first — each
//! case keeps its original index and the pool writes into a pre-sized slot
//! rather than a queue, so no post-hoc sort is needed to restore order.
//! [`compare_profiles`] runs the same pack twice, once per policy, and
//! derives the strict-downgrade rate, reason distribution delta, and
//! recommended profile from the two aggregate runs.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Mutex;

use gateforge_backend::BackendAdapter;
use gateforge_config::BaselineIndex;
use gateforge_config::Policy;
use gateforge_core::decision::Decision;
use gateforge_core::decision::Delta;
use gateforge_core::model::proposal::Proposal;
use gateforge_core::model::repair::ProfileCompareSummary;
use gateforge_core::model::repair::ReasonCounts;
use gateforge_core::model::repair::ReasonDistribution;
use gateforge_core::model::repair::RepairBatchCase;
use gateforge_core::model::repair::RepairBatchSummary;

use crate::error::EngineError;
use crate::planner::Guardrails;
use crate::repair::run_repair_loop;
use crate::repair::RepairInput;

/// One case in a repair batch pack: a proposal with its source status and
/// reasons, plus the per-case repair parameters.
#[derive(Debug, Clone)]
pub struct RepairBatchCaseSpec {
    /// Case name, as declared in the pack.
    pub name: String,
    /// Decision the source run reached, before any repair attempt.
    pub source_status: Decision,
    /// Reasons backing the source run's status.
    pub source_reasons: Vec<String>,
    /// The proposal the failing run was driven by.
    pub proposal: Proposal,
    /// Maximum number of retries beyond the first attempt, for this case.
    pub max_retries: u32,
    /// Prefix tripping the safety guard, for this case.
    pub block_new_reason_prefix: Option<String>,
    /// Configured critical-reasons set, for this case.
    pub new_critical_reasons: Vec<String>,
}

/// A repair batch pack: an ordered list of independent cases sharing one
/// backend, baseline index, and guardrail configuration.
#[derive(Debug, Clone)]
pub struct RepairBatchPack {
    /// Identifier of the pack being executed.
    pub pack_id: String,
    /// Cases, in declaration order.
    pub cases: Vec<RepairBatchCaseSpec>,
}

/// Context shared by every case in a batch: everything a [`RepairInput`]
/// needs except the per-case proposal/status/reasons/retry parameters.
pub struct RepairBatchContext<'a> {
    /// Directory proposal documents and change-sets are relative to.
    pub proposal_dir: &'a Path,
    /// Backend adapter used for every case's attempts.
    pub backend: &'a (dyn BackendAdapter + Sync),
    /// Wall-clock timeout handed to the backend.
    pub timeout_seconds: u64,
    /// Baseline index used to auto-resolve each case's comparison baseline.
    pub baseline_index: Option<&'a BaselineIndex>,
    /// Directory `baseline_index`'s relative paths are resolved against.
    pub baseline_index_dir: &'a Path,
    /// Policy overlay document applied to every case in this batch.
    pub policy: &'a Policy,
    /// Path to the policy document, recorded on every case's attempts.
    pub policy_path: &'a str,
    /// Fractional runtime regression threshold.
    pub runtime_threshold: f64,
    /// Directory candidate/regression artifacts are written into.
    pub output_dir: &'a Path,
    /// Path roots every case's change-set is allowed to touch.
    pub change_set_allowed_roots: &'a [String],
    /// Guardrails validated against every case's planner-produced intent.
    pub guardrails: &'a Guardrails,
    /// Worker pool size; clamped to at least 1 and at most the case count.
    pub worker_count: usize,
}

/// Runs `pack` to completion under `ctx`, per §4.7.
///
/// # Errors
///
/// Returns the first [`EngineError`] encountered, by ascending case index,
/// once every worker has finished.
pub fn run_repair_batch(
    pack: &RepairBatchPack,
    ctx: &RepairBatchContext<'_>,
) -> Result<RepairBatchSummary, EngineError> {
    let slots: Mutex<Vec<Option<Result<RepairBatchCase, EngineError>>>> =
        Mutex::new((0 .. pack.cases.len()).map(|_| None).collect());
    let cursor = std::sync::atomic::AtomicUsize::new(0);
    let worker_count = ctx.worker_count.max(1).min(pack.cases.len().max(1));

    std::thread::scope(|scope| {
        for _ in 0 .. worker_count {
            scope.spawn(|| loop {
                let index = cursor.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                let Some(case) = pack.cases.get(index) else {
                    break;
                };
                let result = run_one_case(case, ctx);
                slots.lock().unwrap_or_else(std::sync::PoisonError::into_inner)[index] = Some(result);
            });
        }
    });

    let mut cases = Vec::with_capacity(pack.cases.len());
    for slot in slots.into_inner().unwrap_or_else(std::sync::PoisonError::into_inner) {
        cases.push(slot.expect("every slot is filled before the scope returns")?);
    }

    let mut improved_count = 0u32;
    let mut worse_count = 0u32;
    let mut unchanged_count = 0u32;
    let mut safety_block_count = 0u32;
    for case in &cases {
        match case.summary.comparison.delta {
            Delta::Improved => improved_count += 1,
            Delta::Worse => worse_count += 1,
            Delta::Unchanged => unchanged_count += 1,
        }
        if case.summary.safety_guard_triggered {
            safety_block_count += 1;
        }
    }

    Ok(RepairBatchSummary {
        pack_id: pack.pack_id.clone(),
        cases,
        improved_count,
        worse_count,
        unchanged_count,
        safety_block_count,
    })
}

fn run_one_case(
    case: &RepairBatchCaseSpec,
    ctx: &RepairBatchContext<'_>,
) -> Result<RepairBatchCase, EngineError> {
    let input = RepairInput {
        source_reasons: &case.source_reasons,
        source_status: case.source_status,
        proposal: &case.proposal,
        proposal_dir: ctx.proposal_dir,
        backend: ctx.backend,
        timeout_seconds: ctx.timeout_seconds,
        baseline_index: ctx.baseline_index,
        baseline_index_dir: ctx.baseline_index_dir,
        policy: ctx.policy,
        policy_path: ctx.policy_path,
        runtime_threshold: ctx.runtime_threshold,
        output_dir: ctx.output_dir,
        change_set_allowed_roots: ctx.change_set_allowed_roots,
        guardrails: ctx.guardrails,
        max_retries: case.max_retries,
        block_new_reason_prefix: case.block_new_reason_prefix.as_deref(),
        new_critical_reasons: &case.new_critical_reasons,
    };
    let summary = run_repair_loop(&input)?;
    Ok(RepairBatchCase { name: case.name.clone(), summary })
}

/// Runs `pack` once per policy (`policy_a` under `profile_a`, `policy_b`
/// under `profile_b`) and derives the §4.7 comparison between the two runs.
///
/// # Errors
///
/// Returns the first [`EngineError`] encountered by either run.
#[allow(clippy::too_many_arguments)]
pub fn compare_profiles(
    pack: &RepairBatchPack,
    profile_a: &str,
    policy_a: &Policy,
    profile_b: &str,
    policy_b: &Policy,
    ctx_without_policy: &RepairBatchContextTemplate<'_>,
) -> Result<ProfileCompareSummary, EngineError> {
    let batch_a = run_repair_batch(pack, &ctx_without_policy.with_policy(policy_a, profile_a))?;
    let batch_b = run_repair_batch(pack, &ctx_without_policy.with_policy(policy_b, profile_b))?;

    let total = batch_a.cases.len().max(1) as f64;
    let downgraded = batch_a
        .cases
        .iter()
        .zip(batch_b.cases.iter())
        .filter(|(a, b)| a.summary.after.status == Decision::Pass && b.summary.after.status != Decision::Pass)
        .count();
    let strict_downgrade_rate = downgraded as f64 / total;

    let counts_a = reason_counts(&batch_a);
    let counts_b = reason_counts(&batch_b);
    let mut reasons: BTreeSet<String> = BTreeSet::new();
    reasons.extend(counts_a.keys().cloned());
    reasons.extend(counts_b.keys().cloned());
    let delta_counts: BTreeMap<String, i64> = reasons
        .iter()
        .map(|reason| {
            let a = i64::from(counts_a.get(reason).copied().unwrap_or(0));
            let b = i64::from(counts_b.get(reason).copied().unwrap_or(0));
            (reason.clone(), b - a)
        })
        .collect();

    let recommended_profile = recommend(&batch_a, profile_a, &batch_b, profile_b);

    Ok(ProfileCompareSummary {
        profile_a: profile_a.to_string(),
        profile_b: profile_b.to_string(),
        strict_downgrade_rate,
        reason_distribution: ReasonDistribution { counts_a, counts_b, delta_counts },
        recommended_profile,
    })
}

fn reason_counts(batch: &RepairBatchSummary) -> ReasonCounts {
    let mut counts = ReasonCounts::new();
    for case in &batch.cases {
        for reason in &case.summary.after.reasons {
            *counts.entry(reason.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Picks the profile with the higher lexicographic `(pass_count, -fail_count)`
/// tuple, per §4.7; `profile_a` wins ties.
fn recommend(batch_a: &RepairBatchSummary, profile_a: &str, batch_b: &RepairBatchSummary, profile_b: &str) -> String {
    let score = |batch: &RepairBatchSummary| {
        let pass = batch.cases.iter().filter(|c| c.summary.after.status == Decision::Pass).count() as i64;
        let fail = batch.cases.iter().filter(|c| c.summary.after.status == Decision::Fail).count() as i64;
        (pass, -fail)
    };
    if score(batch_b) > score(batch_a) {
        profile_b.to_string()
    } else {
        profile_a.to_string()
    }
}

/// A [`RepairBatchContext`] with every field pinned except `policy` and
/// `policy_path`, so [`compare_profiles`] can stamp out two contexts that
/// differ only in which policy profile they apply.
pub struct RepairBatchContextTemplate<'a> {
    /// Directory proposal documents and change-sets are relative to.
    pub proposal_dir: &'a Path,
    /// Backend adapter used for every case's attempts.
    pub backend: &'a (dyn BackendAdapter + Sync),
    /// Wall-clock timeout handed to the backend.
    pub timeout_seconds: u64,
    /// Baseline index used to auto-resolve each case's comparison baseline.
    pub baseline_index: Option<&'a BaselineIndex>,
    /// Directory `baseline_index`'s relative paths are resolved against.
    pub baseline_index_dir: &'a Path,
    /// Fractional runtime regression threshold.
    pub runtime_threshold: f64,
    /// Directory candidate/regression artifacts are written into.
    pub output_dir: &'a Path,
    /// Path roots every case's change-set is allowed to touch.
    pub change_set_allowed_roots: &'a [String],
    /// Guardrails validated against every case's planner-produced intent.
    pub guardrails: &'a Guardrails,
    /// Worker pool size; clamped to at least 1 and at most the case count.
    pub worker_count: usize,
}

impl<'a> RepairBatchContextTemplate<'a> {
    fn with_policy(&self, policy: &'a Policy, policy_path: &'a str) -> RepairBatchContext<'a> {
        RepairBatchContext {
            proposal_dir: self.proposal_dir,
            backend: self.backend,
            timeout_seconds: self.timeout_seconds,
            baseline_index: self.baseline_index,
            baseline_index_dir: self.baseline_index_dir,
            policy,
            policy_path,
            runtime_threshold: self.runtime_threshold,
            output_dir: self.output_dir,
            change_set_allowed_roots: self.change_set_allowed_roots,
            guardrails: self.guardrails,
            worker_count: self.worker_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::collections::BTreeSet;

    use gateforge_backend::mock::MockBackend;
    use gateforge_config::BaselineIndex;
    use gateforge_config::Policy;
    use gateforge_core::decision::Decision;
    use gateforge_core::decision::RiskLevel;
    use gateforge_core::identifiers::ProposalId;
    use gateforge_core::model::proposal::Proposal;
    use gateforge_core::model::proposal::RequestedAction;

    use super::compare_profiles;
    use super::run_repair_batch;
    use super::RepairBatchCaseSpec;
    use super::RepairBatchContext;
    use super::RepairBatchContextTemplate;
    use super::RepairBatchPack;
    use crate::planner::Guardrails;

    fn case(name: &str) -> RepairBatchCaseSpec {
        RepairBatchCaseSpec {
            name: name.to_string(),
            source_status: Decision::Fail,
            source_reasons: vec!["runtime_regression:1.3s>1.0s".to_string()],
            proposal: Proposal {
                proposal_id: ProposalId::new(name),
                schema_version: "1".to_string(),
                backend: "mock".to_string(),
                model_script: "s.mo".to_string(),
                requested_actions: BTreeSet::from([RequestedAction::Check]),
                risk_level: RiskLevel::Low,
                checkers: Vec::new(),
                checker_config: BTreeMap::new(),
                change_set: None,
                physical_invariants: Vec::new(),
            },
            max_retries: 1,
            block_new_reason_prefix: None,
            new_critical_reasons: Vec::new(),
        }
    }

    #[test]
    fn batch_preserves_pack_declaration_order_under_multiple_workers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = MockBackend;
        let policy = Policy::default();
        let baseline_index = BaselineIndex::default();
        let guardrails = Guardrails::default();
        let pack = RepairBatchPack {
            pack_id: "pack-1".to_string(),
            cases: vec![case("a"), case("b"), case("c"), case("d")],
        };
        let ctx = RepairBatchContext {
            proposal_dir: dir.path(),
            backend: &backend,
            timeout_seconds: 30,
            baseline_index: Some(&baseline_index),
            baseline_index_dir: dir.path(),
            policy: &policy,
            policy_path: "policies/default.json",
            runtime_threshold: 0.2,
            output_dir: dir.path(),
            change_set_allowed_roots: &[],
            guardrails: &guardrails,
            worker_count: 4,
        };
        let summary = run_repair_batch(&pack, &ctx).expect("batch");
        let names: Vec<&str> = summary.cases.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
        assert_eq!(summary.improved_count, 4);
    }

    #[test]
    fn compare_profiles_recommends_profile_with_more_passes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = MockBackend;

        let mut prop = case("a").proposal;
        prop.requested_actions = BTreeSet::from([RequestedAction::Simulate, RequestedAction::Regress]);
        prop.checker_config.insert(
            "_runtime".to_string(),
            serde_json::json!({"mock_metrics": {"runtime_seconds": 1.6}}),
        );
        let mut spec = case("a");
        spec.proposal = prop;
        spec.max_retries = 0;

        let baseline_backend = MockBackend;
        let baseline_proposal = case("a").proposal;
        let baseline_request =
            gateforge_backend::BackendRequest { proposal: &baseline_proposal, timeout_seconds: 30 };
        let workspace = gateforge_backend::ScopedWorkspace::new().expect("workspace");
        let baseline_evidence =
            gateforge_backend::BackendAdapter::run(&baseline_backend, &baseline_request, &workspace)
                .expect("baseline run");
        gateforge_core::io::write_json_atomic(&dir.path().join("baseline.json"), &baseline_evidence)
            .expect("write baseline");

        let baseline_index = BaselineIndex {
            entries: vec![gateforge_config::BaselineIndexEntry {
                backend: "mock".to_string(),
                model_script: "s.mo".to_string(),
                baseline_path: "baseline.json".to_string(),
            }],
        };
        let guardrails = Guardrails::default();
        let pack = RepairBatchPack { pack_id: "pack-1".to_string(), cases: vec![spec] };

        // Runtime threshold high enough that only the performance_regression
        // checker (ratio 1.6 > default max_ratio 1.5) fires, not the
        // runtime-ratio step itself, isolating the policy difference below
        // to that one reason.
        let permissive_policy = Policy {
            reason_to_decision_by_risk: std::collections::BTreeMap::from([(
                "performance_regression_detected".to_string(),
                std::collections::BTreeMap::from([("low".to_string(), Decision::Pass)]),
            )]),
            ..Policy::default()
        };
        let strict_policy =
            Policy { critical_reasons: vec!["performance_regression_detected".to_string()], ..Policy::default() };

        let template = RepairBatchContextTemplate {
            proposal_dir: dir.path(),
            backend: &backend,
            timeout_seconds: 30,
            baseline_index: Some(&baseline_index),
            baseline_index_dir: dir.path(),
            runtime_threshold: 0.6,
            output_dir: dir.path(),
            change_set_allowed_roots: &[],
            guardrails: &guardrails,
            worker_count: 1,
        };

        let result =
            compare_profiles(&pack, "permissive", &permissive_policy, "strict", &strict_policy, &template)
                .expect("compare");
        assert_eq!(result.recommended_profile, "permissive");
        assert!(result.strict_downgrade_rate > 0.0);
    }
}
