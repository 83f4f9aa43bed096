//! Integration tests for the budget-allocation pipeline.
//!
//! Purpose
//! -------
//! - Validate the end-to-end flow: from a plan config, through synthetic
//!   benchmark generation, to a settled allocation with conserved budget
//!   and respected bounds.
//! - Pin the solver's output invariants on realistic channel sets rather
//!   than toy edge cases only.
//!
//! Coverage
//! --------
//! - `config` + `synth`:
//!   - plan parsing with defaults, seeded benchmark generation, and curve
//!     construction from benchmark rows.
//! - `allocation::problem`:
//!   - feasibility preconditions (both infeasibility directions).
//! - `allocation::solver`:
//!   - the two-channel Lagrange closed form, budget conservation, bound
//!     satisfaction, degenerate boundary regions, single-channel and
//!     past-peak edge cases, monotonicity in the budget, idempotence, and
//!     history capture.
//!
//! Exclusions
//! ----------
//! - Fine-grained validation of low-level building blocks (settlement,
//!   bracket construction, tolerance checks) — covered by unit tests.
//! - CLI argument handling and file persistence — exercised lightly via the
//!   CSV round-trip here, in full by the synth unit tests.
use approx::{assert_abs_diff_eq, assert_relative_eq};
use budget_optimizer::allocation::solver::{solve, SolveOptions, Termination, Tolerances};
use budget_optimizer::allocation::{AllocationProblem, AllocationResult, SolveError};
use budget_optimizer::config::PlanConfig;
use budget_optimizer::curves::QuadCurve;
use budget_optimizer::synth::{curves_from_benchmarks, generate_benchmarks};

/// Purpose
/// -------
/// Provide the standard five-channel plan used by the pipeline tests, with
/// bound sums that leave the 50k budget comfortably feasible.
fn standard_plan() -> PlanConfig {
    let yaml = r#"
budget:
  total: 50000.0
channels:
  - name: google
    min_spend: 5000.0
    max_spend: 30000.0
  - name: meta
    min_spend: 3000.0
    max_spend: 25000.0
  - name: tiktok
    min_spend: 2000.0
    max_spend: 20000.0
  - name: reddit
    min_spend: 1000.0
    max_spend: 10000.0
  - name: x
    min_spend: 500.0
    max_spend: 8000.0
synth_data:
  random_seed: 42
"#;
    PlanConfig::from_yaml(yaml, "standard-plan").expect("standard plan should validate")
}

/// Purpose
/// -------
/// Build a two-channel problem with a known Lagrange closed form:
/// equal marginals `5 − 0.0004·x₁ = 3 − 0.0002·x₂` under `x₁ + x₂ = budget`.
fn closed_form_pair(budget: f64) -> AllocationProblem {
    AllocationProblem::new(
        vec![
            QuadCurve::new("alpha", 5.0, 0.0002, 0.0, 10_000.0).unwrap(),
            QuadCurve::new("beta", 3.0, 0.0001, 0.0, 12_000.0).unwrap(),
        ],
        budget,
    )
    .expect("closed-form pair should be feasible")
}

fn solve_default(problem: &AllocationProblem) -> AllocationResult {
    solve(problem, &SolveOptions::default()).expect("feasible problems should solve")
}

#[test]
// Purpose
// -------
// Prove the whole synth → optimize workflow functions: generated benchmarks
// build valid curves, the solver allocates the full budget, and every
// channel lands inside its configured bounds.
fn full_synth_to_optimize_pipeline() {
    let config = standard_plan();

    let benchmarks = generate_benchmarks(&config).expect("generation should succeed");
    assert_eq!(benchmarks.len(), config.channels.len());
    for bench in &benchmarks {
        assert!(bench.curve_a > 0.0, "{}: curve_a must be positive", bench.channel);
        assert!(bench.curve_b > 0.0, "{}: curve_b must be positive", bench.channel);
    }

    let curves = curves_from_benchmarks(&benchmarks).expect("benchmarks build valid curves");
    let problem = AllocationProblem::new(curves, config.total_budget()).unwrap();
    let result = solve_default(&problem);

    assert!(result.converged);
    assert_eq!(result.allocations.len(), benchmarks.len());

    // Budget conservation, the important one.
    assert_abs_diff_eq!(result.total_spend, 50_000.0, epsilon = 1e-6 * 50_000.0);
    assert_relative_eq!(result.budget_utilization, 1.0, max_relative = 1e-6);

    for (row, bench) in result.allocations.iter().zip(&benchmarks) {
        assert_eq!(row.channel, bench.channel);
        assert!(
            row.spend >= bench.min_spend - 1e-6 && row.spend <= bench.max_spend + 1e-6,
            "{}: spend {} outside [{}, {}]",
            row.channel,
            row.spend,
            bench.min_spend,
            bench.max_spend
        );
    }
    assert!(result.total_conversions > 0.0);
}

#[test]
// Purpose
// -------
// The solver must reproduce the Lagrange closed form: for this pair the
// optimum is x₁ = 20/0.003 ≈ 6666.67, x₂ ≈ 3333.33.
fn two_channel_allocation_matches_closed_form() {
    let result = solve_default(&closed_form_pair(10_000.0));

    assert!(result.converged);
    assert_relative_eq!(
        result.spend_for("alpha").unwrap(),
        20.0 / 0.003,
        max_relative = 1e-4
    );
    assert_relative_eq!(
        result.spend_for("beta").unwrap(),
        10.0 / 0.003,
        max_relative = 1e-4
    );

    // Marginal returns equalize at the optimum.
    let alpha_marginal = 5.0 - 2.0 * 0.0002 * result.spend_for("alpha").unwrap();
    let beta_marginal = 3.0 - 2.0 * 0.0001 * result.spend_for("beta").unwrap();
    assert_relative_eq!(alpha_marginal, beta_marginal, max_relative = 1e-3);
}

#[test]
fn budget_is_conserved_across_budget_levels() {
    for budget in [12_000.0, 20_000.0, 35_000.0, 50_000.0] {
        let config = standard_plan();
        let benchmarks = generate_benchmarks(&config).unwrap();
        let curves = curves_from_benchmarks(&benchmarks).unwrap();
        let problem = AllocationProblem::new(curves, budget).unwrap();

        let result = solve_default(&problem);
        assert_abs_diff_eq!(result.total_spend, budget, epsilon = 1e-6 * budget);
    }
}

#[test]
// Purpose
// -------
// A budget exactly equal to the min-spend sum leaves a feasible region of
// size zero: the result must be the min-spend vector, exactly, unsearched.
fn min_spend_sum_budget_returns_lower_bounds_exactly() {
    let problem = AllocationProblem::new(
        vec![
            QuadCurve::new("google", 0.0010, 1e-8, 5_000.0, 30_000.0).unwrap(),
            QuadCurve::new("meta", 0.0008, 8e-9, 3_000.0, 25_000.0).unwrap(),
            QuadCurve::new("tiktok", 0.0006, 6e-9, 2_000.0, 20_000.0).unwrap(),
        ],
        10_000.0,
    )
    .unwrap();

    let result = solve_default(&problem);

    assert_eq!(result.status, Termination::DegenerateFeasibleRegion);
    assert_eq!(result.iterations, 0);
    assert_eq!(result.spend_for("google"), Some(5_000.0));
    assert_eq!(result.spend_for("meta"), Some(3_000.0));
    assert_eq!(result.spend_for("tiktok"), Some(2_000.0));
}

#[test]
fn infeasible_budgets_are_rejected_before_any_search() {
    let channels = || {
        vec![
            QuadCurve::new("a", 0.001, 1e-8, 2_000.0, 10_000.0).unwrap(),
            QuadCurve::new("b", 0.001, 1e-8, 2_000.0, 10_000.0).unwrap(),
        ]
    };

    let err = AllocationProblem::new(channels(), 1_000.0).unwrap_err();
    assert!(matches!(err, SolveError::BudgetBelowMinSpend { total_min_spend, .. }
        if total_min_spend == 4_000.0));

    let err = AllocationProblem::new(channels(), 30_000.0).unwrap_err();
    assert!(matches!(err, SolveError::BudgetAboveMaxSpend { total_max_spend, .. }
        if total_max_spend == 20_000.0));
}

#[test]
// Purpose
// -------
// Single-channel trivial case: the entire budget lands in the one channel
// and conversions equal `f(budget)`.
fn single_channel_takes_the_whole_budget() {
    let curve = QuadCurve::new("only", 0.001, 1e-9, 0.0, 100_000.0).unwrap();
    let expected_conversions = curve.evaluate(50_000.0);
    let problem = AllocationProblem::new(vec![curve], 50_000.0).unwrap();

    let result = solve_default(&problem);

    assert_relative_eq!(result.spend_for("only").unwrap(), 50_000.0, max_relative = 1e-9);
    assert_relative_eq!(
        result.conversions_for("only").unwrap(),
        expected_conversions,
        max_relative = 1e-6
    );
}

#[test]
// Purpose
// -------
// A channel whose min_spend sits past its saturation peak is legal: bounds
// win, the channel operates on the decreasing branch, and the remaining
// budget still allocates optimally.
fn min_spend_past_peak_is_respected() {
    // Peak for "saturated" is at 10_000, below its 12_000 minimum.
    let problem = AllocationProblem::new(
        vec![
            QuadCurve::new("saturated", 0.001, 5e-8, 12_000.0, 20_000.0).unwrap(),
            QuadCurve::new("healthy", 0.001, 1e-8, 0.0, 30_000.0).unwrap(),
        ],
        20_000.0,
    )
    .unwrap();

    let result = solve_default(&problem);

    let saturated = result.spend_for("saturated").unwrap();
    assert!(saturated >= 12_000.0 - 1e-6);
    // Nothing beyond the forced minimum: extra spend there only loses
    // conversions while "healthy" still has positive marginal return.
    assert_abs_diff_eq!(saturated, 12_000.0, epsilon = 1e-3);
    assert_abs_diff_eq!(result.total_spend, 20_000.0, epsilon = 1e-6 * 20_000.0);

    let row = &result.allocations[0];
    assert!(row.marginal_return < 0.0, "past-peak channel has negative marginal");
}

#[test]
// Purpose
// -------
// With bounds able to absorb the increase below every saturation peak,
// more budget can never mean fewer total conversions.
fn total_conversions_are_monotone_in_budget() {
    let mut previous = f64::NEG_INFINITY;
    for budget in [5_000.0, 10_000.0, 15_000.0, 20_000.0] {
        let result = solve_default(&closed_form_pair(budget));
        assert!(
            result.total_conversions >= previous - 1e-9,
            "conversions decreased when budget rose to {budget}"
        );
        previous = result.total_conversions;
    }
}

#[test]
fn identical_problems_solve_identically() {
    let config = standard_plan();
    let benchmarks = generate_benchmarks(&config).unwrap();

    let first = solve_default(
        &AllocationProblem::new(curves_from_benchmarks(&benchmarks).unwrap(), 50_000.0).unwrap(),
    );
    let second = solve_default(
        &AllocationProblem::new(curves_from_benchmarks(&benchmarks).unwrap(), 50_000.0).unwrap(),
    );

    for (a, b) in first.allocations.iter().zip(&second.allocations) {
        assert_relative_eq!(a.spend, b.spend, max_relative = 1e-12);
        assert_relative_eq!(a.conversions, b.conversions, max_relative = 1e-12);
    }
}

#[test]
// Purpose
// -------
// History tracking surfaces the search trajectory through the public
// result without changing the allocation.
fn history_tracking_flows_through_to_the_result() {
    let problem = closed_form_pair(10_000.0);

    let tracked = solve(
        &problem,
        &SolveOptions::new(Tolerances::default(), true),
    )
    .unwrap();
    let plain = solve_default(&problem);

    let history = tracked.history.as_ref().expect("tracking was requested");
    assert_eq!(history.len(), tracked.iterations);
    // The last recorded budget error should be small by the time the
    // search stops.
    let last_error = history.budget_error.last().copied().unwrap();
    assert!(last_error.abs() <= 1e-4 * 10_000.0);

    assert_relative_eq!(
        tracked.spend_for("alpha").unwrap(),
        plain.spend_for("alpha").unwrap(),
        max_relative = 1e-9
    );
}

#[test]
fn non_convergence_is_soft_and_visible() {
    let opts = SolveOptions::new(
        Tolerances::new(Some(1e-15), None, Some(2)).unwrap(),
        false,
    );
    let result = solve(&closed_form_pair(10_000.0), &opts).unwrap();

    assert!(!result.converged);
    assert_eq!(result.status, Termination::IterationLimit);
    // Best-effort iterate is still feasible and on budget.
    assert_abs_diff_eq!(result.total_spend, 10_000.0, epsilon = 1e-6 * 10_000.0);
    assert!(result.to_string().contains("not converged"));
}
