//! Marginal-equalization backend: bisection on the budget multiplier.
//!
//! At the optimum of a concave separable objective under one equality
//! constraint, every channel with interior spend has the same marginal
//! return λ (the budget's shadow price); channels pinned at a bound have a
//! marginal on the far side of λ. That gives a one-dimensional search: for
//! a trial λ the per-channel best response is
//!
//! ```text
//! x_i(λ) = clip((a_i − λ) / (2·b_i), lb_i, ub_i)      (b_i > 0)
//! x_i(λ) = ub_i if λ < a_i else lb_i                  (b_i = 0)
//! ```
//!
//! and `Σ x_i(λ)` is non-increasing in λ, so bisection on λ over the
//! bracket `[min_i marginal(ub_i), max_i marginal(lb_i)]` pins the budget.
//! The problem is convex, so the bracketed solution is the global optimum.
//! Ties between linear channels make the sum jump past the budget; the
//! collapse path interpolates between the bracket endpoints, which resolves
//! the tie exactly.
use ndarray::Array1;
use tracing::debug;

use crate::allocation::errors::SolveResult;
use crate::allocation::problem::AllocationProblem;
use crate::allocation::solver::settle::distribute_residual;
use crate::allocation::solver::traits::{
    AllocatorBackend, SolveHistory, SolveOptions, SolveOutcome, Termination,
};
use crate::allocation::solver::types::{BoxBounds, Spend, ITERATION_BACKSTOP};

/// Production backend: bisection on the equalized marginal return.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarginalEqualizer;

impl MarginalEqualizer {
    /// Per-channel best response to a trial multiplier.
    fn allocation_at(problem: &AllocationProblem, bounds: &BoxBounds, lambda: f64) -> Spend {
        Array1::from_iter(problem.channels().iter().enumerate().map(|(i, curve)| {
            let lo = bounds.lower[i];
            let hi = bounds.upper[i];
            if curve.saturation > 0.0 {
                ((curve.efficiency - lambda) / (2.0 * curve.saturation)).clamp(lo, hi)
            } else if lambda < curve.efficiency {
                hi
            } else {
                lo
            }
        }))
    }

    /// Multiplier bracket guaranteed to contain the optimum.
    ///
    /// At the low end every channel sits at its upper bound (total >= budget
    /// by feasibility); at the high end every channel sits at its lower
    /// bound (total <= budget). The nudge keeps linear channels strictly on
    /// the intended side of their step.
    fn bracket(problem: &AllocationProblem, bounds: &BoxBounds) -> (f64, f64) {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for (i, curve) in problem.channels().iter().enumerate() {
            lo = lo.min(curve.marginal(bounds.upper[i]));
            hi = hi.max(curve.marginal(bounds.lower[i]));
        }
        let nudge = 1e-6 * (hi - lo).abs().max(1.0);
        (lo - nudge, hi + nudge)
    }
}

impl AllocatorBackend for MarginalEqualizer {
    fn name(&self) -> &'static str {
        "marginal-equalization"
    }

    fn solve(
        &self, problem: &AllocationProblem, bounds: &BoxBounds, x0: Spend, opts: &SolveOptions,
    ) -> SolveResult<SolveOutcome> {
        let budget = problem.total_budget();
        let budget_tol = opts.tols.tol_budget.map(|t| t * budget.abs().max(1.0));
        let max_iter = opts.tols.max_iter.unwrap_or(ITERATION_BACKSTOP);

        let (mut lo, mut hi) = Self::bracket(problem, bounds);
        let multiplier_tol = opts.tols.tol_multiplier.map(|t| t * (hi - lo).abs().max(1.0));

        let mut history = opts.track_history.then(SolveHistory::default);
        let mut iterations = 0;

        loop {
            iterations += 1;
            let mid = 0.5 * (lo + hi);
            let x = Self::allocation_at(problem, bounds, mid);
            let residual = budget - x.sum();
            if let Some(h) = history.as_mut() {
                h.record(iterations, problem.total_conversions(&x), residual, mid);
            }
            debug!(iteration = iterations, multiplier = mid, residual, "bisection step");

            if let Some(tol) = budget_tol {
                if residual.abs() <= tol {
                    let objective = problem.total_conversions(&x);
                    return SolveOutcome::new(
                        x,
                        objective,
                        Some(mid),
                        Termination::BudgetResidualWithinTolerance,
                        iterations,
                        history,
                    );
                }
            }

            // Total spend is non-increasing in the multiplier: over-allocation
            // means the multiplier must rise.
            if residual < 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }

            let width = hi - lo;
            let machine_width = f64::EPSILON * lo.abs().max(hi.abs()).max(1.0);
            let collapsed =
                multiplier_tol.map_or(false, |t| width <= t) || width <= machine_width;
            if collapsed {
                // The bracket invariant gives total(lo) >= budget >= total(hi);
                // interpolating between the endpoint allocations resolves any
                // step discontinuity (marginal-tied linear channels) exactly.
                let x_lo = Self::allocation_at(problem, bounds, lo);
                let x_hi = Self::allocation_at(problem, bounds, hi);
                let span = x_lo.sum() - x_hi.sum();
                let x = if span > 0.0 {
                    let theta = ((budget - x_hi.sum()) / span).clamp(0.0, 1.0);
                    Array1::from_iter(
                        x_hi.iter().zip(x_lo.iter()).map(|(&h, &l)| h + theta * (l - h)),
                    )
                } else {
                    x_hi
                };
                let objective = problem.total_conversions(&x);
                return SolveOutcome::new(
                    x,
                    objective,
                    Some(0.5 * (lo + hi)),
                    Termination::BracketCollapsed,
                    iterations,
                    history,
                );
            }

            if iterations >= max_iter {
                // Soft failure: hand back the better of the last under-budget
                // iterate and the initial feasible point, both settled onto
                // the budget, and let the caller decide.
                let mut candidate = Self::allocation_at(problem, bounds, hi);
                distribute_residual(&mut candidate, bounds, budget);
                let candidate_objective = problem.total_conversions(&candidate);
                let start_objective = problem.total_conversions(&x0);
                let (x, objective) = if candidate_objective >= start_objective {
                    (candidate, candidate_objective)
                } else {
                    (x0, start_objective)
                };
                return SolveOutcome::new(
                    x,
                    objective,
                    Some(0.5 * (lo + hi)),
                    Termination::IterationLimit,
                    iterations,
                    history,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::solver::feasibility::effective_bounds;
    use crate::allocation::solver::init::initial_allocation;
    use crate::allocation::solver::traits::Tolerances;
    use crate::curves::QuadCurve;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests drive the backend directly against known optima:
    // - the two-channel Lagrange closed form,
    // - single-channel and linear-channel degeneracies,
    // - the iteration-limit soft-failure path.
    //
    // Driver-level behavior (settlement, degenerate regions, packaging) is
    // covered by the api and integration tests.
    // -------------------------------------------------------------------------

    fn run(problem: &AllocationProblem, opts: &SolveOptions) -> SolveOutcome {
        let bounds = effective_bounds(problem);
        let x0 = initial_allocation(problem, &bounds);
        MarginalEqualizer
            .solve(problem, &bounds, x0, opts)
            .expect("backend should produce an outcome")
    }

    #[test]
    // Purpose
    // -------
    // Verify the solver against the Lagrange closed form: equal marginals
    // a₁ − 2b₁x₁ = a₂ − 2b₂x₂ with x₁ + x₂ = B gives x₁ = 20/0.003.
    //
    // Given
    // -----
    // - Channel A (a=5, b=0.0002), channel B (a=3, b=0.0001), B = 10_000,
    //   no binding bounds.
    //
    // Expect
    // ------
    // - x ≈ (6666.67, 3333.33), equalized marginal ≈ 2.333, converged.
    fn matches_two_channel_closed_form() {
        let problem = AllocationProblem::new(
            vec![
                QuadCurve::new("a", 5.0, 0.0002, 0.0, 10_000.0).unwrap(),
                QuadCurve::new("b", 3.0, 0.0001, 0.0, 10_000.0).unwrap(),
            ],
            10_000.0,
        )
        .unwrap();

        let outcome = run(&problem, &SolveOptions::default());

        assert!(outcome.converged);
        assert_relative_eq!(outcome.spend[0], 20.0 / 0.003, max_relative = 1e-4);
        assert_relative_eq!(outcome.spend[1], 10.0 / 0.003, max_relative = 1e-4);
        let lambda = outcome.multiplier.expect("search ran");
        assert_relative_eq!(lambda, 5.0 - 2.0 * 0.0002 * (20.0 / 0.003), max_relative = 1e-3);
    }

    #[test]
    fn single_channel_takes_the_whole_budget() {
        let problem = AllocationProblem::new(
            vec![QuadCurve::new("only", 0.001, 1e-9, 0.0, 100_000.0).unwrap()],
            50_000.0,
        )
        .unwrap();

        let outcome = run(&problem, &SolveOptions::default());

        assert!(outcome.converged);
        assert_relative_eq!(outcome.spend[0], 50_000.0, max_relative = 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // A single linear channel steps straight past the budget; the collapse
    // interpolation must still land exactly on it.
    fn single_linear_channel_resolves_by_interpolation() {
        let problem = AllocationProblem::new(
            vec![QuadCurve::new("linear", 0.5, 0.0, 0.0, 10_000.0).unwrap()],
            8_000.0,
        )
        .unwrap();

        let outcome = run(&problem, &SolveOptions::default());

        assert!(outcome.converged);
        assert_abs_diff_eq!(outcome.spend[0], 8_000.0, epsilon = 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // With two linear channels of distinct efficiency, the budget must go
    // to the better channel alone — never split by bound slack.
    fn distinct_linear_channels_fund_the_better_one() {
        let problem = AllocationProblem::new(
            vec![
                QuadCurve::new("better", 0.6, 0.0, 0.0, 10_000.0).unwrap(),
                QuadCurve::new("worse", 0.4, 0.0, 0.0, 10_000.0).unwrap(),
            ],
            6_000.0,
        )
        .unwrap();

        let outcome = run(&problem, &SolveOptions::default());

        assert_abs_diff_eq!(outcome.spend[0], 6_000.0, epsilon = 1e-3);
        assert_abs_diff_eq!(outcome.spend[1], 0.0, epsilon = 1e-3);
    }

    #[test]
    fn tied_linear_channels_split_the_budget() {
        let problem = AllocationProblem::new(
            vec![
                QuadCurve::new("a", 0.5, 0.0, 0.0, 10_000.0).unwrap(),
                QuadCurve::new("b", 0.5, 0.0, 0.0, 10_000.0).unwrap(),
            ],
            8_000.0,
        )
        .unwrap();

        let outcome = run(&problem, &SolveOptions::default());

        // Any split among marginal-tied channels is optimal; the objective is
        // what matters.
        assert_abs_diff_eq!(outcome.spend.sum(), 8_000.0, epsilon = 1e-6);
        assert_relative_eq!(outcome.objective, 0.5 * 8_000.0, max_relative = 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // Exhausting the iteration budget is a soft failure: the outcome must be
    // feasible, on budget, and flagged converged = false.
    fn iteration_limit_returns_best_feasible_iterate() {
        let problem = AllocationProblem::new(
            vec![
                QuadCurve::new("a", 5.0, 0.0002, 0.0, 10_000.0).unwrap(),
                QuadCurve::new("b", 3.0, 0.0001, 0.0, 10_000.0).unwrap(),
            ],
            10_000.0,
        )
        .unwrap();
        let opts = SolveOptions::new(
            Tolerances::new(Some(1e-15), None, Some(2)).unwrap(),
            false,
        );

        let outcome = run(&problem, &opts);

        assert!(!outcome.converged);
        assert_eq!(outcome.status, Termination::IterationLimit);
        assert_abs_diff_eq!(outcome.spend.sum(), 10_000.0, epsilon = 1e-6);
        for (i, curve) in problem.channels().iter().enumerate() {
            assert!(outcome.spend[i] >= curve.min_spend - 1e-9);
            assert!(outcome.spend[i] <= curve.max_spend + 1e-9);
        }
    }

    #[test]
    fn history_is_captured_when_requested() {
        let problem = AllocationProblem::new(
            vec![
                QuadCurve::new("a", 5.0, 0.0002, 0.0, 10_000.0).unwrap(),
                QuadCurve::new("b", 3.0, 0.0001, 0.0, 10_000.0).unwrap(),
            ],
            10_000.0,
        )
        .unwrap();

        let tracked = run(&problem, &SolveOptions::new(Tolerances::default(), true));
        let history = tracked.history.expect("tracking was enabled");
        assert_eq!(history.len(), tracked.iterations);
        assert!(!history.is_empty());

        let untracked = run(&problem, &SolveOptions::default());
        assert!(untracked.history.is_none());
    }
}
