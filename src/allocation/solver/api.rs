//! High-level entry point for solving an [`AllocationProblem`].
//!
//! This validates options, short-circuits degenerate feasible regions,
//! builds the effective bounds and a feasible starting point, dispatches to
//! a backend (the marginal-equalization bisection by default), settles the
//! returned iterate onto the exact budget, re-checks the output invariants,
//! and packages everything into an [`AllocationResult`].
use tracing::{debug, warn};

use crate::allocation::errors::SolveResult;
use crate::allocation::problem::AllocationProblem;
use crate::allocation::result::AllocationResult;
use crate::allocation::solver::equalizer::MarginalEqualizer;
use crate::allocation::solver::feasibility::{check_solution, effective_bounds};
use crate::allocation::solver::init::initial_allocation;
use crate::allocation::solver::settle::{clip_to_bounds, distribute_residual};
use crate::allocation::solver::traits::{
    AllocatorBackend, SolveOptions, SolveOutcome, Termination, Tolerances,
};
use crate::allocation::solver::types::{DEFAULT_TOL_BUDGET, SOLUTION_CHECK_TOL};

/// Solve with the production backend ([`MarginalEqualizer`]).
///
/// See [`solve_with`] for the full contract.
pub fn solve(problem: &AllocationProblem, opts: &SolveOptions) -> SolveResult<AllocationResult> {
    solve_with(problem, &MarginalEqualizer, opts)
}

/// Solve an allocation problem with an explicit backend.
///
/// # Behavior
/// - Re-validates the option tolerances (options have public fields).
/// - Degenerate feasible regions (`budget ≈ Σ min_spend` or `Σ max_spend`)
///   return the corresponding boundary allocation exactly, with no search.
/// - Otherwise: derive effective bounds (saturation peaks capped), build a
///   feasible starting point, run the backend, settle the iterate onto the
///   exact budget, and re-check bounds and budget before packaging.
/// - Non-convergence is soft: the result carries `converged = false` and the
///   best feasible iterate; no error is raised for it.
///
/// # Errors
/// - Option validation errors ([`crate::allocation::errors::SolveError`]
///   tolerance variants).
/// - Backend errors, and post-settlement constraint-check failures
///   (`BoundViolation` / `BudgetMismatch`), which indicate a backend bug
///   rather than bad input.
pub fn solve_with<B: AllocatorBackend>(
    problem: &AllocationProblem, backend: &B, opts: &SolveOptions,
) -> SolveResult<AllocationResult> {
    Tolerances::new(opts.tols.tol_budget, opts.tols.tol_multiplier, opts.tols.max_iter)?;

    let budget = problem.total_budget();
    let degenerate_tol =
        opts.tols.tol_budget.unwrap_or(DEFAULT_TOL_BUDGET) * budget.abs().max(1.0);

    // Zero-width feasible regions need no iterative search: the boundary
    // allocation is the only feasible point and is returned exactly.
    let lower = problem.lower_bounds();
    if (budget - lower.sum()).abs() <= degenerate_tol {
        let objective = problem.total_conversions(&lower);
        let outcome = SolveOutcome::new(
            lower,
            objective,
            None,
            Termination::DegenerateFeasibleRegion,
            0,
            None,
        )?;
        return Ok(AllocationResult::new(problem, outcome));
    }
    let upper = problem.upper_bounds();
    if (upper.sum() - budget).abs() <= degenerate_tol {
        let objective = problem.total_conversions(&upper);
        let outcome = SolveOutcome::new(
            upper,
            objective,
            None,
            Termination::DegenerateFeasibleRegion,
            0,
            None,
        )?;
        return Ok(AllocationResult::new(problem, outcome));
    }

    let bounds = effective_bounds(problem);
    let x0 = initial_allocation(problem, &bounds);
    debug!(
        backend = backend.name(),
        channels = problem.len(),
        budget,
        "dispatching allocation search"
    );

    let raw = backend.solve(problem, &bounds, x0, opts)?;
    if !raw.converged {
        warn!(
            backend = backend.name(),
            iterations = raw.iterations,
            "search did not converge; returning best feasible iterate"
        );
    }

    // Settlement: remove numerical drift, then make the budget sum exact.
    let mut spend = raw.spend;
    clip_to_bounds(&mut spend, &bounds);
    distribute_residual(&mut spend, &bounds, budget);
    check_solution(problem, &spend, SOLUTION_CHECK_TOL)?;

    let objective = problem.total_conversions(&spend);
    let outcome = SolveOutcome::new(
        spend,
        objective,
        raw.multiplier,
        raw.status,
        raw.iterations,
        raw.history,
    )?;
    Ok(AllocationResult::new(problem, outcome))
}
