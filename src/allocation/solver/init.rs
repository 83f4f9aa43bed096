//! Initial feasible point construction.
//!
//! The starting allocation splits the budget proportionally to each
//! channel's initial efficiency `a`, clips the result into the search
//! bounds, and settles the clipped residual back onto channels with
//! remaining slack so the equality constraint holds exactly. The production
//! backend only needs this point as its non-convergence fallback, but the
//! driver always constructs it so every backend receives a feasible start.
use crate::allocation::problem::AllocationProblem;
use crate::allocation::solver::settle::{clip_to_bounds, distribute_residual};
use crate::allocation::solver::types::{BoxBounds, Spend};

/// Build a feasible, on-budget starting allocation.
///
/// Preconditions: `bounds` come from
/// [`crate::allocation::solver::feasibility::effective_bounds`], so the
/// budget lies within their totals.
pub fn initial_allocation(problem: &AllocationProblem, bounds: &BoxBounds) -> Spend {
    let efficiencies = problem.efficiencies();
    let total: f64 = efficiencies.sum();
    let budget = problem.total_budget();

    // Efficiency weights are strictly positive by problem validation, so
    // the proportional split is well defined.
    let mut spend: Spend = efficiencies.mapv(|a| budget * a / total);
    clip_to_bounds(&mut spend, bounds);
    distribute_residual(&mut spend, bounds, budget);
    spend
}
