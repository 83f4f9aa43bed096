//! Validation and bound-construction helpers for the allocation solver.
//!
//! This module centralizes the consistency checks used across the solver
//! interface:
//!
//! - **Tolerance checks**: [`verify_tol_budget`], [`verify_tol_multiplier`]
//!   ensure numeric tolerances are finite and strictly positive when
//!   provided.
//! - **Effective bounds**: [`effective_bounds`] derives the usable upper
//!   bounds by clamping each channel at its saturation peak, relaxing the
//!   clamp when the capped totals cannot absorb the budget.
//! - **Solution checks**: [`check_solution`] re-validates a settled
//!   allocation against bounds and the budget sum, mirroring the driver's
//!   output invariants.
use ndarray::Array1;

use crate::allocation::errors::{SolveError, SolveResult};
use crate::allocation::problem::AllocationProblem;
use crate::allocation::solver::types::{BoxBounds, Spend, DEFAULT_TOL_BUDGET};

/// Validate the optional budget-residual tolerance.
///
/// - Accepts `None` (no stopping rule on the residual).
/// - If `Some`, the value must be **finite** and **strictly positive**.
///
/// # Errors
/// Returns [`SolveError::InvalidTolBudget`] if the value is non-finite or <= 0.
pub fn verify_tol_budget(tol: Option<f64>) -> SolveResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(SolveError::InvalidTolBudget { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(SolveError::InvalidTolBudget { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Validate the optional multiplier-bracket tolerance.
///
/// # Errors
/// Returns [`SolveError::InvalidTolMultiplier`] if the value is non-finite or <= 0.
pub fn verify_tol_multiplier(tol: Option<f64>) -> SolveResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(SolveError::InvalidTolMultiplier {
                tol,
                reason: "Tolerance must be finite.",
            });
        }
        if tol <= 0.0 {
            return Err(SolveError::InvalidTolMultiplier {
                tol,
                reason: "Tolerance must be positive.",
            });
        }
    }
    Ok(())
}

/// Derive the box bounds the search actually runs over.
///
/// Lower bounds are the raw `min_spend` values. Upper bounds start from each
/// channel's [`crate::curves::QuadCurve::effective_max_spend`] — the
/// saturation peak capped below `max_spend`, floored at `min_spend` — since
/// spend past a peak is never optimal while slack exists elsewhere.
///
/// Feasibility is defined on the raw bounds, so when the capped totals
/// cannot absorb the budget (`sum(effective) < B`) the caps are relaxed back
/// to raw `max_spend` for every channel. The concave objective places
/// past-peak spend only where the optimality conditions force it, so the
/// relax never produces a suboptimal interior allocation.
pub fn effective_bounds(problem: &AllocationProblem) -> BoxBounds {
    let lower = problem.lower_bounds();
    let capped: Spend =
        Array1::from_iter(problem.channels().iter().map(|c| c.effective_max_spend()));

    let budget = problem.total_budget();
    let tol = DEFAULT_TOL_BUDGET * budget.abs().max(1.0);
    let upper = if capped.sum() + tol < budget {
        problem.upper_bounds()
    } else {
        capped
    };

    BoxBounds::new(lower, upper)
}

/// Verify a settled allocation meets all output invariants.
///
/// Checks, in order:
/// 1. every spend within its channel's raw `[min_spend, max_spend]` bounds
///    (within `tol` absolute slack for float drift);
/// 2. the allocation sum equals the budget within `tol · max(1, B)`.
///
/// # Errors
/// - [`SolveError::BoundViolation`] naming the first offending channel.
/// - [`SolveError::BudgetMismatch`] with both sides of the failed sum.
pub fn check_solution(problem: &AllocationProblem, spend: &Spend, tol: f64) -> SolveResult<()> {
    for (curve, &x) in problem.channels().iter().zip(spend.iter()) {
        if x < curve.min_spend - tol || x > curve.max_spend + tol {
            return Err(SolveError::BoundViolation {
                channel: curve.channel.clone(),
                spend: x,
                lower: curve.min_spend,
                upper: curve.max_spend,
            });
        }
    }

    let budget = problem.total_budget();
    let allocated = spend.sum();
    if (allocated - budget).abs() > tol * budget.abs().max(1.0) {
        return Err(SolveError::BudgetMismatch { allocated, budget });
    }
    Ok(())
}
