//! Public configuration and outcome surface for the allocation solver.
//!
//! - [`AllocatorBackend`]: trait a constrained-search backend implements.
//! - [`SolveOptions`] and [`Tolerances`]: configuration for a solve run.
//! - [`Termination`]: why a backend stopped.
//! - [`SolveOutcome`]: normalized raw result handed back to the driver.
//!
//! Convention: backends search over the effective box bounds and the single
//! budget-equality constraint; exact settlement of the budget sum is the
//! driver's job, so a backend may return an iterate that is only within
//! tolerance of the budget.
use std::str::FromStr;

use crate::allocation::errors::{SolveError, SolveResult};
use crate::allocation::problem::AllocationProblem;
use crate::allocation::solver::feasibility::{verify_tol_budget, verify_tol_multiplier};
use crate::allocation::solver::types::{
    BoxBounds, Spend, DEFAULT_MAX_ITER, DEFAULT_TOL_BUDGET, DEFAULT_TOL_MULTIPLIER,
};

/// Constrained-search backend interface.
///
/// Implementors maximize the problem's concave separable objective subject
/// to `bounds` and the budget-equality constraint. The problem is convex,
/// so a correctly bounded local search is globally optimal; backends need no
/// global-optimization machinery.
///
/// Contract:
/// - `x0` is a feasible starting point (on budget, within bounds); backends
///   that do not need one may use it only as the non-convergence fallback.
/// - On iteration exhaustion, return the best feasible iterate found with
///   `converged = false` rather than erroring; callers decide whether a
///   near-optimal allocation is acceptable.
pub trait AllocatorBackend {
    /// Human-readable backend name for logs and diagnostics.
    fn name(&self) -> &'static str;

    fn solve(
        &self, problem: &AllocationProblem, bounds: &BoxBounds, x0: Spend, opts: &SolveOptions,
    ) -> SolveResult<SolveOutcome>;
}

/// Choice of production backend behind the [`AllocatorBackend`] seam.
///
/// Variants:
/// - `MarginalEqualization`: bisection on the equalized marginal return.
///
/// Parsing:
/// This enum implements `FromStr` and accepts case-insensitive names with
/// `-`/`_` separators (`"marginal_equalization"`, `"marginal-equalization"`).
/// Unknown names return [`SolveError::UnknownBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendChoice {
    MarginalEqualization,
}

impl FromStr for BackendChoice {
    type Err = SolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "marginal_equalization" | "marginalequalization" => {
                Ok(BackendChoice::MarginalEqualization)
            }
            _ => Err(SolveError::UnknownBackend {
                name: s.to_string(),
                reason: "The only available backend is 'marginal_equalization'.",
            }),
        }
    }
}

/// Numerical tolerances and iteration limits for the search.
///
/// - `tol_budget`: stop when the budget residual `|sum(x) − B|` falls below
///   `tol_budget · max(1, B)`.
/// - `tol_multiplier`: stop when the multiplier bracket narrows below
///   `tol_multiplier · max(1, initial width)`.
/// - `max_iter`: hard cap on search iterations.
///
/// Any field can be `None` but **at least one** of the three must be
/// provided (see [`Tolerances::new`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_budget: Option<f64>,
    pub tol_multiplier: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Rules
    /// - At least one of `tol_budget`, `tol_multiplier`, or `max_iter` must
    ///   be `Some`.
    /// - If provided, tolerances must be **finite and strictly positive**.
    /// - If provided, `max_iter` must be `> 0`.
    ///
    /// # Errors
    /// - [`SolveError::NoTolerancesProvided`] if all three are `None`.
    /// - [`SolveError::InvalidTolBudget`] / [`SolveError::InvalidTolMultiplier`]
    ///   for non-finite or non-positive tolerances.
    /// - [`SolveError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_budget: Option<f64>, tol_multiplier: Option<f64>, max_iter: Option<usize>,
    ) -> SolveResult<Self> {
        if tol_budget.is_none() && tol_multiplier.is_none() && max_iter.is_none() {
            return Err(SolveError::NoTolerancesProvided);
        }
        verify_tol_budget(tol_budget)?;
        verify_tol_multiplier(tol_multiplier)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(SolveError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_budget, tol_multiplier, max_iter })
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            tol_budget: Some(DEFAULT_TOL_BUDGET),
            tol_multiplier: Some(DEFAULT_TOL_MULTIPLIER),
            max_iter: Some(DEFAULT_MAX_ITER),
        }
    }
}

/// Solver-level configuration.
///
/// - `tols`: numerical tolerances and iteration limits.
/// - `track_history`: when `true`, the backend records per-iteration
///   diagnostics into [`SolveHistory`] for downstream convergence
///   inspection.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SolveOptions {
    pub tols: Tolerances,
    pub track_history: bool,
}

impl SolveOptions {
    pub fn new(tols: Tolerances, track_history: bool) -> Self {
        Self { tols, track_history }
    }
}

/// Why the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Budget residual fell within tolerance.
    BudgetResidualWithinTolerance,
    /// The multiplier bracket collapsed; residual settled by redistribution
    /// among marginal-tied channels.
    BracketCollapsed,
    /// The feasible region was a single point; no search was needed.
    DegenerateFeasibleRegion,
    /// Iteration budget exhausted before the convergence tests were met.
    IterationLimit,
}

impl Termination {
    /// Whether this termination counts as converged.
    pub fn converged(self) -> bool {
        !matches!(self, Termination::IterationLimit)
    }
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::BudgetResidualWithinTolerance => {
                write!(f, "Budget residual within tolerance")
            }
            Termination::BracketCollapsed => write!(f, "Multiplier bracket collapsed"),
            Termination::DegenerateFeasibleRegion => write!(f, "Degenerate feasible region"),
            Termination::IterationLimit => write!(f, "Iteration limit reached"),
        }
    }
}

/// Per-iteration diagnostics captured when `track_history` is enabled.
///
/// Parallel vectors, one entry per search iteration: objective value at the
/// iterate, budget-constraint error `B − sum(x)`, and the multiplier tried.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SolveHistory {
    pub iteration: Vec<usize>,
    pub objective: Vec<f64>,
    pub budget_error: Vec<f64>,
    pub multiplier: Vec<f64>,
}

impl SolveHistory {
    pub fn record(&mut self, iteration: usize, objective: f64, budget_error: f64, multiplier: f64) {
        self.iteration.push(iteration);
        self.objective.push(objective);
        self.budget_error.push(budget_error);
        self.multiplier.push(multiplier);
    }

    pub fn len(&self) -> usize {
        self.iteration.len()
    }

    pub fn is_empty(&self) -> bool {
        self.iteration.is_empty()
    }
}

/// Canonical raw result returned by a backend.
///
/// - `spend`: best spend vector found (validated finite on construction).
/// - `objective`: total conversions at `spend`.
/// - `multiplier`: equalized marginal return (the budget constraint's
///   shadow price); `None` when no search ran.
/// - `converged` / `status`: termination bookkeeping.
/// - `iterations`: number of search iterations performed.
/// - `history`: per-iteration diagnostics when tracking was requested.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub spend: Spend,
    pub objective: f64,
    pub multiplier: Option<f64>,
    pub converged: bool,
    pub status: Termination,
    pub iterations: usize,
    pub history: Option<SolveHistory>,
}

impl SolveOutcome {
    /// Build a validated outcome from raw solver state.
    ///
    /// # Errors
    /// - [`SolveError::NonFiniteSpend`] if any spend entry is NaN or
    ///   infinite.
    pub fn new(
        spend: Spend, objective: f64, multiplier: Option<f64>, status: Termination,
        iterations: usize, history: Option<SolveHistory>,
    ) -> SolveResult<Self> {
        for (index, &value) in spend.iter().enumerate() {
            if !value.is_finite() {
                return Err(SolveError::NonFiniteSpend { index, value });
            }
        }
        Ok(Self {
            spend,
            objective,
            multiplier,
            converged: status.converged(),
            status,
            iterations,
            history,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn backend_names_parse_case_and_separator_insensitively() {
        assert_eq!(
            "marginal_equalization".parse::<BackendChoice>().unwrap(),
            BackendChoice::MarginalEqualization
        );
        assert_eq!(
            "Marginal-Equalization".parse::<BackendChoice>().unwrap(),
            BackendChoice::MarginalEqualization
        );
        let err = "slsqp".parse::<BackendChoice>().unwrap_err();
        assert!(matches!(err, SolveError::UnknownBackend { name, .. } if name == "slsqp"));
    }

    #[test]
    fn at_least_one_tolerance_is_required() {
        let err = Tolerances::new(None, None, None).unwrap_err();
        assert_eq!(err, SolveError::NoTolerancesProvided);
    }

    #[test]
    fn non_positive_tolerances_are_rejected() {
        let err = Tolerances::new(Some(0.0), None, None).unwrap_err();
        assert!(matches!(err, SolveError::InvalidTolBudget { .. }));

        let err = Tolerances::new(None, Some(-1e-9), None).unwrap_err();
        assert!(matches!(err, SolveError::InvalidTolMultiplier { .. }));

        let err = Tolerances::new(None, None, Some(0)).unwrap_err();
        assert!(matches!(err, SolveError::InvalidMaxIter { .. }));
    }

    #[test]
    fn defaults_are_self_consistent() {
        let tols = Tolerances::default();
        // The defaults must themselves pass validation.
        assert!(Tolerances::new(tols.tol_budget, tols.tol_multiplier, tols.max_iter).is_ok());

        let opts = SolveOptions::default();
        assert!(!opts.track_history);
    }

    #[test]
    fn outcome_rejects_non_finite_spend() {
        let err = SolveOutcome::new(
            array![1.0, f64::NAN],
            0.0,
            None,
            Termination::BudgetResidualWithinTolerance,
            3,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, SolveError::NonFiniteSpend { index: 1, .. }));
    }

    #[test]
    fn only_the_iteration_limit_counts_as_non_convergence() {
        assert!(Termination::BudgetResidualWithinTolerance.converged());
        assert!(Termination::BracketCollapsed.converged());
        assert!(Termination::DegenerateFeasibleRegion.converged());
        assert!(!Termination::IterationLimit.converged());
    }

    #[test]
    fn history_records_parallel_vectors() {
        let mut history = SolveHistory::default();
        history.record(1, 10.0, -0.5, 2.0);
        history.record(2, 11.0, 0.1, 1.5);

        assert_eq!(history.len(), 2);
        assert_eq!(history.iteration, vec![1, 2]);
        assert_eq!(history.multiplier, vec![2.0, 1.5]);
    }
}
