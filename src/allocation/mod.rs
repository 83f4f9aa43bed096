//! allocation — constrained budget allocation over channel response curves.
//!
//! Purpose
//! -------
//! Provide the full allocation layer: a validated problem description, a
//! backend-agnostic constrained solver, exact budget settlement, and the
//! packaged result callers report on. Callers build one
//! [`problem::AllocationProblem`] from their channel curves, call
//! [`solver::solve`], and obtain an [`result::AllocationResult`] or a typed
//! failure.
//!
//! Key behaviors
//! -------------
//! - Fail fast on precondition violations (bad channel parameters,
//!   duplicate names, infeasible bound sums) with errors naming the
//!   offending channel and constraint (`errors::SolveError`).
//! - Maximize the concave separable objective
//!   `Σ (aᵢ·xᵢ − bᵢ·xᵢ²)` subject to `Σ xᵢ = budget` and per-channel box
//!   bounds, with saturation peaks capping the usable range (`solver`).
//! - Conserve the budget exactly in the output — numerical drift is settled
//!   internally and never surfaces as an error.
//! - Treat non-convergence as a soft failure: the best feasible iterate is
//!   returned with `converged = false` instead of an error.
//!
//! Invariants & assumptions
//! ------------------------
//! - An `AllocationProblem` that exists is feasible and internally valid;
//!   solver layers run no further input checks.
//! - The problem is convex (concave objective, linear constraints), so any
//!   correctly bounded local search is globally optimal — the property the
//!   backend contract relies on.
//! - One problem solves to one result, synchronously, with no caching or
//!   shared state across invocations; concurrent callers use independently
//!   owned values.
//!
//! Conventions
//! -----------
//! - Spend vectors are `ndarray` arrays in problem order
//!   (`solver::types::Spend`); results are keyed by channel name.
//! - Public entrypoints that can fail return `SolveResult<T>`; callers never
//!   see curve-level error enums.
//! - This module performs no I/O; configuration, synthetic data, and
//!   reporting layers live elsewhere in the crate.
//!
//! Downstream usage
//! ----------------
//! - The CLI builds problems from benchmark rows and prints/persists the
//!   `AllocationResult` table.
//! - Alternate search strategies implement `solver::AllocatorBackend` and
//!   plug into `solver::solve_with` without touching this contract.
//!
//! Testing notes
//! -------------
//! - Submodule unit tests pin the closed-form two-channel optimum,
//!   degenerate feasible regions, settlement exactness, and the error
//!   taxonomy; the `tests/` suite exercises the synth → solve pipeline and
//!   the solver's output invariants end to end.

pub mod errors;
pub mod problem;
pub mod result;
pub mod solver;

pub use self::errors::{SolveError, SolveResult};
pub use self::problem::AllocationProblem;
pub use self::result::{AllocationResult, ChannelAllocation};
pub use self::solver::{solve, solve_with};
