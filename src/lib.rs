//! budget_optimizer — constrained marketing budget allocation.
//!
//! Purpose
//! -------
//! Allocate a fixed marketing budget across advertising channels to
//! maximize total conversions, where each channel's response exhibits
//! diminishing returns. The crate pairs a per-channel quadratic response
//! model with a convex constrained solver, plus the supporting layers a
//! planning pipeline needs: plan configuration, synthetic benchmark
//! generation, and tabular result reporting.
//!
//! Key behaviors
//! -------------
//! - Model each channel as `f(x) = a·x − b·x²` with validity bounds and a
//!   saturation peak (`curves`).
//! - Solve `maximize Σ f_i(x_i)` subject to `Σ x_i = budget` and per-channel
//!   spend bounds, with exact budget conservation in the output
//!   (`allocation`).
//! - Load and validate YAML plan files (`config`) and generate seeded
//!   synthetic channel benchmarks (`synth`) for the CLI pipeline.
//!
//! Invariants & assumptions
//! ------------------------
//! - Validated values are the only way in: curves, problems, tolerances,
//!   and configs all check their invariants at construction and are treated
//!   as internally consistent afterwards.
//! - The optimization problem is convex (concave separable objective,
//!   linear constraints), so the solver needs only a correctly bounded
//!   local search.
//! - The core is synchronous and side-effect free; file I/O lives in the
//!   config, synth, and reporting edges only.
//!
//! Conventions
//! -----------
//! - Spend vectors are `ndarray::Array1<f64>` in problem order; results are
//!   keyed by channel name.
//! - Fallible operations return module-local result aliases
//!   (`CurveResult`, `SolveResult`, `ConfigResult`, `SynthResult`); errors
//!   are hand-rolled enums that name the offending channel or constraint.
//! - Non-convergence is reported through a `converged` flag on the result,
//!   never as an error.
//!
//! Downstream usage
//! ----------------
//! - Library callers build `QuadCurve`s, assemble an `AllocationProblem`,
//!   and call `allocation::solve`; see the `prelude` for the curated
//!   surface.
//! - The `budget-optimizer` binary drives the full synth → optimize
//!   pipeline from a YAML plan file.
//!
//! Testing notes
//! -------------
//! - Unit tests live in `#[cfg(test)]` modules next to the code they pin
//!   (closed-form optima, settlement exactness, validation taxonomies).
//! - `tests/integration_allocation_pipeline.rs` exercises the end-to-end
//!   pipeline and the solver's output invariants.

pub mod allocation;
pub mod config;
pub mod curves;
pub mod synth;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use budget_optimizer::prelude::*;
//
// to import the main allocation surface in a single line.

pub mod prelude {
    pub use crate::allocation::solver::{
        solve, solve_with, AllocatorBackend, BackendChoice, SolveOptions, SolveOutcome,
        Termination, Tolerances,
    };
    pub use crate::allocation::{AllocationProblem, AllocationResult, SolveError, SolveResult};
    pub use crate::curves::{CurveError, CurveResult, QuadCurve};
}
