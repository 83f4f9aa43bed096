//! solver — backend-agnostic constrained search for budget allocation.
//!
//! Purpose
//! -------
//! Turn a validated [`crate::allocation::problem::AllocationProblem`] into a
//! settled, exactly-on-budget spend vector. The driver ([`api::solve`])
//! owns everything method-independent — option validation, degenerate
//! short-circuits, effective bounds, the initial feasible point, settlement,
//! and output checks — while the numerical search itself lives behind the
//! [`traits::AllocatorBackend`] seam.
//!
//! Key behaviors
//! -------------
//! - Cap each channel's searchable range at its saturation peak
//!   ([`feasibility::effective_bounds`]), relaxing the cap when the budget
//!   cannot fit under the peaks.
//! - Construct an efficiency-weighted feasible starting point
//!   ([`init::initial_allocation`]).
//! - Run the production backend — bisection on the equalized marginal
//!   return ([`equalizer::MarginalEqualizer`]) — or any caller-supplied
//!   [`traits::AllocatorBackend`].
//! - Settle iterates onto the exact budget ([`settle`]) and re-check bounds
//!   before packaging.
//!
//! Conventions
//! -----------
//! - Numeric aliases and shared constants live in [`types`]; the rest of the
//!   solver stays container-agnostic.
//! - Backends may return iterates within tolerance of the budget; exactness
//!   is the driver's job.
//! - Errors bubble up as `SolveResult<T>`; this module never intentionally
//!   panics in non-test code.
//!
//! Testing notes
//! -------------
//! - Backend unit tests pin known optima (closed forms, linear-channel
//!   ties, soft non-convergence); driver tests cover degenerate regions,
//!   settlement, and the backend-substitution seam.

pub mod api;
pub mod equalizer;
pub mod feasibility;
pub mod init;
pub mod settle;
pub mod traits;
pub mod types;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::{solve, solve_with};
pub use self::equalizer::MarginalEqualizer;
pub use self::traits::{
    AllocatorBackend, BackendChoice, SolveHistory, SolveOptions, SolveOutcome, Termination,
    Tolerances,
};
pub use self::types::{BoxBounds, Marginal, Spend};
