//! curves — per-channel response curve models.
//!
//! Purpose
//! -------
//! Represent, per marketing channel, the concave quadratic response mapping
//! spend to expected conversions, together with the channel's allocation
//! bounds and the derived economically valid spend range.
//!
//! Key behaviors
//! -------------
//! - Validate curve parameters on construction ([`QuadCurve::new`]) so the
//!   allocator can assume economically sensible inputs.
//! - Evaluate conversions ([`QuadCurve::evaluate`]) and marginal conversions
//!   ([`QuadCurve::marginal`]) at a spend level.
//! - Expose the saturation peak ([`QuadCurve::peak_point`]) and the usable
//!   upper bound ([`QuadCurve::effective_max_spend`]) that excludes the
//!   counterproductive past-peak range.
//!
//! Invariants & assumptions
//! ------------------------
//! - Stored parameters always satisfy `efficiency > 0`, `saturation >= 0`,
//!   `0 <= min_spend <= max_spend`, all finite.
//! - Everything here is purely functional given `(a, b)`; no state, no I/O.
//!
//! Downstream usage
//! ----------------
//! - `allocation` consumes slices of [`QuadCurve`] for objective, gradient,
//!   and bound construction.
//! - `synth` derives curve coefficients from funnel metrics and converts its
//!   benchmark rows into validated curves.

pub mod errors;
pub mod quad;

pub use self::errors::{CurveError, CurveResult};
pub use self::quad::QuadCurve;
