//! Quadratic saturation curves for marketing channels.
//!
//! Conversions as a function of spend are modeled as `f(x) = a·x − b·x²`:
//! concave, monotone increasing up to the peak point `a/(2b)`, and cheap to
//! optimize. The marginal return `f'(x) = a − 2·b·x` decreases linearly in
//! spend, which is the diminishing-returns behavior the allocator exploits.
use crate::curves::errors::{CurveError, CurveResult};

/// Per-channel quadratic response curve with allocation bounds.
///
/// Parameter space:
/// - `efficiency > 0` — initial conversions per dollar at zero spend
///   (roughly `CTR · CVR / CPC` when derived from funnel metrics).
/// - `saturation >= 0` — curvature that flattens performance as spend grows;
///   zero means a linear, non-saturating channel.
/// - `0 <= min_spend <= max_spend` — inclusive allocation bounds.
///
/// The struct stores values that already satisfy these constraints; use
/// [`QuadCurve::new`] to validate an instance built by hand. Instances are
/// immutable inputs to the allocator and are never mutated by it.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadCurve {
    pub channel: String,
    pub efficiency: f64,
    pub saturation: f64,
    pub min_spend: f64,
    pub max_spend: f64,
}

impl QuadCurve {
    /// Construct a validated channel curve.
    ///
    /// # Errors
    /// - [`CurveError::NonFiniteParameter`] if any numeric field is NaN or infinite.
    /// - [`CurveError::NonPositiveEfficiency`] if `efficiency <= 0`.
    /// - [`CurveError::NegativeSaturation`] if `saturation < 0`.
    /// - [`CurveError::NegativeMinSpend`] if `min_spend < 0`.
    /// - [`CurveError::SpendBoundsReversed`] if `min_spend > max_spend`.
    pub fn new(
        channel: impl Into<String>, efficiency: f64, saturation: f64, min_spend: f64,
        max_spend: f64,
    ) -> CurveResult<Self> {
        let curve = QuadCurve {
            channel: channel.into(),
            efficiency,
            saturation,
            min_spend,
            max_spend,
        };
        curve.validate()?;
        Ok(curve)
    }

    /// Re-run the construction checks on an existing instance.
    ///
    /// Useful for callers that received a curve with public fields filled in
    /// by hand (e.g. deserialized benchmark rows).
    pub fn validate(&self) -> CurveResult<()> {
        for (name, value) in [
            ("efficiency", self.efficiency),
            ("saturation", self.saturation),
            ("min_spend", self.min_spend),
            ("max_spend", self.max_spend),
        ] {
            if !value.is_finite() {
                return Err(CurveError::NonFiniteParameter {
                    channel: self.channel.clone(),
                    name,
                    value,
                });
            }
        }
        if self.efficiency <= 0.0 {
            return Err(CurveError::NonPositiveEfficiency {
                channel: self.channel.clone(),
                value: self.efficiency,
            });
        }
        if self.saturation < 0.0 {
            return Err(CurveError::NegativeSaturation {
                channel: self.channel.clone(),
                value: self.saturation,
            });
        }
        if self.min_spend < 0.0 {
            return Err(CurveError::NegativeMinSpend {
                channel: self.channel.clone(),
                value: self.min_spend,
            });
        }
        if self.min_spend > self.max_spend {
            return Err(CurveError::SpendBoundsReversed {
                channel: self.channel.clone(),
                min_spend: self.min_spend,
                max_spend: self.max_spend,
            });
        }
        Ok(())
    }

    /// Conversions at a spend level: `a·x − b·x²`.
    ///
    /// Precondition: `spend >= 0`. The raw formula computes for any finite
    /// input; past the peak point conversions decrease, which the allocator
    /// excludes from the usable range via [`QuadCurve::effective_max_spend`].
    pub fn evaluate(&self, spend: f64) -> f64 {
        self.efficiency * spend - self.saturation * spend * spend
    }

    /// Marginal conversions per additional dollar: `a − 2·b·x`.
    pub fn marginal(&self, spend: f64) -> f64 {
        self.efficiency - 2.0 * self.saturation * spend
    }

    /// Spend level at which the marginal return reaches zero: `a / (2b)`.
    ///
    /// Returns `None` for `saturation == 0` (linear channel, no finite peak).
    pub fn peak_point(&self) -> Option<f64> {
        if self.saturation > 0.0 {
            Some(self.efficiency / (2.0 * self.saturation))
        } else {
            None
        }
    }

    /// Economically usable upper bound: `min(max_spend, peak_point)`,
    /// floored at `min_spend`.
    ///
    /// Spending past the peak is never optimal while slack exists elsewhere,
    /// so the allocator caps the searchable range here. When `min_spend`
    /// already exceeds the peak the bound floor wins and the channel legally
    /// operates on the decreasing branch of its curve.
    pub fn effective_max_spend(&self) -> f64 {
        match self.peak_point() {
            Some(peak) => peak.min(self.max_spend).max(self.min_spend),
            None => self.max_spend,
        }
    }

    /// Batch-evaluate conversions at several spend levels.
    pub fn evaluate_levels(&self, spend_levels: &[f64]) -> Vec<f64> {
        spend_levels.iter().map(|&s| self.evaluate(s)).collect()
    }
}
