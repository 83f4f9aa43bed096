/// Module-wide result alias for curve operations.
pub type CurveResult<T> = Result<T, CurveError>;

#[derive(Debug, Clone, PartialEq)]
pub enum CurveError {
    /// All curve parameters must be finite.
    NonFiniteParameter {
        channel: String,
        name: &'static str,
        value: f64,
    },

    /// Efficiency (initial conversions per dollar) must be > 0.
    NonPositiveEfficiency {
        channel: String,
        value: f64,
    },

    /// Saturation coefficient must be >= 0.
    NegativeSaturation {
        channel: String,
        value: f64,
    },

    /// Minimum spend must be >= 0.
    NegativeMinSpend {
        channel: String,
        value: f64,
    },

    /// Spend bounds must satisfy min_spend <= max_spend.
    SpendBoundsReversed {
        channel: String,
        min_spend: f64,
        max_spend: f64,
    },
}

impl std::error::Error for CurveError {}

impl std::fmt::Display for CurveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CurveError::NonFiniteParameter { channel, name, value } => {
                write!(f, "Channel '{channel}': parameter {name} is {value}, must be finite")
            }
            CurveError::NonPositiveEfficiency { channel, value } => {
                write!(f, "Channel '{channel}': efficiency is {value}, must be > 0")
            }
            CurveError::NegativeSaturation { channel, value } => {
                write!(f, "Channel '{channel}': saturation is {value}, must be >= 0")
            }
            CurveError::NegativeMinSpend { channel, value } => {
                write!(f, "Channel '{channel}': min_spend is {value}, must be >= 0")
            }
            CurveError::SpendBoundsReversed { channel, min_spend, max_spend } => {
                write!(
                    f,
                    "Channel '{channel}': min_spend {min_spend} exceeds max_spend {max_spend}"
                )
            }
        }
    }
}
