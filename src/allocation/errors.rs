use crate::curves::errors::CurveError;

/// Module-wide result alias for allocation operations.
pub type SolveResult<T> = Result<T, SolveError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SolveError {
    // ---- Channel parameters ----
    /// A curve parameter is NaN or infinite.
    NonFiniteParameter {
        channel: String,
        name: &'static str,
        value: f64,
    },

    /// Efficiency must be > 0 for a channel to be worth allocating to.
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

    /// Channel names must be unique across the problem.
    DuplicateChannelId {
        channel: String,
    },

    /// At least one channel is required.
    NoChannels,

    // ---- Budget ----
    /// Total budget must be finite and >= 0.
    InvalidBudget {
        value: f64,
        reason: &'static str,
    },

    /// Budget cannot cover the channel minimum spends.
    BudgetBelowMinSpend {
        budget: f64,
        total_min_spend: f64,
    },

    /// Budget exceeds what the channel maximum spends can absorb.
    BudgetAboveMaxSpend {
        budget: f64,
        total_max_spend: f64,
    },

    // ---- Options ----
    /// Budget-residual tolerance needs to be positive and finite.
    InvalidTolBudget {
        tol: f64,
        reason: &'static str,
    },

    /// Multiplier-bracket tolerance needs to be positive and finite.
    InvalidTolMultiplier {
        tol: f64,
        reason: &'static str,
    },

    /// Maximum iterations needs to be positive.
    InvalidMaxIter {
        max_iter: usize,
        reason: &'static str,
    },

    /// At least one tolerance must be provided.
    NoTolerancesProvided,

    /// Invalid solver backend name.
    UnknownBackend {
        name: String,
        reason: &'static str,
    },

    // ---- Solution checks ----
    /// A settled spend value escaped its channel bounds.
    BoundViolation {
        channel: String,
        spend: f64,
        lower: f64,
        upper: f64,
    },

    /// The settled allocation does not sum to the budget.
    BudgetMismatch {
        allocated: f64,
        budget: f64,
    },

    /// Spend values must be finite.
    NonFiniteSpend {
        index: usize,
        value: f64,
    },
}

impl std::error::Error for SolveError {}

impl std::fmt::Display for SolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Channel parameters ----
            SolveError::NonFiniteParameter { channel, name, value } => {
                write!(f, "Channel '{channel}': parameter {name} is {value}, must be finite")
            }
            SolveError::NonPositiveEfficiency { channel, value } => {
                write!(f, "Channel '{channel}': efficiency is {value}, must be > 0")
            }
            SolveError::NegativeSaturation { channel, value } => {
                write!(f, "Channel '{channel}': saturation is {value}, must be >= 0")
            }
            SolveError::NegativeMinSpend { channel, value } => {
                write!(f, "Channel '{channel}': min_spend is {value}, must be >= 0")
            }
            SolveError::SpendBoundsReversed { channel, min_spend, max_spend } => {
                write!(
                    f,
                    "Channel '{channel}': min_spend {min_spend} exceeds max_spend {max_spend}"
                )
            }
            SolveError::DuplicateChannelId { channel } => {
                write!(f, "Duplicate channel id '{channel}'")
            }
            SolveError::NoChannels => {
                write!(f, "Need at least one channel to optimize")
            }

            // ---- Budget ----
            SolveError::InvalidBudget { value, reason } => {
                write!(f, "Invalid total budget {value}: {reason}")
            }
            SolveError::BudgetBelowMinSpend { budget, total_min_spend } => {
                write!(
                    f,
                    "Budget too small for channel minimums ({total_min_spend} > {budget})"
                )
            }
            SolveError::BudgetAboveMaxSpend { budget, total_max_spend } => {
                write!(
                    f,
                    "Budget exceeds channel maximums ({budget} > {total_max_spend})"
                )
            }

            // ---- Options ----
            SolveError::InvalidTolBudget { tol, reason } => {
                write!(f, "Invalid budget tolerance {tol}: {reason}")
            }
            SolveError::InvalidTolMultiplier { tol, reason } => {
                write!(f, "Invalid multiplier tolerance {tol}: {reason}")
            }
            SolveError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            SolveError::NoTolerancesProvided => {
                write!(f, "No tolerances provided")
            }
            SolveError::UnknownBackend { name, reason } => {
                write!(f, "Unknown solver backend '{name}': {reason}")
            }

            // ---- Solution checks ----
            SolveError::BoundViolation { channel, spend, lower, upper } => {
                write!(
                    f,
                    "Channel '{channel}': spend {spend} outside bounds [{lower}, {upper}]"
                )
            }
            SolveError::BudgetMismatch { allocated, budget } => {
                write!(f, "Allocation sums to {allocated}, budget is {budget}")
            }
            SolveError::NonFiniteSpend { index, value } => {
                write!(f, "Spend at index {index} is {value}, must be finite")
            }
        }
    }
}

impl From<CurveError> for SolveError {
    fn from(err: CurveError) -> Self {
        match err {
            CurveError::NonFiniteParameter { channel, name, value } => {
                SolveError::NonFiniteParameter { channel, name, value }
            }
            CurveError::NonPositiveEfficiency { channel, value } => {
                SolveError::NonPositiveEfficiency { channel, value }
            }
            CurveError::NegativeSaturation { channel, value } => {
                SolveError::NegativeSaturation { channel, value }
            }
            CurveError::NegativeMinSpend { channel, value } => {
                SolveError::NegativeMinSpend { channel, value }
            }
            CurveError::SpendBoundsReversed { channel, min_spend, max_spend } => {
                SolveError::SpendBoundsReversed { channel, min_spend, max_spend }
            }
        }
    }
}
