//! config — YAML plan configuration with fail-fast validation.
//!
//! Purpose
//! -------
//! Load and validate the plan file that drives the CLI: total budget,
//! channel spend constraints, synthetic-data sampling ranges, optimizer
//! settings, and output paths. Validation rejects malformed or economically
//! nonsensical input before any data generation or optimization runs.
//!
//! Key behaviors
//! -------------
//! - Deserialize the YAML sections into typed structs with sensible serde
//!   defaults for everything except the budget and channel list.
//! - Map missing files, parse failures, and semantic violations into a
//!   dedicated [`ConfigError`] naming the path, section, or channel.
//! - Translate the `optimization` section into solver
//!   [`SolveOptions`]/[`BackendChoice`] values, re-using the solver's own
//!   validation for tolerances and backend names.
//!
//! Conventions
//! -----------
//! - Metric ranges are `[lo, hi]` pairs with `0 < lo < hi`, matching the
//!   uniform sampling the synth layer performs.
//! - `sum(min_spend) <= budget` is checked here as well as at problem
//!   construction so a bad plan file fails before benchmark generation.
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::allocation::solver::{BackendChoice, SolveOptions, Tolerances};
use crate::allocation::solver::types::DEFAULT_TOL_MULTIPLIER;

/// Module-wide result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Config file does not exist.
    FileNotFound {
        path: String,
    },

    /// Config file exists but could not be read.
    ReadFailed {
        path: String,
        text: String,
    },

    /// YAML parsing failed.
    ParseFailed {
        path: String,
        text: String,
    },

    /// Budget must be finite and > 0.
    NonPositiveBudget {
        value: f64,
    },

    /// At least one channel is required.
    NoChannels,

    /// Channel spend constraints must satisfy 0 <= min_spend <= max_spend.
    InvalidChannelBounds {
        channel: String,
        min_spend: f64,
        max_spend: f64,
    },

    /// Channel minimum spends cannot exceed the budget.
    MinSpendExceedsBudget {
        total_min_spend: f64,
        budget: f64,
    },

    /// Metric sampling ranges must satisfy 0 < lo < hi, both finite.
    InvalidMetricRange {
        metric: &'static str,
        lo: f64,
        hi: f64,
    },

    /// Optimizer settings rejected by the solver layer.
    InvalidOptimizationSetting {
        text: String,
    },
}

impl std::error::Error for ConfigError {}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileNotFound { path } => {
                write!(f, "Config not found: {path}")
            }
            ConfigError::ReadFailed { path, text } => {
                write!(f, "Failed to read config {path}: {text}")
            }
            ConfigError::ParseFailed { path, text } => {
                write!(f, "Error parsing YAML file {path}: {text}")
            }
            ConfigError::NonPositiveBudget { value } => {
                write!(f, "Budget must be > 0, got {value}")
            }
            ConfigError::NoChannels => {
                write!(f, "Need at least one channel")
            }
            ConfigError::InvalidChannelBounds { channel, min_spend, max_spend } => {
                write!(
                    f,
                    "Invalid spend constraints for '{channel}': min {min_spend}, max {max_spend}"
                )
            }
            ConfigError::MinSpendExceedsBudget { total_min_spend, budget } => {
                write!(f, "Channel minimums ({total_min_spend}) > budget ({budget})")
            }
            ConfigError::InvalidMetricRange { metric, lo, hi } => {
                write!(f, "Invalid {metric} range [{lo}, {hi}]: need 0 < lo < hi")
            }
            ConfigError::InvalidOptimizationSetting { text } => {
                write!(f, "Invalid optimization settings: {text}")
            }
        }
    }
}

/// The full plan file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlanConfig {
    pub budget: BudgetSection,
    pub channels: Vec<ChannelSection>,
    #[serde(default)]
    pub synth_data: SynthSection,
    #[serde(default)]
    pub optimization: OptimizationSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BudgetSection {
    pub total: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChannelSection {
    pub name: String,
    pub min_spend: f64,
    pub max_spend: f64,
}

/// Sampling ranges and seed for the synthetic benchmark generator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SynthSection {
    pub random_seed: u64,
    pub cpc_range: [f64; 2],
    pub ctr_range: [f64; 2],
    pub cvr_range: [f64; 2],
}

impl Default for SynthSection {
    fn default() -> Self {
        Self {
            random_seed: 42,
            cpc_range: [0.5, 3.0],
            ctr_range: [0.01, 0.08],
            cvr_range: [0.005, 0.05],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OptimizationSection {
    pub solver: String,
    pub max_iter: usize,
    pub budget_tolerance: f64,
    pub track_history: bool,
}

impl Default for OptimizationSection {
    fn default() -> Self {
        Self {
            solver: "marginal_equalization".to_string(),
            max_iter: 200,
            budget_tolerance: 1e-9,
            track_history: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub results_dir: PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self { results_dir: PathBuf::from("experiments/results") }
    }
}

impl PlanConfig {
    /// Parse and validate a plan from YAML text.
    pub fn from_yaml(text: &str, origin: &str) -> ConfigResult<Self> {
        let config: PlanConfig = serde_yaml::from_str(text).map_err(|err| {
            ConfigError::ParseFailed { path: origin.to_string(), text: err.to_string() }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the config has the stuff the pipeline needs.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.budget.total.is_finite() || self.budget.total <= 0.0 {
            return Err(ConfigError::NonPositiveBudget { value: self.budget.total });
        }
        if self.channels.is_empty() {
            return Err(ConfigError::NoChannels);
        }
        for ch in &self.channels {
            let ok = ch.min_spend.is_finite()
                && ch.max_spend.is_finite()
                && ch.min_spend >= 0.0
                && ch.max_spend >= ch.min_spend;
            if !ok {
                return Err(ConfigError::InvalidChannelBounds {
                    channel: ch.name.clone(),
                    min_spend: ch.min_spend,
                    max_spend: ch.max_spend,
                });
            }
        }

        let total_min: f64 = self.channels.iter().map(|ch| ch.min_spend).sum();
        if total_min > self.budget.total {
            return Err(ConfigError::MinSpendExceedsBudget {
                total_min_spend: total_min,
                budget: self.budget.total,
            });
        }

        for (metric, [lo, hi]) in [
            ("cpc", self.synth_data.cpc_range),
            ("ctr", self.synth_data.ctr_range),
            ("cvr", self.synth_data.cvr_range),
        ] {
            if !lo.is_finite() || !hi.is_finite() || lo <= 0.0 || lo >= hi {
                return Err(ConfigError::InvalidMetricRange { metric, lo, hi });
            }
        }

        // Re-use the solver layer's own validation for backend and limits.
        self.backend_choice()?;
        self.solve_options()?;
        Ok(())
    }

    pub fn total_budget(&self) -> f64 {
        self.budget.total
    }

    /// Channel names in file order.
    pub fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(|ch| ch.name.clone()).collect()
    }

    /// `(min_spend, max_spend)` per channel, keyed by name.
    pub fn channel_constraints(&self) -> HashMap<String, (f64, f64)> {
        self.channels
            .iter()
            .map(|ch| (ch.name.clone(), (ch.min_spend, ch.max_spend)))
            .collect()
    }

    /// The configured solver backend.
    pub fn backend_choice(&self) -> ConfigResult<BackendChoice> {
        BackendChoice::from_str(&self.optimization.solver)
            .map_err(|err| ConfigError::InvalidOptimizationSetting { text: err.to_string() })
    }

    /// Solver options from the `optimization` section.
    pub fn solve_options(&self) -> ConfigResult<SolveOptions> {
        let tols = Tolerances::new(
            Some(self.optimization.budget_tolerance),
            Some(DEFAULT_TOL_MULTIPLIER),
            Some(self.optimization.max_iter),
        )
        .map_err(|err| ConfigError::InvalidOptimizationSetting { text: err.to_string() })?;
        Ok(SolveOptions::new(tols, self.optimization.track_history))
    }
}

/// Load a plan config from a YAML file.
///
/// # Errors
/// - [`ConfigError::FileNotFound`] / [`ConfigError::ReadFailed`] for
///   filesystem problems, naming the path.
/// - [`ConfigError::ParseFailed`] for YAML syntax errors.
/// - Any semantic validation error from [`PlanConfig::validate`].
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<PlanConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::FileNotFound { path: path.display().to_string() });
    }
    let text = std::fs::read_to_string(path).map_err(|err| ConfigError::ReadFailed {
        path: path.display().to_string(),
        text: err.to_string(),
    })?;
    PlanConfig::from_yaml(&text, &path.display().to_string())
}
