//! synth — seeded synthetic channel benchmarks.
//!
//! Purpose
//! -------
//! Generate realistic per-channel funnel metrics (CPC/CTR/CVR) and derive
//! quadratic response-curve coefficients from them, deterministically for a
//! configured seed. The output rows are the format-agnostic channel records
//! the allocator consumes, and they round-trip through CSV for persistence.
//!
//! Key behaviors
//! -------------
//! - Sample base metrics uniformly from the configured ranges, then apply
//!   per-channel personality multipliers (cheap clicks on tiktok, strong
//!   conversion on google, and so on).
//! - Derive curve coefficients from the funnel: `a = ctr·cvr / cpc` is the
//!   initial conversions-per-dollar, and `b = a·drop / max_spend` makes the
//!   channel lose `drop` of its initial efficiency at `max_spend`.
//! - Ignore seasonality and genre effects; those are out of scope for the
//!   synthetic generator.
//!
//! Conventions
//! -----------
//! - The RNG is seeded once per generation run from
//!   `synth_data.random_seed`, so identical configs produce identical rows.
//! - Unknown channel names get a neutral profile (all multipliers 1.0).
use std::path::Path;

use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use statrs::distribution::Uniform;

use crate::config::PlanConfig;
use crate::curves::{CurveResult, QuadCurve};

/// Module-wide result alias for synthetic-data operations.
pub type SynthResult<T> = Result<T, SynthError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SynthError {
    /// Sampling range rejected by the distribution layer.
    InvalidMetricRange {
        metric: &'static str,
        lo: f64,
        hi: f64,
    },

    /// CSV serialization or parsing failed.
    Csv {
        path: String,
        text: String,
    },

    /// Filesystem failure while writing or reading benchmark rows.
    Io {
        path: String,
        text: String,
    },
}

impl std::error::Error for SynthError {}

impl std::fmt::Display for SynthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SynthError::InvalidMetricRange { metric, lo, hi } => {
                write!(f, "Invalid {metric} sampling range [{lo}, {hi}]")
            }
            SynthError::Csv { path, text } => {
                write!(f, "CSV error for {path}: {text}")
            }
            SynthError::Io { path, text } => {
                write!(f, "I/O error for {path}: {text}")
            }
        }
    }
}

/// Channel personality: multipliers applied to the sampled base metrics and
/// the fraction of initial efficiency lost at `max_spend`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelProfile {
    pub cpc_multiplier: f64,
    pub ctr_multiplier: f64,
    pub cvr_multiplier: f64,
    pub saturation_rate: f64,
}

const NEUTRAL_PROFILE: ChannelProfile = ChannelProfile {
    cpc_multiplier: 1.0,
    ctr_multiplier: 1.0,
    cvr_multiplier: 1.0,
    saturation_rate: 0.3,
};

/// Look up the personality profile for a channel name (case-insensitive).
///
/// Unknown channels get the neutral profile.
pub fn profile_for(channel: &str) -> ChannelProfile {
    match channel.to_lowercase().as_str() {
        // baseline costs, high engagement, strong conversion
        "google" => ChannelProfile {
            cpc_multiplier: 1.0,
            ctr_multiplier: 1.2,
            cvr_multiplier: 1.5,
            saturation_rate: 0.3,
        },
        "meta" => ChannelProfile {
            cpc_multiplier: 1.0,
            ctr_multiplier: 0.9,
            cvr_multiplier: 1.1,
            saturation_rate: 0.15,
        },
        // cheap clicks, high engagement, moderate conversion
        "tiktok" => ChannelProfile {
            cpc_multiplier: 0.6,
            ctr_multiplier: 1.3,
            cvr_multiplier: 0.7,
            saturation_rate: 0.2,
        },
        "reddit" => ChannelProfile {
            cpc_multiplier: 0.8,
            ctr_multiplier: 1.1,
            cvr_multiplier: 1.0,
            saturation_rate: 0.4,
        },
        // cheap clicks but weak conversion, saturates quickly
        "x" => ChannelProfile {
            cpc_multiplier: 0.6,
            ctr_multiplier: 1.0,
            cvr_multiplier: 0.5,
            saturation_rate: 0.6,
        },
        _ => NEUTRAL_PROFILE,
    }
}

/// One synthetic benchmark row: funnel metrics plus derived curve
/// coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelBenchmark {
    pub channel: String,
    pub cpc: f64,
    pub ctr: f64,
    pub cvr: f64,
    pub min_spend: f64,
    pub max_spend: f64,
    pub curve_a: f64,
    pub curve_b: f64,
}

impl ChannelBenchmark {
    /// Build the validated response curve for this row.
    pub fn curve(&self) -> CurveResult<QuadCurve> {
        QuadCurve::new(
            self.channel.clone(),
            self.curve_a,
            self.curve_b,
            self.min_spend,
            self.max_spend,
        )
    }
}

/// Turn funnel metrics into `(a, b)` curve coefficients.
///
/// `a = ctr·cvr / cpc` is the conversions-per-dollar at low spend;
/// `b = a·efficiency_drop / max_spend` places the efficiency loss at the
/// spend ceiling. A zero `max_spend` yields a linear curve (`b = 0`).
pub fn derive_quad_params(
    cpc: f64, ctr: f64, cvr: f64, max_spend: f64, efficiency_drop: f64,
) -> (f64, f64) {
    let a = (ctr * cvr) / cpc;
    let b = if max_spend > 0.0 { a * efficiency_drop / max_spend } else { 0.0 };
    (a, b)
}

fn sample_metric(
    metric: &'static str, range: [f64; 2], rng: &mut StdRng,
) -> SynthResult<f64> {
    let [lo, hi] = range;
    let dist = Uniform::new(lo, hi)
        .map_err(|_| SynthError::InvalidMetricRange { metric, lo, hi })?;
    Ok(dist.sample(rng))
}

/// Generate one benchmark row per configured channel.
///
/// Deterministic for a fixed `synth_data.random_seed`: the RNG is seeded
/// once and the channels are sampled in file order.
pub fn generate_benchmarks(config: &PlanConfig) -> SynthResult<Vec<ChannelBenchmark>> {
    let mut rng = StdRng::seed_from_u64(config.synth_data.random_seed);

    let mut benchmarks = Vec::with_capacity(config.channels.len());
    for ch in &config.channels {
        let base_cpc = sample_metric("cpc", config.synth_data.cpc_range, &mut rng)?;
        let base_ctr = sample_metric("ctr", config.synth_data.ctr_range, &mut rng)?;
        let base_cvr = sample_metric("cvr", config.synth_data.cvr_range, &mut rng)?;

        let profile = profile_for(&ch.name);
        let cpc = base_cpc * profile.cpc_multiplier;
        let ctr = base_ctr * profile.ctr_multiplier;
        let cvr = base_cvr * profile.cvr_multiplier;

        let (curve_a, curve_b) =
            derive_quad_params(cpc, ctr, cvr, ch.max_spend, profile.saturation_rate);

        benchmarks.push(ChannelBenchmark {
            channel: ch.name.clone(),
            cpc,
            ctr,
            cvr,
            min_spend: ch.min_spend,
            max_spend: ch.max_spend,
            curve_a,
            curve_b,
        });
    }
    Ok(benchmarks)
}

/// Build validated response curves from benchmark rows.
pub fn curves_from_benchmarks(benchmarks: &[ChannelBenchmark]) -> CurveResult<Vec<QuadCurve>> {
    benchmarks.iter().map(ChannelBenchmark::curve).collect()
}

/// Write benchmark rows to a CSV file.
pub fn write_benchmarks_csv(
    benchmarks: &[ChannelBenchmark], path: impl AsRef<Path>,
) -> SynthResult<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path).map_err(|err| SynthError::Csv {
        path: path.display().to_string(),
        text: err.to_string(),
    })?;
    for row in benchmarks {
        writer.serialize(row).map_err(|err| SynthError::Csv {
            path: path.display().to_string(),
            text: err.to_string(),
        })?;
    }
    writer.flush().map_err(|err| SynthError::Io {
        path: path.display().to_string(),
        text: err.to_string(),
    })
}

/// Read benchmark rows back from a CSV file.
pub fn read_benchmarks_csv(path: impl AsRef<Path>) -> SynthResult<Vec<ChannelBenchmark>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).map_err(|err| SynthError::Csv {
        path: path.display().to_string(),
        text: err.to_string(),
    })?;
    reader
        .deserialize()
        .map(|row| {
            row.map_err(|err| SynthError::Csv {
                path: path.display().to_string(),
                text: err.to_string(),
            })
        })
        .collect()
}
