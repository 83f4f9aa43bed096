//! Caller-facing allocation results: per-channel rows, aggregates, and
//! tabular output.
//!
//! An [`AllocationResult`] is a fresh, independent value: it copies channel
//! names and evaluated figures out of the problem and holds no reference
//! back to the curve set. Non-convergence stays visible here (`converged`,
//! `status`) so reporting layers can flag it without halting the pipeline.
use std::fmt;
use std::io;

use serde::Serialize;

use crate::allocation::problem::AllocationProblem;
use crate::allocation::solver::traits::{SolveHistory, SolveOutcome, Termination};

/// One result-table row.
///
/// `cpa` (cost per acquisition, `spend / conversions`) is absent when the
/// channel produced no conversions; `marginal_return` is the channel's
/// marginal conversions per dollar at the final spend, a useful diagnostic
/// for spotting bound-pinned channels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelAllocation {
    pub channel: String,
    pub spend: f64,
    pub conversions: f64,
    pub cpa: Option<f64>,
    pub marginal_return: f64,
}

/// The solver's packaged output.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationResult {
    /// Per-channel rows, in problem order.
    pub allocations: Vec<ChannelAllocation>,
    pub total_budget: f64,
    pub total_spend: f64,
    pub total_conversions: f64,
    /// `total_spend / total_budget`; 1.0 for a zero-budget problem.
    pub budget_utilization: f64,
    pub converged: bool,
    pub status: Termination,
    pub iterations: usize,
    /// Equalized marginal return at the optimum, when a search ran.
    pub multiplier: Option<f64>,
    pub history: Option<SolveHistory>,
}

impl AllocationResult {
    /// Package a settled solver outcome against its problem.
    pub fn new(problem: &AllocationProblem, outcome: SolveOutcome) -> Self {
        let allocations: Vec<ChannelAllocation> = problem
            .channels()
            .iter()
            .zip(outcome.spend.iter())
            .map(|(curve, &spend)| {
                let conversions = curve.evaluate(spend);
                let cpa = if conversions > 0.0 { Some(spend / conversions) } else { None };
                ChannelAllocation {
                    channel: curve.channel.clone(),
                    spend,
                    conversions,
                    cpa,
                    marginal_return: curve.marginal(spend),
                }
            })
            .collect();

        let total_budget = problem.total_budget();
        let total_spend = outcome.spend.sum();
        let total_conversions: f64 = allocations.iter().map(|row| row.conversions).sum();
        let budget_utilization =
            if total_budget > 0.0 { total_spend / total_budget } else { 1.0 };

        AllocationResult {
            allocations,
            total_budget,
            total_spend,
            total_conversions,
            budget_utilization,
            converged: outcome.converged,
            status: outcome.status,
            iterations: outcome.iterations,
            multiplier: outcome.multiplier,
            history: outcome.history,
        }
    }

    /// Spend for a channel by name.
    pub fn spend_for(&self, channel: &str) -> Option<f64> {
        self.allocations.iter().find(|row| row.channel == channel).map(|row| row.spend)
    }

    /// Conversions for a channel by name.
    pub fn conversions_for(&self, channel: &str) -> Option<f64> {
        self.allocations
            .iter()
            .find(|row| row.channel == channel)
            .map(|row| row.conversions)
    }

    /// Write the result table as CSV: one row per channel plus a totals row.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in &self.allocations {
            csv_writer.serialize(row)?;
        }
        let total_cpa = if self.total_conversions > 0.0 {
            format!("{}", self.total_spend / self.total_conversions)
        } else {
            String::new()
        };
        csv_writer.write_record([
            "total",
            &self.total_spend.to_string(),
            &self.total_conversions.to_string(),
            &total_cpa,
            "",
        ])?;
        csv_writer.flush()?;
        Ok(())
    }
}

impl fmt::Display for AllocationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<12} {:>14} {:>14} {:>12} {:>12}",
            "channel", "spend", "conversions", "cpa", "marginal"
        )?;
        for row in &self.allocations {
            let cpa = match row.cpa {
                Some(value) => format!("{value:.2}"),
                None => "-".to_string(),
            };
            writeln!(
                f,
                "{:<12} {:>14.2} {:>14.2} {:>12} {:>12.6}",
                row.channel, row.spend, row.conversions, cpa, row.marginal_return
            )?;
        }
        writeln!(
            f,
            "{:<12} {:>14.2} {:>14.2}",
            "total", self.total_spend, self.total_conversions
        )?;
        writeln!(f, "budget utilization: {:.1}%", 100.0 * self.budget_utilization)?;
        write!(f, "status: {}", self.status)?;
        if !self.converged {
            write!(f, " (not converged)")?;
        }
        Ok(())
    }
}
