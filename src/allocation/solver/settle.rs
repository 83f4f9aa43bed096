//! Budget settlement: turn a near-feasible iterate into an exact allocation.
//!
//! Numerical search leaves two kinds of drift behind: spend values a float
//! epsilon outside their bounds, and an allocation sum slightly off the
//! budget. Settlement removes both — clip first, then redistribute the
//! residual proportionally to each channel's remaining slack, then push the
//! last float-epsilon remainder into the single channel with the most room.
//! Exact budget conservation is a hard output invariant of the solver, not
//! an approximation.
use crate::allocation::solver::types::{BoxBounds, Spend};

/// Clip each spend entry into its channel's `[lower, upper]` interval.
pub fn clip_to_bounds(spend: &mut Spend, bounds: &BoxBounds) {
    for (i, x) in spend.iter_mut().enumerate() {
        *x = x.clamp(bounds.lower[i], bounds.upper[i]);
    }
}

/// Redistribute the budget residual across channels with slack.
///
/// Preconditions: `spend` is within `bounds`, and the budget lies within
/// `[bounds.total_lower(), bounds.total_upper()]` — both guaranteed by the
/// driver. Under those conditions the residual never exceeds the available
/// slack and the proportional pass cannot push any channel past a bound.
pub fn distribute_residual(spend: &mut Spend, bounds: &BoxBounds, budget: f64) {
    let residual = budget - spend.sum();
    if residual != 0.0 {
        if residual > 0.0 {
            let slack: Vec<f64> =
                (0..spend.len()).map(|i| bounds.upper[i] - spend[i]).collect();
            let total_slack: f64 = slack.iter().sum();
            if total_slack > 0.0 {
                for (i, x) in spend.iter_mut().enumerate() {
                    *x += residual * slack[i] / total_slack;
                }
            }
        } else {
            let slack: Vec<f64> =
                (0..spend.len()).map(|i| spend[i] - bounds.lower[i]).collect();
            let total_slack: f64 = slack.iter().sum();
            if total_slack > 0.0 {
                for (i, x) in spend.iter_mut().enumerate() {
                    *x += residual * slack[i] / total_slack;
                }
            }
        }
        clip_to_bounds(spend, bounds);
    }

    // Float-epsilon remainder goes to the single channel with the most room
    // in the needed direction, clamped so it can never escape its bounds.
    let remainder = budget - spend.sum();
    if remainder != 0.0 {
        let pick = if remainder > 0.0 {
            (0..spend.len())
                .max_by(|&i, &j| {
                    let si = bounds.upper[i] - spend[i];
                    let sj = bounds.upper[j] - spend[j];
                    si.partial_cmp(&sj).unwrap_or(std::cmp::Ordering::Equal)
                })
        } else {
            (0..spend.len())
                .max_by(|&i, &j| {
                    let si = spend[i] - bounds.lower[i];
                    let sj = spend[j] - bounds.lower[j];
                    si.partial_cmp(&sj).unwrap_or(std::cmp::Ordering::Equal)
                })
        };
        if let Some(i) = pick {
            spend[i] = (spend[i] + remainder).clamp(bounds.lower[i], bounds.upper[i]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use ndarray::array;

    fn bounds() -> BoxBounds {
        BoxBounds::new(array![0.0, 0.0, 1_000.0], array![10_000.0, 8_000.0, 5_000.0])
    }

    #[test]
    fn clip_pulls_entries_back_inside() {
        let mut spend = array![-5.0, 9_000.0, 2_000.0];
        clip_to_bounds(&mut spend, &bounds());
        assert_eq!(spend, array![0.0, 8_000.0, 2_000.0]);
    }

    #[test]
    // Purpose
    // -------
    // An under-allocated iterate must end exactly on budget, with the
    // residual spread toward upper bounds proportionally to slack.
    fn positive_residual_is_distributed_to_slack() {
        let b = bounds();
        let mut spend = array![2_000.0, 2_000.0, 2_000.0];
        let budget = 9_000.0;

        distribute_residual(&mut spend, &b, budget);

        assert_abs_diff_eq!(spend.sum(), budget, epsilon = 1e-9);
        // Slacks were 8_000 / 6_000 / 3_000: channel 0 absorbs the most.
        assert!(spend[0] > spend[1]);
        assert!(spend[1] > spend[2]);
        for i in 0..3 {
            assert!(spend[i] >= b.lower[i] && spend[i] <= b.upper[i]);
        }
    }

    #[test]
    fn negative_residual_is_pulled_from_slack_above_lower_bounds() {
        let b = bounds();
        let mut spend = array![6_000.0, 6_000.0, 4_000.0];
        let budget = 12_000.0;

        distribute_residual(&mut spend, &b, budget);

        assert_abs_diff_eq!(spend.sum(), budget, epsilon = 1e-9);
        // Channel 2 had the least room above its lower bound, so it gives
        // up the least.
        assert!(spend[2] > 2_000.0);
        for i in 0..3 {
            assert!(spend[i] >= b.lower[i] && spend[i] <= b.upper[i]);
        }
    }

    #[test]
    fn already_exact_allocation_is_untouched() {
        let b = bounds();
        let mut spend = array![3_000.0, 3_000.0, 3_000.0];
        distribute_residual(&mut spend, &b, 9_000.0);
        assert_relative_eq!(spend[0], 3_000.0);
        assert_relative_eq!(spend[1], 3_000.0);
        assert_relative_eq!(spend[2], 3_000.0);
    }

    #[test]
    fn tiny_drift_lands_on_exact_budget() {
        let b = bounds();
        let mut spend = array![3_000.0 + 1e-7, 3_000.0, 3_000.0 - 3e-7];
        distribute_residual(&mut spend, &b, 9_000.0);
        assert_abs_diff_eq!(spend.sum(), 9_000.0, epsilon = 1e-9);
    }
}
