//! Early-stopping rules layered on top of the iteration/timeout budget.
//! Grounded on `stop_criteria.py`. Each variant follows the same shape:
//! keep going while fewer than `stop_window` points have been recorded,
//! then compare a computed statistic against a threshold.

use crate::grid::Grid;
use crate::history::{mean, median, History};
use itertools::Itertools;

#[derive(Debug, Clone, Copy)]
pub enum AggregateEstimator {
    Mean,
    Median,
}

impl AggregateEstimator {
    fn apply(self, values: &[f64]) -> f64 {
        match self {
            AggregateEstimator::Mean => mean(values),
            AggregateEstimator::Median => median(values),
        }
    }
}

#[derive(Debug, Clone)]
pub enum StopCriterion {
    /// Continue while the relative change in the estimator between the
    /// window before and the trailing window is at least `threshold`.
    Improvement {
        threshold: f64,
        estimator: AggregateEstimator,
        stop_window: usize,
    },
    /// Continue while the count of distinct parametrizations among the
    /// trailing window exceeds `nbr_parametrizations`.
    CountMovement {
        nbr_parametrizations: usize,
        stop_window: usize,
    },
    /// Continue while the mean pairwise distance among the trailing
    /// window's distinct parametrizations exceeds `distance`.
    DistanceMovement { distance: f64, stop_window: usize },
}

impl StopCriterion {
    pub fn should_continue(&self, history: &History, grid: &Grid) -> bool {
        match self {
            StopCriterion::Improvement { threshold, estimator, stop_window } => {
                let fitness = history.fitness();
                if fitness.len() <= *stop_window {
                    return true;
                }
                let split = fitness.len() - stop_window;
                let before = estimator.apply(&fitness[..split]);
                let after = estimator.apply(&fitness[split..]);
                let ratio = (before - after) / before;
                // NaN/inf (e.g. before == 0) compares false against the
                // threshold under IEEE-754 semantics, i.e. "continue" —
                // matches the unguarded division in the original source.
                !(ratio >= *threshold)
            }
            StopCriterion::CountMovement { nbr_parametrizations, stop_window } => {
                let params = history.parameters();
                if params.len() <= *stop_window {
                    return true;
                }
                let window = &params[params.len() - stop_window..];
                let unique = window.iter().unique().count();
                unique > *nbr_parametrizations
            }
            StopCriterion::DistanceMovement { distance, stop_window } => {
                let params = history.parameters();
                if params.len() <= *stop_window {
                    return true;
                }
                let window = &params[params.len() - stop_window..];
                let unique: Vec<_> = window.iter().cloned().unique().collect();
                if unique.len() < 2 {
                    return true;
                }
                let total: f64 = unique
                    .iter()
                    .tuple_combinations()
                    .map(|(a, b)| grid.distance(a, b))
                    .sum();
                let avg = total / unique.len() as f64;
                avg > *distance
            }
        }
    }
}

/// AND-composes every configured stop criterion with the driver's own
/// iteration/timeout/heuristic-stop conditions: the run continues only
/// while all of them say to continue.
pub fn all_continue(criteria: &[StopCriterion], history: &History, grid: &Grid) -> bool {
    criteria.iter().all(|c| c.should_continue(history, grid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Axis, AxisValue};

    fn grid_1d() -> Grid {
        Grid::new(vec![Axis::numeric(vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap()]).unwrap()
    }

    fn push(history: &mut History, value: f64) {
        history.push(vec![AxisValue::Numeric(value)], value, false, false, false);
    }

    #[test]
    fn improvement_continues_below_stop_window() {
        let mut history = History::new();
        push(&mut history, 1.0);
        let criterion = StopCriterion::Improvement {
            threshold: 0.01,
            estimator: AggregateEstimator::Mean,
            stop_window: 5,
        };
        assert!(criterion.should_continue(&history, &grid_1d()));
    }

    #[test]
    fn improvement_stops_once_ratio_meets_threshold() {
        let mut history = History::new();
        for v in [10.0, 10.0, 10.0, 10.0, 9.99, 9.99] {
            push(&mut history, v);
        }
        let criterion = StopCriterion::Improvement {
            threshold: 0.5,
            estimator: AggregateEstimator::Mean,
            stop_window: 2,
        };
        assert!(!criterion.should_continue(&history, &grid_1d()));
    }

    #[test]
    fn count_movement_stops_when_window_is_too_diverse() {
        let mut history = History::new();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            push(&mut history, v);
        }
        let criterion = StopCriterion::CountMovement { nbr_parametrizations: 2, stop_window: 4 };
        assert!(!criterion.should_continue(&history, &grid_1d()));
    }

    #[test]
    fn distance_movement_continues_with_a_single_unique_point() {
        let mut history = History::new();
        for _ in 0..5 {
            push(&mut history, 1.0);
        }
        let criterion = StopCriterion::DistanceMovement { distance: 0.1, stop_window: 4 };
        assert!(criterion.should_continue(&history, &grid_1d()));
    }
}
