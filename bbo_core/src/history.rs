//! Append-only record of every evaluation the optimizer has performed, plus
//! the metrics derived from it.

use crate::grid::{Grid, ParameterVector};
use itertools::Itertools;

/// One estimator used to collapse several resamples of the same
/// parametrization into a single fitness value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Estimator {
    Mean,
    Median,
    Std,
}

impl Estimator {
    pub fn apply(self, values: &[f64]) -> f64 {
        match self {
            Estimator::Mean => mean(values),
            Estimator::Median => median(values),
            Estimator::Std => std_dev(values),
        }
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Five parallel, append-only arrays recording every evaluation performed
/// by the optimizer, in the order they were performed.
#[derive(Debug, Clone, Default)]
pub struct History {
    parameters: Vec<ParameterVector>,
    fitness: Vec<f64>,
    truncated: Vec<bool>,
    resampled: Vec<bool>,
    initialization: Vec<bool>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        parameters: ParameterVector,
        fitness: f64,
        truncated: bool,
        resampled: bool,
        initialization: bool,
    ) {
        self.parameters.push(parameters);
        self.fitness.push(fitness);
        self.truncated.push(truncated);
        self.resampled.push(resampled);
        self.initialization.push(initialization);
    }

    pub fn len(&self) -> usize {
        self.fitness.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fitness.is_empty()
    }

    pub fn parameters(&self) -> &[ParameterVector] {
        &self.parameters
    }

    pub fn fitness(&self) -> &[f64] {
        &self.fitness
    }

    pub fn truncated(&self) -> &[bool] {
        &self.truncated
    }

    pub fn resampled(&self) -> &[bool] {
        &self.resampled
    }

    pub fn initialization(&self) -> &[bool] {
        &self.initialization
    }

    /// The most recent parametrization's fitness values, in submission
    /// order, for however many trailing entries share that parametrization.
    pub fn last_parametrization_fitness(&self) -> Vec<f64> {
        if self.parameters.is_empty() {
            return Vec::new();
        }
        let last = self.parameters.last().unwrap();
        let mut out = Vec::new();
        for (p, f) in self.parameters.iter().zip(self.fitness.iter()).rev() {
            if p == last {
                out.push(*f);
            } else {
                break;
            }
        }
        out.reverse();
        out
    }

    /// Collapse consecutive resamples of the same parametrization into one
    /// point via `estimator`, preserving first-seen order. `initialization`
    /// and `resampled` are carried over from each group's first occurrence
    /// so all four derived arrays share the aggregated length.
    pub fn aggregate(&self, estimator: Estimator) -> History {
        if self.len() < 2 {
            return self.clone();
        }
        let mut groups: Vec<(ParameterVector, Vec<f64>, bool, bool)> = Vec::new();
        for i in 0..self.len() {
            let p = &self.parameters[i];
            if let Some(group) = groups.iter_mut().find(|(gp, ..)| gp == p) {
                group.1.push(self.fitness[i]);
            } else {
                groups.push((
                    p.clone(),
                    vec![self.fitness[i]],
                    self.initialization[i],
                    self.resampled[i],
                ));
            }
        }
        let mut out = History::new();
        for (p, fits, init, resampled) in groups {
            let truncated = false;
            out.push(p, estimator.apply(&fits), truncated, resampled, init);
        }
        out
    }

    /// `estimator` applied to every point's resample group, in the order
    /// groups first appear (mirrors `optimizer.py`'s
    /// `_compute_consecutive_aggregation`).
    pub fn consecutive_aggregation(&self, estimator: Estimator) -> Vec<f64> {
        self.aggregate(estimator).fitness
    }

    pub fn averaged_fitness(&self) -> Vec<f64> {
        self.consecutive_aggregation(Estimator::Mean)
    }

    pub fn min_fitness(&self) -> Option<f64> {
        self.fitness.iter().cloned().fold(None, |acc, v| {
            Some(acc.map_or(v, |a: f64| a.min(v)))
        })
    }

    pub fn max_fitness(&self) -> Option<f64> {
        self.fitness.iter().cloned().fold(None, |acc, v| {
            Some(acc.map_or(v, |a: f64| a.max(v)))
        })
    }

    pub fn resampled_count(&self) -> usize {
        self.resampled.iter().filter(|&&r| r).count()
    }

    /// Standard deviation of the fitness series; `[0.0]` if fewer than two
    /// points have been recorded (matches the original implementation's
    /// guard, which otherwise divides by a near-zero sample size).
    pub fn measured_noise(&self) -> Vec<f64> {
        if self.len() <= 1 {
            vec![0.0]
        } else {
            vec![std_dev(&self.fitness)]
        }
    }

    /// Index of the iteration that produced the current best fitness.
    pub fn iteration_of_best_fitness(&self) -> Option<usize> {
        self.fitness
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
    }

    /// Per-step change in fitness (`fitness[i+1] - fitness[i]`).
    pub fn fitness_gain_per_iteration(&self) -> Option<Vec<f64>> {
        if self.len() < 2 {
            return None;
        }
        Some(self.fitness.windows(2).map(|w| w[1] - w[0]).collect())
    }

    /// Count and summed penalty of evaluations that failed to improve on
    /// the running minimum seen so far.
    pub fn global_exploration_cost(&self) -> (usize, f64) {
        let mut running_min = f64::INFINITY;
        let mut count = 0usize;
        let mut cost = 0.0;
        for &f in &self.fitness {
            if f > running_min {
                count += 1;
                cost += f - running_min;
            }
            running_min = running_min.min(f);
        }
        (count, cost)
    }

    /// Count and summed penalty of consecutive non-improving steps
    /// (`fitness[i] <= fitness[i+1]`).
    pub fn local_exploration_cost(&self) -> (usize, f64) {
        let mut count = 0usize;
        let mut cost = 0.0;
        for w in self.fitness.windows(2) {
            if w[0] <= w[1] {
                count += 1;
                cost += w[1] - w[0];
            }
        }
        (count, cost)
    }

    /// Fraction of the grid's total size that has been visited, and the
    /// fraction of evaluations that revisited an already-seen point.
    /// Returned as fractions in `[0, 1]`, not percentages (an Open Question
    /// resolution — see `DESIGN.md`).
    pub fn size_explored_space(&self, grid: &Grid) -> (f64, f64) {
        if self.parameters.is_empty() {
            return (0.0, 0.0);
        }
        let unique = self.parameters.iter().unique().count();
        let explored_fraction = unique as f64 / grid.size() as f64;
        let static_fraction = 1.0 - (unique as f64 / self.parameters.len() as f64);
        (explored_fraction, static_fraction)
    }

    pub fn total_iterations(&self, initial_sample_size: usize) -> usize {
        self.len().saturating_sub(initial_sample_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Axis, AxisValue};

    fn pv(v: f64) -> ParameterVector {
        vec![AxisValue::Numeric(v)]
    }

    #[test]
    fn measured_noise_guards_small_samples() {
        let mut h = History::new();
        assert_eq!(h.measured_noise(), vec![0.0]);
        h.push(pv(1.0), 3.0, false, false, true);
        assert_eq!(h.measured_noise(), vec![0.0]);
    }

    #[test]
    fn global_exploration_cost_counts_regressions() {
        let mut h = History::new();
        for (p, f) in [(1.0, 5.0), (2.0, 3.0), (3.0, 4.0), (4.0, 1.0)] {
            h.push(pv(p), f, false, false, false);
        }
        let (count, cost) = h.global_exploration_cost();
        assert_eq!(count, 1);
        assert!((cost - 1.0).abs() < 1e-9);
    }

    #[test]
    fn aggregate_collapses_repeated_parametrizations_preserving_order() {
        let mut h = History::new();
        h.push(pv(1.0), 10.0, false, false, true);
        h.push(pv(2.0), 20.0, false, false, true);
        h.push(pv(1.0), 30.0, false, true, false);
        let agg = h.aggregate(Estimator::Mean);
        assert_eq!(agg.len(), 2);
        assert_eq!(agg.parameters()[0], pv(1.0));
        assert!((agg.fitness()[0] - 20.0).abs() < 1e-9);
        assert_eq!(agg.parameters()[1], pv(2.0));
    }

    #[test]
    fn size_explored_space_fraction_bounds() {
        let grid = Grid::new(vec![Axis::numeric(vec![1.0, 2.0, 3.0, 4.0]).unwrap()]).unwrap();
        let mut h = History::new();
        h.push(pv(1.0), 1.0, false, false, true);
        h.push(pv(1.0), 1.0, false, true, false);
        let (explored, static_frac) = h.size_explored_space(&grid);
        assert!((explored - 0.25).abs() < 1e-9);
        assert!((static_frac - 0.5).abs() < 1e-9);
    }
}
