//! Acquisition strategies: given a fitted regressor, propose the next
//! point to evaluate. Grounded on
//! `heuristics/surrogate_models/next_parameter_strategies.py`.
//!
//! MPI and EI brute-force-enumerate the grid's full Cartesian product,
//! exactly as the source does. L-BFGS-B and CMA-ES instead optimize the
//! continuous relaxation bounded by each axis's min/max, returning a
//! candidate the driver snaps back onto the grid — also matching the
//! source, which calls `scipy.optimize.minimize`/`cma` over continuous
//! bounds rather than the discrete grid.

use crate::error::{BboError, Result};
use crate::grid::{AxisValue, Grid, ParameterVector};
use crate::heuristics::surrogate::encoder::Encoder;
use crate::heuristics::surrogate::regressor::{ProbabilisticRegressor, Regressor, RegressorKind};
use argmin::core::{CostFunction, Error as ArgminError, Executor, Gradient};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

#[derive(Debug, Clone, Copy)]
pub enum Acquisition {
    LbfgsB,
    CmaEs { sigma: f64 },
    MaximumProbabilityOfImprovement,
    ExpectedImprovement,
}

impl Acquisition {
    pub fn requires_std(&self) -> bool {
        matches!(
            self,
            Acquisition::MaximumProbabilityOfImprovement | Acquisition::ExpectedImprovement
        )
    }

    pub fn propose(&self, regressor: &RegressorKind, grid: &Grid, rng: &mut StdRng) -> Result<ParameterVector> {
        match self {
            Acquisition::LbfgsB => lbfgs_propose(regressor, grid, rng),
            Acquisition::CmaEs { sigma } => cma_es_propose(regressor, grid, *sigma, rng),
            Acquisition::MaximumProbabilityOfImprovement => grid_search_propose(regressor, grid, rng, mpi_score),
            Acquisition::ExpectedImprovement => grid_search_propose(regressor, grid, rng, ei_score),
        }
    }
}

struct NegatedMean<'a> {
    regressor: &'a RegressorKind,
    dims: usize,
}

impl<'a> CostFunction for NegatedMean<'a> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> std::result::Result<Self::Output, ArgminError> {
        let x = Array2::from_shape_vec((1, self.dims), param.clone()).unwrap();
        let y = self
            .regressor
            .predict(&x)
            .map_err(|e| ArgminError::msg(e.to_string()))?;
        Ok(y[0])
    }
}

impl<'a> Gradient for NegatedMean<'a> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, param: &Self::Param) -> std::result::Result<Self::Gradient, ArgminError> {
        let eps = 1e-4;
        let base = self.cost(param)?;
        let mut grad = vec![0.0; param.len()];
        for i in 0..param.len() {
            let mut shifted = param.clone();
            shifted[i] += eps;
            let bumped = self.cost(&shifted)?;
            grad[i] = (bumped - base) / eps;
        }
        Ok(grad)
    }
}

fn bounds(grid: &Grid) -> Result<Vec<(f64, f64)>> {
    grid.axes()
        .iter()
        .map(|axis| {
            Ok((
                axis.min()
                    .ok_or_else(|| BboError::Grid("non-numeric axis passed to continuous acquisition".into()))?,
                axis.max()
                    .ok_or_else(|| BboError::Grid("non-numeric axis passed to continuous acquisition".into()))?,
            ))
        })
        .collect()
}

fn clamp_to_bounds(point: &mut [f64], bounds: &[(f64, f64)]) {
    for (v, (lo, hi)) in point.iter_mut().zip(bounds.iter()) {
        *v = v.clamp(*lo, *hi);
    }
}

fn to_numeric_vector(values: &[f64]) -> ParameterVector {
    values.iter().map(|v| AxisValue::Numeric(*v)).collect()
}

/// Box-Muller standard normal sample, used by the hand-rolled CMA-ES step
/// (no normal-sampling crate beyond `statrs`, which only exposes pdf/cdf,
/// is part of the dependency stack).
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(1e-12..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

fn lbfgs_propose(regressor: &RegressorKind, grid: &Grid, rng: &mut StdRng) -> Result<ParameterVector> {
    let bounds_vec = bounds(grid)?;
    let x0: Vec<f64> = bounds_vec.iter().map(|(lo, hi)| rng.gen_range(*lo..=*hi)).collect();
    let cost = NegatedMean { regressor, dims: bounds_vec.len() };
    let linesearch = MoreThuenteLineSearch::new();
    let solver = LBFGS::new(linesearch, 7);
    let result = Executor::new(cost, solver)
        .configure(|state| state.param(x0.clone()).max_iters(50))
        .run();
    let mut best = match result {
        Ok(res) => res.state.best_param.unwrap_or(x0),
        Err(_) => x0,
    };
    clamp_to_bounds(&mut best, &bounds_vec);
    Ok(to_numeric_vector(&best))
}

/// Hand-rolled isotropic evolution strategy (no CMA-ES crate appears in the
/// retrieved pack, see `DESIGN.md`): each generation perturbs the current
/// mean with Gaussian noise and moves the mean to the best offspring.
fn cma_es_propose(regressor: &RegressorKind, grid: &Grid, sigma: f64, rng: &mut StdRng) -> Result<ParameterVector> {
    let bounds_vec = bounds(grid)?;
    let dims = bounds_vec.len();
    let mut mean: Vec<f64> = bounds_vec.iter().map(|(lo, hi)| (lo + hi) / 2.0).collect();
    let population = 8;
    let generations = 15;
    for _ in 0..generations {
        let mut candidates: Vec<Vec<f64>> = (0..population)
            .map(|_| {
                let mut candidate = mean.clone();
                for (v, (lo, hi)) in candidate.iter_mut().zip(bounds_vec.iter()) {
                    *v += sigma * standard_normal(rng);
                    *v = v.clamp(*lo, *hi);
                }
                candidate
            })
            .collect();
        candidates.sort_by(|a, b| {
            let xa = Array2::from_shape_vec((1, dims), a.clone()).unwrap();
            let xb = Array2::from_shape_vec((1, dims), b.clone()).unwrap();
            let ya = regressor.predict(&xa).map(|v| v[0]).unwrap_or(f64::INFINITY);
            let yb = regressor.predict(&xb).map(|v| v[0]).unwrap_or(f64::INFINITY);
            ya.partial_cmp(&yb).unwrap()
        });
        mean = candidates[0].clone();
    }
    Ok(to_numeric_vector(&mean))
}

fn grid_search_propose<F>(regressor: &RegressorKind, grid: &Grid, rng: &mut StdRng, score: F) -> Result<ParameterVector>
where
    F: Fn(f64, f64, f64) -> f64,
{
    let probabilistic = regressor.as_probabilistic().ok_or_else(|| BboError::Capability {
        heuristic: "surrogate model (MPI/EI)",
        required: "a regressor that predicts a standard deviation",
    })?;
    let points = grid.cartesian_product();
    let encoder = Encoder::from_grid(grid);
    let x = encoder.encode_matrix(&points);
    let (means, stds) = probabilistic.predict_with_std(&x)?;
    let current_optimum = means.iter().cloned().fold(f64::INFINITY, f64::min);
    let scores: Vec<f64> = means
        .iter()
        .zip(stds.iter())
        .map(|(&m, &s)| score(current_optimum, m, s))
        .collect();
    let total: f64 = scores.iter().sum();
    if total.abs() < 1e-12 {
        // Acquisition signal is flat everywhere: fall back to a uniformly
        // random grid point, as `spec.md` calls for explicitly (the source
        // only implements this fallback for EI; this crate implements it
        // for both — see `DESIGN.md`).
        return Ok(points.choose(rng).unwrap().clone());
    }
    let best_idx = scores
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        .map(|(i, _)| i)
        .unwrap();
    Ok(points[best_idx].clone())
}

fn mpi_score(current_optimum: f64, mean: f64, std: f64) -> f64 {
    if std <= 0.0 {
        return 0.0;
    }
    let normal = Normal::new(0.0, 1.0).unwrap();
    let z = (current_optimum - mean) / std;
    normal.cdf(z)
}

fn ei_score(current_optimum: f64, mean: f64, std: f64) -> f64 {
    if std <= 0.0 {
        return 0.0;
    }
    let normal = Normal::new(0.0, 1.0).unwrap();
    let z = (current_optimum - mean) / std;
    (current_optimum - mean) * normal.cdf(z) + std * normal.pdf(z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ei_score_is_zero_when_std_is_zero() {
        assert_eq!(ei_score(1.0, 2.0, 0.0), 0.0);
    }

    #[test]
    fn mpi_score_increases_with_improvement_probability() {
        let low = mpi_score(0.0, 5.0, 1.0);
        let high = mpi_score(0.0, -5.0, 1.0);
        assert!(high > low);
    }

    #[test]
    fn standard_normal_is_finite() {
        let mut rng = <StdRng as rand::SeedableRng>::seed_from_u64(0);
        for _ in 0..10 {
            assert!(standard_normal(&mut rng).is_finite());
        }
    }
}
