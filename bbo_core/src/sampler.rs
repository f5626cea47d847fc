//! Strategies for drawing the initial batch of parametrizations before any
//! heuristic has seen data.

use crate::error::{BboError, Result};
use crate::grid::{AxisValue, Grid, ParameterVector};
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialDrawMethod {
    UniformRandom,
    LatinHypercube,
    Hybrid,
}

/// Draws `count` (generally distinct) parametrizations from `grid` using
/// `method`, in the style of `initial_parametrizations.py`.
pub fn draw_initial_sample<R: Rng + ?Sized>(
    grid: &Grid,
    count: usize,
    method: InitialDrawMethod,
    rng: &mut R,
) -> Result<Vec<ParameterVector>> {
    match method {
        InitialDrawMethod::UniformRandom => Ok(uniform_random_draw(grid, count, rng)),
        InitialDrawMethod::LatinHypercube => latin_hypercube_sampling(grid, count, rng),
        InitialDrawMethod::Hybrid => hybrid_lhs_uniform_sampling(grid, count, rng),
    }
}

pub fn uniform_random_draw<R: Rng + ?Sized>(
    grid: &Grid,
    count: usize,
    rng: &mut R,
) -> Vec<ParameterVector> {
    (0..count)
        .map(|_| {
            grid.axes()
                .iter()
                .map(|axis| axis.values().choose(rng).unwrap().clone())
                .collect()
        })
        .collect()
}

/// Latin Hypercube Sampling: each axis contributes `count` distinct values
/// (drawn without replacement and shuffled independently per axis), then
/// rows are assembled by index. Requires every axis to have at least
/// `count` distinct values.
pub fn latin_hypercube_sampling<R: Rng + ?Sized>(
    grid: &Grid,
    count: usize,
    rng: &mut R,
) -> Result<Vec<ParameterVector>> {
    if count > grid.smallest_axis_len() {
        return Err(BboError::Grid(format!(
            "latin hypercube sampling requires {count} points but the smallest axis only has {} values",
            grid.smallest_axis_len()
        )));
    }
    let columns: Vec<Vec<AxisValue>> = grid
        .axes()
        .iter()
        .map(|axis| {
            let mut idxs: Vec<usize> = (0..axis.len()).collect();
            idxs.shuffle(rng);
            idxs.truncate(count);
            idxs.into_iter().map(|i| axis.values()[i].clone()).collect()
        })
        .collect();
    Ok((0..count)
        .map(|row| columns.iter().map(|col| col[row].clone()).collect())
        .collect())
}

/// `min(count, smallest_axis_len)` points via LHS, topped up to `count`
/// with uniform-random draws.
pub fn hybrid_lhs_uniform_sampling<R: Rng + ?Sized>(
    grid: &Grid,
    count: usize,
    rng: &mut R,
) -> Result<Vec<ParameterVector>> {
    let n_lhs = count.min(grid.smallest_axis_len());
    let mut out = latin_hypercube_sampling(grid, n_lhs, rng)?;
    out.extend(uniform_random_draw(grid, count - n_lhs, rng));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Axis;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid_1d(n: usize) -> Grid {
        Grid::new(vec![Axis::numeric((0..n).map(|i| i as f64).collect()).unwrap()]).unwrap()
    }

    #[test]
    fn lhs_rejects_count_above_smallest_axis() {
        let grid = grid_1d(3);
        let mut rng = StdRng::seed_from_u64(42);
        assert!(latin_hypercube_sampling(&grid, 4, &mut rng).is_err());
    }

    #[test]
    fn lhs_produces_distinct_rows_per_axis_column() {
        let grid = Grid::new(vec![
            Axis::numeric((0..5).map(|i| i as f64).collect()).unwrap(),
            Axis::numeric((0..5).map(|i| i as f64 * 10.0).collect()).unwrap(),
        ])
        .unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let sample = latin_hypercube_sampling(&grid, 5, &mut rng).unwrap();
        assert_eq!(sample.len(), 5);
        let col0: std::collections::HashSet<_> =
            sample.iter().map(|row| row[0].clone()).collect();
        assert_eq!(col0.len(), 5);
    }

    #[test]
    fn hybrid_tops_up_with_uniform_draws() {
        let grid = grid_1d(3);
        let mut rng = StdRng::seed_from_u64(1);
        let sample = hybrid_lhs_uniform_sampling(&grid, 5, &mut rng).unwrap();
        assert_eq!(sample.len(), 5);
    }
}
