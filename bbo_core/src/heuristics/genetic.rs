//! Genetic algorithm over the grid. Selection/crossover/mutation structure
//! grounded on `GeneticAlgorythm` in `optimization.rs`, generalized from
//! fixed `ParameterSet` fields to the grid's generic axis columns; parent
//! selection formulas grounded on `heuristics/genetic_algorithm/selections.py`.

use crate::grid::{AxisValue, Grid, ParameterVector};
use crate::heuristics::Heuristic;
use crate::history::History;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, Copy)]
pub enum Selection {
    Probabilistic { matingpool_size: usize, elitism: bool },
    Tournament { pool_size: usize, matingpool_size: usize, elitism: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossover {
    SinglePoint,
    DoublePoint,
}

/// One completed breeding event, kept for `summary()`.
#[derive(Debug, Clone)]
pub struct FamilyRecord {
    pub parent_1: ParameterVector,
    pub parent_2: ParameterVector,
    pub child: ParameterVector,
}

#[derive(Debug, Clone)]
pub struct GeneticAlgorithm {
    selection: Selection,
    crossover: Crossover,
    mutation_rate: f64,
    max_repeat: usize,
    mutation_count: u32,
    family_line: Vec<FamilyRecord>,
}

impl GeneticAlgorithm {
    pub fn new(selection: Selection, crossover: Crossover, mutation_rate: f64, max_repeat: usize) -> Self {
        GeneticAlgorithm {
            selection,
            crossover,
            mutation_rate,
            max_repeat,
            mutation_count: 0,
            family_line: Vec::new(),
        }
    }

    fn sorted_by_fitness(history: &History) -> Vec<(ParameterVector, f64)> {
        let mut pool: Vec<(ParameterVector, f64)> = history
            .parameters()
            .iter()
            .cloned()
            .zip(history.fitness().iter().cloned())
            .collect();
        pool.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        pool
    }

    fn weighted_probability_pick(
        pool: &[(ParameterVector, f64)],
        rng: &mut StdRng,
    ) -> usize {
        let min_fitness = pool.iter().map(|(_, f)| *f).fold(f64::INFINITY, f64::min);
        let weights: Vec<f64> = pool.iter().map(|(_, f)| 1.0 / (f - min_fitness + 1.0)).collect();
        let total: f64 = weights.iter().sum();
        let mut target = rng.gen::<f64>() * total;
        for (i, w) in weights.iter().enumerate() {
            if target < *w {
                return i;
            }
            target -= w;
        }
        pool.len() - 1
    }

    /// Completed breeding events recorded so far, most recent last.
    pub fn family_line(&self) -> &[FamilyRecord] {
        &self.family_line
    }

    fn select_parents(&self, history: &History, rng: &mut StdRng) -> (ParameterVector, ParameterVector) {
        let sorted = Self::sorted_by_fitness(history);
        match self.selection {
            Selection::Probabilistic { matingpool_size, elitism } => {
                let pool_size = matingpool_size.min(sorted.len());
                let mut pool = sorted[..pool_size].to_vec();
                let parent_1 = if elitism {
                    pool.remove(0)
                } else {
                    let idx = Self::weighted_probability_pick(&pool, rng);
                    pool.remove(idx)
                };
                let idx2 = Self::weighted_probability_pick(&pool, rng);
                let parent_2 = pool[idx2].clone();
                (parent_1.0, parent_2.0)
            }
            Selection::Tournament { pool_size, matingpool_size, elitism } => {
                let mating_size = matingpool_size.min(sorted.len());
                let mut mating_pool = sorted[..mating_size].to_vec();
                let pick_one = |pool: &mut Vec<(ParameterVector, f64)>, rng: &mut StdRng, elitism: bool| {
                    if elitism {
                        pool.remove(0)
                    } else {
                        let mut tournament: Vec<usize> = (0..pool.len()).collect();
                        tournament.shuffle(rng);
                        tournament.truncate(pool_size.min(pool.len()));
                        let winner = tournament
                            .into_iter()
                            .min_by(|&a, &b| pool[a].1.partial_cmp(&pool[b].1).unwrap())
                            .unwrap();
                        pool.remove(winner)
                    }
                };
                let parent_1 = pick_one(&mut mating_pool, rng, elitism);
                let parent_2 = pick_one(&mut mating_pool, rng, false);
                (parent_1.0, parent_2.0)
            }
        }
    }

    fn crossover(&self, parent_1: &ParameterVector, parent_2: &ParameterVector, rng: &mut StdRng) -> ParameterVector {
        let dims = parent_1.len();
        match self.crossover {
            Crossover::SinglePoint => {
                let point = rng.gen_range(1..dims.max(2));
                parent_1[..point]
                    .iter()
                    .chain(parent_2[point..].iter())
                    .cloned()
                    .collect()
            }
            Crossover::DoublePoint => {
                if dims < 3 {
                    return self.crossover_single_fallback(parent_1, parent_2, rng);
                }
                let mut a = rng.gen_range(1..dims);
                let mut b = rng.gen_range(1..dims);
                if a > b {
                    std::mem::swap(&mut a, &mut b);
                }
                let mut child = parent_1.clone();
                child[a..b].clone_from_slice(&parent_2[a..b]);
                child
            }
        }
    }

    fn crossover_single_fallback(&self, parent_1: &ParameterVector, parent_2: &ParameterVector, rng: &mut StdRng) -> ParameterVector {
        let dims = parent_1.len();
        let point = rng.gen_range(1..dims.max(2));
        parent_1[..point].iter().chain(parent_2[point..].iter()).cloned().collect()
    }

    /// With probability `mutation_rate`, replaces every axis value of
    /// `child` with an independent draw from its 3-value neighborhood
    /// `{prev, same, next}`, clamped at the axis's edges.
    fn mutate_to_neighbor(&mut self, child: &mut ParameterVector, grid: &Grid, rng: &mut StdRng) {
        if rng.gen::<f64>() >= self.mutation_rate {
            return;
        }
        for axis_idx in 0..grid.dims() {
            let axis = grid.axis(axis_idx);
            if let Some(current_index) = axis.position_of(&child[axis_idx]) {
                let delta: i64 = match rng.gen_range(0..3) {
                    0 => -1,
                    1 => 0,
                    _ => 1,
                };
                let new_index = (current_index as i64 + delta).clamp(0, axis.len() as i64 - 1) as usize;
                if new_index != current_index {
                    self.mutation_count += 1;
                }
                child[axis_idx] = axis.values()[new_index].clone();
            }
        }
    }
}

impl Heuristic for GeneticAlgorithm {
    fn propose(
        &mut self,
        history: &History,
        grid: &Grid,
        _current: Option<&ParameterVector>,
        rng: &mut StdRng,
    ) -> Vec<AxisValue> {
        if history.len() < 2 {
            return grid
                .axes()
                .iter()
                .map(|a| a.values().choose(rng).unwrap().clone())
                .collect();
        }
        let mut parent_1 = Vec::new();
        let mut parent_2 = Vec::new();
        let mut child = Vec::new();
        for _ in 0..self.max_repeat.max(1) {
            let (p1, p2) = self.select_parents(history, rng);
            let mut c = self.crossover(&p1, &p2, rng);
            self.mutate_to_neighbor(&mut c, grid, rng);
            let distinct = c != p1 && c != p2;
            parent_1 = p1;
            parent_2 = p2;
            child = c;
            if distinct {
                break;
            }
        }
        self.family_line.push(FamilyRecord {
            parent_1: parent_1.clone(),
            parent_2: parent_2.clone(),
            child: child.clone(),
        });
        child
    }

    fn summary(&self, _history: &History) -> String {
        format!(
            "genetic algorithm: {} mutations, {} breeding events",
            self.mutation_count,
            self.family_line.len()
        )
    }

    fn reset(&mut self) {
        self.mutation_count = 0;
        self.family_line.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Axis;
    use rand::SeedableRng;

    fn sample_grid() -> Grid {
        Grid::new(vec![
            Axis::numeric(vec![1.0, 2.0, 3.0, 4.0]).unwrap(),
            Axis::numeric(vec![10.0, 20.0, 30.0]).unwrap(),
        ])
        .unwrap()
    }

    fn sample_history() -> History {
        let mut h = History::new();
        let data = [
            (vec![1.0, 10.0], 10.0),
            (vec![2.0, 20.0], 5.0),
            (vec![3.0, 30.0], 4.0),
            (vec![4.0, 20.0], 2.0),
        ];
        for (p, f) in data {
            h.push(p.into_iter().map(AxisValue::Numeric).collect(), f, false, false, true);
        }
        h
    }

    #[test]
    fn tournament_elitism_picks_best_as_parent_one() {
        let history = sample_history();
        let ga = GeneticAlgorithm::new(
            Selection::Tournament { pool_size: 2, matingpool_size: 10, elitism: true },
            Crossover::SinglePoint,
            0.0,
            5,
        );
        let mut rng = StdRng::seed_from_u64(0);
        let (p1, _p2) = ga.select_parents(&history, &mut rng);
        assert_eq!(p1, vec![AxisValue::Numeric(4.0), AxisValue::Numeric(20.0)]);
    }

    #[test]
    fn reset_clears_counters_and_family_line() {
        let mut ga = GeneticAlgorithm::new(
            Selection::Probabilistic { matingpool_size: 10, elitism: true },
            Crossover::SinglePoint,
            1.0,
            5,
        );
        ga.mutation_count = 3;
        ga.family_line.push(FamilyRecord {
            parent_1: vec![AxisValue::Numeric(1.0)],
            parent_2: vec![AxisValue::Numeric(2.0)],
            child: vec![AxisValue::Numeric(1.0)],
        });
        ga.reset();
        assert_eq!(ga.mutation_count, 0);
        assert!(ga.family_line.is_empty());
    }

    #[test]
    fn propose_returns_a_vector_of_matching_dimensionality() {
        let grid = sample_grid();
        let history = sample_history();
        let mut ga = GeneticAlgorithm::new(
            Selection::Tournament { pool_size: 2, matingpool_size: 10, elitism: false },
            Crossover::SinglePoint,
            0.5,
            5,
        );
        let mut rng = StdRng::seed_from_u64(2);
        let child = ga.propose(&history, &grid, None, &mut rng);
        assert_eq!(child.len(), 2);
    }
}
