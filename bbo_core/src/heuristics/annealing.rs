//! Simulated annealing over the grid. Grounded on
//! `simulated_annealing/cooldown_functions.py` and
//! `simulated_annealing/neighbor_functions.py`.

use crate::grid::{AxisValue, Grid, ParameterVector};
use crate::heuristics::Heuristic;
use crate::history::History;
use rand::rngs::StdRng;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cooldown {
    /// `cooling_factor^k * t0`, `cooling_factor < 1`.
    Exponential { cooling_factor: f64 },
    /// `t0 / (1 + cooling_factor * ln(k + 1))`, `cooling_factor > 1`.
    Logarithmic { cooling_factor: f64 },
    /// `t0 / (1 + cooling_factor * k)`, `cooling_factor > 1`.
    Multiplicative { cooling_factor: f64 },
}

impl Cooldown {
    pub fn temperature(self, t0: f64, k: u32) -> f64 {
        let k = k as f64;
        match self {
            Cooldown::Exponential { cooling_factor } => cooling_factor.powf(k) * t0,
            Cooldown::Logarithmic { cooling_factor } => t0 / (1.0 + cooling_factor * (k + 1.0).ln()),
            Cooldown::Multiplicative { cooling_factor } => t0 / (1.0 + cooling_factor * k),
        }
    }
}

/// Nudge exactly one axis of `parameter` to an adjacent value on its axis,
/// repeating until the result differs from the input (mirrors
/// `hop_to_next_value`). Corrects the source's off-by-one clamp so the
/// last value of each axis remains reachable (see `DESIGN.md`).
pub fn hop_to_next_value(
    parameter: &ParameterVector,
    grid: &Grid,
    rng: &mut StdRng,
) -> crate::error::Result<ParameterVector> {
    loop {
        let positions = grid.positions_of(parameter)?;
        let mut next = parameter.clone();
        let axis_idx = rng.gen_range(0..grid.dims());
        let axis = grid.axis(axis_idx);
        let current_index = positions[axis_idx];
        let direction = rng.gen_range(0..3); // 0: up, 1: down, 2: stay
        let new_index = match direction {
            0 if current_index < axis.len() - 1 => current_index + 1,
            1 if current_index > 0 => current_index - 1,
            _ => current_index,
        };
        next[axis_idx] = axis.values()[new_index].clone();
        if next != *parameter {
            return Ok(next);
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedAnnealing {
    cooldown: Cooldown,
    t0: f64,
    restart_after: Option<u32>,
    current: Option<ParameterVector>,
    current_fitness: f64,
    best: Option<ParameterVector>,
    best_fitness: f64,
    iterations_since_improvement: u32,
    k: u32,
}

impl SimulatedAnnealing {
    pub fn new(cooldown: Cooldown, t0: f64, restart_after: Option<u32>) -> Self {
        SimulatedAnnealing {
            cooldown,
            t0,
            restart_after,
            current: None,
            current_fitness: f64::INFINITY,
            best: None,
            best_fitness: f64::INFINITY,
            iterations_since_improvement: 0,
            k: 0,
        }
    }

    fn metropolis_accept(delta: f64, temperature: f64, rng: &mut StdRng) -> bool {
        if delta <= 0.0 {
            true
        } else if temperature <= 0.0 {
            false
        } else {
            rng.gen::<f64>() < (-delta / temperature).exp()
        }
    }
}

impl Heuristic for SimulatedAnnealing {
    fn propose(
        &mut self,
        history: &History,
        grid: &Grid,
        current: Option<&ParameterVector>,
        rng: &mut StdRng,
    ) -> Vec<AxisValue> {
        // Absorb the most recently evaluated candidate (by construction of
        // the driver's propose-evaluate-append loop, the last history entry
        // is always this heuristic's own previous proposal) via the
        // Metropolis criterion.
        if let (Some(last_params), Some(&last_fitness)) =
            (history.parameters().last(), history.fitness().last())
        {
            let delta = last_fitness - self.current_fitness;
            if self.current.is_none()
                || Self::metropolis_accept(delta, self.cooldown.temperature(self.t0, self.k), rng)
            {
                self.current = Some(last_params.clone());
                self.current_fitness = last_fitness;
            }
            if last_fitness < self.best_fitness {
                self.best = Some(last_params.clone());
                self.best_fitness = last_fitness;
                self.iterations_since_improvement = 0;
            } else {
                self.iterations_since_improvement += 1;
            }
        }

        if let Some(restart_after) = self.restart_after {
            if self.iterations_since_improvement >= restart_after {
                self.current = self.best.clone();
                self.current_fitness = self.best_fitness;
                self.iterations_since_improvement = 0;
            }
        }

        let base = self
            .current
            .clone()
            .or_else(|| current.cloned())
            .unwrap_or_else(|| grid.axes().iter().map(|a| a.values()[0].clone()).collect());
        self.k += 1;
        hop_to_next_value(&base, grid, rng).unwrap_or(base)
    }

    /// Raises `should_stop` once the cooldown schedule has driven the
    /// temperature down to the point where further moves are effectively
    /// frozen (`cooldown_functions.py`'s `self.current_t <= 0.01` check).
    fn should_stop(&self) -> bool {
        self.cooldown.temperature(self.t0, self.k) <= 0.01
    }

    fn summary(&self, _history: &History) -> String {
        format!(
            "simulated annealing: k={}, temperature={:.4}, best_fitness={:.6}",
            self.k,
            self.cooldown.temperature(self.t0, self.k),
            self.best_fitness
        )
    }

    fn reset(&mut self) {
        self.current = None;
        self.current_fitness = f64::INFINITY;
        self.best = None;
        self.best_fitness = f64::INFINITY;
        self.iterations_since_improvement = 0;
        self.k = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Axis;
    use rand::SeedableRng;

    #[test]
    fn cooldown_schedules_decrease_temperature() {
        let exp = Cooldown::Exponential { cooling_factor: 0.5 };
        assert!(exp.temperature(100.0, 5) < exp.temperature(100.0, 0));
        let log = Cooldown::Logarithmic { cooling_factor: 10.0 };
        assert!(log.temperature(100.0, 5) < log.temperature(100.0, 0));
        let mult = Cooldown::Multiplicative { cooling_factor: 10.0 };
        assert!(mult.temperature(100.0, 5) < mult.temperature(100.0, 0));
    }

    #[test]
    fn hop_to_next_value_changes_exactly_one_axis_and_differs() {
        let grid = Grid::new(vec![
            Axis::numeric(vec![1.0, 2.0, 3.0]).unwrap(),
            Axis::numeric(vec![10.0, 20.0]).unwrap(),
        ])
        .unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let start = vec![AxisValue::Numeric(2.0), AxisValue::Numeric(10.0)];
        let next = hop_to_next_value(&start, &grid, &mut rng).unwrap();
        assert_ne!(next, start);
        let diffs = next.iter().zip(start.iter()).filter(|(a, b)| a != b).count();
        assert_eq!(diffs, 1);
    }

    #[test]
    fn hop_to_next_value_errors_off_grid() {
        let grid = Grid::new(vec![Axis::numeric(vec![1.0, 2.0]).unwrap()]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let off_grid = vec![AxisValue::Numeric(99.0)];
        assert!(hop_to_next_value(&off_grid, &grid, &mut rng).is_err());
    }

    #[test]
    fn should_stop_once_temperature_decays_below_threshold() {
        let mut sa = SimulatedAnnealing::new(Cooldown::Multiplicative { cooling_factor: 5.0 }, 10.0, None);
        assert!(!sa.should_stop());
        sa.k = 200;
        assert!(sa.should_stop());
    }

    #[test]
    fn reset_clears_internal_state() {
        let mut sa = SimulatedAnnealing::new(Cooldown::Multiplicative { cooling_factor: 10.0 }, 10.0, None);
        sa.k = 5;
        sa.best_fitness = 1.0;
        sa.reset();
        assert_eq!(sa.k, 0);
        assert_eq!(sa.best_fitness, f64::INFINITY);
    }
}
