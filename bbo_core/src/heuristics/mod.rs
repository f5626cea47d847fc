//! The pluggable search strategies that decide which parametrization to try
//! next.

pub mod annealing;
pub mod exhaustive;
pub mod genetic;
pub mod surrogate;

use crate::grid::{AxisValue, Grid, ParameterVector};
use crate::history::History;
use rand::rngs::StdRng;

/// Behaviour shared by every search strategy. `propose` may return an
/// off-grid candidate (the surrogate model's continuous acquisition
/// strategies do); the driver snaps it onto the grid before evaluating it.
pub trait Heuristic {
    fn propose(
        &mut self,
        history: &History,
        grid: &Grid,
        current: Option<&ParameterVector>,
        rng: &mut StdRng,
    ) -> Vec<AxisValue>;

    /// Whether the heuristic itself has an internal reason to stop
    /// (distinct from the driver's own stop criteria).
    fn should_stop(&self) -> bool {
        false
    }

    fn summary(&self, _history: &History) -> String {
        String::new()
    }

    fn reset(&mut self);
}

/// Closed set of built-in heuristics, dispatched without `dyn` so that
/// strategies requiring extra capabilities (the surrogate model's
/// probabilistic regressor, for acquisition strategies that need a
/// predictive standard deviation) are checked at construction time rather
/// than at call time.
pub enum HeuristicKind {
    Exhaustive(exhaustive::ExhaustiveSearch),
    Annealing(annealing::SimulatedAnnealing),
    Genetic(genetic::GeneticAlgorithm),
    Surrogate(surrogate::SurrogateModel),
    /// Escape hatch for a caller-supplied heuristic.
    Custom(Box<dyn Heuristic + Send>),
}

impl Heuristic for HeuristicKind {
    fn propose(
        &mut self,
        history: &History,
        grid: &Grid,
        current: Option<&ParameterVector>,
        rng: &mut StdRng,
    ) -> Vec<AxisValue> {
        match self {
            HeuristicKind::Exhaustive(h) => h.propose(history, grid, current, rng),
            HeuristicKind::Annealing(h) => h.propose(history, grid, current, rng),
            HeuristicKind::Genetic(h) => h.propose(history, grid, current, rng),
            HeuristicKind::Surrogate(h) => h.propose(history, grid, current, rng),
            HeuristicKind::Custom(h) => h.propose(history, grid, current, rng),
        }
    }

    fn should_stop(&self) -> bool {
        match self {
            HeuristicKind::Exhaustive(h) => h.should_stop(),
            HeuristicKind::Annealing(h) => h.should_stop(),
            HeuristicKind::Genetic(h) => h.should_stop(),
            HeuristicKind::Surrogate(h) => h.should_stop(),
            HeuristicKind::Custom(h) => h.should_stop(),
        }
    }

    fn summary(&self, history: &History) -> String {
        match self {
            HeuristicKind::Exhaustive(h) => h.summary(history),
            HeuristicKind::Annealing(h) => h.summary(history),
            HeuristicKind::Genetic(h) => h.summary(history),
            HeuristicKind::Surrogate(h) => h.summary(history),
            HeuristicKind::Custom(h) => h.summary(history),
        }
    }

    fn reset(&mut self) {
        match self {
            HeuristicKind::Exhaustive(h) => h.reset(),
            HeuristicKind::Annealing(h) => h.reset(),
            HeuristicKind::Genetic(h) => h.reset(),
            HeuristicKind::Surrogate(h) => h.reset(),
            HeuristicKind::Custom(h) => h.reset(),
        }
    }
}
