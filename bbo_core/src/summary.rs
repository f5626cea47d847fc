//! Human-readable summary of a finished optimization run. Grounded on
//! `OptimizationResult::format_for_display` in `optimization.rs`.

use crate::driver::Optimizer;

pub fn format_summary(optimizer: &Optimizer) -> String {
    let history = optimizer.aggregated_history();
    let mut lines = Vec::new();
    lines.push(format!("iterations: {}", optimizer.nbr_iteration()));
    lines.push(format!("evaluations recorded: {}", history.len()));

    if let Some((params, fitness)) = optimizer.best() {
        let rendered = params
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("best parameters: [{rendered}]"));
        lines.push(format!("best fitness: {fitness:.6}"));
    }

    let (explored, static_frac) = history.size_explored_space(optimizer.grid());
    lines.push(format!("explored space: {:.2}%", explored * 100.0));
    lines.push(format!("repeated evaluations: {:.2}%", static_frac * 100.0));

    let (global_count, global_cost) = history.global_exploration_cost();
    lines.push(format!("global exploration cost: {global_count} regressions, penalty {global_cost:.6}"));

    let (local_count, local_cost) = history.local_exploration_cost();
    lines.push(format!("local exploration cost: {local_count} regressions, penalty {local_cost:.6}"));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Axis, Grid};
    use crate::heuristics::exhaustive::ExhaustiveSearch;
    use crate::heuristics::HeuristicKind;
    use crate::noise::{Aggregation, ResamplingPolicy};
    use crate::{BlackBox, OptimizerConfig};

    struct Parabola;
    impl BlackBox for Parabola {
        fn compute(&mut self, parameters: &crate::grid::ParameterVector) -> anyhow::Result<f64> {
            let x = parameters[0].as_f64().unwrap();
            Ok(x * x)
        }
    }

    #[test]
    fn summary_mentions_best_fitness() {
        let grid = Grid::new(vec![Axis::numeric(vec![-1.0, 0.0, 1.0]).unwrap()]).unwrap();
        let heuristic = HeuristicKind::Exhaustive(ExhaustiveSearch::new(&grid));
        let mut optimizer = Optimizer::new(
            grid,
            OptimizerConfig { initial_sample_size: 1, max_iterations: Some(2), ..OptimizerConfig::default() },
            heuristic,
            ResamplingPolicy::Simple { n: 1 },
            Aggregation::Identity,
            vec![],
        );
        let mut bb = Parabola;
        optimizer.optimize(&mut bb).unwrap();
        let summary = optimizer.summarize().unwrap();
        assert!(summary.contains("best fitness"));
    }
}
