//! The optimizer driver: owns the history, the heuristic, the noise
//! reduction policies and the stop rule, and runs the main
//! propose → evaluate → record → callback loop. Grounded on
//! `optimizer.py`'s `BBOptimizer`.

pub mod async_eval;
pub mod callbacks;
pub mod stop_criteria;

use crate::blackbox::BlackBox;
use crate::error::{BboError, Result};
use crate::grid::Grid;
use crate::heuristics::HeuristicKind;
use crate::history::History;
use crate::noise::{Aggregation, ResamplingPolicy};
use crate::sampler::InitialDrawMethod;
use callbacks::CallbackRegistry;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use stop_criteria::StopCriterion;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

/// Everything the driver needs that is not the black box, heuristic or
/// history itself. Plain, `serde`-deserializable (matching the teacher's
/// `StrategySettings` convention) even though parsing a config file is out
/// of this crate's scope.
#[derive(Clone, Deserialize, Serialize)]
pub struct OptimizerConfig {
    pub initial_sample_size: usize,
    pub initial_draw_method: InitialDrawMethodConfig,
    pub max_iterations: Option<usize>,
    pub timeout: Option<Duration>,
    pub max_evaluation_cost: Option<f64>,
    /// If `false`, [`Optimizer::select_next_parameters`] retries the
    /// heuristic up to `max_retry` times to avoid proposing a parametrization
    /// already present in history.
    pub reevaluate: bool,
    pub max_retry: usize,
    /// Optional post-transform applied to the black box's raw output before
    /// it is recorded as fitness. Not serialized — a function value has no
    /// wire representation, matching the rest of the config's JSON-roundtrip
    /// contract for every other field.
    #[serde(skip)]
    pub perf_function: Option<Arc<dyn Fn(f64) -> f64 + Send + Sync>>,
    pub seed: u64,
}

impl std::fmt::Debug for OptimizerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimizerConfig")
            .field("initial_sample_size", &self.initial_sample_size)
            .field("initial_draw_method", &self.initial_draw_method)
            .field("max_iterations", &self.max_iterations)
            .field("timeout", &self.timeout)
            .field("max_evaluation_cost", &self.max_evaluation_cost)
            .field("reevaluate", &self.reevaluate)
            .field("max_retry", &self.max_retry)
            .field("perf_function", &self.perf_function.is_some())
            .field("seed", &self.seed)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum InitialDrawMethodConfig {
    UniformRandom,
    LatinHypercube,
    Hybrid,
}

impl From<InitialDrawMethodConfig> for InitialDrawMethod {
    fn from(value: InitialDrawMethodConfig) -> Self {
        match value {
            InitialDrawMethodConfig::UniformRandom => InitialDrawMethod::UniformRandom,
            InitialDrawMethodConfig::LatinHypercube => InitialDrawMethod::LatinHypercube,
            InitialDrawMethodConfig::Hybrid => InitialDrawMethod::Hybrid,
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            initial_sample_size: 5,
            initial_draw_method: InitialDrawMethodConfig::UniformRandom,
            max_iterations: Some(100),
            timeout: None,
            max_evaluation_cost: None,
            reevaluate: true,
            max_retry: 5,
            perf_function: None,
            seed: 0,
        }
    }
}

pub struct Optimizer {
    grid: Grid,
    config: OptimizerConfig,
    heuristic: HeuristicKind,
    resampling: ResamplingPolicy,
    aggregation: Aggregation,
    stop_criteria: Vec<StopCriterion>,
    callbacks: CallbackRegistry,
    rng: StdRng,
    history: History,
    nbr_iteration: usize,
    launched: bool,
    started_at: Option<Instant>,
}

impl Optimizer {
    pub fn new(
        grid: Grid,
        config: OptimizerConfig,
        heuristic: HeuristicKind,
        resampling: ResamplingPolicy,
        aggregation: Aggregation,
        stop_criteria: Vec<StopCriterion>,
    ) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Optimizer {
            grid,
            config,
            heuristic,
            resampling,
            aggregation,
            stop_criteria,
            callbacks: CallbackRegistry::new(),
            rng,
            history: History::new(),
            nbr_iteration: 0,
            launched: false,
            started_at: None,
        }
    }

    pub fn register_callback(&mut self, callback: callbacks::Callback) {
        self.callbacks.register(callback);
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// AND of the iteration budget, the timeout, the heuristic's own
    /// `should_stop`, and every configured [`StopCriterion`].
    fn stop_rule(&self) -> bool {
        if let Some(max_iterations) = self.config.max_iterations {
            if self.nbr_iteration >= max_iterations {
                return true;
            }
        }
        if let Some(timeout) = self.config.timeout {
            if let Some(started_at) = self.started_at {
                if started_at.elapsed() >= timeout {
                    return true;
                }
            }
        }
        if self.heuristic.should_stop() {
            return true;
        }
        let aggregated = self.aggregation.apply(&self.history);
        !stop_criteria::all_continue(&self.stop_criteria, &aggregated, &self.grid)
    }

    fn initialize(&mut self, black_box: &mut dyn BlackBox) -> Result<()> {
        let draws = crate::sampler::draw_initial_sample(
            &self.grid,
            self.config.initial_sample_size,
            self.config.initial_draw_method.into(),
            &mut self.rng,
        )?;
        for parameters in draws {
            let fitness = black_box
                .compute(&parameters)
                .map_err(BboError::Evaluation)?;
            let fitness = self.apply_perf_function(fitness);
            self.history.push(parameters, fitness, false, false, true);
            self.callbacks.fire(&self.history);
        }
        Ok(())
    }

    fn apply_perf_function(&self, fitness: f64) -> f64 {
        match &self.config.perf_function {
            Some(transform) => transform(fitness),
            None => fitness,
        }
    }

    /// Implements `select_next`: first checks whether the resampling policy
    /// wants the most recently evaluated parametrization repeated (returning
    /// immediately, without consulting the heuristic at all); otherwise
    /// aggregates history, asks the heuristic for a candidate, snaps it onto
    /// the grid, and — if `reevaluate` is disabled — retries the heuristic
    /// up to `max_retry` times until the snapped candidate is not already
    /// present in history. Returns the chosen parametrization and whether it
    /// is a resample of the previous one.
    fn select_next_parameters(&mut self) -> Result<(Vec<crate::grid::AxisValue>, bool)> {
        let last_fitness = self.history.last_parametrization_fitness();
        if !last_fitness.is_empty()
            && self
                .resampling
                .should_resample(&last_fitness, self.history.len())
        {
            let repeat = self.history.parameters().last().unwrap().clone();
            return Ok((repeat, true));
        }

        let aggregated = self.aggregation.apply(&self.history);
        let current = self.history.parameters().last().cloned();
        let candidate = self
            .heuristic
            .propose(&aggregated, &self.grid, current.as_ref(), &mut self.rng);
        let mut snapped = self.grid.snap(&candidate)?;

        if !self.config.reevaluate {
            let mut retries = 0;
            while retries < self.config.max_retry
                && self.history.parameters().iter().any(|p| *p == snapped)
            {
                let retry_candidate = self.heuristic.propose(&aggregated, &self.grid, None, &mut self.rng);
                snapped = self.grid.snap(&retry_candidate)?;
                retries += 1;
            }
        }

        Ok((snapped, false))
    }

    /// Synchronous per-iteration step: evaluate `parameters` directly on
    /// the calling thread.
    fn optimization_step(
        &mut self,
        black_box: &mut dyn BlackBox,
        parameters: Vec<crate::grid::AxisValue>,
        resampled: bool,
    ) -> Result<()> {
        let fitness = black_box
            .compute(&parameters)
            .map_err(BboError::Evaluation)?;
        let fitness = self.apply_perf_function(fitness);
        self.history.push(parameters, fitness, false, resampled, false);
        self.callbacks.fire(&self.history);
        Ok(())
    }

    /// Runs the optimizer to completion synchronously: single-threaded,
    /// cooperative, no tokio runtime touched.
    pub fn optimize(&mut self, black_box: &mut dyn BlackBox) -> Result<()> {
        self.launched = true;
        self.started_at = Some(Instant::now());
        info!(initial_sample_size = self.config.initial_sample_size, "starting optimization");
        self.initialize(black_box)?;
        let (mut next, mut resampled) = self.select_next_parameters()?;
        while !self.stop_rule() {
            self.optimization_step(black_box, next, resampled)?;
            self.nbr_iteration += 1;
            debug!(iteration = self.nbr_iteration, "completed iteration");
            (next, resampled) = self.select_next_parameters()?;
        }
        info!(iterations = self.nbr_iteration, "optimization finished");
        Ok(())
    }

    /// Runs the optimizer asynchronously, evaluating each candidate on a
    /// worker task and polling the cost monitor per
    /// [`async_eval::evaluate_with_budget`].
    pub async fn optimize_async(&mut self, black_box: Arc<AsyncMutex<Box<dyn BlackBox>>>) -> Result<()> {
        self.launched = true;
        self.started_at = Some(Instant::now());
        {
            let mut guard = black_box.lock().await;
            self.initialize(&mut **guard)?;
        }
        let (mut next, mut resampled) = self.select_next_parameters()?;
        while !self.stop_rule() {
            let outcome = async_eval::evaluate_with_budget(
                Arc::clone(&black_box),
                next.clone(),
                self.config.max_evaluation_cost,
            )
            .await;
            if outcome.truncated {
                warn!(iteration = self.nbr_iteration, "evaluation truncated by cost monitor");
            }
            let fitness = outcome.fitness.map_err(BboError::Evaluation)?;
            let fitness = if outcome.truncated { fitness } else { self.apply_perf_function(fitness) };
            self.history.push(next, fitness, outcome.truncated, resampled, false);
            self.callbacks.fire(&self.history);
            self.nbr_iteration += 1;
            (next, resampled) = self.select_next_parameters()?;
        }
        Ok(())
    }

    pub fn best(&self) -> Option<(crate::grid::ParameterVector, f64)> {
        let aggregated = self.aggregation.apply(&self.history);
        let idx = aggregated.iteration_of_best_fitness()?;
        Some((aggregated.parameters()[idx].clone(), aggregated.fitness()[idx]))
    }

    pub fn summarize(&self) -> Result<String> {
        if !self.launched {
            return Err(BboError::SummaryBeforeRun);
        }
        Ok(crate::summary::format_summary(self))
    }

    pub fn reset(&mut self) {
        self.history = History::new();
        self.nbr_iteration = 0;
        self.launched = false;
        self.started_at = None;
        self.heuristic.reset();
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn nbr_iteration(&self) -> usize {
        self.nbr_iteration
    }

    pub fn launched(&self) -> bool {
        self.launched
    }

    pub fn aggregated_history(&self) -> History {
        self.aggregation.apply(&self.history)
    }
}
