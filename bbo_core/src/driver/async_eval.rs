//! Asynchronous evaluation of a single candidate: spawns one worker task,
//! polls a cost monitor at ~100ms granularity, and supports cancellation
//! with `on_interrupt()` bookkeeping. Grounded on
//! `optimizer.py`'s `_async_optimization_step`.

use crate::blackbox::BlackBox;
use crate::grid::ParameterVector;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};
use tokio::time::interval;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of one asynchronous evaluation.
pub struct EvalOutcome {
    pub fitness: anyhow::Result<f64>,
    /// Set when the evaluation was cancelled because its cost exceeded
    /// `max_cost` before completing. A truncated evaluation's fitness is
    /// still recorded (the driver treats it as a ceiling value), matching
    /// `optimizer.py`'s truncation bookkeeping.
    pub truncated: bool,
}

/// Runs `black_box.compute(parameters)` on a worker task, polling
/// `black_box.step_cost_function()` (falling back to wall-clock elapsed
/// time) every [`POLL_INTERVAL`] against `max_cost`. If the cost monitor
/// trips first, the evaluation is reported truncated; `black_box.on_interrupt()`
/// is still invoked once the worker task's exclusive hold on the box is
/// released, since a synchronous `compute` cannot be preempted mid-call.
pub async fn evaluate_with_budget(
    black_box: Arc<Mutex<Box<dyn BlackBox>>>,
    parameters: ParameterVector,
    max_cost: Option<f64>,
) -> EvalOutcome {
    let (done_tx, mut done_rx) = watch::channel(false);
    let worker_box = Arc::clone(&black_box);
    let worker_params = parameters.clone();
    let handle = tokio::spawn(async move {
        let result = {
            let mut guard = worker_box.lock().await;
            guard.compute(&worker_params)
        };
        let _ = done_tx.send(true);
        result
    });

    let mut ticker = interval(POLL_INTERVAL);
    let started = Instant::now();
    let mut truncated = false;

    loop {
        tokio::select! {
            _ = done_rx.changed() => {
                break;
            }
            _ = ticker.tick() => {
                if let Some(max_cost) = max_cost {
                    // `compute` holds this same lock for its whole, possibly
                    // blocking duration; waiting on it here would starve the
                    // cost check until the evaluation is already done. Take
                    // a best-effort reading through `try_lock` and fall back
                    // to wall-clock elapsed time, which needs no lock at all.
                    let cost = match black_box.try_lock() {
                        Ok(guard) => guard.step_cost_function().unwrap_or_else(|| started.elapsed().as_secs_f64()),
                        Err(_) => started.elapsed().as_secs_f64(),
                    };
                    if cost > max_cost {
                        truncated = true;
                        break;
                    }
                }
            }
        }
    }

    if truncated {
        // The worker task may still be holding the box; wait for it, since
        // there is no way to preempt a blocking `compute` call mid-flight.
        let mut guard = black_box.lock().await;
        guard.on_interrupt();
        EvalOutcome {
            fitness: Ok(max_cost.unwrap_or(f64::INFINITY)),
            truncated: true,
        }
    } else {
        match handle.await {
            Ok(result) => EvalOutcome { fitness: result, truncated: false },
            Err(join_err) => EvalOutcome {
                fitness: Err(anyhow::anyhow!("evaluation task panicked: {join_err}")),
                truncated: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::AxisValue;

    struct Slow;
    impl BlackBox for Slow {
        fn compute(&mut self, parameters: &ParameterVector) -> anyhow::Result<f64> {
            let x = parameters[0].as_f64().unwrap();
            Ok(x)
        }
    }

    #[tokio::test]
    async fn evaluation_completes_without_a_budget() {
        let bb: Arc<Mutex<Box<dyn BlackBox>>> = Arc::new(Mutex::new(Box::new(Slow)));
        let outcome = evaluate_with_budget(bb, vec![AxisValue::Numeric(4.0)], None).await;
        assert!(!outcome.truncated);
        assert_eq!(outcome.fitness.unwrap(), 4.0);
    }
}
