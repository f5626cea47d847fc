//! The contract implemented by whatever system the optimizer is steering.

use crate::grid::ParameterVector;

/// The opaque function being optimized.
///
/// `on_interrupt` and `step_cost_function` default to no-ops so capability
/// detection happens through a default-method override rather than runtime
/// duck typing, matching the teacher's `Strategy` trait's use of default
/// methods for optional hooks.
pub trait BlackBox: Send {
    /// Evaluate the black box at `parameters`, returning its fitness
    /// (lower is better). Caller-side failures propagate as `anyhow::Error`
    /// and are surfaced to the driver as [`crate::error::BboError::Evaluation`].
    fn compute(&mut self, parameters: &ParameterVector) -> anyhow::Result<f64>;

    /// Called when an in-flight evaluation is cancelled because the cost
    /// monitor's budget was exceeded. Implementors that can gracefully wind
    /// down a long-running computation should override this; the default
    /// does nothing.
    fn on_interrupt(&mut self) {}

    /// The wall-clock/resource cost of the evaluation in progress, polled
    /// by the async driver's cost monitor. `None` means the black box does
    /// not support cost introspection (the capability is absent).
    fn step_cost_function(&self) -> Option<f64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Parabola;
    impl BlackBox for Parabola {
        fn compute(&mut self, parameters: &ParameterVector) -> anyhow::Result<f64> {
            let x = parameters[0].as_f64().unwrap();
            Ok(x * x)
        }
    }

    #[test]
    fn default_capabilities_are_absent() {
        let bb = Parabola;
        assert_eq!(bb.step_cost_function(), None);
    }

    #[test]
    fn compute_evaluates_without_error() {
        use crate::grid::AxisValue;
        let mut bb = Parabola;
        let result = bb.compute(&vec![AxisValue::Numeric(3.0)]).unwrap();
        assert_eq!(result, 9.0);
    }
}
