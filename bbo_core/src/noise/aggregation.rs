//! Collapses repeated resamples of the same parametrization into a single
//! fitness value before a heuristic sees the history.

use crate::history::{Estimator, History};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// History is passed through unchanged.
    Identity,
    /// Repeated parametrizations are collapsed via `estimator`.
    Simple(Estimator),
}

impl Aggregation {
    pub fn apply(self, history: &History) -> History {
        match self {
            Aggregation::Identity => history.clone(),
            Aggregation::Simple(estimator) => history.aggregate(estimator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::AxisValue;

    #[test]
    fn identity_is_a_passthrough() {
        let mut h = History::new();
        h.push(vec![AxisValue::Numeric(1.0)], 2.0, false, false, true);
        h.push(vec![AxisValue::Numeric(1.0)], 4.0, false, true, false);
        let out = Aggregation::Identity.apply(&h);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn simple_aggregation_collapses_duplicates() {
        let mut h = History::new();
        h.push(vec![AxisValue::Numeric(1.0)], 2.0, false, false, true);
        h.push(vec![AxisValue::Numeric(1.0)], 4.0, false, true, false);
        let out = Aggregation::Simple(Estimator::Mean).apply(&h);
        assert_eq!(out.len(), 1);
        assert!((out.fitness()[0] - 3.0).abs() < 1e-9);
    }
}
