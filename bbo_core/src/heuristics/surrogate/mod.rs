pub mod acquisition;
pub mod encoder;
pub mod regressor;

use crate::error::BboError;
use crate::grid::{AxisValue, Grid, ParameterVector};
use crate::heuristics::Heuristic;
use crate::history::{Estimator, History};
use acquisition::Acquisition;
use encoder::Encoder;
use rand::rngs::StdRng;
use regressor::{Regressor, RegressorKind};

/// Fits a regression model to the aggregated history, then hands the
/// model to an acquisition strategy to pick the next candidate. Grounded
/// on `heuristics/surrogate_models/surrogate_models.py`'s orchestration of
/// a regressor plus a `next_parameter_strategy`.
pub struct SurrogateModel {
    regressor: RegressorKind,
    acquisition: Acquisition,
    encoder: Option<Encoder>,
}

impl SurrogateModel {
    /// Construction fails with [`BboError::Capability`] if an acquisition
    /// strategy requiring a predictive standard deviation is paired with a
    /// plain (non-probabilistic) regressor — a compile-time-adjacent check
    /// performed once at setup rather than on every `propose` call.
    pub fn new(regressor: RegressorKind, acquisition: Acquisition) -> crate::error::Result<Self> {
        if acquisition.requires_std() && regressor.as_probabilistic().is_none() {
            return Err(BboError::Capability {
                heuristic: "surrogate model (MPI/EI)",
                required: "a regressor that predicts a standard deviation",
            });
        }
        Ok(SurrogateModel { regressor, acquisition, encoder: None })
    }
}

impl Heuristic for SurrogateModel {
    fn propose(
        &mut self,
        history: &History,
        grid: &Grid,
        current: Option<&ParameterVector>,
        rng: &mut StdRng,
    ) -> Vec<AxisValue> {
        let encoder = self.encoder.get_or_insert_with(|| Encoder::from_grid(grid));
        if history.len() < 2 {
            return current
                .cloned()
                .unwrap_or_else(|| grid.axes().iter().map(|a| a.values()[0].clone()).collect());
        }
        let aggregated = history.aggregate(Estimator::Mean);
        let x = encoder.encode_matrix(aggregated.parameters());
        let y = ndarray::Array1::from(aggregated.fitness().to_vec());
        if self.regressor.fit(&x, &y).is_err() {
            return current
                .cloned()
                .unwrap_or_else(|| grid.axes().iter().map(|a| a.values()[0].clone()).collect());
        }
        self.acquisition
            .propose(&self.regressor, grid, rng)
            .unwrap_or_else(|_| grid.axes().iter().map(|a| a.values()[0].clone()).collect())
    }

    fn summary(&self, history: &History) -> String {
        format!("surrogate model: {} points used to fit the regressor", history.len())
    }

    fn reset(&mut self) {
        self.encoder = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Axis;
    use regressor::{GaussianProcessRegressor, OlsRegressor};

    #[test]
    fn construction_rejects_std_acquisition_with_plain_regressor() {
        let result = SurrogateModel::new(
            RegressorKind::Ols(OlsRegressor::new()),
            Acquisition::ExpectedImprovement,
        );
        assert!(result.is_err());
    }

    #[test]
    fn construction_accepts_std_acquisition_with_probabilistic_regressor() {
        let result = SurrogateModel::new(
            RegressorKind::Gp(GaussianProcessRegressor::new(1.0, 1.0, 1e-3)),
            Acquisition::ExpectedImprovement,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn propose_falls_back_before_enough_history() {
        let grid = Grid::new(vec![Axis::numeric(vec![1.0, 2.0, 3.0]).unwrap()]).unwrap();
        let mut model = SurrogateModel::new(RegressorKind::Ols(OlsRegressor::new()), Acquisition::LbfgsB).unwrap();
        let history = History::new();
        let mut rng = <StdRng as rand::SeedableRng>::seed_from_u64(0);
        let proposal = model.propose(&history, &grid, None, &mut rng);
        assert_eq!(proposal.len(), 1);
    }
}
