//! Typed error surface for the optimizer core.
//!
//! `BudgetExhausted` is not a failure: it is raised internally to give
//! `summarize()`/logging a name for "the configured stop rule fired", and is
//! never returned from [`crate::driver::Optimizer::optimize`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BboError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("capability error: {heuristic} requires {required}")]
    Capability {
        heuristic: &'static str,
        required: &'static str,
    },

    #[error("grid error: {0}")]
    Grid(String),

    #[error("budget exhausted: {0}")]
    BudgetExhausted(String),

    #[error("black-box evaluation failed")]
    Evaluation(#[source] anyhow::Error),

    #[error("summarize() called before the optimizer has run")]
    SummaryBeforeRun,
}

pub type Result<T> = std::result::Result<T, BboError>;
