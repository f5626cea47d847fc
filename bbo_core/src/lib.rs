// bbo_core/src/lib.rs

pub mod error;
pub mod grid;
pub mod history;
pub mod sampler;
pub mod blackbox;
pub mod noise;
pub mod heuristics;
pub mod driver;
pub mod summary;

pub use blackbox::BlackBox;
pub use driver::{Optimizer, OptimizerConfig};
pub use error::BboError;
pub use grid::{Axis, AxisValue, Grid, ParameterVector};
pub use history::History;
