//! The discrete parameter grid and the vectors drawn from it.

use crate::error::{BboError, Result};
use itertools::Itertools;
use std::fmt;

/// A single value along one axis of the grid.
///
/// An axis is homogeneous: all of its values are the same variant. Mixing
/// variants within one axis is a configuration error caught by
/// [`Grid::new`].
#[derive(Debug, Clone, PartialEq)]
pub enum AxisValue {
    Numeric(f64),
    Categorical(String),
}

impl AxisValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AxisValue::Numeric(v) => Some(*v),
            AxisValue::Categorical(_) => None,
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, AxisValue::Numeric(_))
    }
}

impl Eq for AxisValue {}

impl std::hash::Hash for AxisValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            AxisValue::Numeric(v) => v.to_bits().hash(state),
            AxisValue::Categorical(s) => s.hash(state),
        }
    }
}

impl fmt::Display for AxisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisValue::Numeric(v) => write!(f, "{v}"),
            AxisValue::Categorical(s) => write!(f, "{s}"),
        }
    }
}

/// One axis of the grid: an ordered, finite set of values a parameter may
/// take. Order matters for numeric axes (used for "neighbor" heuristics)
/// and for categorical tie-breaking during grid snapping.
#[derive(Debug, Clone)]
pub struct Axis {
    values: Vec<AxisValue>,
}

impl Axis {
    pub fn new(values: Vec<AxisValue>) -> Result<Self> {
        if values.is_empty() {
            return Err(BboError::Configuration("axis must have at least one value".into()));
        }
        let numeric = values[0].is_numeric();
        if !values.iter().all(|v| v.is_numeric() == numeric) {
            return Err(BboError::Configuration(
                "axis values must all be numeric or all categorical".into(),
            ));
        }
        Ok(Axis { values })
    }

    pub fn numeric(values: Vec<f64>) -> Result<Self> {
        Self::new(values.into_iter().map(AxisValue::Numeric).collect())
    }

    pub fn categorical(values: Vec<String>) -> Result<Self> {
        Self::new(values.into_iter().map(AxisValue::Categorical).collect())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[AxisValue] {
        &self.values
    }

    pub fn is_numeric(&self) -> bool {
        self.values[0].is_numeric()
    }

    pub fn min(&self) -> Option<f64> {
        self.values.iter().filter_map(|v| v.as_f64()).fold(None, |acc, v| {
            Some(acc.map_or(v, |a: f64| a.min(v)))
        })
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().filter_map(|v| v.as_f64()).fold(None, |acc, v| {
            Some(acc.map_or(v, |a: f64| a.max(v)))
        })
    }

    /// Index of the value closest to `target` along this axis. Numeric axes
    /// use L1 distance; categorical axes snap to the value itself if
    /// present, otherwise to index 0 (ties broken toward the lower index).
    pub fn closest_index(&self, target: &AxisValue) -> usize {
        match target {
            AxisValue::Numeric(t) => self
                .values
                .iter()
                .enumerate()
                .map(|(i, v)| (i, (v.as_f64().unwrap() - t).abs()))
                .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
                .map(|(i, _)| i)
                .unwrap(),
            AxisValue::Categorical(t) => self
                .values
                .iter()
                .position(|v| matches!(v, AxisValue::Categorical(s) if s == t))
                .unwrap_or(0),
        }
    }

    /// Exact position of `value` in this axis, if present.
    pub fn position_of(&self, value: &AxisValue) -> Option<usize> {
        self.values.iter().position(|v| v == value)
    }
}

/// One parameter vector: exactly one value per axis, in axis order.
pub type ParameterVector = Vec<AxisValue>;

/// The full discrete search space: an ordered set of axes.
#[derive(Debug, Clone)]
pub struct Grid {
    axes: Vec<Axis>,
}

impl Grid {
    pub fn new(axes: Vec<Axis>) -> Result<Self> {
        if axes.is_empty() {
            return Err(BboError::Configuration("grid must have at least one axis".into()));
        }
        Ok(Grid { axes })
    }

    pub fn dims(&self) -> usize {
        self.axes.len()
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn axis(&self, i: usize) -> &Axis {
        &self.axes[i]
    }

    /// Total number of distinct points in the grid (product of axis sizes).
    pub fn size(&self) -> u64 {
        self.axes.iter().map(|a| a.len() as u64).product()
    }

    pub fn smallest_axis_len(&self) -> usize {
        self.axes.iter().map(|a| a.len()).min().unwrap_or(0)
    }

    /// Snap an arbitrary (possibly off-grid) candidate vector onto the
    /// nearest point actually present in the grid, axis by axis.
    pub fn snap(&self, candidate: &[AxisValue]) -> Result<ParameterVector> {
        if candidate.len() != self.axes.len() {
            return Err(BboError::Grid(format!(
                "candidate has {} dimensions, grid has {}",
                candidate.len(),
                self.axes.len()
            )));
        }
        Ok(self
            .axes
            .iter()
            .zip(candidate.iter())
            .map(|(axis, value)| {
                let idx = axis.closest_index(value);
                axis.values()[idx].clone()
            })
            .collect())
    }

    /// The exact grid index (per-axis position) of `vector`, if every
    /// coordinate is present on its axis. Returns a [`BboError::Grid`]
    /// otherwise (mirrors the original "current parameter out of grid"
    /// failure used by neighbor functions).
    pub fn positions_of(&self, vector: &[AxisValue]) -> Result<Vec<usize>> {
        vector
            .iter()
            .zip(self.axes.iter())
            .map(|(v, axis)| {
                axis.position_of(v)
                    .ok_or_else(|| BboError::Grid("current parameter out of grid".into()))
            })
            .collect()
    }

    /// Materialize the full Cartesian product of the grid. Used by
    /// exhaustive search and by the MPI/EI acquisition strategies, which
    /// brute-force-enumerate the grid exactly as the original
    /// implementation does.
    pub fn cartesian_product(&self) -> Vec<ParameterVector> {
        self.axes
            .iter()
            .map(|a| a.values().iter().cloned())
            .multi_cartesian_product()
            .collect()
    }

    /// Euclidean-style distance between two points of the grid: squared
    /// numeric difference per numeric axis, 0/1 indicator per categorical
    /// axis, summed then square-rooted.
    pub fn distance(&self, a: &[AxisValue], b: &[AxisValue]) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| match (x, y) {
                (AxisValue::Numeric(x), AxisValue::Numeric(y)) => (x - y).powi(2),
                _ => {
                    if x == y {
                        0.0
                    } else {
                        1.0
                    }
                }
            })
            .sum::<f64>()
            .sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_rejects_mixed_variants() {
        let values = vec![AxisValue::Numeric(1.0), AxisValue::Categorical("a".into())];
        assert!(Axis::new(values).is_err());
    }

    #[test]
    fn axis_rejects_empty() {
        assert!(Axis::new(vec![]).is_err());
    }

    #[test]
    fn closest_index_numeric_ties_toward_lower() {
        let axis = Axis::numeric(vec![0.0, 10.0]).unwrap();
        // equidistant from 0.0 and 10.0
        assert_eq!(axis.closest_index(&AxisValue::Numeric(5.0)), 0);
    }

    #[test]
    fn grid_size_is_product_of_axis_lengths() {
        let grid = Grid::new(vec![
            Axis::numeric(vec![1.0, 2.0, 3.0]).unwrap(),
            Axis::categorical(vec!["a".into(), "b".into()]).unwrap(),
        ])
        .unwrap();
        assert_eq!(grid.size(), 6);
        assert_eq!(grid.cartesian_product().len(), 6);
    }

    #[test]
    fn snap_rejects_dimension_mismatch() {
        let grid = Grid::new(vec![Axis::numeric(vec![1.0, 2.0]).unwrap()]).unwrap();
        let candidate = vec![AxisValue::Numeric(1.5), AxisValue::Numeric(2.0)];
        assert!(grid.snap(&candidate).is_err());
    }

    #[test]
    fn snap_picks_nearest_value() {
        let grid = Grid::new(vec![Axis::numeric(vec![0.0, 5.0, 10.0]).unwrap()]).unwrap();
        let snapped = grid.snap(&[AxisValue::Numeric(6.0)]).unwrap();
        assert_eq!(snapped[0], AxisValue::Numeric(5.0));
    }

    #[test]
    fn positions_of_reports_grid_error_when_absent() {
        let grid = Grid::new(vec![Axis::numeric(vec![0.0, 5.0]).unwrap()]).unwrap();
        assert!(grid.positions_of(&[AxisValue::Numeric(3.0)]).is_err());
    }
}
