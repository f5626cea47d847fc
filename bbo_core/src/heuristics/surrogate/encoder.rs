//! Turns grid parameter vectors into the numeric feature rows the
//! regressors consume: numeric axes pass through unchanged, categorical
//! axes are one-hot encoded against the grid's fixed category list.

use crate::grid::{AxisValue, Grid, ParameterVector};
use ndarray::{Array1, Array2};

#[derive(Debug, Clone)]
pub struct Encoder {
    /// One entry per axis: `None` for numeric axes, `Some(categories)` for
    /// categorical axes (in the axis's declared order).
    categories: Vec<Option<Vec<String>>>,
    width: usize,
}

impl Encoder {
    pub fn from_grid(grid: &Grid) -> Self {
        let categories: Vec<Option<Vec<String>>> = grid
            .axes()
            .iter()
            .map(|axis| {
                if axis.is_numeric() {
                    None
                } else {
                    Some(
                        axis.values()
                            .iter()
                            .map(|v| v.to_string())
                            .collect(),
                    )
                }
            })
            .collect();
        let width = categories
            .iter()
            .map(|c| c.as_ref().map_or(1, |cats| cats.len()))
            .sum();
        Encoder { categories, width }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn encode_row(&self, parameters: &ParameterVector) -> Array1<f64> {
        let mut row = Vec::with_capacity(self.width);
        for (value, categories) in parameters.iter().zip(self.categories.iter()) {
            match (value, categories) {
                (AxisValue::Numeric(v), None) => row.push(*v),
                (AxisValue::Categorical(s), Some(cats)) => {
                    for cat in cats {
                        row.push(if cat == s { 1.0 } else { 0.0 });
                    }
                }
                _ => unreachable!("axis/value variant mismatch"),
            }
        }
        Array1::from(row)
    }

    pub fn encode_matrix(&self, rows: &[ParameterVector]) -> Array2<f64> {
        let mut data = Vec::with_capacity(rows.len() * self.width);
        for row in rows {
            data.extend(self.encode_row(row).into_iter());
        }
        Array2::from_shape_vec((rows.len(), self.width), data).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Axis;

    #[test]
    fn numeric_axes_pass_through() {
        let grid = Grid::new(vec![Axis::numeric(vec![1.0, 2.0]).unwrap()]).unwrap();
        let encoder = Encoder::from_grid(&grid);
        assert_eq!(encoder.width(), 1);
        let row = encoder.encode_row(&vec![AxisValue::Numeric(1.5)]);
        assert_eq!(row, Array1::from(vec![1.5]));
    }

    #[test]
    fn categorical_axes_are_one_hot() {
        let grid = Grid::new(vec![Axis::categorical(vec!["a".into(), "b".into(), "c".into()]).unwrap()]).unwrap();
        let encoder = Encoder::from_grid(&grid);
        assert_eq!(encoder.width(), 3);
        let row = encoder.encode_row(&vec![AxisValue::Categorical("b".into())]);
        assert_eq!(row, Array1::from(vec![0.0, 1.0, 0.0]));
    }
}
