use super::axis::AxisSelector;
use crate::error::{OpError, Result};
use ndarray::{ArrayView1, ArrayView2, Axis};

/// An image seen as a stack of 1-D curves, one per row of `view`.
#[derive(Debug, Clone)]
pub struct Curves<'a> {
    view: ArrayView2<'a, f64>,
    axis: Axis,
}

impl<'a> Curves<'a> {
    /// Split `image` into curves along `axis` (-1, 0 or 1).
    ///
    /// Axis 0 takes every row as a curve, axis 1 every column.
    pub fn decompose(image: ArrayView2<'a, f64>, axis: i64) -> Result<Self> {
        let axis = AxisSelector::try_from(axis)?.resolve_shorter(&image);
        if image.is_empty() {
            return Err(OpError::EmptyImage);
        }
        let view = if axis == Axis(0) {
            image
        } else {
            image.reversed_axes()
        };
        Ok(Self { view, axis })
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn n_curves(&self) -> usize {
        self.view.nrows()
    }

    pub fn n_points(&self) -> usize {
        self.view.ncols()
    }

    pub fn curve(&self, idx: usize) -> ArrayView1<'_, f64> {
        self.view.row(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = ArrayView1<'_, f64>> + '_ {
        self.view.outer_iter()
    }

    /// Curves as rows of a 2-D view.
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.view.view()
    }

    /// Check that `idx0` names one of the curves.
    pub fn reference(&self, idx0: usize) -> Result<ArrayView1<'_, f64>> {
        if idx0 >= self.n_curves() {
            return Err(OpError::ReferenceOutOfRange {
                idx0,
                n_curves: self.n_curves(),
            });
        }
        Ok(self.curve(idx0))
    }
}
