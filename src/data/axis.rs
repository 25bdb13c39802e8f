use crate::error::{OpError, Result};
use ndarray::{ArrayView2, Axis};

/// Axis argument as accepted by the operations: `-1` resolves automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSelector {
    Auto,
    Axis0,
    Axis1,
}

impl TryFrom<i64> for AxisSelector {
    type Error = OpError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            -1 => Ok(AxisSelector::Auto),
            0 => Ok(AxisSelector::Axis0),
            1 => Ok(AxisSelector::Axis1),
            other => Err(OpError::InvalidAxis(other)),
        }
    }
}

impl AxisSelector {
    /// Resolve `Auto` to axis 0 when the image has fewer rows than columns,
    /// otherwise to axis 1.
    ///
    /// Alignment and `axisSum` both use this rule. For alignment the
    /// resolved axis names the direction the curves are stacked in; for
    /// `axisSum` it is the axis that gets summed away.
    pub fn resolve_shorter(self, image: &ArrayView2<'_, f64>) -> Axis {
        match self {
            AxisSelector::Axis0 => Axis(0),
            AxisSelector::Axis1 => Axis(1),
            AxisSelector::Auto => {
                let (rows, cols) = image.dim();
                if rows < cols {
                    Axis(0)
                } else {
                    Axis(1)
                }
            }
        }
    }
}

/// Validate an axis that has no automatic resolution (slicing, summing slices).
pub fn fixed_axis(value: i64) -> Result<Axis> {
    match value {
        0 => Ok(Axis(0)),
        1 => Ok(Axis(1)),
        other => Err(OpError::InvalidAxis(other)),
    }
}
