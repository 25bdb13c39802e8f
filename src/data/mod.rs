//! Image and curve primitives shared by the operation families.

pub mod axis;
pub mod curves;

pub use axis::*;
pub use curves::*;

use crate::error::{OpError, Result};
use ndarray::{Array2, ArrayView1};

/// Detector image. Operations never modify their input and return new arrays.
pub type Image = Array2<f64>;

/// Build an image from nested rows. Every row must have the same length.
pub fn image_from_rows(rows: &[Vec<f64>]) -> Result<Image> {
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|row| row.len() != n_cols) {
        return Err(OpError::InvalidParameter(
            "image rows must all have the same length".to_string(),
        ));
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((n_rows, n_cols), flat)
        .map_err(|e| OpError::InvalidParameter(e.to_string()))
}

/// Index of the first maximum, `None` for an empty curve.
pub fn argmax(curve: &ArrayView1<'_, f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &value) in curve.iter().enumerate() {
        match best {
            Some((_, current)) if !(value > current) => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Minimum and maximum of a sequence, `None` when empty.
pub fn min_max<'a, I>(values: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = &'a f64>,
{
    values.into_iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Mean spacing between consecutive samples of a scale array.
pub fn scale_step(scale: &[f64]) -> Result<f64> {
    if scale.len() < 2 {
        return Err(OpError::InvalidParameter(format!(
            "scale needs at least two samples, got {}",
            scale.len()
        )));
    }
    let span: f64 = scale.windows(2).map(|w| w[1] - w[0]).sum();
    Ok(span / (scale.len() - 1) as f64)
}
