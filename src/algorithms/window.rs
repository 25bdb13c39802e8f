//! Threshold windows and centroids shared by the centroid-based alignments.

use crate::data::{argmax, min_max};
use crate::error::{OpError, Result};
use ndarray::{Array1, ArrayView1};

/// Rescale a curve to `[0, 1]`; `None` when it has no dynamic range.
pub(crate) fn normalize_curve(curve: ArrayView1<'_, f64>) -> Option<Array1<f64>> {
    let (lo, hi) = min_max(curve.iter())?;
    let range = hi - lo;
    if !(range > 0.0) {
        return None;
    }
    Some(curve.mapv(|v| (v - lo) / range))
}

/// Grow a window outwards from `peak` while samples exceed `threshold`.
///
/// Both returned bounds are the first samples at or below the threshold.
/// Running off either end of the curve is an error.
pub(crate) fn threshold_window(
    normed: ArrayView1<'_, f64>,
    peak: usize,
    threshold: f64,
    curve: usize,
) -> Result<(usize, usize)> {
    let n_points = normed.len();
    let out_of_bounds = |left: isize, right: usize| OpError::WindowOutOfBounds {
        curve,
        left,
        right,
        n_points,
    };

    let mut left = peak;
    while normed[left] > threshold {
        if left == 0 {
            return Err(out_of_bounds(-1, peak));
        }
        left -= 1;
    }

    let mut right = peak;
    while normed[right] > threshold {
        right += 1;
        if right >= n_points {
            return Err(out_of_bounds(left as isize, right));
        }
    }
    Ok((left, right))
}

/// Trapezoidal integral with unit sample spacing.
pub(crate) fn trapz<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut iter = values.into_iter();
    let Some(mut previous) = iter.next() else {
        return 0.0;
    };
    let mut total = 0.0;
    for value in iter {
        total += 0.5 * (previous + value);
        previous = value;
    }
    total
}

/// Index-weighted trapezoidal centroid of `normed` over `left..=right`.
pub(crate) fn window_centroid(normed: ArrayView1<'_, f64>, left: usize, right: usize) -> f64 {
    let weighted = trapz((left..=right).map(|k| normed[k] * k as f64));
    let mass = trapz((left..=right).map(|k| normed[k]));
    weighted / mass
}

/// Centroid of the thresholded window around the curve's maximum.
pub(crate) fn peak_centroid(
    normed: ArrayView1<'_, f64>,
    portion: f64,
    curve: usize,
) -> Result<f64> {
    let peak = argmax(&normed).ok_or(OpError::EmptyImage)?;
    let threshold = portion * normed[peak];
    let (left, right) = threshold_window(normed, peak, threshold, curve)?;
    Ok(window_centroid(normed, left, right))
}
