//! Cross-correlation alignment
//!
//! Every curve is correlated against the reference in the frequency
//! domain. The correlation is rotated so zero lag sits at `n / 2`, then
//! its thresholded peak is reduced to a single position.

use super::window::{normalize_curve, threshold_window};
use super::{validate_portion, AlignmentParams};
use crate::data::{argmax, Curves};
use crate::error::{OpError, Result};
use ndarray::{Array1, ArrayView1, ArrayView2};
use num_complex::Complex;
use rayon::prelude::*;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// How the thresholded correlation peak is reduced to a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CentroidWeighting {
    /// Amplitude-weighted mean of the window positions.
    #[default]
    Window,
    /// Amplitudes weighted by the curve index instead of the position.
    /// The shift then only depends on which curve is being aligned.
    /// Kept for comparison with historical results.
    CurveIndex,
}

struct Correlator {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    n: usize,
}

impl Correlator {
    fn new(n: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        Self {
            forward: planner.plan_fft_forward(n),
            inverse: planner.plan_fft_inverse(n),
            n,
        }
    }

    fn spectrum(&self, curve: ArrayView1<'_, f64>) -> Vec<Complex<f64>> {
        let mut buffer: Vec<Complex<f64>> = curve.iter().map(|&v| Complex::new(v, 0.0)).collect();
        self.forward.process(&mut buffer);
        buffer
    }

    /// Real part of `ifft(reference * conj(fft(curve)))`, rotated right by `n / 2`.
    fn correlate(&self, reference: &[Complex<f64>], curve: ArrayView1<'_, f64>) -> Array1<f64> {
        let spectrum = self.spectrum(curve);
        let mut product: Vec<Complex<f64>> = reference
            .iter()
            .zip(&spectrum)
            .map(|(r, c)| r * c.conj())
            .collect();
        self.inverse.process(&mut product);

        let scale = self.n as f64;
        let mut real: Vec<f64> = product.iter().map(|c| c.re / scale).collect();
        real.rotate_right(self.n / 2);
        Array1::from(real)
    }
}

pub fn fft_alignment(image: ArrayView2<'_, f64>, params: &AlignmentParams) -> Result<Vec<f64>> {
    validate_portion(params.portion)?;
    let curves = Curves::decompose(image, params.axis)?;
    let reference = curves.reference(params.idx0)?;

    let correlator = Correlator::new(curves.n_points());
    let spectrum0 = correlator.spectrum(reference);
    let center = (curves.n_points() / 2) as f64;

    let rows: Vec<ArrayView1<'_, f64>> = curves.iter().collect();
    let mut shifts: Vec<f64> = rows
        .par_iter()
        .enumerate()
        .map(|(idx, curve)| -> Result<f64> {
            let correlation = correlator.correlate(&spectrum0, curve.view());
            let Some(normed) = normalize_curve(correlation.view()) else {
                debug!(curve = idx, "Flat correlation, no shift");
                return Ok(f64::NAN);
            };
            let peak = argmax(&normed.view()).ok_or(OpError::EmptyImage)?;
            let threshold = params.portion * normed[peak];
            let (left, right) = threshold_window(normed.view(), peak, threshold, idx)?;

            let window = normed.slice(ndarray::s![left..=right]);
            let mass: f64 = window.sum();
            let centroid = match params.centroid_weighting {
                CentroidWeighting::Window => {
                    window
                        .iter()
                        .zip(left..=right)
                        .map(|(&w, k)| w * k as f64)
                        .sum::<f64>()
                        / mass
                }
                CentroidWeighting::CurveIndex => {
                    window.iter().map(|&w| w * idx as f64).sum::<f64>() / mass
                }
            };
            Ok(centroid - center)
        })
        .collect::<Result<_>>()?;

    // The autocorrelation centroid lands on `center` only up to rounding.
    if params.centroid_weighting == CentroidWeighting::Window && shifts[params.idx0].is_finite() {
        shifts[params.idx0] = 0.0;
    }
    Ok(shifts)
}
