//! Gaussian fit alignment
//!
//! Baselines are clipped away with SNIP, the remaining peaks are located
//! and fitted with a Gaussian. Per-curve problems never abort the run: a
//! failed peak search falls back to the curve maximum and a failed fit
//! yields a `NaN` [`FitResult`].

use super::{AlignmentParams, FitResult};
use crate::data::{argmax, min_max, Curves};
use crate::error::Result;
use crate::fitting::{
    BackgroundEstimator, Gaussian, LeastSquaresSolver, PeakSearch, PeakSearchError,
};
use crate::operations::zero_to_one;
use ndarray::{ArrayView1, ArrayView2};
use rayon::prelude::*;
use tracing::warn;

/// Intensity scaling handed to the peak search
pub const PEAK_SEARCH_YSCALING: f64 = 100.0;

/// Fraction of a curve's normalized maximum bounding the width seed.
const HALF_MAXIMUM: f64 = 0.5;
/// Fraction of a curve's normalized maximum bounding the fitted samples.
const SUPPORT_FLOOR: f64 = 0.1;

pub struct FitCollaborators<'a> {
    pub background: &'a dyn BackgroundEstimator,
    pub peak_search: &'a dyn PeakSearch,
    pub solver: &'a dyn LeastSquaresSolver,
}

/// Shifts of the fitted peak positions relative to the reference fit,
/// together with every curve's fit.
pub fn fit_alignment(
    image: ArrayView2<'_, f64>,
    params: &AlignmentParams,
    with: &FitCollaborators<'_>,
) -> Result<(Vec<f64>, Vec<FitResult>)> {
    let curves = Curves::decompose(image, params.axis)?;
    curves.reference(params.idx0)?;
    let (rows, cols) = image.dim();
    let snip_width = params.snip_width.unwrap_or(rows.max(cols) / 10);

    let raw = curves.view();
    let mut subtracted = raw.to_owned();
    for (mut row, curve) in subtracted.outer_iter_mut().zip(raw.outer_iter()) {
        let background = with.background.background(curve, snip_width);
        row -= &background;
    }
    let normalized = zero_to_one(subtracted.view())?;

    let fits: Vec<FitResult> = (0..curves.n_curves())
        .into_par_iter()
        .map(|idx| {
            let curve = CurveData {
                idx,
                raw: raw.row(idx),
                subtracted: subtracted.row(idx),
                normalized: normalized.row(idx),
            };
            let search = params.peak_search.then_some(with.peak_search);
            fit_curve(&curve, search, with.solver)
        })
        .collect();

    let position0 = fits[params.idx0].position;
    let shifts = fits.iter().map(|fit| position0 - fit.position).collect();
    Ok((shifts, fits))
}

struct CurveData<'a> {
    idx: usize,
    raw: ArrayView1<'a, f64>,
    subtracted: ArrayView1<'a, f64>,
    normalized: ArrayView1<'a, f64>,
}

fn locate_peak(curve: &CurveData<'_>, search: Option<&dyn PeakSearch>) -> usize {
    let y = curve.subtracted;
    let fallback = argmax(&y).unwrap_or(0);
    let Some(search) = search else {
        return fallback;
    };
    match search.seek(y, PEAK_SEARCH_YSCALING) {
        Ok(peaks) => peaks
            .into_iter()
            .filter(|&i| i < y.len())
            .max_by(|&a, &b| y[a].total_cmp(&y[b]))
            .unwrap_or(fallback),
        Err(PeakSearchError::NoPeaks) => {
            warn!(curve = curve.idx, "No peaks found, using curve maximum");
            fallback
        }
        Err(e) => {
            warn!(curve = curve.idx, error = %e, "Peak search failed, using curve maximum");
            fallback
        }
    }
}

fn fit_curve(
    curve: &CurveData<'_>,
    search: Option<&dyn PeakSearch>,
    solver: &dyn LeastSquaresSolver,
) -> FitResult {
    let peak = locate_peak(curve, search);
    let floor = min_max(curve.raw.iter()).map_or(0.0, |(lo, _)| lo);
    let height = curve.subtracted[peak] + floor;
    let position = peak as f64;

    let top = min_max(curve.normalized.iter()).map_or(0.0, |(_, hi)| hi);
    if !(top > 0.0) {
        warn!(curve = curve.idx, "Curve has no signal above the image minimum");
        return FitResult::failed();
    }

    let above_half: Vec<usize> = indices_where(curve.normalized, |v| v >= HALF_MAXIMUM * top);
    let fwhm = match (above_half.first(), above_half.last()) {
        (Some(&first), Some(&last)) => ((last - first) as f64).max(1.0),
        _ => 1.0,
    };

    let support = indices_where(curve.normalized, |v| v > SUPPORT_FLOOR * top);
    let xdata: Vec<f64> = support.iter().map(|&i| i as f64).collect();
    let mut ydata: Vec<f64> = support.iter().map(|&i| curve.subtracted[i]).collect();
    if let Some((lo, _)) = min_max(ydata.iter()) {
        ydata.iter_mut().for_each(|y| *y -= lo);
    }

    match solver.fit(&Gaussian, &[height, position, fwhm], &xdata, &ydata) {
        Ok(outcome) => FitResult {
            amplitude: outcome.params[0],
            position: outcome.params[1],
            width: outcome.params[2],
        },
        Err(e) => {
            warn!(curve = curve.idx, error = %e, "Gaussian fit failed");
            FitResult::failed()
        }
    }
}

fn indices_where(values: ArrayView1<'_, f64>, keep: impl Fn(f64) -> bool) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter(|&(_, &v)| keep(v))
        .map(|(i, _)| i)
        .collect()
}
