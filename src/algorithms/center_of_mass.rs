use super::window::{normalize_curve, peak_centroid};
use super::{apply_scale, validate_portion, AlignmentParams};
use crate::data::Curves;
use crate::error::{OpError, Result};
use ndarray::ArrayView2;
use tracing::debug;

/// Shift of every curve's peak centroid relative to the reference centroid.
///
/// Each curve is normalized to `[0, 1]`, and the centroid is taken over
/// the window around its maximum where the curve exceeds `portion`.
/// Curves without dynamic range get a `NaN` shift.
pub fn center_of_mass_alignment(
    image: ArrayView2<'_, f64>,
    params: &AlignmentParams,
) -> Result<Vec<f64>> {
    validate_portion(params.portion)?;
    let curves = Curves::decompose(image, params.axis)?;
    let reference = curves.reference(params.idx0)?;
    let normed0 =
        normalize_curve(reference).ok_or(OpError::DegenerateCurve { idx0: params.idx0 })?;
    let pos0 = peak_centroid(normed0.view(), params.portion, params.idx0)?;

    let mut shifts = vec![f64::NAN; curves.n_curves()];
    for (idx, curve) in curves.iter().enumerate() {
        let Some(normed) = normalize_curve(curve) else {
            debug!(curve = idx, "Constant curve, no centroid");
            continue;
        };
        shifts[idx] = pos0 - peak_centroid(normed.view(), params.portion, idx)?;
    }
    apply_scale(shifts, params.scale.as_deref())
}
