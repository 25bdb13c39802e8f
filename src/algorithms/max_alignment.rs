use super::{apply_scale, AlignmentParams};
use crate::data::{argmax, Curves};
use crate::error::{OpError, Result};
use ndarray::ArrayView2;

/// Shift of every curve's maximum relative to the reference maximum.
pub fn max_alignment(image: ArrayView2<'_, f64>, params: &AlignmentParams) -> Result<Vec<f64>> {
    let curves = Curves::decompose(image, params.axis)?;
    let reference = curves.reference(params.idx0)?;
    let pos0 = argmax(&reference).ok_or(OpError::EmptyImage)? as f64;

    let mut shifts = Vec::with_capacity(curves.n_curves());
    for curve in curves.iter() {
        let pos = argmax(&curve).ok_or(OpError::EmptyImage)? as f64;
        shifts.push(pos0 - pos);
    }
    apply_scale(shifts, params.scale.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_ties_resolve_to_first_maximum() {
        let image = array![[0.0, 3.0, 3.0, 0.0], [3.0, 0.0, 0.0, 3.0]];
        let params = AlignmentParams {
            axis: 0,
            ..AlignmentParams::default()
        };
        assert_eq!(max_alignment(image.view(), &params).unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_scale_multiplies_by_mean_step() {
        let image = array![[0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 0.0, 1.0]];
        let params = AlignmentParams {
            axis: 0,
            scale: Some(vec![10.0, 10.5, 11.0, 11.5]),
            ..AlignmentParams::default()
        };
        assert_eq!(max_alignment(image.view(), &params).unwrap(), vec![0.0, -1.0]);
    }
}
