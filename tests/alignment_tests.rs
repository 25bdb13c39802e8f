use ndarray::{array, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rixs_ops::algorithms::{
    center_of_mass_alignment, fft_alignment, max_alignment, Alignment, AlignmentOp, AlignmentOutput,
    AlignmentParams, CentroidWeighting,
};
use rixs_ops::fitting::{
    FitError, FitModel, FitOutcome, LeastSquaresSolver, PeakSearch, PeakSearchError,
};
use rixs_ops::pipeline::{OperationFamily, OperationKind};
use rixs_ops::OpError;

/// One Gaussian peak per row on top of a linear baseline.
fn gaussian_rows(centers: &[f64], n_points: usize, sigma: f64, slope: f64) -> Array2<f64> {
    Array2::from_shape_fn((centers.len(), n_points), |(row, col)| {
        let x = col as f64;
        let d = (x - centers[row]) / sigma;
        100.0 * (-0.5 * d * d).exp() + 5.0 + slope * x
    })
}

fn rows_params() -> AlignmentParams {
    AlignmentParams {
        axis: 0,
        ..AlignmentParams::default()
    }
}

#[test]
fn test_max_alignment_scenario() {
    let image = array![
        [0.0, 0.0, 0.0, 1.0, 2.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 2.0, 1.0, 0.0, 0.0, 0.0]
    ];
    let shifts = max_alignment(image.view(), &rows_params()).unwrap();
    assert_eq!(shifts, vec![0.0, 1.0]);
}

#[test]
fn test_every_method_keeps_reference_at_zero() {
    let image = gaussian_rows(&[30.0, 32.0, 27.5, 31.0, 29.0], 64, 3.0, 0.0);
    let family = Alignment::default();
    let params = AlignmentParams {
        idx0: 2,
        ..AlignmentParams::default()
    };

    for &kind in AlignmentOp::all() {
        let output = family.run(kind, image.view(), &params).unwrap();
        let shifts = output.shift_list();
        assert_eq!(shifts.len(), 5, "{}", kind.name());
        assert_eq!(shifts[2], 0.0, "{} reference shift", kind.name());
    }
}

#[test]
fn test_auto_axis_takes_columns_of_tall_images() {
    let image = gaussian_rows(&[30.0, 33.0, 28.0], 64, 3.0, 0.0);
    let tall = image.t().to_owned();
    let shifts = max_alignment(tall.view(), &AlignmentParams::default()).unwrap();
    assert_eq!(shifts, vec![0.0, -3.0, 2.0]);
}

#[test]
fn test_center_of_mass_recovers_half_sample_shifts() {
    let image = gaussian_rows(&[30.0, 31.5, 27.0], 64, 3.0, 0.0);
    let shifts = center_of_mass_alignment(image.view(), &rows_params()).unwrap();
    let expected = [0.0, -1.5, 3.0];
    for (s, e) in shifts.iter().zip(expected) {
        assert!((s - e).abs() < 1e-9, "got {}, expected {}", s, e);
    }
}

#[test]
fn test_center_of_mass_identical_curves_do_not_shift() {
    let image = gaussian_rows(&[22.3, 22.3, 22.3, 22.3], 48, 2.5, 0.2);
    let shifts = center_of_mass_alignment(image.view(), &rows_params()).unwrap();
    assert!(shifts.iter().all(|&s| s == 0.0));
}

#[test]
fn test_center_of_mass_scale_multiplies_shifts() {
    let image = gaussian_rows(&[30.0, 31.5, 27.0], 64, 3.0, 0.0);
    let params = AlignmentParams {
        scale: Some((0..64).map(|i| 100.0 + 0.25 * i as f64).collect()),
        ..rows_params()
    };
    let shifts = center_of_mass_alignment(image.view(), &params).unwrap();
    assert!((shifts[1] + 0.375).abs() < 1e-9);
    assert!((shifts[2] - 0.75).abs() < 1e-9);
}

#[test]
fn test_degenerate_reference_is_fatal() {
    let image = array![[2.0, 2.0, 2.0, 2.0], [0.0, 1.0, 0.0, 0.0]];
    let err = center_of_mass_alignment(image.view(), &rows_params()).unwrap_err();
    assert_eq!(err, OpError::DegenerateCurve { idx0: 0 });
}

#[test]
fn test_degenerate_curve_is_skipped() {
    let image = array![[0.0, 1.0, 4.0, 1.0, 0.0], [3.0, 3.0, 3.0, 3.0, 3.0]];
    let shifts = center_of_mass_alignment(image.view(), &rows_params()).unwrap();
    assert_eq!(shifts[0], 0.0);
    assert!(shifts[1].is_nan());
}

#[test]
fn test_window_leaving_the_curve_is_fatal() {
    let image = array![[1.0, 0.9, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]];
    let err = center_of_mass_alignment(image.view(), &rows_params()).unwrap_err();
    assert!(matches!(err, OpError::WindowOutOfBounds { curve: 0, left: -1, .. }));
}

#[test]
fn test_invalid_axis_and_reference() {
    let image = gaussian_rows(&[10.0, 11.0], 24, 2.0, 0.0);
    let bad_axis = AlignmentParams {
        axis: 2,
        ..AlignmentParams::default()
    };
    assert_eq!(max_alignment(image.view(), &bad_axis), Err(OpError::InvalidAxis(2)));

    let bad_reference = AlignmentParams {
        idx0: 5,
        ..rows_params()
    };
    assert_eq!(
        fft_alignment(image.view(), &bad_reference),
        Err(OpError::ReferenceOutOfRange { idx0: 5, n_curves: 2 })
    );
}

#[test]
fn test_fft_alignment_matches_peak_offsets() {
    let image = gaussian_rows(&[30.0, 34.0, 26.5, 31.5], 64, 3.0, 0.0);
    let shifts = fft_alignment(image.view(), &rows_params()).unwrap();
    let expected = [0.0, -4.0, 3.5, -1.5];
    for (s, e) in shifts.iter().zip(expected) {
        assert!((s - e).abs() < 1e-6, "got {}, expected {}", s, e);
    }
}

#[test]
fn test_fft_alignment_odd_length_reference_is_exactly_zero() {
    let image = gaussian_rows(&[30.0, 33.0, 27.0], 63, 3.0, 0.0);
    let params = AlignmentParams {
        idx0: 1,
        ..rows_params()
    };
    let shifts = fft_alignment(image.view(), &params).unwrap();
    assert_eq!(shifts[1], 0.0);
    assert!((shifts[0] - 3.0).abs() < 1e-6, "got {}", shifts[0]);
    assert!((shifts[2] - 6.0).abs() < 1e-6, "got {}", shifts[2]);
}

// The index-weighted formula ignores where the correlation peaks: every
// curve i reports i - n/2, the reference included.
#[test]
fn test_fft_curve_index_weighting_reports_curve_index() {
    let image = gaussian_rows(&[30.0, 34.0, 26.0, 31.0], 64, 3.0, 0.0);
    let params = AlignmentParams {
        centroid_weighting: CentroidWeighting::CurveIndex,
        ..rows_params()
    };
    let shifts = fft_alignment(image.view(), &params).unwrap();
    for (idx, s) in shifts.iter().enumerate() {
        assert!((s - (idx as f64 - 32.0)).abs() < 1e-9);
    }
}

#[test]
fn test_fit_alignment_on_noisy_sloped_curves() {
    let centers = [40.0, 43.5, 37.2, 41.0];
    let mut image = gaussian_rows(&centers, 100, 3.0, 0.1);
    let mut rng = StdRng::seed_from_u64(7);
    let noise = Normal::new(0.0, 0.3).unwrap();
    image.mapv_inplace(|v| v + noise.sample(&mut rng));

    let params = AlignmentParams {
        peak_search: true,
        ..rows_params()
    };
    let output = Alignment::default().run(AlignmentOp::Fit, image.view(), &params).unwrap();
    let AlignmentOutput::Fit { shift_list, fits } = output else {
        panic!("expected a fit output");
    };
    assert_eq!(fits.len(), 4);
    for (idx, fit) in fits.iter().enumerate() {
        assert!(!fit.is_failed());
        assert!((fit.position - centers[idx]).abs() < 0.2, "curve {} at {}", idx, fit.position);
        assert!((shift_list[idx] - (centers[0] - centers[idx])).abs() < 0.2);
    }
    assert_eq!(shift_list[0], 0.0);
}

#[test]
fn test_fit_alignment_flat_curve_degrades_to_nan() {
    let mut image = gaussian_rows(&[20.0, 22.0, 0.0], 50, 2.5, 0.0);
    image.row_mut(2).fill(5.0);
    let params = AlignmentParams {
        peak_search: true,
        ..rows_params()
    };

    let output = Alignment::default().run(AlignmentOp::Fit, image.view(), &params).unwrap();
    let AlignmentOutput::Fit { shift_list, fits } = output else {
        panic!("expected a fit output");
    };
    assert!(fits[2].is_failed());
    assert!(fits[2].amplitude.is_nan() && fits[2].width.is_nan());
    assert!(shift_list[2].is_nan());
    assert!((shift_list[1] + 2.0).abs() < 0.2);
}

struct AlwaysSingular;

impl LeastSquaresSolver for AlwaysSingular {
    fn fit(
        &self,
        _: &dyn FitModel,
        _: &[f64],
        _: &[f64],
        _: &[f64],
    ) -> Result<FitOutcome, FitError> {
        Err(FitError::Singular)
    }
}

#[test]
fn test_injected_solver_failures_never_abort() {
    let image = gaussian_rows(&[20.0, 22.0], 50, 2.5, 0.0);
    let family = Alignment::default().with_solver(AlwaysSingular);
    let output = family.run(AlignmentOp::Fit, image.view(), &rows_params()).unwrap();
    assert_eq!(output.shift_list().len(), 2);
    assert!(output.shift_list().iter().all(|s| s.is_nan()));
}

struct BrokenSearch;

impl PeakSearch for BrokenSearch {
    fn seek(&self, _: ArrayView1<'_, f64>, _: f64) -> Result<Vec<usize>, PeakSearchError> {
        Err(PeakSearchError::Failed("detector map unavailable".to_string()))
    }
}

struct EmptySearch;

impl PeakSearch for EmptySearch {
    fn seek(&self, _: ArrayView1<'_, f64>, _: f64) -> Result<Vec<usize>, PeakSearchError> {
        Err(PeakSearchError::NoPeaks)
    }
}

fn assert_fits_from_curve_maximum(family: Alignment) {
    let centers = [30.0, 32.0, 34.0];
    let image = gaussian_rows(&centers, 64, 3.0, 0.0);
    let params = AlignmentParams {
        peak_search: true,
        ..rows_params()
    };
    let output = family.run(AlignmentOp::Fit, image.view(), &params).unwrap();
    let AlignmentOutput::Fit { shift_list, fits } = output else {
        panic!("expected a fit output");
    };

    for (idx, fit) in fits.iter().enumerate() {
        assert!(fit.position.is_finite(), "curve {} not fitted", idx);
        assert!((fit.position - centers[idx]).abs() < 0.05, "curve {} at {}", idx, fit.position);
    }
    assert_eq!(shift_list[0], 0.0);
    for (s, e) in shift_list.iter().zip([0.0, -2.0, -4.0]) {
        assert!((s - e).abs() < 0.05, "got {}, expected {}", s, e);
    }
}

#[test]
fn test_failed_peak_search_falls_back_to_curve_maximum() {
    assert_fits_from_curve_maximum(Alignment::default().with_peak_search(BrokenSearch));
}

#[test]
fn test_empty_peak_search_falls_back_to_curve_maximum() {
    assert_fits_from_curve_maximum(Alignment::default().with_peak_search(EmptySearch));
}
