use ndarray::{array, Array2, Axis};
use rixs_ops::operations::{
    axis_sum, band_pass, slice, slice_and_sum, zero_to_one, FilterParams, IntegrationParams,
    ManipulationParams,
};
use rixs_ops::OpError;

fn ramp(rows: usize, cols: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows, cols), |(r, c)| (r * cols + c) as f64)
}

#[test]
fn test_band_pass_scenario() {
    let image = array![[0.0, 5.0, 10.0], [15.0, 20.0, 25.0]];
    let params = FilterParams {
        low: Some(5.0),
        high: Some(20.0),
        offset: None,
    };
    let filtered = band_pass(image.view(), &params).unwrap();
    assert_eq!(filtered, array![[0.0, 5.0, 10.0], [15.0, 20.0, 0.0]]);
}

#[test]
fn test_band_pass_defaults_keep_image() {
    let image = array![[3.0, -1.0], [7.5, 2.0]];
    let filtered = band_pass(image.view(), &FilterParams::default()).unwrap();
    assert_eq!(filtered, image);
}

#[test]
fn test_band_pass_offset_zeroes_low_pixels() {
    let image = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
    let params = FilterParams {
        low: None,
        high: Some(5.0),
        offset: Some(2.0),
    };
    let filtered = band_pass(image.view(), &params).unwrap();
    assert_eq!(filtered, array![[0.0, 0.0, 3.0], [4.0, 5.0, 1.0]]);
}

#[test]
fn test_zero_to_one_scenario() {
    let normalized = zero_to_one(array![[0.0, 2.0], [4.0, 6.0]].view()).unwrap();
    let expected = array![[0.0, 1.0 / 3.0], [2.0 / 3.0, 1.0]];
    for (a, b) in normalized.iter().zip(expected.iter()) {
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn test_zero_to_one_constant_and_range() {
    let constant = zero_to_one(Array2::from_elem((3, 4), 9.0).view()).unwrap();
    assert_eq!(constant, Array2::<f64>::zeros((3, 4)));

    let normalized = zero_to_one(ramp(5, 7).view()).unwrap();
    assert!(normalized.iter().all(|&v| (0.0..=1.0).contains(&v)));
}

#[test]
fn test_empty_image_is_rejected() {
    let empty = Array2::<f64>::zeros((0, 4));
    assert_eq!(zero_to_one(empty.view()), Err(OpError::EmptyImage));
    assert_eq!(band_pass(empty.view(), &FilterParams::default()), Err(OpError::EmptyImage));
}

#[test]
fn test_strict_slice_drops_remainder() {
    let image = ramp(5, 19);
    let params = ManipulationParams {
        bin_width: 4,
        ..ManipulationParams::default()
    };
    let slices = slice(image.view(), &params).unwrap();
    assert_eq!(slices.len(), 4);
    for (idx, bin) in slices.iter().enumerate() {
        assert_eq!(bin.dim(), (5, 4));
        assert_eq!(bin[[0, 0]], (idx * 4) as f64);
    }
    // Columns 16..19 belong to no slice
    assert!(slices.iter().all(|bin| bin.iter().all(|&v| (v as usize) % 19 < 16)));
}

#[test]
fn test_slice_along_rows() {
    let image = ramp(10, 3);
    let params = ManipulationParams {
        bin_width: 3,
        axis: 0,
        ..ManipulationParams::default()
    };
    let slices = slice(image.view(), &params).unwrap();
    assert_eq!(slices.len(), 3);
    assert_eq!(slices[2], image.slice(ndarray::s![6..9, ..]).to_owned());
}

#[test]
fn test_slice_rejects_unsupported_settings() {
    let image = ramp(4, 8);
    let relaxed = ManipulationParams {
        mode: "relaxed".to_string(),
        ..ManipulationParams::default()
    };
    assert!(matches!(
        slice(image.view(), &relaxed),
        Err(OpError::UnsupportedConfiguration(_))
    ));

    let unknown = ManipulationParams {
        mode: "loose".to_string(),
        ..ManipulationParams::default()
    };
    assert!(matches!(
        slice(image.view(), &unknown),
        Err(OpError::UnsupportedConfiguration(_))
    ));

    let zero_width = ManipulationParams {
        bin_width: 0,
        ..ManipulationParams::default()
    };
    assert!(matches!(slice(image.view(), &zero_width), Err(OpError::InvalidParameter(_))));

    let auto_axis = ManipulationParams {
        axis: -1,
        ..ManipulationParams::default()
    };
    assert_eq!(slice(image.view(), &auto_axis), Err(OpError::InvalidAxis(-1)));
}

#[test]
fn test_axis_sum_resolves_shorter_dimension() {
    let wide = ramp(2, 3);
    assert_eq!(axis_sum(wide.view(), -1).unwrap(), array![3.0, 5.0, 7.0]);

    let tall = ramp(3, 2);
    assert_eq!(axis_sum(tall.view(), -1).unwrap(), array![1.0, 5.0, 9.0]);

    assert_eq!(axis_sum(wide.view(), 1).unwrap(), wide.sum_axis(Axis(1)));
    assert_eq!(axis_sum(wide.view(), 3), Err(OpError::InvalidAxis(3)));
}

#[test]
fn test_slice_and_sum() {
    let image = ramp(4, 17);
    let params = IntegrationParams::default();
    let sums = slice_and_sum(image.view(), &params).unwrap();
    assert_eq!(sums.len(), 2);
    for (idx, sum) in sums.iter().enumerate() {
        assert_eq!(sum.len(), 4);
        let lower = idx * 8;
        let expected: f64 = (lower..lower + 8).map(|c| c as f64).sum();
        assert_eq!(sum[0], expected);
    }
}
