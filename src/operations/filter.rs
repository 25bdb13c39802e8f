use crate::data::{min_max, Image};
use crate::error::{OpError, Result};
use crate::pipeline::{array2_value, OpRecord, OperationFamily, OperationKind, Record, ResultMap};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

/// Parameters of the band-pass filter. Unset bounds default to the
/// image's own minimum and maximum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterParams {
    pub low: Option<f64>,
    pub high: Option<f64>,
    /// Pixels not strictly above the offset are zeroed.
    pub offset: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    BandPass,
}

impl OperationKind for FilterOp {
    fn all() -> &'static [Self] {
        &[FilterOp::BandPass]
    }

    fn name(self) -> &'static str {
        match self {
            FilterOp::BandPass => "bandpass",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutput {
    BandPass { image: Image },
}

impl Record for FilterOutput {
    fn to_record(&self) -> ResultMap {
        let mut record = ResultMap::new();
        record.insert("op".to_string(), self.op().into());
        match self {
            FilterOutput::BandPass { image } => {
                record.insert("image".to_string(), array2_value(image.view()));
            }
        }
        record
    }
}

impl OpRecord for FilterOutput {
    fn op(&self) -> &'static str {
        match self {
            FilterOutput::BandPass { .. } => FilterOp::BandPass.name(),
        }
    }
}

/// Intensity filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Filter;

impl OperationFamily for Filter {
    type Kind = FilterOp;
    type Params = FilterParams;
    type Output = FilterOutput;

    fn family_name(&self) -> &'static str {
        "Filter"
    }

    fn run(
        &self,
        kind: FilterOp,
        image: ArrayView2<'_, f64>,
        params: &FilterParams,
    ) -> Result<FilterOutput> {
        match kind {
            FilterOp::BandPass => {
                band_pass(image, params).map(|image| FilterOutput::BandPass { image })
            }
        }
    }
}

/// Replace pixels outside `[low, high]` by the image minimum.
///
/// With an `offset`, every pixel that is not strictly greater than it is
/// set to zero on top of that.
pub fn band_pass(image: ArrayView2<'_, f64>, params: &FilterParams) -> Result<Image> {
    let (im_min, im_max) = min_max(image.iter()).ok_or(OpError::EmptyImage)?;
    let low = params.low.unwrap_or(im_min);
    let high = params.high.unwrap_or(im_max);
    let offset = params.offset;

    Ok(image.mapv(|pixel| {
        let mut out = if low <= pixel { pixel } else { im_min };
        if !(pixel <= high) {
            out = im_min;
        }
        match offset {
            Some(offset) if !(pixel > offset) => 0.0,
            _ => out,
        }
    }))
}
