use crate::data::{min_max, Image};
use crate::error::{OpError, Result};
use crate::pipeline::{array2_value, OpRecord, OperationFamily, OperationKind, Record, ResultMap};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

/// `zeroToOne` takes no parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParams {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationOp {
    ZeroToOne,
}

impl OperationKind for NormalizationOp {
    fn all() -> &'static [Self] {
        &[NormalizationOp::ZeroToOne]
    }

    fn name(self) -> &'static str {
        match self {
            NormalizationOp::ZeroToOne => "zeroToOne",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NormalizationOutput {
    ZeroToOne { image: Image },
}

impl Record for NormalizationOutput {
    fn to_record(&self) -> ResultMap {
        let mut record = ResultMap::new();
        record.insert("op".to_string(), self.op().into());
        match self {
            NormalizationOutput::ZeroToOne { image } => {
                record.insert("image".to_string(), array2_value(image.view()));
            }
        }
        record
    }
}

impl OpRecord for NormalizationOutput {
    fn op(&self) -> &'static str {
        match self {
            NormalizationOutput::ZeroToOne { .. } => NormalizationOp::ZeroToOne.name(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Normalization;

impl OperationFamily for Normalization {
    type Kind = NormalizationOp;
    type Params = NormalizationParams;
    type Output = NormalizationOutput;

    fn family_name(&self) -> &'static str {
        "Normalization"
    }

    fn run(
        &self,
        kind: NormalizationOp,
        image: ArrayView2<'_, f64>,
        _params: &NormalizationParams,
    ) -> Result<NormalizationOutput> {
        match kind {
            NormalizationOp::ZeroToOne => {
                zero_to_one(image).map(|image| NormalizationOutput::ZeroToOne { image })
            }
        }
    }
}

/// Rescale to `[0, 1]`. A constant image maps to all zeros.
pub fn zero_to_one(image: ArrayView2<'_, f64>) -> Result<Image> {
    let (offset, maximum) = min_max(image.iter()).ok_or(OpError::EmptyImage)?;
    let norm_factor = maximum - offset;

    tracing::trace!(min = offset, max = maximum, "zeroToOne");
    if norm_factor == 0.0 {
        return Ok(Image::zeros(image.raw_dim()));
    }
    Ok(image.mapv(|v| (v - offset) / norm_factor))
}
