use super::manipulation::{slice, ManipulationParams, DEFAULT_BIN_WIDTH};
use crate::data::{fixed_axis, AxisSelector};
use crate::error::Result;
use crate::pipeline::{array1_value, OpRecord, OperationFamily, OperationKind, Record, ResultMap};
use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IntegrationParams {
    /// `axisSum`: axis to sum away, -1 picks it from the image shape
    pub axis: i64,
    /// `sliceAndSum`: axis each slice is summed along
    pub sum_axis: i64,
    /// `sliceAndSum`: axis the image is cut along
    pub slice_axis: i64,
    pub bin_width: usize,
    pub mode: String,
}

impl Default for IntegrationParams {
    fn default() -> Self {
        Self {
            axis: -1,
            sum_axis: 1,
            slice_axis: 1,
            bin_width: DEFAULT_BIN_WIDTH,
            mode: "strict".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationOp {
    AxisSum,
    SliceAndSum,
}

impl OperationKind for IntegrationOp {
    fn all() -> &'static [Self] {
        &[IntegrationOp::AxisSum, IntegrationOp::SliceAndSum]
    }

    fn name(self) -> &'static str {
        match self {
            IntegrationOp::AxisSum => "axisSum",
            IntegrationOp::SliceAndSum => "sliceAndSum",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IntegrationOutput {
    AxisSum { sum: Array1<f64> },
    SliceAndSum { summed_slices: Vec<Array1<f64>> },
}

impl Record for IntegrationOutput {
    fn to_record(&self) -> ResultMap {
        let mut record = ResultMap::new();
        record.insert("op".to_string(), self.op().into());
        match self {
            IntegrationOutput::AxisSum { sum } => {
                record.insert("sum".to_string(), array1_value(sum.view()));
            }
            IntegrationOutput::SliceAndSum { summed_slices } => {
                let sums = summed_slices.iter().map(|s| array1_value(s.view())).collect();
                record.insert("summedSlices".to_string(), Value::Array(sums));
            }
        }
        record
    }
}

impl OpRecord for IntegrationOutput {
    fn op(&self) -> &'static str {
        match self {
            IntegrationOutput::AxisSum { .. } => IntegrationOp::AxisSum.name(),
            IntegrationOutput::SliceAndSum { .. } => IntegrationOp::SliceAndSum.name(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Integration;

impl OperationFamily for Integration {
    type Kind = IntegrationOp;
    type Params = IntegrationParams;
    type Output = IntegrationOutput;

    fn family_name(&self) -> &'static str {
        "Integration"
    }

    fn run(
        &self,
        kind: IntegrationOp,
        image: ArrayView2<'_, f64>,
        params: &IntegrationParams,
    ) -> Result<IntegrationOutput> {
        match kind {
            IntegrationOp::AxisSum => {
                axis_sum(image, params.axis).map(|sum| IntegrationOutput::AxisSum { sum })
            }
            IntegrationOp::SliceAndSum => slice_and_sum(image, params)
                .map(|summed_slices| IntegrationOutput::SliceAndSum { summed_slices }),
        }
    }
}

/// Sum along `axis`. With -1 the axis is 0 when the image has fewer rows
/// than columns, otherwise 1.
pub fn axis_sum(image: ArrayView2<'_, f64>, axis: i64) -> Result<Array1<f64>> {
    let axis = AxisSelector::try_from(axis)?.resolve_shorter(&image);
    Ok(image.sum_axis(axis))
}

/// Cut the image into `binWidth` slices along `sliceAxis`, then sum
/// every slice along `sumAxis`.
pub fn slice_and_sum(
    image: ArrayView2<'_, f64>,
    params: &IntegrationParams,
) -> Result<Vec<Array1<f64>>> {
    let sum_axis = fixed_axis(params.sum_axis)?;
    let slices = slice(
        image,
        &ManipulationParams {
            bin_width: params.bin_width,
            axis: params.slice_axis,
            mode: params.mode.clone(),
        },
    )?;
    Ok(slices.iter().map(|s| s.sum_axis(sum_axis)).collect())
}
