use crate::data::{fixed_axis, Image};
use crate::error::{OpError, Result};
use crate::pipeline::{array2_value, OpRecord, OperationFamily, OperationKind, Record, ResultMap};
use ndarray::{ArrayView2, Slice};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_BIN_WIDTH: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ManipulationParams {
    pub bin_width: usize,
    /// 0 cuts bands of rows, 1 bands of columns
    pub axis: i64,
    pub mode: String,
}

impl Default for ManipulationParams {
    fn default() -> Self {
        Self {
            bin_width: DEFAULT_BIN_WIDTH,
            axis: 1,
            mode: BinningMode::Strict.as_str().to_string(),
        }
    }
}

/// How a trailing remainder narrower than the bin width is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinningMode {
    /// Drop the remainder.
    Strict,
    /// Keep the remainder as a narrower last bin. Reserved, not implemented.
    Relaxed,
}

impl BinningMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BinningMode::Strict => "strict",
            BinningMode::Relaxed => "relaxed",
        }
    }
}

impl FromStr for BinningMode {
    type Err = OpError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "strict" => Ok(BinningMode::Strict),
            "relaxed" => Ok(BinningMode::Relaxed),
            other => Err(OpError::UnsupportedConfiguration(format!(
                "unknown binning mode '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManipulationOp {
    Slice,
}

impl OperationKind for ManipulationOp {
    fn all() -> &'static [Self] {
        &[ManipulationOp::Slice]
    }

    fn name(self) -> &'static str {
        match self {
            ManipulationOp::Slice => "slice",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ManipulationOutput {
    Slice { slices: Vec<Image> },
}

impl Record for ManipulationOutput {
    fn to_record(&self) -> ResultMap {
        let mut record = ResultMap::new();
        record.insert("op".to_string(), self.op().into());
        match self {
            ManipulationOutput::Slice { slices } => {
                let slices = slices.iter().map(|s| array2_value(s.view())).collect();
                record.insert("slices".to_string(), serde_json::Value::Array(slices));
            }
        }
        record
    }
}

impl OpRecord for ManipulationOutput {
    fn op(&self) -> &'static str {
        match self {
            ManipulationOutput::Slice { .. } => ManipulationOp::Slice.name(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Manipulation;

impl OperationFamily for Manipulation {
    type Kind = ManipulationOp;
    type Params = ManipulationParams;
    type Output = ManipulationOutput;

    fn family_name(&self) -> &'static str {
        "Manipulation"
    }

    fn run(
        &self,
        kind: ManipulationOp,
        image: ArrayView2<'_, f64>,
        params: &ManipulationParams,
    ) -> Result<ManipulationOutput> {
        match kind {
            ManipulationOp::Slice => {
                slice(image, params).map(|slices| ManipulationOutput::Slice { slices })
            }
        }
    }
}

/// Cut the image into contiguous bins of `bin_width` along `axis`.
///
/// Only strict binning exists: `L / bin_width` bins are returned and the
/// last `L % bin_width` lines belong to none of them.
pub fn slice(image: ArrayView2<'_, f64>, params: &ManipulationParams) -> Result<Vec<Image>> {
    let axis = fixed_axis(params.axis)?;
    match params.mode.parse::<BinningMode>()? {
        BinningMode::Strict => {}
        BinningMode::Relaxed => {
            return Err(OpError::UnsupportedConfiguration(
                "binning mode 'relaxed' is reserved but not implemented".to_string(),
            ))
        }
    }
    if params.bin_width == 0 {
        return Err(OpError::InvalidParameter("binWidth must be positive".to_string()));
    }

    let lim = image.len_of(axis);
    let n_bins = lim / params.bin_width;
    if lim % params.bin_width != 0 {
        tracing::debug!(
            dropped = lim % params.bin_width,
            axis = axis.index(),
            "Strict binning drops trailing lines"
        );
    }

    Ok((0..n_bins)
        .map(|idx| {
            let lower = idx * params.bin_width;
            let upper = lower + params.bin_width;
            image
                .slice_axis(axis, Slice::from(lower..upper))
                .to_owned()
        })
        .collect())
}
