//! Curve alignment
//!
//! Four ways of estimating, for every curve of an image, its shift
//! relative to a reference curve `idx0`. All of them return one shift
//! per curve, with the reference's own shift at zero.

pub mod center_of_mass;
pub mod fft_alignment;
pub mod fit_alignment;
pub mod max_alignment;
mod window;

pub use center_of_mass::center_of_mass_alignment;
pub use fft_alignment::{fft_alignment, CentroidWeighting};
pub use fit_alignment::{fit_alignment, FitCollaborators, PEAK_SEARCH_YSCALING};
pub use max_alignment::max_alignment;

use crate::data::scale_step;
use crate::error::{OpError, Result};
use crate::fitting::{
    BackgroundEstimator, LeastSquaresSolver, LevenbergMarquardt, LocalMaximaSearch, PeakSearch,
    Snip,
};
use crate::pipeline::{slice_value, OpRecord, OperationFamily, OperationKind, Record, ResultMap};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlignmentParams {
    /// Reference curve
    pub idx0: usize,
    /// -1, 0 or 1; -1 stacks curves along the shorter image axis
    pub axis: i64,
    /// Threshold of the centroid window, as a fraction of the peak
    pub portion: f64,
    /// Sample coordinates. Max and center-of-mass shifts are multiplied by
    /// their mean step when given.
    pub scale: Option<Vec<f64>>,
    pub snip_width: Option<usize>,
    pub peak_search: bool,
    pub centroid_weighting: CentroidWeighting,
}

impl Default for AlignmentParams {
    fn default() -> Self {
        Self {
            idx0: 0,
            axis: -1,
            portion: 0.8,
            scale: None,
            snip_width: None,
            peak_search: false,
            centroid_weighting: CentroidWeighting::Window,
        }
    }
}

pub(crate) fn validate_portion(portion: f64) -> Result<()> {
    if (0.0..1.0).contains(&portion) {
        Ok(())
    } else {
        Err(OpError::InvalidParameter(format!(
            "portion must be in [0, 1), got {}",
            portion
        )))
    }
}

pub(crate) fn apply_scale(shifts: Vec<f64>, scale: Option<&[f64]>) -> Result<Vec<f64>> {
    match scale {
        Some(scale) => {
            let step = scale_step(scale)?;
            Ok(shifts.into_iter().map(|s| s * step).collect())
        }
        None => Ok(shifts),
    }
}

/// Gaussian fit of one curve. All fields are `NaN` when the fit failed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub amplitude: f64,
    pub position: f64,
    pub width: f64,
}

impl FitResult {
    pub fn failed() -> Self {
        Self {
            amplitude: f64::NAN,
            position: f64::NAN,
            width: f64::NAN,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.position.is_nan()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentOp {
    Max,
    Fft,
    CenterOfMass,
    Fit,
}

impl OperationKind for AlignmentOp {
    fn all() -> &'static [Self] {
        &[
            AlignmentOp::Max,
            AlignmentOp::Fft,
            AlignmentOp::CenterOfMass,
            AlignmentOp::Fit,
        ]
    }

    fn name(self) -> &'static str {
        match self {
            AlignmentOp::Max => "maxAlignment",
            AlignmentOp::Fft => "fftAlignment",
            AlignmentOp::CenterOfMass => "centerOfMassAlignment",
            AlignmentOp::Fit => "fitAlignment",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlignmentOutput {
    Max { shift_list: Vec<f64> },
    Fft { shift_list: Vec<f64> },
    CenterOfMass { shift_list: Vec<f64> },
    Fit { shift_list: Vec<f64>, fits: Vec<FitResult> },
}

impl AlignmentOutput {
    pub fn shift_list(&self) -> &[f64] {
        match self {
            AlignmentOutput::Max { shift_list }
            | AlignmentOutput::Fft { shift_list }
            | AlignmentOutput::CenterOfMass { shift_list }
            | AlignmentOutput::Fit { shift_list, .. } => shift_list,
        }
    }
}

impl Record for AlignmentOutput {
    fn to_record(&self) -> ResultMap {
        let mut record = ResultMap::new();
        record.insert("op".to_string(), self.op().into());
        record.insert("shiftList".to_string(), slice_value(self.shift_list()));
        if let AlignmentOutput::Fit { fits, .. } = self {
            let fits = fits
                .iter()
                .map(|fit| {
                    let mut entry = ResultMap::new();
                    entry.insert("amplitude".to_string(), fit.amplitude.into());
                    entry.insert("position".to_string(), fit.position.into());
                    entry.insert("width".to_string(), fit.width.into());
                    Value::Object(entry)
                })
                .collect();
            record.insert("fits".to_string(), Value::Array(fits));
        }
        record
    }
}

impl OpRecord for AlignmentOutput {
    fn op(&self) -> &'static str {
        match self {
            AlignmentOutput::Max { .. } => AlignmentOp::Max.name(),
            AlignmentOutput::Fft { .. } => AlignmentOp::Fft.name(),
            AlignmentOutput::CenterOfMass { .. } => AlignmentOp::CenterOfMass.name(),
            AlignmentOutput::Fit { .. } => AlignmentOp::Fit.name(),
        }
    }
}

/// The alignment family, carrying the numerical collaborators used by
/// `fitAlignment`.
pub struct Alignment {
    background: Box<dyn BackgroundEstimator>,
    peak_search: Box<dyn PeakSearch>,
    solver: Box<dyn LeastSquaresSolver>,
}

impl Default for Alignment {
    fn default() -> Self {
        Self {
            background: Box::new(Snip),
            peak_search: Box::new(LocalMaximaSearch::default()),
            solver: Box::new(LevenbergMarquardt::default()),
        }
    }
}

impl Alignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_background<B: BackgroundEstimator + 'static>(mut self, background: B) -> Self {
        self.background = Box::new(background);
        self
    }

    pub fn with_peak_search<P: PeakSearch + 'static>(mut self, peak_search: P) -> Self {
        self.peak_search = Box::new(peak_search);
        self
    }

    pub fn with_solver<S: LeastSquaresSolver + 'static>(mut self, solver: S) -> Self {
        self.solver = Box::new(solver);
        self
    }
}

impl OperationFamily for Alignment {
    type Kind = AlignmentOp;
    type Params = AlignmentParams;
    type Output = AlignmentOutput;

    fn family_name(&self) -> &'static str {
        "Alignment"
    }

    fn run(
        &self,
        kind: AlignmentOp,
        image: ArrayView2<'_, f64>,
        params: &AlignmentParams,
    ) -> Result<AlignmentOutput> {
        match kind {
            AlignmentOp::Max => {
                max_alignment(image, params).map(|shift_list| AlignmentOutput::Max { shift_list })
            }
            AlignmentOp::Fft => {
                fft_alignment(image, params).map(|shift_list| AlignmentOutput::Fft { shift_list })
            }
            AlignmentOp::CenterOfMass => center_of_mass_alignment(image, params)
                .map(|shift_list| AlignmentOutput::CenterOfMass { shift_list }),
            AlignmentOp::Fit => {
                let collaborators = FitCollaborators {
                    background: &*self.background,
                    peak_search: &*self.peak_search,
                    solver: &*self.solver,
                };
                fit_alignment(image, params, &collaborators)
                    .map(|(shift_list, fits)| AlignmentOutput::Fit { shift_list, fits })
            }
        }
    }
}
