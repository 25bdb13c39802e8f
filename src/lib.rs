//! Processing kernels for 2-D RIXS detector images.
//!
//! Images are stacks of spectra. The crate offers band-pass filtering,
//! normalization, slicing, integration, curve alignment and intensity
//! statistics, each grouped into an [`pipeline::OperationFamily`] and
//! invoked through a [`pipeline::Dispatcher`] bound to one owner.

pub mod algorithms;
pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod fitting;
pub mod logging;
pub mod operations;
pub mod pipeline;

pub use algorithms::{
    Alignment, AlignmentOp, AlignmentOutput, AlignmentParams, CentroidWeighting, FitResult,
};
pub use analysis::{BasicStats, Histogram, Stats2D, StatsCache, StatsOp, StatsOutput, StatsParams};
pub use data::{image_from_rows, Curves, Image};
pub use error::{OpError, Result};
pub use operations::{
    Filter, FilterOp, FilterOutput, FilterParams, Integration, IntegrationOp, IntegrationOutput,
    IntegrationParams, Manipulation, ManipulationOp, ManipulationOutput, ManipulationParams,
    Normalization, NormalizationOp, NormalizationOutput, NormalizationParams,
};
pub use pipeline::{
    Combined, Dispatch, Dispatcher, OperationFamily, OperationKind, OwnerToken, Record,
};
