//! Error types shared by every operation family.
//!
//! Fatal conditions abort a single operation call and surface as an
//! [`OpError`]. Per-curve conditions that only degrade a result (fit
//! failures, failed peak searches) live next to the collaborators that
//! raise them, see [`crate::fitting`].

use thiserror::Error;

/// Fatal failure of one operation call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OpError {
    #[error("axis must be either -1, 0 or 1, got {0}")]
    InvalidAxis(i64),

    #[error("reference curve {idx0} has zero dynamic range")]
    DegenerateCurve { idx0: usize },

    #[error(
        "threshold window of curve {curve} leaves the curve \
         (left: {left}, right: {right}, points: {n_points})"
    )]
    WindowOutOfBounds {
        curve: usize,
        left: isize,
        right: usize,
        n_points: usize,
    },

    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    #[error("unknown operation '{name}' for {family}")]
    UnknownOperation { family: &'static str, name: String },

    #[error("reference index {idx0} out of range for {n_curves} curves")]
    ReferenceOutOfRange { idx0: usize, n_curves: usize },

    #[error("operation requires a non-empty image")]
    EmptyImage,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, OpError>;
