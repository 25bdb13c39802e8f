//! Intensity statistics of whole images.

pub mod stats;

pub use stats::*;
