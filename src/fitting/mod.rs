//! Numerical collaborators used by fit alignment: baseline estimation,
//! peak search and nonlinear least squares.
//!
//! Each is a trait so callers can inject their own implementation into
//! [`crate::algorithms::Alignment`].

pub mod least_squares;
pub mod peak_search;
pub mod snip;

pub use least_squares::*;
pub use peak_search::*;
pub use snip::*;
