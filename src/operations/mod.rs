//! Pixel-level operation families: filtering, normalization, slicing and
//! integration.

pub mod filter;
pub mod integration;
pub mod manipulation;
pub mod normalization;

pub use filter::*;
pub use integration::*;
pub use manipulation::*;
pub use normalization::*;
