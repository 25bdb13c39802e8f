//! Operation dispatch shared by every capability family.

pub mod dispatcher;
pub mod traits;
pub mod types;

pub use dispatcher::*;
pub use traits::*;
pub use types::*;
