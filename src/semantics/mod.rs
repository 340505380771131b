//! Abstract semantics for bounding floating-point round-off error.

pub mod error;

pub use error::{ErrorSemantics, round_off_error};
