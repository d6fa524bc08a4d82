//! Result output
//!
//! - [`text`]: console summary printed after each phase
//! - [`json`]: machine-readable export of every phase report

pub mod json;
pub mod text;
