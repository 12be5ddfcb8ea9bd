//! Report output.
//!
//! Console text blocks for each report section and the JSON summary.

pub mod generator;

pub use generator::*;
