//! Analysis modules.
//!
//! Aggregation over a loaded [`crate::dataset::Dataset`]. Nothing here
//! touches the file system.

pub mod aggregator;
pub mod describe;

pub use aggregator::*;
pub use describe::*;
