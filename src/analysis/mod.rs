//! Trial analysis.
//!
//! Accumulation of trial files into a table and the statistics used to
//! reduce it.

pub mod aggregator;
pub mod stats;

pub use aggregator::*;
