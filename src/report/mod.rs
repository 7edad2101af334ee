//! Report rendering and output.

mod generator;

pub use generator::*;
