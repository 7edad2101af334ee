//! Slot statistics.

use crate::models::Direction;

/// Normal quantile for a two-sided 95% interval.
pub const Z_95: f64 = 1.96;

/// Arithmetic mean. Callers guarantee a non-empty slice.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Square root of the summed squared deviations from `mean`.
///
/// Not divided by the sample count.
pub fn deviation(values: &[f64], mean: f64) -> f64 {
    values
        .iter()
        .map(|v| (v - mean) * (v - mean))
        .sum::<f64>()
        .sqrt()
}

/// Confidence half-width `z * deviation / sqrt(n)`.
pub fn half_width(z: f64, deviation: f64, n: usize) -> f64 {
    z * deviation / (n as f64).sqrt()
}

/// Classify the interval `[mean - half_width, mean + half_width]` against `reference`.
pub fn classify(mean: f64, half_width: f64, reference: f64) -> Direction {
    if mean - half_width > reference {
        Direction::Up
    } else if mean + half_width < reference {
        Direction::Down
    } else {
        Direction::None
    }
}
