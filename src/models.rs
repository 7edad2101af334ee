//! Data models for trial aggregation.
//!
//! This module contains the structures produced by the reduction step and
//! consumed by the report generators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional classification of a slot against its reference maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The whole confidence interval lies above the reference.
    Up,
    /// The whole confidence interval lies below the reference.
    Down,
    /// The interval touches or contains the reference.
    None,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
            Direction::None => write!(f, "none"),
        }
    }
}

/// Scope of the reference maximum used for directional tags.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum BaselineScope {
    /// Largest trial value across every model and every file.
    #[default]
    Global,
    /// Largest trial value among the model's own trials.
    PerModel,
}

impl fmt::Display for BaselineScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaselineScope::Global => write!(f, "global"),
            BaselineScope::PerModel => write!(f, "per-model"),
        }
    }
}

/// Reduced statistics for one cluster slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotSummary {
    /// Slot position (1-indexed).
    pub slot: usize,
    /// Trial values in file-processing order.
    pub values: Vec<f64>,
    /// Arithmetic mean of the values.
    pub mean: f64,
    /// Confidence half-width around the mean.
    pub half_width: f64,
    /// Classification against the reference maximum.
    pub direction: Direction,
}

impl SlotSummary {
    /// Number of trials contributing to this slot.
    pub fn trials(&self) -> usize {
        self.values.len()
    }
}

/// Reduced statistics for one model block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSummary {
    /// Model name as read from the header lines.
    pub name: String,
    /// Reference maximum the slots were classified against.
    pub reference: f64,
    /// One entry per cluster slot, in slot order.
    pub slots: Vec<SlotSummary>,
}

impl ModelSummary {
    /// Counts slots per direction as `(up, down, none)`.
    pub fn direction_counts(&self) -> (usize, usize, usize) {
        self.slots
            .iter()
            .fold((0, 0, 0), |(up, down, none), s| match s.direction {
                Direction::Up => (up + 1, down, none),
                Direction::Down => (up, down + 1, none),
                Direction::None => (up, down, none + 1),
            })
    }
}

/// Metadata about a single aggregation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Input files in processing order.
    pub inputs: Vec<String>,
    /// Number of cluster slots per model block.
    pub cluster_count: usize,
    /// Scope of the reference maximum.
    pub baseline: BaselineScope,
    /// Normal quantile used for the half-width.
    pub z_score: f64,
    /// Largest trial value across the whole input.
    pub global_max: Option<f64>,
}

/// The complete trial aggregation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialReport {
    /// Metadata about the run.
    pub metadata: ReportMetadata,
    /// Models in first-seen order.
    pub models: Vec<ModelSummary>,
}
