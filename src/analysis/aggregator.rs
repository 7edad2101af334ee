//! Trial accumulation and reduction.
//!
//! Input files are folded into a [`TrialTable`] one after another, then
//! [`summarize`] reduces the table to per-slot statistics.

use super::stats;
use crate::error::{Result, TrialError};
use crate::models::{BaselineScope, ModelSummary, SlotSummary};
use crate::parser::{self, Line};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Options controlling the reduction step.
#[derive(Debug, Clone, Copy)]
pub struct AggregateOptions {
    /// Scope of the reference maximum.
    pub baseline: BaselineScope,
    /// Normal quantile for the half-width.
    pub z_score: f64,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            baseline: BaselineScope::Global,
            z_score: stats::Z_95,
        }
    }
}

/// Trial values of one model, one vector per cluster slot.
#[derive(Debug, Clone)]
pub struct ModelTrials {
    pub name: String,
    pub slots: Vec<Vec<f64>>,
    /// Largest value among this model's trials.
    pub max: Option<f64>,
}

/// Accumulated trial values keyed by model, in first-seen order.
#[derive(Debug, Clone)]
pub struct TrialTable {
    cluster_count: usize,
    models: Vec<ModelTrials>,
    index: HashMap<String, usize>,
    global_max: Option<f64>,
}

/// Cursor over the block currently being read.
struct Block {
    model: usize,
    next_slot: usize,
    header_line: usize,
}

impl TrialTable {
    /// Create an empty table with `cluster_count` slots per model.
    pub fn new(cluster_count: usize) -> Self {
        Self {
            cluster_count,
            models: Vec::new(),
            index: HashMap::new(),
            global_max: None,
        }
    }

    pub fn cluster_count(&self) -> usize {
        self.cluster_count
    }

    /// Models in first-seen order.
    pub fn models(&self) -> &[ModelTrials] {
        &self.models
    }

    /// Largest value seen across every file.
    pub fn global_max(&self) -> Option<f64> {
        self.global_max
    }

    /// Read a file from disk and fold it into the table.
    pub fn accumulate_file(&mut self, path: &Path) -> Result<()> {
        debug!("Reading trials from {}", path.display());
        let content = parser::read_input(path)?;
        self.accumulate_str(path, &content)
    }

    /// Fold the contents of one input file into the table.
    ///
    /// `path` is only used for error messages and warnings.
    pub fn accumulate_str(&mut self, path: &Path, content: &str) -> Result<()> {
        let mut block: Option<Block> = None;

        for (i, line) in content.lines().enumerate() {
            let line_no = i + 1;

            match parser::parse_line(path, line_no, line)? {
                Line::Blank => {}
                Line::Header(name) => {
                    if let Some(done) = block.take() {
                        self.check_block_length(path, &done);
                    }
                    block = Some(Block {
                        model: self.model_index(name),
                        next_slot: 0,
                        header_line: line_no,
                    });
                }
                Line::Data { value } => {
                    let Some(current) = block.as_mut() else {
                        return Err(TrialError::MissingHeader {
                            path: path.to_path_buf(),
                            line: line_no,
                            content: line.trim_end().to_string(),
                        });
                    };

                    let model = &mut self.models[current.model];
                    if current.next_slot >= self.cluster_count {
                        return Err(TrialError::BlockOverflow {
                            path: path.to_path_buf(),
                            line: line_no,
                            model: model.name.clone(),
                            cluster_count: self.cluster_count,
                        });
                    }

                    model.slots[current.next_slot].push(value);
                    model.max = Some(model.max.map_or(value, |m| m.max(value)));
                    self.global_max = Some(self.global_max.map_or(value, |m| m.max(value)));
                    current.next_slot += 1;
                }
            }
        }

        if let Some(done) = block {
            self.check_block_length(path, &done);
        }

        Ok(())
    }

    fn model_index(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }

        let idx = self.models.len();
        self.models.push(ModelTrials {
            name: name.to_string(),
            slots: vec![Vec::new(); self.cluster_count],
            max: None,
        });
        self.index.insert(name.to_string(), idx);
        idx
    }

    fn check_block_length(&self, path: &Path, block: &Block) {
        if block.next_slot < self.cluster_count {
            warn!(
                "{}:{}: block for model {:?} has {} of {} data lines",
                path.display(),
                block.header_line,
                self.models[block.model].name,
                block.next_slot,
                self.cluster_count
            );
        }
    }
}

/// Reduce the table to per-slot statistics.
///
/// Fails on the first slot that received no trial values.
pub fn summarize(table: &TrialTable, options: &AggregateOptions) -> Result<Vec<ModelSummary>> {
    let global_max = table.global_max.unwrap_or(f64::NEG_INFINITY);

    table
        .models
        .iter()
        .map(|model| {
            let reference = match options.baseline {
                BaselineScope::Global => global_max,
                BaselineScope::PerModel => model.max.unwrap_or(f64::NEG_INFINITY),
            };
            summarize_model(model, reference, options.z_score)
        })
        .collect()
}

fn summarize_model(model: &ModelTrials, reference: f64, z_score: f64) -> Result<ModelSummary> {
    let slots = model
        .slots
        .iter()
        .enumerate()
        .map(|(i, values)| {
            if values.is_empty() {
                return Err(TrialError::EmptySlot {
                    model: model.name.clone(),
                    slot: i + 1,
                });
            }

            let mean = stats::mean(values);
            let deviation = stats::deviation(values, mean);
            let half_width = stats::half_width(z_score, deviation, values.len());

            Ok(SlotSummary {
                slot: i + 1,
                values: values.clone(),
                mean,
                half_width,
                direction: stats::classify(mean, half_width, reference),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ModelSummary {
        name: model.name.clone(),
        reference,
        slots,
    })
}
