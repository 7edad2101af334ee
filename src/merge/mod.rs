//! Model block extraction.
//!
//! Turns one raw clustering result file into a model block the
//! aggregator can read: the model name as a header line, followed by the
//! short rows of the input. Longer rows (per-document listings and the
//! like) are dropped.

use crate::error::Result;
use crate::parser::{self, field_count};
use crate::report::append_report;
use std::path::Path;
use tracing::{debug, info};

/// Options for block extraction.
#[derive(Debug, Clone, Copy)]
pub struct MergeOptions {
    /// Rows with more fields than this are dropped.
    pub max_fields: usize,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self { max_fields: 3 }
    }
}

/// Render the block for `model` from the raw `content`.
///
/// Kept rows are copied verbatim and always newline-terminated.
pub fn render_block(model: &str, content: &str, options: &MergeOptions) -> (String, usize) {
    let mut block = String::with_capacity(content.len() + model.len() + 1);
    let mut kept = 0;

    block.push_str(model);
    block.push('\n');

    for line in content.lines() {
        if field_count(line) <= options.max_fields {
            block.push_str(line);
            block.push('\n');
            kept += 1;
        }
    }

    (block, kept)
}

/// Append the block for `model` read from `input` to `output`.
///
/// Returns the number of rows kept.
pub fn merge_block(model: &str, input: &Path, output: &Path, options: &MergeOptions) -> Result<usize> {
    debug!("Extracting block {:?} from {}", model, input.display());

    let content = parser::read_input(input)?;
    let (block, kept) = render_block(model, &content, options);
    append_report(output, &block)?;

    info!(
        "Appended {} rows for model {:?} to {}",
        kept,
        model,
        output.display()
    );
    Ok(kept)
}
