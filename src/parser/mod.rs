//! Line grammar for trial result files.
//!
//! Fields are separated by runs of whitespace (tabs or spaces). A line with
//! a single field is a model header, a line with two or more fields is a
//! data line whose last field is the trial value, and blank lines carry
//! nothing.

use crate::error::{Result, TrialError};
use std::fs;
use std::path::Path;

/// A classified input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Line<'a> {
    /// No fields.
    Blank,
    /// Model header carrying the model name.
    Header(&'a str),
    /// Data row with its parsed trial value.
    Data { value: f64 },
}

/// Number of whitespace-separated fields in a line.
pub fn field_count(line: &str) -> usize {
    line.split_whitespace().count()
}

/// Classify a line and parse the trial value of data rows.
///
/// `line_no` is 1-based and only used to build error messages.
pub fn parse_line<'a>(path: &Path, line_no: usize, line: &'a str) -> Result<Line<'a>> {
    let mut fields = line.split_whitespace();

    let Some(first) = fields.next() else {
        return Ok(Line::Blank);
    };

    let Some(last) = fields.last() else {
        return Ok(Line::Header(first));
    };

    let value = last.parse::<f64>().map_err(|_| TrialError::InvalidValue {
        path: path.to_path_buf(),
        line: line_no,
        token: last.to_string(),
        content: line.trim_end().to_string(),
    })?;

    Ok(Line::Data { value })
}

/// Read a whole input file into memory.
pub fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| TrialError::read(path, e))
}
