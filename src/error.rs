//! Error types shared by the aggregation, merge and query-vector commands.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading, reducing or writing trial data.
#[derive(Debug, Error)]
pub enum TrialError {
    /// An input file could not be opened or read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An output file could not be opened or written.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The last field of a data line is not a number.
    #[error("{}:{line}: invalid trial value {token:?} in line {content:?}", .path.display())]
    InvalidValue {
        path: PathBuf,
        line: usize,
        token: String,
        content: String,
    },

    /// A data line appeared before any model header in a file.
    #[error("{}:{line}: data line before any model header: {content:?}", .path.display())]
    MissingHeader {
        path: PathBuf,
        line: usize,
        content: String,
    },

    /// A model block holds more data lines than there are cluster slots.
    #[error(
        "{}:{line}: block for model {model:?} has more than {cluster_count} data lines",
        .path.display()
    )]
    BlockOverflow {
        path: PathBuf,
        line: usize,
        model: String,
        cluster_count: usize,
    },

    /// A cluster slot received no trial values from any file.
    #[error("model {model:?} has no trial values for cluster slot {slot}")]
    EmptySlot { model: String, slot: usize },

    /// A query word has no entry in the word-vector table.
    #[error("{}:{line}: word {word:?} has no vector", .path.display())]
    UnknownWord {
        path: PathBuf,
        line: usize,
        word: String,
    },

    /// A word-vector line carries fewer components than the configured dimension.
    #[error(
        "{}:{line}: vector for {word:?} has {found} components, expected {expected}",
        .path.display()
    )]
    ShortVector {
        path: PathBuf,
        line: usize,
        word: String,
        found: usize,
        expected: usize,
    },

    /// A report could not be serialized.
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Every word of a query was skipped.
    #[error("{}:{line}: query has no known words", .path.display())]
    EmptyQuery { path: PathBuf, line: usize },
}

impl TrialError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TrialError::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TrialError::Write {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TrialError>;
