//! Query embedding from word vectors.
//!
//! Each query is turned into two vectors: the elementwise mean and the
//! elementwise max of the vectors of its words.

use crate::error::{Result, TrialError};
use crate::parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Words loaded between progress updates.
const PROGRESS_INTERVAL: usize = 100_000;

/// Options for building query vectors.
#[derive(Debug, Clone, Copy)]
pub struct QueryVecOptions {
    /// Number of vector components read per word.
    pub dimension: usize,
    /// Skip words without a vector instead of failing.
    pub skip_unknown_words: bool,
    /// Whether to show a progress spinner while loading vectors.
    pub show_progress: bool,
}

impl Default for QueryVecOptions {
    fn default() -> Self {
        Self {
            dimension: 50,
            skip_unknown_words: false,
            show_progress: true,
        }
    }
}

/// Word-vector lookup table.
#[derive(Debug, Default)]
pub struct WordVectors {
    dimension: usize,
    vectors: HashMap<String, Vec<f64>>,
}

impl WordVectors {
    /// Parse a word-vector table: a word followed by at least `dimension` floats.
    ///
    /// Components past `dimension` are ignored. A repeated word replaces
    /// the earlier entry.
    pub fn parse(path: &Path, content: &str, dimension: usize, progress: &ProgressBar) -> Result<Self> {
        let mut vectors = HashMap::new();
        let mut loaded = 0usize;

        for (i, line) in content.lines().enumerate() {
            let mut fields = line.split_whitespace();
            let Some(word) = fields.next() else {
                continue;
            };

            let mut vector = Vec::with_capacity(dimension);
            for token in fields.take(dimension) {
                let value = token.parse::<f64>().map_err(|_| TrialError::InvalidValue {
                    path: path.to_path_buf(),
                    line: i + 1,
                    token: token.to_string(),
                    content: line.trim_end().to_string(),
                })?;
                vector.push(value);
            }

            if vector.len() < dimension {
                return Err(TrialError::ShortVector {
                    path: path.to_path_buf(),
                    line: i + 1,
                    word: word.to_string(),
                    found: vector.len(),
                    expected: dimension,
                });
            }

            vectors.insert(word.to_string(), vector);
            loaded += 1;

            if loaded % PROGRESS_INTERVAL == 0 {
                progress.set_message(format!("{} words loaded", loaded));
                progress.tick();
            }
        }

        Ok(Self { dimension, vectors })
    }

    /// Load a word-vector table from disk.
    pub fn load(path: &Path, dimension: usize, show_progress: bool) -> Result<Self> {
        let progress = if show_progress {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_message(format!("Loading word vectors from {}", path.display()));
            pb
        } else {
            ProgressBar::hidden()
        };

        let content = parser::read_input(path)?;
        let table = Self::parse(path, &content, dimension, &progress)?;

        progress.finish_with_message(format!("{} words loaded", table.len()));
        info!("Loaded {} word vectors from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn get(&self, word: &str) -> Option<&[f64]> {
        self.vectors.get(word).map(Vec::as_slice)
    }
}

/// Mean and max vectors of one query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryVector {
    pub mean: Vec<f64>,
    pub max: Vec<f64>,
}

/// Where a query came from, for error messages.
#[derive(Debug, Clone, Copy)]
pub struct QuerySource<'a> {
    pub path: &'a Path,
    pub line: usize,
}

/// Combine the vectors of `words` into mean and max vectors.
pub fn embed_query(
    words: &[&str],
    vectors: &WordVectors,
    skip_unknown_words: bool,
    source: QuerySource<'_>,
) -> Result<QueryVector> {
    let d = vectors.dimension();
    let mut sum = vec![0.0; d];
    let mut max = vec![f64::NEG_INFINITY; d];
    let mut used = 0usize;

    for word in words {
        let Some(vector) = vectors.get(word) else {
            if skip_unknown_words {
                warn!(
                    "{}:{}: skipping word {:?} with no vector",
                    source.path.display(),
                    source.line,
                    word
                );
                continue;
            }
            return Err(TrialError::UnknownWord {
                path: source.path.to_path_buf(),
                line: source.line,
                word: word.to_string(),
            });
        };

        for (i, &value) in vector.iter().enumerate() {
            sum[i] += value;
            if value > max[i] {
                max[i] = value;
            }
        }
        used += 1;
    }

    if used == 0 {
        return Err(TrialError::EmptyQuery {
            path: source.path.to_path_buf(),
            line: source.line,
        });
    }

    let mean = sum.into_iter().map(|s| s / used as f64).collect();
    Ok(QueryVector { mean, max })
}

/// Embed every non-blank line of a query file.
pub fn embed_queries(
    path: &Path,
    content: &str,
    vectors: &WordVectors,
    skip_unknown_words: bool,
) -> Result<Vec<QueryVector>> {
    let mut out = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        let source = QuerySource { path, line: i + 1 };
        out.push(embed_query(&words, vectors, skip_unknown_words, source)?);
    }

    debug!("Embedded {} queries from {}", out.len(), path.display());
    Ok(out)
}

/// Space-separated components with a trailing space, newline-terminated.
pub fn format_vector(vector: &[f64]) -> String {
    let mut line = String::new();
    for value in vector {
        line.push_str(&crate::report::format_value(*value));
        line.push(' ');
    }
    line.push('\n');
    line
}

/// Paths produced by [`build_query_vectors`].
#[derive(Debug, Clone)]
pub struct QueryVecOutputs {
    pub mean: PathBuf,
    pub max: PathBuf,
}

/// Load vectors and queries, then write the mean and max files.
///
/// Both output files are replaced. Both are rendered and opened before
/// either is truncated, so a failure leaves the old pair intact. Returns
/// the number of queries written.
pub fn build_query_vectors(
    vectors_path: &Path,
    queries_path: &Path,
    outputs: &QueryVecOutputs,
    options: &QueryVecOptions,
) -> Result<usize> {
    let vectors = WordVectors::load(vectors_path, options.dimension, options.show_progress)?;
    let content = parser::read_input(queries_path)?;
    let queries = embed_queries(queries_path, &content, &vectors, options.skip_unknown_words)?;

    let mean = render_vectors(queries.iter().map(|q| q.mean.as_slice()));
    let max = render_vectors(queries.iter().map(|q| q.max.as_slice()));

    let mut mean_file = open_output(&outputs.mean)?;
    let mut max_file = open_output(&outputs.max)?;
    replace_contents(&mut mean_file, &outputs.mean, &mean)?;
    replace_contents(&mut max_file, &outputs.max, &max)?;

    info!(
        "Wrote {} query vectors to {} and {}",
        queries.len(),
        outputs.mean.display(),
        outputs.max.display()
    );
    Ok(queries.len())
}

/// Concatenate formatted rows.
pub fn render_vectors<'a>(rows: impl Iterator<Item = &'a [f64]>) -> String {
    rows.map(format_vector).collect()
}

/// Open an output file for writing without truncating it yet.
fn open_output(path: &Path) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| TrialError::write(path, e))
}

fn replace_contents(file: &mut File, path: &Path, content: &str) -> Result<()> {
    file.set_len(0).map_err(|e| TrialError::write(path, e))?;
    file.write_all(content.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| TrialError::write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VECTORS: &str = "storm 1.0 -2.0 0.5\nflood 3.0 0.0 -0.5 9.9\n\nfire -1.0 4.0 0.5\n";

    fn table() -> WordVectors {
        WordVectors::parse(Path::new("vec.txt"), VECTORS, 3, &ProgressBar::hidden()).unwrap()
    }

    fn source() -> QuerySource<'static> {
        QuerySource {
            path: Path::new("queries.txt"),
            line: 1,
        }
    }

    #[test]
    fn test_parse_truncates_to_dimension() {
        let vectors = table();
        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors.get("flood"), Some(&[3.0, 0.0, -0.5][..]));
    }

    #[test]
    fn test_parse_short_vector() {
        let err = WordVectors::parse(Path::new("v.txt"), "a 1.0 2.0\n", 3, &ProgressBar::hidden())
            .unwrap_err();
        assert!(matches!(
            err,
            TrialError::ShortVector {
                found: 2,
                expected: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_embed_query_mean_and_max() {
        let q = embed_query(&["storm", "flood"], &table(), false, source()).unwrap();
        assert_eq!(q.mean, vec![2.0, -1.0, 0.0]);
        assert_eq!(q.max, vec![3.0, 0.0, 0.5]);
    }

    #[test]
    fn test_repeated_word_counts_twice() {
        let q = embed_query(&["storm", "storm", "fire"], &table(), false, source()).unwrap();
        assert_eq!(q.mean, vec![1.0 / 3.0, 0.0, 0.5]);
        assert_eq!(q.max, vec![1.0, 4.0, 0.5]);
    }

    #[test]
    fn test_unknown_word_fails_by_default() {
        let err = embed_query(&["storm", "quake"], &table(), false, source()).unwrap_err();
        assert!(matches!(err, TrialError::UnknownWord { ref word, .. } if word == "quake"));
    }

    #[test]
    fn test_unknown_word_skipped() {
        let q = embed_query(&["quake", "fire"], &table(), true, source()).unwrap();
        assert_eq!(q.mean, vec![-1.0, 4.0, 0.5]);

        let err = embed_query(&["quake"], &table(), true, source()).unwrap_err();
        assert!(matches!(err, TrialError::EmptyQuery { .. }));
    }

    #[test]
    fn test_embed_queries_skips_blank_lines() {
        let out = embed_queries(Path::new("q.txt"), "storm\n\nfire flood\n", &table(), false).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_format_vector() {
        assert_eq!(format_vector(&[1.0, -0.5]), "1.0 -0.5 \n");
    }

    #[test]
    fn test_build_query_vectors_replaces_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let vectors = dir.path().join("vectors.txt");
        let queries = dir.path().join("queries.txt");
        let outputs = QueryVecOutputs {
            mean: dir.path().join("mean.txt"),
            max: dir.path().join("max.txt"),
        };
        std::fs::write(&vectors, VECTORS).unwrap();
        std::fs::write(&queries, "storm flood\n").unwrap();
        std::fs::write(&outputs.mean, "stale\n").unwrap();

        let options = QueryVecOptions {
            dimension: 3,
            show_progress: false,
            ..QueryVecOptions::default()
        };
        let n = build_query_vectors(&vectors, &queries, &outputs, &options).unwrap();

        assert_eq!(n, 1);
        assert_eq!(
            std::fs::read_to_string(&outputs.mean).unwrap(),
            "2.0 -1.0 0.0 \n"
        );
        assert_eq!(
            std::fs::read_to_string(&outputs.max).unwrap(),
            "3.0 0.0 0.5 \n"
        );
    }

    #[test]
    fn test_render_vectors() {
        let rows = [vec![1.0, 2.0], vec![-0.5, 0.0]];
        assert_eq!(
            render_vectors(rows.iter().map(Vec::as_slice)),
            "1.0 2.0 \n-0.5 0.0 \n"
        );
    }

    #[test]
    fn test_unwritable_max_output_keeps_mean_output() {
        let dir = tempfile::tempdir().unwrap();
        let vectors = dir.path().join("vectors.txt");
        let queries = dir.path().join("queries.txt");
        let outputs = QueryVecOutputs {
            mean: dir.path().join("mean.txt"),
            max: dir.path().join("missing").join("max.txt"),
        };
        std::fs::write(&vectors, VECTORS).unwrap();
        std::fs::write(&queries, "storm flood\n").unwrap();
        std::fs::write(&outputs.mean, "stale\n").unwrap();

        let options = QueryVecOptions {
            dimension: 3,
            show_progress: false,
            ..QueryVecOptions::default()
        };
        let err = build_query_vectors(&vectors, &queries, &outputs, &options).unwrap_err();

        assert!(matches!(err, TrialError::Write { ref path, .. } if path == &outputs.max));
        assert_eq!(std::fs::read_to_string(&outputs.mean).unwrap(), "stale\n");
    }
}
