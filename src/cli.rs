//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation of positional argument shapes.

use crate::config::GeneralConfig;
use crate::models::BaselineScope;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// trialstat - trial averaging and query vectors for clustering experiments
///
/// Averages per-cluster results across trial files, tags each cluster
/// against a reference maximum with a 95% confidence interval, and builds
/// query vectors from word vectors.
///
/// Examples:
///   trialstat aggregate run1.txt run2.txt run3.txt report.txt
///   trialstat aggregate --clusters 20 --baseline per-model run*.txt report.txt
///   trialstat merge kmeans raw/kmeans_run1.txt run1.txt
///   trialstat queryvec wordvectors.txt queries.txt mean.txt max.txt
///   trialstat --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .trialstat.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .trialstat.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Average trial files and append a significance report
    Aggregate(AggregateArgs),
    /// Append one raw result file to a trial file as a model block
    Merge(MergeArgs),
    /// Build mean and max query vectors from word vectors
    Queryvec(QueryVecArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct AggregateArgs {
    /// Data lines per model block [default: 100]
    #[arg(long, value_name = "COUNT")]
    pub clusters: Option<usize>,

    /// Scope of the reference maximum [default: global]
    #[arg(long, value_name = "SCOPE")]
    pub baseline: Option<BaselineScope>,

    /// Normal quantile for the confidence half-width [default: 1.96]
    #[arg(long, value_name = "VALUE")]
    pub z: Option<f64>,

    /// Report format [default: text]
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Input trial files followed by the output file
    #[arg(value_name = "FILES", required = true, num_args = 2..)]
    pub paths: Vec<PathBuf>,
}

impl AggregateArgs {
    /// Input files: every path but the last.
    pub fn inputs(&self) -> &[PathBuf] {
        match self.paths.split_last() {
            Some((_, inputs)) => inputs,
            None => &[],
        }
    }

    /// Output file: the last path.
    pub fn output(&self) -> Option<&Path> {
        self.paths.last().map(PathBuf::as_path)
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct MergeArgs {
    /// Keep rows with at most this many fields [default: 3]
    #[arg(long, value_name = "COUNT")]
    pub max_fields: Option<usize>,

    /// Model name written as the block header
    pub model: String,

    /// Raw result file
    pub input: PathBuf,

    /// Trial file to append to
    pub output: PathBuf,
}

#[derive(clap::Args, Debug, Clone)]
pub struct QueryVecArgs {
    /// Vector components per word [default: 50]
    #[arg(long, value_name = "DIM")]
    pub dimension: Option<usize>,

    /// Skip query words without a vector instead of failing
    #[arg(long)]
    pub skip_unknown_words: bool,

    /// Word-vector file (word followed by its components)
    pub vectors: PathBuf,

    /// Query text file, one query per line
    pub queries: PathBuf,

    /// Output file for mean vectors
    pub mean_out: PathBuf,

    /// Output file for max vectors
    pub max_out: PathBuf,
}

/// Output format for the trial report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Tab-separated text (default)
    #[default]
    Text,
    /// One JSON document per run
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        let Some(command) = &self.command else {
            return Err("No command given; see --help".to_string());
        };

        if let Command::Aggregate(args) = command {
            if args.inputs().is_empty() {
                return Err("At least one input file and an output file are required".to_string());
            }
            if let Some(output) = args.output() {
                if args.inputs().iter().any(|p| p == output) {
                    return Err(format!(
                        "Output file is also an input: {}",
                        output.display()
                    ));
                }
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity flags and the config file.
    ///
    /// `--quiet` wins over both `--verbose` and `general.verbose`.
    pub fn log_level(&self, general: &GeneralConfig) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_aggregate_last_path_is_output() {
        let args = parse(&["trialstat", "aggregate", "a.txt", "b.txt", "out.txt"]);
        let Some(Command::Aggregate(agg)) = &args.command else {
            panic!("expected aggregate");
        };
        assert_eq!(agg.inputs(), &[PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
        assert_eq!(agg.output(), Some(Path::new("out.txt")));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_aggregate_requires_input_and_output() {
        assert!(Args::try_parse_from(["trialstat", "aggregate", "only.txt"]).is_err());
    }

    #[test]
    fn test_aggregate_flags() {
        let args = parse(&[
            "trialstat",
            "aggregate",
            "--clusters",
            "20",
            "--baseline",
            "per-model",
            "--format",
            "json",
            "a.txt",
            "out.txt",
        ]);
        let Some(Command::Aggregate(agg)) = &args.command else {
            panic!("expected aggregate");
        };
        assert_eq!(agg.clusters, Some(20));
        assert_eq!(agg.baseline, Some(BaselineScope::PerModel));
        assert_eq!(agg.format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_validation_output_is_input() {
        let args = parse(&["trialstat", "aggregate", "a.txt", "a.txt"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let args = parse(&["trialstat", "-v", "-q", "merge", "m", "in.txt", "out.txt"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_command() {
        assert!(parse(&["trialstat"]).validate().is_err());
        assert!(parse(&["trialstat", "--init-config"]).validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let general = GeneralConfig::default();
        let mut args = parse(&["trialstat", "merge", "m", "in.txt", "out.txt"]);
        assert_eq!(args.log_level(&general), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(&general), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(&general), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_level_from_config_file() {
        let config: crate::config::Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        let mut args = parse(&["trialstat", "merge", "m", "in.txt", "out.txt"]);
        assert_eq!(args.log_level(&config.general), tracing::Level::DEBUG);

        args.quiet = true;
        assert_eq!(args.log_level(&config.general), tracing::Level::ERROR);
    }
}
