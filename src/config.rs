//! Configuration file handling.
//!
//! This module handles loading `.trialstat.toml` files and merging them
//! with command-line arguments.

use crate::analysis::stats::Z_95;
use crate::cli::{Command, OutputFormat};
use crate::models::BaselineScope;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = ".trialstat.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Trial aggregation settings.
    #[serde(default)]
    pub aggregate: AggregateConfig,

    /// Block extraction settings.
    #[serde(default)]
    pub merge: MergeConfig,

    /// Query vector settings.
    #[serde(default)]
    pub queryvec: QueryVecConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Trial aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateConfig {
    /// Data lines per model block.
    #[serde(default = "default_cluster_count")]
    pub cluster_count: usize,

    /// Scope of the reference maximum.
    #[serde(default)]
    pub baseline: BaselineScope,

    /// Normal quantile for the confidence half-width.
    #[serde(default = "default_z_score")]
    pub z_score: f64,

    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            cluster_count: default_cluster_count(),
            baseline: BaselineScope::default(),
            z_score: default_z_score(),
            format: OutputFormat::default(),
        }
    }
}

fn default_cluster_count() -> usize {
    100
}

fn default_z_score() -> f64 {
    Z_95
}

/// Block extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Rows with more fields than this are dropped.
    #[serde(default = "default_max_fields")]
    pub max_fields: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            max_fields: default_max_fields(),
        }
    }
}

fn default_max_fields() -> usize {
    3
}

/// Query vector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryVecConfig {
    /// Vector components per word.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Skip words without a vector instead of failing.
    #[serde(default)]
    pub skip_unknown_words: bool,
}

impl Default for QueryVecConfig {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
            skip_unknown_words: false,
        }
    }
}

fn default_dimension() -> usize {
    50
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_optional(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Load `default_path` if it exists.
    pub fn load_optional(default_path: &Path) -> Result<Option<Self>> {
        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence; only explicitly given values override.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if args.verbose {
            self.general.verbose = true;
        }

        match &args.command {
            Some(Command::Aggregate(a)) => {
                if let Some(n) = a.clusters {
                    self.aggregate.cluster_count = n;
                }
                if let Some(baseline) = a.baseline {
                    self.aggregate.baseline = baseline;
                }
                if let Some(z) = a.z {
                    self.aggregate.z_score = z;
                }
                if let Some(format) = a.format {
                    self.aggregate.format = format;
                }
            }
            Some(Command::Merge(m)) => {
                if let Some(n) = m.max_fields {
                    self.merge.max_fields = n;
                }
            }
            Some(Command::Queryvec(q)) => {
                if let Some(d) = q.dimension {
                    self.queryvec.dimension = d;
                }
                if q.skip_unknown_words {
                    self.queryvec.skip_unknown_words = true;
                }
            }
            None => {}
        }
    }

    /// Check values the CLI could not validate on its own.
    pub fn validate(&self) -> Result<(), String> {
        if self.aggregate.cluster_count == 0 {
            return Err("Cluster count must be at least 1".to_string());
        }
        if !self.aggregate.z_score.is_finite() || self.aggregate.z_score < 0.0 {
            return Err("z score must be a non-negative number".to_string());
        }
        if self.queryvec.dimension == 0 {
            return Err("Vector dimension must be at least 1".to_string());
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{AggregateArgs, Args};
    use std::path::PathBuf;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.aggregate.cluster_count, 100);
        assert_eq!(config.aggregate.baseline, BaselineScope::Global);
        assert_eq!(config.aggregate.z_score, 1.96);
        assert_eq!(config.merge.max_fields, 3);
        assert_eq!(config.queryvec.dimension, 50);
        assert!(!config.queryvec.skip_unknown_words);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
verbose = true

[aggregate]
cluster_count = 20
baseline = "per-model"
format = "json"

[queryvec]
skip_unknown_words = true
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.aggregate.cluster_count, 20);
        assert_eq!(config.aggregate.baseline, BaselineScope::PerModel);
        assert_eq!(config.aggregate.format, OutputFormat::Json);
        assert_eq!(config.aggregate.z_score, 1.96);
        assert_eq!(config.merge.max_fields, 3);
        assert!(config.queryvec.skip_unknown_words);
        assert_eq!(config.queryvec.dimension, 50);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[aggregate]"));
        assert!(toml_str.contains("[merge]"));
        assert!(toml_str.contains("[queryvec]"));
        assert!(toml_str.contains("baseline = \"global\""));

        let round: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(round.aggregate.cluster_count, 100);
    }

    #[test]
    fn test_args_override_config() {
        let mut config = Config::default();
        config.aggregate.baseline = BaselineScope::PerModel;

        let args = Args {
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
            command: Some(Command::Aggregate(AggregateArgs {
                clusters: Some(5),
                baseline: None,
                z: Some(2.58),
                format: None,
                paths: vec![PathBuf::from("a.txt"), PathBuf::from("out.txt")],
            })),
        };

        config.merge_with_args(&args);
        assert_eq!(config.aggregate.cluster_count, 5);
        assert_eq!(config.aggregate.z_score, 2.58);
        assert_eq!(config.aggregate.baseline, BaselineScope::PerModel);
    }

    #[test]
    fn test_validate_rejects_zero_clusters() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());
        config.aggregate.cluster_count = 0;
        assert!(config.validate().is_err());
    }
}
