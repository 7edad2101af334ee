//! trialstat - trial averaging and significance reports
//!
//! A CLI tool that averages per-cluster results across clustering trial
//! files, tags each cluster against a reference maximum, and builds query
//! vectors from word vectors.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (bad arguments, unreadable or malformed input, write failure)

mod analysis;
mod cli;
mod config;
mod error;
mod merge;
mod models;
mod parser;
mod report;
mod vectors;

use analysis::{AggregateOptions, TrialTable};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{AggregateArgs, Args, Command, MergeArgs, OutputFormat, QueryVecArgs};
use config::{Config, DEFAULT_CONFIG_FILE};
use models::{ReportMetadata, TrialReport};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so `general.verbose` applies
    let config = match prepare_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config);

    info!("trialstat v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    if let Err(e) = run(&args, &config) {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .trialstat.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", DEFAULT_CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = args.log_level(&config.general);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration, apply CLI overrides, and validate the result.
fn prepare_config(args: &Args) -> Result<Config> {
    let mut config = load_config(args)?;
    config.merge_with_args(args);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}

/// Dispatch the subcommand.
fn run(args: &Args, config: &Config) -> Result<()> {
    match &args.command {
        Some(Command::Aggregate(a)) => run_aggregate(a, config, args.quiet),
        Some(Command::Merge(m)) => run_merge(m, config),
        Some(Command::Queryvec(q)) => run_queryvec(q, config, args.quiet),
        None => Ok(()),
    }
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up. A config file that exists but does not
/// parse is an error, whether given with `--config` or found in the
/// current directory.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    Ok(Config::load_default()?.unwrap_or_default())
}

/// Read every input, reduce, and append the report to the output file.
fn run_aggregate(args: &AggregateArgs, config: &Config, quiet: bool) -> Result<()> {
    let start_time = Instant::now();
    let output = args.output().context("Missing output file")?;

    let report = build_report(args.inputs(), config)?;

    let content = match config.aggregate.format {
        OutputFormat::Text => report::generate_text_report(&report),
        OutputFormat::Json => report::generate_json_report(&report)?,
    };
    report::append_report(output, &content)?;

    let (up, down, none) = report
        .models
        .iter()
        .map(|m| m.direction_counts())
        .fold((0, 0, 0), |acc, c| (acc.0 + c.0, acc.1 + c.1, acc.2 + c.2));
    let max_trials = report
        .models
        .iter()
        .flat_map(|m| &m.slots)
        .map(|s| s.trials())
        .max()
        .unwrap_or(0);

    info!(
        "Aggregated {} models from {} files in {:.2}s",
        report.models.len(),
        report.metadata.inputs.len(),
        start_time.elapsed().as_secs_f64()
    );

    if !quiet {
        println!("📊 Trial Summary:");
        println!("   Models: {}", report.models.len());
        println!("   Files: {}", report.metadata.inputs.len());
        println!("   Trials per slot: up to {}", max_trials);
        println!("   Slots: ⬆ up {} | ⬇ down {} | ● none {}", up, down, none);
        println!("✅ Report appended to: {}", output.display());
    }

    Ok(())
}

/// Accumulate the inputs in order and reduce them into a report.
fn build_report(inputs: &[std::path::PathBuf], config: &Config) -> Result<TrialReport> {
    let mut table = TrialTable::new(config.aggregate.cluster_count);
    for input in inputs {
        table.accumulate_file(input)?;
    }

    let options = AggregateOptions {
        baseline: config.aggregate.baseline,
        z_score: config.aggregate.z_score,
    };
    debug!(
        "Accumulated {} models from {} files",
        table.models().len(),
        inputs.len()
    );
    let models = analysis::summarize(&table, &options)?;

    Ok(TrialReport {
        metadata: ReportMetadata {
            generated_at: Utc::now(),
            inputs: inputs.iter().map(|p| p.display().to_string()).collect(),
            cluster_count: table.cluster_count(),
            baseline: options.baseline,
            z_score: options.z_score,
            global_max: table.global_max(),
        },
        models,
    })
}

fn run_merge(args: &MergeArgs, config: &Config) -> Result<()> {
    let options = merge::MergeOptions {
        max_fields: config.merge.max_fields,
    };
    merge::merge_block(&args.model, &args.input, &args.output, &options)?;
    Ok(())
}

fn run_queryvec(args: &QueryVecArgs, config: &Config, quiet: bool) -> Result<()> {
    let options = vectors::QueryVecOptions {
        dimension: config.queryvec.dimension,
        skip_unknown_words: config.queryvec.skip_unknown_words,
        show_progress: !quiet,
    };
    let outputs = vectors::QueryVecOutputs {
        mean: args.mean_out.clone(),
        max: args.max_out.clone(),
    };

    let count = vectors::build_query_vectors(&args.vectors, &args.queries, &outputs, &options)?;

    if !quiet {
        println!("✅ Wrote {} query vectors.", count);
    }
    Ok(())
}
