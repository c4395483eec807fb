//! Wallet credit scoring binary.
//!
//! Reads a JSON array of lending-protocol transactions, scores every wallet
//! on a 0-1000 scale and writes the score CSV plus a histogram chart.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use credit_pipeline::{run_file, write_reports, PipelineConfig};
use tracing::{error, info};

/// Score wallets from their on-chain lending history.
#[derive(Parser, Debug)]
#[command(
    name = "credit-score",
    version,
    about = "Score wallets 0-1000 from lending-protocol transactions"
)]
struct Args {
    /// Input JSON file (an array of transaction records)
    input: PathBuf,

    /// Directory for the score CSV and histogram
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Config file (TOML, JSON or YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format ("text" or "json")
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Random forest seed
    #[arg(long)]
    seed: Option<u64>,

    /// Number of trees in the forest
    #[arg(long)]
    trees: Option<usize>,

    /// Also write the per-wallet feature table under this file name
    #[arg(long)]
    features_out: Option<String>,
}

impl Args {
    /// Load the layered config and apply CLI overrides on top.
    fn load_config(&self) -> Result<PipelineConfig> {
        let mut config = PipelineConfig::load(self.config.as_deref())
            .context("failed to load configuration")?;

        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(seed) = self.seed {
            config.model.seed = seed;
        }
        if let Some(trees) = self.trees {
            config.model.n_estimators = trees;
        }
        if let Some(features) = &self.features_out {
            config.output.features_file = Some(features.clone());
        }

        config.validate().context("invalid command-line overrides")?;
        Ok(config)
    }
}

fn main() {
    let args = Args::parse();

    let config = match args.load_config() {
        Ok(c) => c,
        Err(e) => {
            init_logging(args.log_level.as_deref().unwrap_or("info"), &args.log_format);
            error!("{e:#}");
            process::exit(1);
        }
    };

    init_logging(&config.log_level, &args.log_format);
    info!("credit-score v{}", env!("CARGO_PKG_VERSION"));
    info!("input: {:?}", args.input);
    info!("output_dir: {:?}", config.output.dir);
    info!(
        "model: trees={} seed={} cv_folds={}",
        config.model.n_estimators, config.model.seed, config.model.cv_folds
    );

    if let Err(e) = run(&args.input, &config) {
        error!("{e:#}");
        process::exit(1);
    }
}

fn run(input: &Path, config: &PipelineConfig) -> Result<()> {
    let output = run_file(input, config)
        .with_context(|| format!("scoring failed for {}", input.display()))?;
    let written = write_reports(&output, &config.output).context("failed to write reports")?;

    let summary = &output.summary;
    println!("Scored {} wallets from {} records", summary.wallets, summary.records);
    if let Some(cv) = &summary.cv {
        println!(
            "Cross-validation R2: {:.4} (+/- {:.4}) over {} folds",
            cv.mean, cv.std, cv.folds
        );
    }
    for path in written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// Pass `format = "json"` for structured JSON output. Any other value
/// defaults to human-readable text. `RUST_LOG` takes precedence over `level`.
fn init_logging(level: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
