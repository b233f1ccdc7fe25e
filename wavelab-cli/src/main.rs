//! WaveLab CLI: evaluate signals, multi-timeframe confirmation, parameter presets.
//!
//! Commands:
//! - `signals`: compute entry/exit flags, tags and stops for OHLCV CSV files
//! - `mtf`: run multi-timeframe confirmation over a 1m CSV
//! - `params`: print a strategy variant's parameters as TOML
//! - `validate`: load a parameters file, validate it, print its fingerprint

mod io;
mod logging;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use wavelab_core::domain::Timeframe;
use wavelab_core::ml::{EvaluationContext, LogisticModel};
use wavelab_core::mtf::compute_mtf;
use wavelab_core::params::{StrategyParameters, StrategyVariant};
use wavelab_core::strategy::evaluate_series;

use logging::{init_logging, LogFormat};

#[derive(Parser)]
#[command(
    name = "wavelab",
    about = "WaveLab CLI: WaveTrend/kernel signal evaluation over OHLCV CSV files"
)]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute per-bar entry/exit flags, tags and stops.
    Signals {
        /// OHLCV CSV files (timestamp,open,high,low,close,volume).
        #[arg(long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Strategy variant: wave_kernel, enhanced_wave, multi_timeframe, ml_feature.
        #[arg(long)]
        preset: Option<String>,

        /// Path to a TOML parameters file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Logistic model weights (JSON) for the ML gate.
        #[arg(long)]
        model: Option<PathBuf>,

        /// Bar timeframe of the input files.
        #[arg(long, default_value = "1m")]
        timeframe: String,

        /// Output directory for `<stem>.signals.csv`.
        #[arg(long, default_value = "signals")]
        output_dir: PathBuf,
    },
    /// Multi-timeframe confirmation over a 1m series.
    Mtf {
        /// OHLCV CSV file on the entry timeframe.
        #[arg(long)]
        input: PathBuf,

        /// Strategy variant. Defaults to multi_timeframe.
        #[arg(long)]
        preset: Option<String>,

        /// Path to a TOML parameters file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for `<stem>.mtf.csv`.
        #[arg(long, default_value = "signals")]
        output_dir: PathBuf,
    },
    /// Print a strategy variant's parameters as TOML.
    Params {
        /// Strategy variant name.
        #[arg(long, default_value = "wave_kernel")]
        preset: String,
    },
    /// Load and validate a parameters file.
    Validate {
        /// Path to a TOML parameters file.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    match cli.command {
        Commands::Signals {
            input,
            preset,
            config,
            model,
            timeframe,
            output_dir,
        } => run_signals(&input, preset, config, model, &timeframe, &output_dir),
        Commands::Mtf {
            input,
            preset,
            config,
            output_dir,
        } => run_mtf(&input, preset, config, &output_dir),
        Commands::Params { preset } => run_params(&preset),
        Commands::Validate { config } => run_validate(&config),
    }
}

/// Resolve `--config` / `--preset`, falling back to `default`.
fn load_params(
    config: Option<PathBuf>,
    preset: Option<String>,
    default: StrategyVariant,
) -> Result<StrategyParameters> {
    match (config, preset) {
        (Some(_), Some(_)) => bail!("--config and --preset are mutually exclusive"),
        (Some(path), None) => StrategyParameters::from_file(&path)
            .with_context(|| format!("failed to load parameters from {}", path.display())),
        (None, Some(name)) => Ok(name.parse::<StrategyVariant>()?.parameters()),
        (None, None) => Ok(default.parameters()),
    }
}

fn load_context(model: Option<PathBuf>, params: &StrategyParameters) -> Result<EvaluationContext> {
    let Some(path) = model else {
        if params.ml.enabled {
            warn!("ML gate enabled but no --model given; entries are not gated");
        }
        return Ok(EvaluationContext::new());
    };
    let model = LogisticModel::from_file(&path)
        .with_context(|| format!("failed to load model from {}", path.display()))?;
    if !params.ml.enabled {
        warn!(model = %path.display(), "model loaded but ml.enabled is false; it will not be consulted");
    }
    Ok(EvaluationContext::with_model(Arc::new(model)))
}

fn write_output(output_dir: &Path, name: &str, contents: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    let path = output_dir.join(name);
    std::fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

struct FileSummary {
    path: PathBuf,
    bars: usize,
    entries: usize,
    exits: usize,
    params_hash: String,
}

fn run_signals(
    inputs: &[PathBuf],
    preset: Option<String>,
    config: Option<PathBuf>,
    model: Option<PathBuf>,
    timeframe: &str,
    output_dir: &Path,
) -> Result<()> {
    let params = load_params(config, preset, StrategyVariant::default())?;
    let ctx = load_context(model, &params)?;
    let timeframe: Timeframe = timeframe.parse()?;
    info!(variant = %params.variant, files = inputs.len(), %timeframe, "evaluating signals");

    let summaries = inputs
        .par_iter()
        .map(|input| -> Result<FileSummary> {
            let series = io::load_series(input, timeframe)?;
            let signals = evaluate_series(&series, &params, &ctx)
                .with_context(|| format!("evaluation failed for {}", input.display()))?;
            let csv = io::signals_csv(&series, &signals)?;
            let path = write_output(
                output_dir,
                &format!("{}.signals.csv", io::file_stem(input)),
                &csv,
            )?;
            Ok(FileSummary {
                path,
                bars: series.len(),
                entries: signals.entries.count(),
                exits: signals.exits.count(),
                params_hash: signals.fingerprint.params_hash.short().to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    println!("{:<40} {:>8} {:>8} {:>8}  {}", "Output", "Bars", "Entries", "Exits", "Params");
    println!("{}", "-".repeat(82));
    for s in &summaries {
        println!(
            "{:<40} {:>8} {:>8} {:>8}  {}",
            s.path.display().to_string(),
            s.bars,
            s.entries,
            s.exits,
            s.params_hash
        );
    }
    Ok(())
}

fn run_mtf(
    input: &Path,
    preset: Option<String>,
    config: Option<PathBuf>,
    output_dir: &Path,
) -> Result<()> {
    let params = load_params(config, preset, StrategyVariant::MultiTimeframe)?;
    let series = io::load_series(input, params.mtf.entry)?;
    let evaluations = compute_mtf(&series, &params)
        .with_context(|| format!("multi-timeframe evaluation failed for {}", input.display()))?;

    let entries = evaluations.iter().filter(|e| e.enter_long).count();
    let exits = evaluations.iter().filter(|e| e.exit_long).count();
    let defined = evaluations.iter().filter(|e| e.defined).count();
    let path = write_output(
        output_dir,
        &format!("{}.mtf.csv", io::file_stem(input)),
        &io::mtf_csv(&evaluations)?,
    )?;

    info!(bars = series.len(), defined, entries, exits, "multi-timeframe evaluation done");
    println!("Bars:     {}", series.len());
    println!("Defined:  {defined}");
    println!("Entries:  {entries}");
    println!("Exits:    {exits}");
    println!("Written:  {}", path.display());
    Ok(())
}

fn run_params(preset: &str) -> Result<()> {
    let params = preset.parse::<StrategyVariant>()?.parameters();
    print!("{}", params.to_toml()?);
    Ok(())
}

fn run_validate(config: &Path) -> Result<()> {
    let params = StrategyParameters::from_file(config)
        .with_context(|| format!("invalid parameters in {}", config.display()))?;
    let fingerprint = params.fingerprint()?;
    println!("OK: {} ({})", config.display(), params.variant);
    println!("Fingerprint: {fingerprint}");
    Ok(())
}
