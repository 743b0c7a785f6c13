//! Command-line interface for the 0DTE backtester.
//!
//! `run` executes a full simulation from bar and signal CSVs and writes
//! the trade journal; `verify` structurally checks the inputs without
//! simulating, useful as a fast preflight in data pipelines.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use zerodte_backtest::{load_bars, load_signals, BacktestConfig, BacktestEngine};

#[derive(Parser)]
#[command(name = "zerodte-backtest")]
#[command(about = "Signal-driven 0DTE options backtesting engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a backtest and write the trade journal
    Run {
        /// Bar CSV (timestamp,open,high,low,close)
        #[arg(long)]
        bars: PathBuf,

        /// Signal CSV (signal column, one {-1,0,1} row per bar)
        #[arg(long)]
        signals: PathBuf,

        /// Optional TOML configuration; defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for the trade journal
        #[arg(long, default_value = "results")]
        output: PathBuf,

        /// Symbol label used in the report and output filename
        #[arg(long, default_value = "SPY")]
        symbol: String,

        /// Override the configured starting balance
        #[arg(long)]
        initial_balance: Option<rust_decimal::Decimal>,
    },
    /// Validate bar and signal files without simulating
    Verify {
        #[arg(long)]
        bars: PathBuf,

        #[arg(long)]
        signals: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            bars,
            signals,
            config,
            output,
            symbol,
            initial_balance,
        } => run(bars, signals, config, output, &symbol, initial_balance),
        Commands::Verify { bars, signals } => verify(bars, signals),
    }
}

fn run(
    bars_path: PathBuf,
    signals_path: PathBuf,
    config_path: Option<PathBuf>,
    output: PathBuf,
    symbol: &str,
    initial_balance: Option<rust_decimal::Decimal>,
) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => BacktestConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => BacktestConfig::default(),
    };
    if let Some(balance) = initial_balance {
        config.initial_balance = balance;
    }

    let bars = load_bars(&bars_path)
        .with_context(|| format!("loading bars from {}", bars_path.display()))?;
    let signals = load_signals(&signals_path)
        .with_context(|| format!("loading signals from {}", signals_path.display()))?;
    info!(bars = bars.len(), signals = signals.len(), "inputs loaded");

    let result = BacktestEngine::new(config, symbol).run(&bars, &signals)?;

    std::fs::create_dir_all(&output)
        .with_context(|| format!("creating output directory {}", output.display()))?;
    let journal_path = output.join(format!("{}_trade_journal.csv", symbol));
    result
        .journal
        .write_csv(&journal_path)
        .with_context(|| format!("writing journal to {}", journal_path.display()))?;
    info!(path = %journal_path.display(), trades = result.journal.len(), "journal written");

    println!("{}", result.summary().report());
    Ok(())
}

fn verify(bars_path: PathBuf, signals_path: PathBuf) -> Result<()> {
    let bars = load_bars(&bars_path)
        .with_context(|| format!("loading bars from {}", bars_path.display()))?;
    let signals = load_signals(&signals_path)
        .with_context(|| format!("loading signals from {}", signals_path.display()))?;

    BacktestEngine::validate_series(&bars, &signals)?;
    println!(
        "OK: {} bars and {} signals, aligned and well-formed",
        bars.len(),
        signals.len()
    );
    Ok(())
}
