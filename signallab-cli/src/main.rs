//! SignalLab CLI: walk-forward backtests, sweeps, and the train/predict workflow.
//!
//! Commands:
//! - `run`: execute a walk-forward backtest from a TOML config and save artifacts
//! - `sweep`: run the config's threshold grid over one preloaded table
//! - `train`: fit a model on every realized row and save the bundle
//! - `predict`: score the latest (or a given) date with a saved bundle
//!
//! Logging goes through `tracing`; set `RUST_LOG` to override the `info` default.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use signallab_runner::{
    load_feature_table, predict_from_config, run_from_config, save_artifacts, train_from_config,
    BacktestConfig, BacktestResult, ParamSweep, SweepResults,
};

#[derive(Parser)]
#[command(
    name = "signallab",
    about = "SignalLab CLI: walk-forward random forest backtesting"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a walk-forward backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for artifacts. Overrides `[output] dir`.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Run the `[sweep]` grid from a TOML config file.
    Sweep {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Run grid points one at a time.
        #[arg(long, default_value_t = false)]
        serial: bool,

        /// Number of best points to print.
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// Train a model on all realized rows and save it as JSON.
    Train {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Where to write the model bundle.
        #[arg(long, default_value = "models/forest.json")]
        model: PathBuf,
    },
    /// Score one date with a saved model and write filtered predictions.
    Predict {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Model bundle written by `train`.
        #[arg(long, default_value = "models/forest.json")]
        model: PathBuf,

        /// Date to score (YYYY-MM-DD). Defaults to the latest date in the table.
        #[arg(long)]
        date: Option<String>,

        /// Output CSV path.
        #[arg(long, default_value = "predictions.csv")]
        output: PathBuf,
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
        Commands::Run { config, output_dir } => run_backtest_cmd(config, output_dir),
        Commands::Sweep {
            config,
            serial,
            top,
        } => run_sweep_cmd(config, serial, top),
        Commands::Train { config, model } => run_train_cmd(config, model),
        Commands::Predict {
            config,
            model,
            date,
            output,
        } => run_predict_cmd(config, model, date, output),
    }
}

fn load_config(path: &Path) -> Result<BacktestConfig> {
    let config =
        BacktestConfig::from_file(path).with_context(|| format!("loading {}", path.display()))?;
    info!(config = %path.display(), data = %config.data.path.display(), "config loaded");
    Ok(config)
}

fn run_backtest_cmd(config_path: PathBuf, output_dir: Option<PathBuf>) -> Result<()> {
    let config = load_config(&config_path)?;
    let result = run_from_config(&config)?;

    print_summary(&result);

    let output_dir = output_dir.unwrap_or_else(|| config.output.dir.clone());
    let run_dir = save_artifacts(&result, &output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

fn run_sweep_cmd(config_path: PathBuf, serial: bool, top: usize) -> Result<()> {
    let config = load_config(&config_path)?;
    let data = load_feature_table(&config.data.path, &config.data.columns)?;

    let parallel = config.sweep.parallel && !serial;
    let results = ParamSweep::new()
        .with_parallelism(parallel)
        .sweep(&config.sweep, &config.params(), &data)?;

    print_sweep(&results, top);
    Ok(())
}

fn run_train_cmd(config_path: PathBuf, model_path: PathBuf) -> Result<()> {
    let config = load_config(&config_path)?;
    let summary = train_from_config(&config, &model_path)?;

    println!("Model saved to:  {}", summary.model_path.display());
    println!("Training rows:   {}", summary.training_rows);
    println!("Features:        {}", summary.feature_count);
    if let Some(d) = summary.trained_through {
        println!("Trained through: {d}");
    }
    Ok(())
}

fn run_predict_cmd(
    config_path: PathBuf,
    model_path: PathBuf,
    date: Option<String>,
    output: PathBuf,
) -> Result<()> {
    let config = load_config(&config_path)?;
    let date = date
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("--date must be YYYY-MM-DD")?;

    let summary = predict_from_config(&config, &model_path, &output, date)?;

    if let Some(d) = summary.date {
        println!("Date:        {d}");
    }
    println!("Scored rows: {}", summary.scored_rows);
    println!("Selected:    {}", summary.predictions.len());
    for p in &summary.predictions {
        println!(
            "  {:<10} p_up={:.3} close={:.2}",
            p.ticker, p.predicted_probability_up, p.close_price
        );
    }
    println!("Predictions saved to: {}", summary.output_path.display());
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let fp = &result.fingerprint;
    println!();
    println!("=== Backtest Result ===");
    println!("Run:            {}", fp.run_id.short());
    if let (Some(first), Some(last)) = (fp.first_date, fp.last_date) {
        println!("Data:           {first} to {last} ({} rows)", fp.rows);
    }
    println!(
        "Evaluated days: {} ({} warmup)",
        result.days.len(),
        fp.params.warmup_days
    );
    println!("Trades:         {}", result.metrics.trade_count);
    println!("Final Balance:  {:.2}", result.final_balance);
    println!();
    println!("--- Performance ---");
    println!(
        "Total Return:   {:.2}%",
        result.metrics.total_return * 100.0
    );
    println!(
        "Max Drawdown:   {:.2}%",
        result.metrics.max_drawdown * 100.0
    );
    println!("Win Rate:       {:.1}%", result.metrics.win_rate * 100.0);
    println!("Profit Factor:  {:.2}", result.metrics.profit_factor);
    println!("Avg Profit:     {:.2}", result.metrics.avg_profit);
    println!("Best Trade:     {:.2}", result.metrics.best_trade);
    println!("Worst Trade:    {:.2}", result.metrics.worst_trade);
    println!("Trading Days:   {}", result.metrics.days_with_trades);
    if !result.skipped_days.is_empty() {
        println!();
        println!("Skipped {} day(s) with degenerate training data", result.skipped_days.len());
    }
    if !result.data_quality.is_empty() {
        println!("WARNING: {} data quality issue(s), see manifest.json", result.data_quality.len());
    }
    println!();
}

fn print_sweep(results: &SweepResults, top: usize) {
    println!();
    println!("=== Sweep: {} points ===", results.len());
    println!(
        "{:>10} {:>10} {:>10} {:>14} {:>8} {:>9}",
        "confidence", "volatility", "fraction", "final_balance", "trades", "win_rate"
    );
    for p in results.top_n(top) {
        println!(
            "{:>10.3} {:>10.3} {:>10.4} {:>14.2} {:>8} {:>8.1}%",
            p.confidence_threshold,
            p.volatility_threshold,
            p.position_fraction,
            p.final_balance,
            p.metrics.trade_count,
            p.metrics.win_rate * 100.0
        );
    }
    println!();
}
