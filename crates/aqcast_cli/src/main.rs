//! aqcast CLI for training and evaluating air-quality forecasters.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aqcast_core::backend::{NdArrayDevice, TrainBackend};
use aqcast_core::Seed;
use aqcast_data::{scale_split, TimeSeries, WindowedDataset};
use aqcast_train::{HistoryObserver, ObserverList, ProgressObserver, RunConfig};

#[derive(Parser)]
#[command(name = "aqcast")]
#[command(author, version)]
#[command(about = "Train and evaluate time series forecasters on sensor CSV data")]
#[command(long_about = "aqcast: windowed time series forecasting experiments.

EXAMPLES:
  # Validate a configuration without touching the data
  aqcast check-config --config configs/pm25.toml

  # Show series length, channels and window counts
  aqcast inspect --config configs/pm25.toml

  # Train and evaluate, writing the configured artifacts
  aqcast -v train --config configs/pm25.toml

  # Override epochs and seed for a quick run
  aqcast train --config configs/pm25.toml --epochs 5 --seed 7

MODELS (selected by [model] type):
  feed_forward - MLP over the flattened lookback window [default]
  recurrent    - LSTM over the lookback sequence
  patch_tst    - Patch-based transformer encoder")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model and evaluate it on the held-out tail
    Train {
        /// Run configuration (.toml or .json)
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        /// Override the number of training epochs
        #[arg(long, value_name = "N")]
        epochs: Option<usize>,

        /// Override the random seed
        #[arg(long, value_name = "SEED")]
        seed: Option<u64>,
    },
    /// Load and validate a configuration
    CheckConfig {
        /// Run configuration (.toml or .json)
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
    },
    /// Load the dataset and show how it will be split and windowed
    Inspect {
        /// Run configuration (.toml or .json)
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::from_level(log_level))
        .init();

    match cli.command {
        Commands::Train {
            config,
            epochs,
            seed,
        } => handle_train(&config, epochs, seed),
        Commands::CheckConfig { config } => handle_check_config(&config),
        Commands::Inspect { config } => handle_inspect(&config),
    }
}

fn load_config(path: &Path) -> Result<RunConfig> {
    let config = RunConfig::load(path)
        .with_context(|| format!("Failed to load config '{}'", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config '{}'", path.display()))?;
    Ok(config)
}

fn print_config(config: &RunConfig) {
    println!("Configuration:");
    println!("  Dataset:        {}", config.dataset.path.display());
    println!(
        "  Columns:        time='{}', target='{}' ({})",
        config.dataset.timestamp_column,
        config.dataset.target_column,
        if config.use_single_channel {
            "single channel"
        } else {
            "all channels"
        }
    );
    println!(
        "  Window:         lookback={}, forecast={}, test rows={}",
        config.window.lookback_size, config.window.forecast_size, config.window.tst_size
    );
    println!("  Model:          {}", config.model);
    println!(
        "  Training:       epochs={}, batch_size={}, shuffle={}, loss={}, optimizer={} (lr={})",
        config.train.epochs,
        config.train.batch_size,
        config.train.shuffle,
        config.train.loss.name(),
        config.train.optimizer.name(),
        config.train.optimizer.lr()
    );
    println!("  Seed:           {}", config.seed.value());
}

fn handle_check_config(path: &Path) -> Result<()> {
    let config = load_config(path)?;
    print_config(&config);
    println!("\nConfig OK");
    Ok(())
}

fn handle_inspect(path: &Path) -> Result<()> {
    let config = load_config(path)?;
    let series = TimeSeries::from_csv(&config.dataset.path, &config.csv_options())
        .with_context(|| format!("Failed to load dataset '{}'", config.dataset.path.display()))?;

    let Some(target) = series.channel_index(&config.dataset.target_column) else {
        bail!(
            "Target column '{}' not found among channels {:?}",
            config.dataset.target_column,
            series.channel_names()
        );
    };

    println!("Dataset: {}", config.dataset.path.display());
    println!("─────────────────────────────────────────");
    println!("  Rows:           {}", series.len());
    println!("  Channels:       {} {:?}", series.n_channels(), series.channel_names());
    if let (Some(first), Some(last)) = (series.timestamps().first(), series.timestamps().last()) {
        println!("  Time range:     {} .. {}", first, last);
    }

    let window = &config.window;
    let split = scale_split(&series, window.tst_size, window.lookback_size)
        .context("Failed to split dataset")?;
    let train_view = WindowedDataset::new(
        &split.train,
        window.lookback_size,
        window.forecast_size,
        Some(target),
    )?;
    let test_view = WindowedDataset::new(
        &split.test,
        window.lookback_size,
        window.forecast_size,
        Some(target),
    )?;

    println!();
    println!("  Train rows:     {} ({} windows)", split.train.len(), train_view.len());
    println!(
        "  Test rows:      {} incl. {} lookback ({} windows)",
        split.test.len(),
        window.lookback_size,
        test_view.len()
    );
    println!(
        "  Target range:   [{}, {}] (train only)",
        split.scaler.data_min()[target],
        split.scaler.data_max()[target]
    );
    Ok(())
}

fn handle_train(path: &Path, epochs: Option<usize>, seed: Option<u64>) -> Result<()> {
    let mut config = load_config(path)?;
    if let Some(epochs) = epochs {
        config.train.epochs = epochs;
    }
    if let Some(seed) = seed {
        config.seed = Seed::new(seed);
    }

    println!("=== aqcast Training ===\n");
    print_config(&config);
    println!();

    let device = NdArrayDevice::Cpu;
    let mut progress = ProgressObserver::new();
    let mut history = HistoryObserver::new();
    let mut observers = ObserverList::new()
        .with(&mut progress)
        .with(&mut history);

    let outcome = aqcast_train::run::<TrainBackend>(&config, &device, &mut observers)
        .context("Training run failed")?;

    let report = &outcome.report;
    println!("Training:");
    println!(
        "  {} train windows, {} test windows, {} channel(s)",
        report.n_train_windows, report.n_test_windows, report.n_channels
    );
    if let (Some(train), Some(valid)) = (report.train_losses.last(), report.valid_losses.last()) {
        println!("  Final loss:     train={:.6}, valid={:.6}", train, valid);
    }
    if let Some(best) = history.best_epoch() {
        println!(
            "  Best epoch:     {} (valid={:.6})",
            best + 1,
            history.valid_losses()[best]
        );
    }
    println!("  Time:           {:.1}s", report.training_time_secs);

    let m = &report.metrics;
    println!("\nTest metrics ({} steps):", outcome.evaluation.len());
    println!("  MAPE:           {:.4}", m.mape);
    println!("  MAE:            {:.4}", m.mae);
    println!("  RMSE:           {:.4}", m.rmse);
    println!("  R2:             {:.4}", m.r2);

    let artifacts = [
        ("Predictions", &config.artifacts.predictions_csv),
        ("Plot", &config.artifacts.plot),
        ("Report", &config.artifacts.report_json),
    ];
    if artifacts.iter().any(|(_, path)| path.is_some()) {
        println!("\nArtifacts:");
        for (label, path) in artifacts {
            if let Some(path) = path {
                println!("  {:<15} {}", format!("{}:", label), path.display());
            }
        }
    }

    Ok(())
}
