//! # aqcast
//!
//! Windowed time series forecasting experiments for air-quality sensor data.
//!
//! aqcast turns a timestamped CSV into a trained forecaster and a scored
//! test-period forecast:
//!
//! - **Data**: CSV loading, train-only min-max scaling, tail split,
//!   sliding lookback/forecast windows and a shuffling mini-batch loader
//! - **Models**: feed-forward, LSTM and PatchTST variants behind one
//!   forecasting contract
//! - **Training**: configurable loss and optimizer, per-epoch validation,
//!   epoch observers
//! - **Evaluation**: stitched test forecast, MAPE / MAE / RMSE / R2, CSV,
//!   SVG and JSON artifacts
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use aqcast::prelude::*;
//!
//! let config = RunConfig::load("configs/pm25.toml")?;
//! let device = NdArrayDevice::Cpu;
//! let outcome = run::<TrainBackend>(&config, &device, &mut ProgressObserver::new())?;
//! println!("{}", outcome.evaluation.metrics.summary());
//! ```
//!
//! Lower-level pieces compose the same way the runner does:
//!
//! ```rust,ignore
//! use aqcast::prelude::*;
//!
//! let series = TimeSeries::from_csv("station.csv", &CsvOptions::new("time", "pm25"))?;
//! let split = scale_split(&series, 365, 384)?;
//! let train = WindowedDataset::new(&split.train, 384, 7, None)?;
//! let loader = WindowLoader::builder(train).batch_size(128).shuffle(true).build()?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export all crates
pub use aqcast_core as core;
pub use aqcast_data as data;
pub use aqcast_models as models;
pub use aqcast_train as train;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use aqcast::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use aqcast_core::backend::{InferBackend, NdArrayDevice, TrainBackend};
    pub use aqcast_core::{
        CoreError, ForecastModel, InputLayout, LookbackInput, ModelDims, Seed, Split, WindowBatch,
    };

    // Data
    pub use aqcast_data::{
        scale_split, split_train_test, CsvOptions, DataError, MinMaxScaler, ScaledSeries,
        TimeSeries, WindowLoader, WindowedDataset,
    };

    // Models
    pub use aqcast_models::{
        FeedForward, FeedForwardConfig, ModelConfig, PatchTst, PatchTstConfig, Recurrent,
        RecurrentConfig,
    };

    // Training
    pub use aqcast_train::{
        evaluate, run, run_series, EpochObserver, EpochReport, Evaluation, ForecastMetrics,
        ForecastTrainer, ForecastTrainerConfig, HistoryObserver, LossKind, ObserverList,
        OptimizerConfig, ProgressObserver, RunConfig, RunOutcome, TrainError,
    };
}
