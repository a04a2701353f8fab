//! # aqcast_train
//!
//! Run configuration, training loop, evaluation and artifacts for aqcast.
//!
//! This crate provides:
//! - [`RunConfig`], the typed TOML/JSON experiment description
//! - [`ForecastTrainer`] for mini-batch training of any forecasting model
//! - Epoch observers for progress logging and loss history
//! - Test evaluation with window stitching and forecast metrics
//! - Artifacts: predictions CSV, SVG forecast plot and JSON run report
//!
//! ## Example
//!
//! ```rust,ignore
//! use aqcast_core::backend::TrainBackend;
//! use aqcast_train::{run, ProgressObserver, RunConfig};
//!
//! let config = RunConfig::load("configs/pm25.toml")?;
//! let outcome = run::<TrainBackend>(&config, &Default::default(), &mut ProgressObserver::new())?;
//! println!("{}", outcome.evaluation.metrics.summary());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod artifacts;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod losses;
pub mod metrics;
pub mod observer;
pub mod optimizer;
pub mod runner;
pub mod training;

pub use artifacts::{plot_forecast, write_predictions_csv, write_report, RunReport};
pub use config::{ArtifactsConfig, DatasetConfig, EvalConfig, RunConfig, TrainConfig, WindowConfig};
pub use error::{Result, TrainError};
pub use evaluation::{evaluate, stitch, Evaluation};
pub use losses::{HuberLoss, LossKind, MAELoss, MSELoss};
pub use metrics::{mae, mape, r2_score, rmse, ForecastMetrics};
pub use observer::{EpochObserver, EpochReport, HistoryObserver, ObserverList, ProgressObserver};
pub use optimizer::OptimizerConfig;
pub use runner::{run, run_series, RunOutcome};
pub use training::{ForecastTrainer, ForecastTrainerConfig, TrainingOutput, TrainingState};
