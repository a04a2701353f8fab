//! # aqcast_data
//!
//! Series loading, scaling, windowing and batching for aqcast.
//!
//! This crate provides:
//! - [`TimeSeries`] with CSV loading via [`CsvOptions`]
//! - [`MinMaxScaler`] fit on the training prefix only, and [`ScaledSeries`]
//! - [`split_train_test`] / [`scale_split`] for the chronological hold-out
//! - [`WindowedDataset`] for indexable (lookback, forecast) windows
//! - [`WindowLoader`] for shuffled mini-batches on a Burn device
//!
//! ## Example
//!
//! ```rust,ignore
//! use aqcast_data::{scale_split, CsvOptions, TimeSeries, WindowLoader, WindowedDataset};
//! use aqcast_core::Seed;
//!
//! let series = TimeSeries::from_csv("data/air.csv", &CsvOptions::new("time", "pm25"))?;
//! let split = scale_split(&series, 168, 24)?;
//!
//! let train = WindowedDataset::new(&split.train, 24, 7, None)?;
//! let loader = WindowLoader::builder(train)
//!     .batch_size(32)
//!     .shuffle(true)
//!     .seed(Seed::new(42))
//!     .build()?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod io;
mod loader;
mod sampler;
mod scaler;
mod series;
mod splits;
mod window;

pub use error::{DataError, Result};
pub use io::{parse_timestamp, CsvOptions};
pub use loader::{WindowLoader, WindowLoaderBuilder, WindowLoaderIter};
pub use sampler::{EpochShuffleSampler, Sampler, SequentialSampler};
pub use scaler::{MinMaxScaler, ScaledSeries};
pub use series::TimeSeries;
pub use splits::{scale_split, split_train_test, ScaledSplit};
pub use window::{Window, WindowedDataset};
