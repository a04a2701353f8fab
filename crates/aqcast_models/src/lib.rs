//! # aqcast_models
//!
//! Forecasting models for aqcast.
//!
//! Every model implements [`ForecastModel`](aqcast_core::ForecastModel) and
//! maps a batch of lookback windows to a `(batch, F)` forecast:
//!
//! - [`FeedForward`] - MLP over the flattened `(batch, L * C)` window
//! - [`Recurrent`] - stateless LSTM over the `(batch, L, C)` sequence
//! - [`PatchTst`] - channel-independent patch transformer
//!
//! [`ModelConfig`] selects one of them from configuration.
//!
//! ## Example
//!
//! ```rust,ignore
//! use aqcast_core::ModelDims;
//! use aqcast_models::RecurrentConfig;
//!
//! let model = RecurrentConfig::new(64).init::<B>(ModelDims::new(24, 7, 1), &device)?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod feed_forward;
mod patch_tst;
mod recurrent;

pub use config::ModelConfig;
pub use feed_forward::{FeedForward, FeedForwardConfig};
pub use patch_tst::{PatchTst, PatchTstConfig};
pub use recurrent::{Recurrent, RecurrentConfig};
