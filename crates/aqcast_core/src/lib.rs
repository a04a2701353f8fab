//! # aqcast_core
//!
//! Core types and traits for aqcast forecasting experiments.
//!
//! This crate provides:
//! - [`Seed`] for deterministic shuffling and weight initialization
//! - [`Split`] to tag train/test data flows
//! - [`WindowBatch`] pairing lookback and forecast tensors
//! - [`ForecastModel`], the contract every model variant satisfies
//! - Error types shared by the whole workspace
//!
//! ## Shape Convention
//!
//! Windowed batches follow the convention `(B, L, C)`:
//! - `B`: Batch size (number of windows)
//! - `L`: Lookback length (time steps fed to the model)
//! - `C`: Channels (observed variables)
//!
//! Forecast targets are `(B, F)` where `F` is the forecast horizon.
//!
//! ## Example
//!
//! ```rust,ignore
//! use aqcast_core::{InputLayout, LookbackInput, ModelDims};
//!
//! let dims = ModelDims::new(24, 7, 1);
//! let input = LookbackInput::from_windows(lookback, InputLayout::Flattened);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod batch;
mod error;
mod model_trait;
mod seed;
mod split;

pub use batch::WindowBatch;
pub use error::{CoreError, Result};
pub use model_trait::{ForecastModel, InputLayout, LookbackInput, ModelDims};
pub use seed::Seed;
pub use split::Split;

/// Backend type aliases for convenience.
pub mod backend {
    pub use burn_autodiff::Autodiff;
    pub use burn_ndarray::{NdArray, NdArrayDevice};

    /// CPU backend used for inference and evaluation.
    pub type InferBackend = NdArray<f32>;

    /// CPU backend with automatic differentiation, used for training.
    pub type TrainBackend = Autodiff<InferBackend>;
}
