//! The model adapter contract.
//!
//! Every model variant takes a batch of lookback windows and returns a batch
//! of forecasts. The training loop only ever talks to models through
//! [`ForecastModel`], so swapping architectures never touches the loop.

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Construction dimensions declared by a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDims {
    /// Lookback length `L`.
    pub d_in: usize,
    /// Forecast horizon `F`.
    pub d_out: usize,
    /// Channel count `C`.
    pub c_in: usize,
}

impl ModelDims {
    /// Create model dimensions.
    #[must_use]
    pub const fn new(d_in: usize, d_out: usize, c_in: usize) -> Self {
        Self { d_in, d_out, c_in }
    }

    /// Width of a flattened lookback row (`L * C`).
    #[must_use]
    pub const fn input_width(&self) -> usize {
        self.d_in * self.c_in
    }

    /// Check that no dimension is zero.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] naming the first zero dimension.
    pub fn validate(&self) -> Result<()> {
        if self.d_in == 0 {
            return Err(CoreError::config("lookback length d_in must be > 0"));
        }
        if self.d_out == 0 {
            return Err(CoreError::config("forecast horizon d_out must be > 0"));
        }
        if self.c_in == 0 {
            return Err(CoreError::config("channel count c_in must be > 0"));
        }
        Ok(())
    }
}

/// Input shape a model declares for its lookback batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputLayout {
    /// `(batch, L * C)`, time-major then channel.
    Flattened,
    /// `(batch, L, C)`.
    Sequence,
}

/// A lookback batch already shaped for a model.
#[derive(Debug, Clone)]
pub enum LookbackInput<B: Backend> {
    /// Flattened `(batch, L * C)`.
    Flat(Tensor<B, 2>),
    /// Shaped `(batch, L, C)`.
    Sequence(Tensor<B, 3>),
}

impl<B: Backend> LookbackInput<B> {
    /// Reshape a `(batch, L, C)` lookback batch into the given layout.
    pub fn from_windows(lookback: Tensor<B, 3>, layout: InputLayout) -> Self {
        match layout {
            InputLayout::Flattened => Self::Flat(lookback.flatten(1, 2)),
            InputLayout::Sequence => Self::Sequence(lookback),
        }
    }

    /// Layout of this input.
    #[must_use]
    pub fn layout(&self) -> InputLayout {
        match self {
            Self::Flat(_) => InputLayout::Flattened,
            Self::Sequence(_) => InputLayout::Sequence,
        }
    }

    /// Flattened `(batch, L * C)` view of the input.
    pub fn into_flat(self) -> Tensor<B, 2> {
        match self {
            Self::Flat(x) => x,
            Self::Sequence(x) => x.flatten(1, 2),
        }
    }

    /// `(batch, L, C)` view of the input, unflattening with `dims` if needed.
    pub fn into_sequence(self, dims: &ModelDims) -> Tensor<B, 3> {
        match self {
            Self::Sequence(x) => x,
            Self::Flat(x) => {
                let [batch, _] = x.dims();
                x.reshape([batch, dims.d_in, dims.c_in])
            }
        }
    }

    /// Number of windows in the batch.
    pub fn batch_size(&self) -> usize {
        match self {
            Self::Flat(x) => x.dims()[0],
            Self::Sequence(x) => x.dims()[0],
        }
    }

    /// Check this input against declared dimensions and layout.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ShapeMismatch`] on any disagreement.
    pub fn check(&self, dims: &ModelDims, layout: InputLayout) -> Result<()> {
        if self.layout() != layout {
            return Err(CoreError::shape(format!(
                "model expects {:?} input, got {:?}",
                layout,
                self.layout()
            )));
        }
        match self {
            Self::Flat(x) => {
                let [_, width] = x.dims();
                if width != dims.input_width() {
                    return Err(CoreError::shape(format!(
                        "flattened input width {} != d_in * c_in = {}",
                        width,
                        dims.input_width()
                    )));
                }
            }
            Self::Sequence(x) => {
                let [_, len, channels] = x.dims();
                if len != dims.d_in || channels != dims.c_in {
                    return Err(CoreError::shape(format!(
                        "sequence input (_, {}, {}) != declared (_, {}, {})",
                        len, channels, dims.d_in, dims.c_in
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Contract satisfied by every forecasting model variant.
///
/// Implementors provide [`forward`](ForecastModel::forward); callers should
/// go through [`predict_batch`](ForecastModel::predict_batch), which checks
/// the input against the declared dimensions before and after the pass.
pub trait ForecastModel<B: Backend>: Module<B> + Clone + Send {
    /// Declared construction dimensions.
    fn dims(&self) -> ModelDims;

    /// Input layout this model consumes.
    fn input_layout(&self) -> InputLayout;

    /// Raw forward pass, `(batch, F)` out. Input is assumed to be checked.
    fn forward(&self, input: LookbackInput<B>) -> Tensor<B, 2>;

    /// Checked forward pass.
    ///
    /// # Arguments
    ///
    /// * `input` - Lookback batch in this model's [`InputLayout`]
    ///
    /// # Returns
    ///
    /// Forecast tensor of shape `(batch, F)`
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ShapeMismatch`] if the input or output shape
    /// disagrees with [`dims`](ForecastModel::dims).
    fn predict_batch(&self, input: LookbackInput<B>) -> Result<Tensor<B, 2>> {
        let dims = self.dims();
        input.check(&dims, self.input_layout())?;
        let batch = input.batch_size();

        let output = self.forward(input);
        let [out_batch, horizon] = output.dims();
        if out_batch != batch || horizon != dims.d_out {
            return Err(CoreError::shape(format!(
                "model output ({}, {}) != expected ({}, {})",
                out_batch, horizon, batch, dims.d_out
            )));
        }
        Ok(output)
    }
}
