//! Stateless LSTM forecaster.

use aqcast_core::{CoreError, ForecastModel, InputLayout, LookbackInput, ModelDims, Result};
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig, Lstm, LstmConfig};
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::feed_forward::check_dropout;

/// Configuration for [`Recurrent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecurrentConfig {
    /// Hidden dimension.
    pub hidden_size: usize,
    /// Dropout rate applied to the last hidden state.
    pub dropout: f64,
}

impl Default for RecurrentConfig {
    fn default() -> Self {
        Self {
            hidden_size: 128,
            dropout: 0.1,
        }
    }
}

impl RecurrentConfig {
    /// Create a new config.
    pub fn new(hidden_size: usize) -> Self {
        Self {
            hidden_size,
            ..Default::default()
        }
    }

    /// Set dropout rate.
    #[must_use]
    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    /// Check hyperparameters against the window geometry.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] for a zero hidden size or an
    /// invalid dropout rate.
    pub fn validate(&self, dims: &ModelDims) -> Result<()> {
        dims.validate()?;
        if self.hidden_size == 0 {
            return Err(CoreError::config("hidden_size must be > 0"));
        }
        check_dropout(self.dropout)
    }

    /// Initialize the model.
    ///
    /// # Errors
    ///
    /// Returns the validation error, if any.
    pub fn init<B: Backend>(&self, dims: ModelDims, device: &B::Device) -> Result<Recurrent<B>> {
        self.validate(&dims)?;
        Ok(Recurrent {
            lstm: LstmConfig::new(dims.c_in, self.hidden_size, true).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            fc: LinearConfig::new(self.hidden_size, dims.d_out).init(device),
            d_in: dims.d_in,
            d_out: dims.d_out,
            c_in: dims.c_in,
        })
    }
}

/// LSTM forecaster.
///
/// Every batch starts from a zero state; the hidden state at the last
/// lookback step is projected onto the forecast horizon.
#[derive(Module, Debug)]
pub struct Recurrent<B: Backend> {
    lstm: Lstm<B>,
    dropout: Dropout,
    fc: Linear<B>,
    d_in: usize,
    d_out: usize,
    c_in: usize,
}

impl<B: Backend> ForecastModel<B> for Recurrent<B> {
    fn dims(&self) -> ModelDims {
        ModelDims::new(self.d_in, self.d_out, self.c_in)
    }

    fn input_layout(&self) -> InputLayout {
        InputLayout::Sequence
    }

    fn forward(&self, input: LookbackInput<B>) -> Tensor<B, 2> {
        let x = input.into_sequence(&self.dims());
        let [batch, seq_len, _] = x.dims();

        let (output, _) = self.lstm.forward(x, None);
        let [_, _, hidden_dim] = output.dims();

        let last = output
            .slice([0..batch, (seq_len - 1)..seq_len, 0..hidden_dim])
            .reshape([batch, hidden_dim]);

        self.fc.forward(self.dropout.forward(last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn test_recurrent_config() {
        let config = RecurrentConfig::default();
        assert_eq!(config.hidden_size, 128);
        assert!(RecurrentConfig::new(0).validate(&ModelDims::new(10, 5, 1)).is_err());
    }

    #[test]
    fn test_recurrent_output_shape() {
        let device = Default::default();
        let model = RecurrentConfig::new(16)
            .init::<B>(ModelDims::new(12, 3, 2), &device)
            .unwrap();

        let x = Tensor::<B, 3>::zeros([5, 12, 2], &device);
        let out = model
            .predict_batch(LookbackInput::from_windows(x, InputLayout::Sequence))
            .unwrap();
        assert_eq!(out.dims(), [5, 3]);
    }

    #[test]
    fn test_recurrent_rejects_wrong_channels() {
        let device = Default::default();
        let model = RecurrentConfig::new(8)
            .init::<B>(ModelDims::new(12, 3, 2), &device)
            .unwrap();
        let x = Tensor::<B, 3>::zeros([5, 12, 1], &device);
        assert!(matches!(
            model.predict_batch(LookbackInput::Sequence(x)),
            Err(CoreError::ShapeMismatch(_))
        ));
    }
}
