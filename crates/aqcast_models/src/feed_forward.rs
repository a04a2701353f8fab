//! Feed-forward forecaster over the flattened lookback window.

use aqcast_core::{CoreError, ForecastModel, InputLayout, LookbackInput, ModelDims, Result};
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig, Relu};
use burn::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for [`FeedForward`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedForwardConfig {
    /// Hidden layer sizes.
    pub hidden_sizes: Vec<usize>,
    /// Dropout rate.
    pub dropout: f64,
}

impl Default for FeedForwardConfig {
    fn default() -> Self {
        Self {
            hidden_sizes: vec![512],
            dropout: 0.1,
        }
    }
}

impl FeedForwardConfig {
    /// Create a new config.
    pub fn new(hidden_sizes: Vec<usize>) -> Self {
        Self {
            hidden_sizes,
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
    /// Returns [`CoreError::Configuration`] for zero dimensions, a zero-width
    /// hidden layer or a dropout outside `[0, 1)`.
    pub fn validate(&self, dims: &ModelDims) -> Result<()> {
        dims.validate()?;
        if self.hidden_sizes.contains(&0) {
            return Err(CoreError::config("hidden layer sizes must be > 0"));
        }
        check_dropout(self.dropout)
    }

    /// Initialize the model.
    ///
    /// # Errors
    ///
    /// Returns the validation error, if any.
    pub fn init<B: Backend>(&self, dims: ModelDims, device: &B::Device) -> Result<FeedForward<B>> {
        self.validate(&dims)?;
        Ok(FeedForward::new(self, dims, device))
    }
}

pub(crate) fn check_dropout(dropout: f64) -> Result<()> {
    if !(0.0..1.0).contains(&dropout) {
        return Err(CoreError::config(format!(
            "dropout must be in [0, 1), got {}",
            dropout
        )));
    }
    Ok(())
}

#[derive(Module, Debug)]
struct DenseBlock<B: Backend> {
    linear: Linear<B>,
    dropout: Dropout,
}

impl<B: Backend> DenseBlock<B> {
    fn new(in_features: usize, out_features: usize, dropout: f64, device: &B::Device) -> Self {
        Self {
            linear: LinearConfig::new(in_features, out_features).init(device),
            dropout: DropoutConfig::new(dropout).init(),
        }
    }

    fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let out = Relu::new().forward(self.linear.forward(x));
        self.dropout.forward(out)
    }
}

/// Multilayer perceptron forecaster.
///
/// # Architecture
///
/// ```text
/// Input (B, L * C)
///       |
///       +---> [Linear + ReLU + Dropout] x N
///       |
///       +---> [Linear] -> Output (B, F)
/// ```
#[derive(Module, Debug)]
pub struct FeedForward<B: Backend> {
    blocks: Vec<DenseBlock<B>>,
    head: Linear<B>,
    d_in: usize,
    d_out: usize,
    c_in: usize,
}

impl<B: Backend> FeedForward<B> {
    fn new(config: &FeedForwardConfig, dims: ModelDims, device: &B::Device) -> Self {
        let mut blocks = Vec::with_capacity(config.hidden_sizes.len());
        let mut prev_size = dims.input_width();
        for &hidden_size in &config.hidden_sizes {
            blocks.push(DenseBlock::new(prev_size, hidden_size, config.dropout, device));
            prev_size = hidden_size;
        }
        let head = LinearConfig::new(prev_size, dims.d_out).init(device);

        Self {
            blocks,
            head,
            d_in: dims.d_in,
            d_out: dims.d_out,
            c_in: dims.c_in,
        }
    }
}

impl<B: Backend> ForecastModel<B> for FeedForward<B> {
    fn dims(&self) -> ModelDims {
        ModelDims::new(self.d_in, self.d_out, self.c_in)
    }

    fn input_layout(&self) -> InputLayout {
        InputLayout::Flattened
    }

    fn forward(&self, input: LookbackInput<B>) -> Tensor<B, 2> {
        let out = self
            .blocks
            .iter()
            .fold(input.into_flat(), |out, block| block.forward(out));
        self.head.forward(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn test_feed_forward_config_default() {
        let config = FeedForwardConfig::default();
        assert_eq!(config.hidden_sizes, vec![512]);
        assert_eq!(config.dropout, 0.1);
    }

    #[test]
    fn test_feed_forward_output_shape() {
        let device = Default::default();
        let dims = ModelDims::new(10, 5, 2);
        let model = FeedForwardConfig::new(vec![16, 8])
            .init::<B>(dims, &device)
            .unwrap();

        let x = Tensor::<B, 3>::zeros([4, 10, 2], &device);
        let input = LookbackInput::from_windows(x, model.input_layout());
        let out = model.predict_batch(input).unwrap();
        assert_eq!(out.dims(), [4, 5]);
    }

    #[test]
    fn test_feed_forward_rejects_wrong_width() {
        let device = Default::default();
        let model = FeedForwardConfig::default()
            .init::<B>(ModelDims::new(10, 5, 1), &device)
            .unwrap();
        let input = LookbackInput::Flat(Tensor::<B, 2>::zeros([4, 12], &device));
        assert!(matches!(
            model.predict_batch(input),
            Err(CoreError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_feed_forward_invalid_config() {
        let device = Default::default();
        let dims = ModelDims::new(10, 5, 1);
        assert!(FeedForwardConfig::new(vec![0]).init::<B>(dims, &device).is_err());
        assert!(FeedForwardConfig::default()
            .with_dropout(1.0)
            .init::<B>(dims, &device)
            .is_err());
    }
}
