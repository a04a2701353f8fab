//! PatchTST forecaster.
//!
//! Based on "A Time Series is Worth 64 Words: Long-term Forecasting with
//! Transformers" by Nie et al. (2023). Each channel is cut into patches
//! independently, patches are embedded and run through a transformer
//! encoder, and a flatten head maps every channel's encoding to the horizon.

use aqcast_core::{CoreError, ForecastModel, InputLayout, LookbackInput, ModelDims, Result};
use burn::module::Param;
use burn::nn::{
    attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
    Dropout, DropoutConfig, LayerNorm, LayerNormConfig, Linear, LinearConfig, Relu,
};
use burn::prelude::*;
use burn::tensor::Distribution;
use serde::{Deserialize, Serialize};

use crate::feed_forward::check_dropout;

/// Configuration for [`PatchTst`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatchTstConfig {
    /// Patch length.
    pub patch_len: usize,
    /// Stride between patches.
    pub stride: usize,
    /// Model dimension.
    pub d_model: usize,
    /// Number of attention heads.
    pub n_heads: usize,
    /// Number of transformer layers.
    pub n_layers: usize,
    /// Feedforward dimension.
    pub d_ff: usize,
    /// Dropout rate.
    pub dropout: f64,
}

impl Default for PatchTstConfig {
    fn default() -> Self {
        Self {
            patch_len: 16,
            stride: 16,
            d_model: 128,
            n_heads: 8,
            n_layers: 3,
            d_ff: 256,
            dropout: 0.1,
        }
    }
}

impl PatchTstConfig {
    /// Set patch length and stride.
    #[must_use]
    pub fn with_patches(mut self, patch_len: usize, stride: usize) -> Self {
        self.patch_len = patch_len;
        self.stride = stride;
        self
    }

    /// Set model dimension, head count and layer count.
    #[must_use]
    pub fn with_encoder(mut self, d_model: usize, n_heads: usize, n_layers: usize) -> Self {
        self.d_model = d_model;
        self.n_heads = n_heads;
        self.n_layers = n_layers;
        self
    }

    /// Set feedforward dimension.
    #[must_use]
    pub fn with_d_ff(mut self, d_ff: usize) -> Self {
        self.d_ff = d_ff;
        self
    }

    /// Set dropout rate.
    #[must_use]
    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    /// Number of patches cut from a lookback of length `seq_len`.
    ///
    /// Returns `None` when no full patch fits or the stride is zero.
    #[must_use]
    pub fn n_patches(&self, seq_len: usize) -> Option<usize> {
        if self.stride == 0 || self.patch_len == 0 || self.patch_len > seq_len {
            return None;
        }
        Some((seq_len - self.patch_len) / self.stride + 1)
    }

    /// Check the patch geometry and encoder shape.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] for an invalid geometry.
    pub fn validate(&self, dims: &ModelDims) -> Result<()> {
        dims.validate()?;
        if self.n_patches(dims.d_in).is_none() {
            return Err(CoreError::config(format!(
                "patch_len {} / stride {} do not fit lookback {}",
                self.patch_len, self.stride, dims.d_in
            )));
        }
        if self.d_model == 0 || self.n_heads == 0 || self.d_model % self.n_heads != 0 {
            return Err(CoreError::config(format!(
                "d_model {} must be a positive multiple of n_heads {}",
                self.d_model, self.n_heads
            )));
        }
        if self.d_ff == 0 {
            return Err(CoreError::config("d_ff must be > 0"));
        }
        check_dropout(self.dropout)
    }

    /// Initialize the model.
    ///
    /// # Errors
    ///
    /// Returns the validation error, if any.
    pub fn init<B: Backend>(&self, dims: ModelDims, device: &B::Device) -> Result<PatchTst<B>> {
        self.validate(&dims)?;
        let n_patches = self
            .n_patches(dims.d_in)
            .ok_or_else(|| CoreError::config("no patch fits the lookback"))?;
        Ok(PatchTst::new(self, dims, n_patches, device))
    }
}

/// Transformer encoder layer.
#[derive(Module, Debug)]
struct EncoderLayer<B: Backend> {
    attention: MultiHeadAttention<B>,
    norm1: LayerNorm<B>,
    ff_linear1: Linear<B>,
    ff_linear2: Linear<B>,
    norm2: LayerNorm<B>,
    dropout: Dropout,
}

impl<B: Backend> EncoderLayer<B> {
    fn new(d_model: usize, n_heads: usize, d_ff: usize, dropout: f64, device: &B::Device) -> Self {
        Self {
            attention: MultiHeadAttentionConfig::new(d_model, n_heads)
                .with_dropout(dropout)
                .init(device),
            norm1: LayerNormConfig::new(d_model).init(device),
            ff_linear1: LinearConfig::new(d_model, d_ff).init(device),
            ff_linear2: LinearConfig::new(d_ff, d_model).init(device),
            norm2: LayerNormConfig::new(d_model).init(device),
            dropout: DropoutConfig::new(dropout).init(),
        }
    }

    fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        // Self-attention with residual
        let attn_out = self.attention.forward(MhaInput::self_attn(x.clone())).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_out));

        // Feedforward with residual
        let ff_out = Relu::new().forward(self.ff_linear1.forward(x.clone()));
        let ff_out = self.ff_linear2.forward(self.dropout.forward(ff_out));

        self.norm2.forward(x + self.dropout.forward(ff_out))
    }
}

/// Patch-based transformer forecaster.
///
/// # Architecture
///
/// ```text
/// Input (B, L, C)
///       |
///       +---> [Patch per channel] -> (B * C, P, patch_len)
///       |
///       +---> [Linear embed + positional embedding] -> (B * C, P, d_model)
///       |
///       +---> [Encoder layer] x n_layers
///       |
///       +---> [Flatten] -> (B, C * P * d_model) -> [Linear] -> Output (B, F)
/// ```
#[derive(Module, Debug)]
pub struct PatchTst<B: Backend> {
    patch_embed: Linear<B>,
    pos_embedding: Param<Tensor<B, 3>>,
    encoder_layers: Vec<EncoderLayer<B>>,
    head: Linear<B>,
    dropout: Dropout,
    patch_len: usize,
    stride: usize,
    n_patches: usize,
    d_in: usize,
    d_out: usize,
    c_in: usize,
}

impl<B: Backend> PatchTst<B> {
    fn new(config: &PatchTstConfig, dims: ModelDims, n_patches: usize, device: &B::Device) -> Self {
        let encoder_layers = (0..config.n_layers)
            .map(|_| {
                EncoderLayer::new(
                    config.d_model,
                    config.n_heads,
                    config.d_ff,
                    config.dropout,
                    device,
                )
            })
            .collect();

        let pos_embedding = Tensor::random(
            [1, n_patches, config.d_model],
            Distribution::Normal(0.0, 0.02),
            device,
        );
        let head_in = dims.c_in * n_patches * config.d_model;

        Self {
            patch_embed: LinearConfig::new(config.patch_len, config.d_model).init(device),
            pos_embedding: Param::from_tensor(pos_embedding),
            encoder_layers,
            head: LinearConfig::new(head_in, dims.d_out).init(device),
            dropout: DropoutConfig::new(config.dropout).init(),
            patch_len: config.patch_len,
            stride: config.stride,
            n_patches,
            d_in: dims.d_in,
            d_out: dims.d_out,
            c_in: dims.c_in,
        }
    }

    /// Cut `(B, L, C)` into `(B * C, P, patch_len)`.
    fn patchify(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, _, channels] = x.dims();
        let x = x.swap_dims(1, 2);

        let patches: Vec<Tensor<B, 3>> = (0..self.n_patches)
            .map(|p| {
                let start = p * self.stride;
                x.clone()
                    .slice([0..batch, 0..channels, start..start + self.patch_len])
            })
            .collect();

        Tensor::stack::<4>(patches, 2).reshape([batch * channels, self.n_patches, self.patch_len])
    }
}

impl<B: Backend> ForecastModel<B> for PatchTst<B> {
    fn dims(&self) -> ModelDims {
        ModelDims::new(self.d_in, self.d_out, self.c_in)
    }

    fn input_layout(&self) -> InputLayout {
        InputLayout::Sequence
    }

    fn forward(&self, input: LookbackInput<B>) -> Tensor<B, 2> {
        let x = input.into_sequence(&self.dims());
        let [batch, _, channels] = x.dims();

        let patches = self.patchify(x);
        let embedded = self.patch_embed.forward(patches) + self.pos_embedding.val();
        let mut out = self.dropout.forward(embedded);
        for layer in &self.encoder_layers {
            out = layer.forward(out);
        }

        let [_, n_patches, d_model] = out.dims();
        let out = out.reshape([batch, channels * n_patches * d_model]);
        self.head.forward(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type B = NdArray<f32>;

    fn small_config() -> PatchTstConfig {
        PatchTstConfig::default()
            .with_patches(4, 2)
            .with_encoder(16, 4, 1)
            .with_d_ff(32)
    }

    #[test]
    fn test_n_patches() {
        let config = PatchTstConfig::default();
        // 24 non-overlapping patches of 16
        assert_eq!(config.n_patches(384), Some(24));
        assert_eq!(small_config().n_patches(12), Some(5));
        assert_eq!(small_config().n_patches(3), None);
        assert_eq!(small_config().with_patches(4, 0).n_patches(12), None);
    }

    #[test]
    fn test_invalid_geometry() {
        let device = Default::default();
        let dims = ModelDims::new(12, 3, 1);
        let too_long = small_config().with_patches(16, 8);
        assert!(matches!(
            too_long.init::<B>(dims, &device),
            Err(CoreError::Configuration(_))
        ));
        let bad_heads = small_config().with_encoder(10, 4, 1);
        assert!(bad_heads.validate(&dims).is_err());
    }

    #[test]
    fn test_patchify_values() {
        let device = Default::default();
        let model = small_config().init::<B>(ModelDims::new(8, 2, 1), &device).unwrap();
        let data: Vec<f32> = (0..8).map(|v| v as f32).collect();
        let x = Tensor::<B, 3>::from_data(TensorData::new(data, [1, 8, 1]), &device);

        let patches = model.patchify(x);
        assert_eq!(patches.dims(), [1, 3, 4]);
        let values = patches.into_data().to_vec::<f32>().unwrap();
        assert_eq!(
            values,
            vec![0.0, 1.0, 2.0, 3.0, 2.0, 3.0, 4.0, 5.0, 4.0, 5.0, 6.0, 7.0]
        );
    }

    #[test]
    fn test_patch_tst_output_shape() {
        let device = Default::default();
        let model = small_config().init::<B>(ModelDims::new(12, 3, 2), &device).unwrap();
        let x = Tensor::<B, 3>::random([4, 12, 2], Distribution::Default, &device);
        let out = model.predict_batch(LookbackInput::Sequence(x)).unwrap();
        assert_eq!(out.dims(), [4, 3]);
    }
}
