//! Batched lookback/forecast tensors.

use burn::prelude::*;

use crate::error::{CoreError, Result};

/// A batch of windows ready for a forward pass.
///
/// `lookback` is `(B, L, C)` and `forecast` is `(B, F)`; both live on the
/// same device.
#[derive(Debug, Clone)]
pub struct WindowBatch<B: Backend> {
    /// Lookback windows `(B, L, C)`.
    pub lookback: Tensor<B, 3>,
    /// Forecast targets `(B, F)`.
    pub forecast: Tensor<B, 2>,
}

impl<B: Backend> WindowBatch<B> {
    /// Pair lookback and forecast tensors.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ShapeMismatch`] if the batch dimensions differ.
    pub fn new(lookback: Tensor<B, 3>, forecast: Tensor<B, 2>) -> Result<Self> {
        let x_batch = lookback.dims()[0];
        let y_batch = forecast.dims()[0];

        if x_batch != y_batch {
            return Err(CoreError::ShapeMismatch(format!(
                "lookback batch size {} != forecast batch size {}",
                x_batch, y_batch
            )));
        }

        Ok(Self { lookback, forecast })
    }

    /// Number of windows in the batch.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.lookback.dims()[0]
    }

    /// Lookback length `L`.
    #[must_use]
    pub fn lookback_len(&self) -> usize {
        self.lookback.dims()[1]
    }

    /// Channel count `C`.
    #[must_use]
    pub fn n_channels(&self) -> usize {
        self.lookback.dims()[2]
    }

    /// Forecast horizon `F`.
    #[must_use]
    pub fn horizon(&self) -> usize {
        self.forecast.dims()[1]
    }

    /// Get the device.
    pub fn device(&self) -> B::Device {
        self.lookback.device()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InferBackend;

    #[test]
    fn test_batch_dims() {
        let device = Default::default();
        let x = Tensor::<InferBackend, 3>::zeros([4, 10, 2], &device);
        let y = Tensor::<InferBackend, 2>::zeros([4, 5], &device);
        let batch = WindowBatch::new(x, y).unwrap();

        assert_eq!(batch.batch_size(), 4);
        assert_eq!(batch.lookback_len(), 10);
        assert_eq!(batch.n_channels(), 2);
        assert_eq!(batch.horizon(), 5);
    }

    #[test]
    fn test_batch_size_mismatch() {
        let device = Default::default();
        let x = Tensor::<InferBackend, 3>::zeros([4, 10, 1], &device);
        let y = Tensor::<InferBackend, 2>::zeros([3, 5], &device);
        let err = WindowBatch::new(x, y).unwrap_err();
        assert!(matches!(err, CoreError::ShapeMismatch(_)));
    }
}
