//! Evaluation on the held-out windows and forecast stitching.

use aqcast_core::{CoreError, ForecastModel, LookbackInput};
use aqcast_data::{MinMaxScaler, WindowedDataset};
use burn::prelude::*;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::metrics::ForecastMetrics;

/// Reconstruct one continuous series from overlapping forecast windows.
///
/// `windows` is `(K, F)` with window `k` starting one step after window
/// `k - 1`. The result takes the first step of every window followed by the
/// remaining steps of the last window, `K + F - 1` values in total. A single
/// window is returned whole.
pub fn stitch(windows: ArrayView2<'_, f32>) -> Vec<f32> {
    let (k, f) = windows.dim();
    if k == 0 || f == 0 {
        return Vec::new();
    }

    let mut series = Vec::with_capacity(k + f - 1);
    series.extend(windows.column(0).iter().copied());
    series.extend(windows.row(k - 1).iter().skip(1).copied());
    series
}

/// Stitched predictions and ground truth in original units, with metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Stitched predicted series.
    pub predicted: Vec<f32>,
    /// Stitched actual series.
    pub actual: Vec<f32>,
    /// Error metrics of `predicted` against `actual`.
    pub metrics: ForecastMetrics,
}

impl Evaluation {
    /// Number of stitched steps.
    pub fn len(&self) -> usize {
        self.actual.len()
    }

    /// Check if nothing was evaluated.
    pub fn is_empty(&self) -> bool {
        self.actual.is_empty()
    }
}

fn to_array<B: Backend>(tensor: Tensor<B, 2>) -> Result<Array2<f32>> {
    let [rows, cols] = tensor.dims();
    let values = tensor
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| CoreError::TensorData(format!("{:?}", e)))?;
    Array2::from_shape_vec((rows, cols), values)
        .map_err(|e| CoreError::TensorData(e.to_string()).into())
}

fn inverse_rows(scaler: &MinMaxScaler, scaled: &Array2<f32>, channel: usize) -> Result<Array2<f32>> {
    let flat: Vec<f32> = scaled.iter().copied().collect();
    let restored = scaler.inverse_channel(&flat, channel)?;
    Array2::from_shape_vec(scaled.dim(), restored)
        .map_err(|e| CoreError::TensorData(e.to_string()).into())
}

/// Evaluate a trained model on every test window at once.
///
/// All windows go through the model as a single batch; predictions and
/// targets are inverse-scaled with the target channel's training parameters
/// and stitched into one series each before scoring.
///
/// # Arguments
///
/// * `model` - Trained model on an inference backend
/// * `test_view` - Windowed test region
/// * `scaler` - Scaler fit on the training prefix
/// * `device` - Device to run on
///
/// # Errors
///
/// Returns an error for an empty test view, a shape mismatch or a metric
/// that is undefined for the data (e.g. MAPE with a zero actual value).
pub fn evaluate<B, M>(
    model: &M,
    test_view: &WindowedDataset,
    scaler: &MinMaxScaler,
    device: &B::Device,
) -> Result<Evaluation>
where
    B: Backend,
    M: ForecastModel<B>,
{
    let batch = test_view.full_batch::<B>(device)?;
    let input = LookbackInput::from_windows(batch.lookback, model.input_layout());
    let preds = model.predict_batch(input)?;

    let target = test_view.target_channel();
    let predicted = inverse_rows(scaler, &to_array(preds)?, target)?;
    let actual = inverse_rows(scaler, &to_array(batch.forecast)?, target)?;

    let predicted = stitch(predicted.view());
    let actual = stitch(actual.view());
    let metrics = ForecastMetrics::compute(&predicted, &actual)?;

    tracing::info!(
        "Evaluated {} windows -> {} steps: {}",
        test_view.len(),
        actual.len(),
        metrics.summary()
    );

    Ok(Evaluation {
        predicted,
        actual,
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqcast_core::backend::InferBackend;
    use aqcast_core::{InputLayout, ModelDims};
    use ndarray::array;

    #[test]
    fn test_stitch_overlapping_windows() {
        let windows = array![[1.0f32, 2.0, 3.0], [2.0, 3.0, 4.0], [3.0, 4.0, 5.0]];
        assert_eq!(stitch(windows.view()), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_stitch_single_window() {
        let windows = array![[7.0f32, 8.0, 9.0]];
        assert_eq!(stitch(windows.view()), vec![7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_stitch_length() {
        for k in 1..6 {
            for f in 1..5 {
                let windows = Array2::<f32>::zeros((k, f));
                assert_eq!(stitch(windows.view()).len(), k + f - 1);
            }
        }
    }

    #[test]
    fn test_stitch_takes_first_steps() {
        // Predictions disagree across windows; only first steps and the last
        // window's tail survive.
        let windows = array![[10.0f32, 11.0], [20.0, 21.0], [30.0, 31.0]];
        assert_eq!(stitch(windows.view()), vec![10.0, 20.0, 30.0, 31.0]);
    }

    /// Predicts the last lookback value for every horizon step.
    #[derive(Module, Clone, Debug)]
    struct Persistence {
        d_in: usize,
        d_out: usize,
    }

    impl<B: Backend> ForecastModel<B> for Persistence {
        fn dims(&self) -> ModelDims {
            ModelDims::new(self.d_in, self.d_out, 1)
        }

        fn input_layout(&self) -> InputLayout {
            InputLayout::Flattened
        }

        fn forward(&self, input: LookbackInput<B>) -> Tensor<B, 2> {
            let x = input.into_flat();
            let [batch, width] = x.dims();
            let last = x.slice([0..batch, width - 1..width]);
            Tensor::cat(vec![last; self.d_out], 1)
        }
    }

    #[test]
    fn test_evaluate_inverse_scales_and_stitches() {
        let device = Default::default();
        // Original values 10..=30, scaler fit on [10, 20] -> scale 0.1.
        let scaler = MinMaxScaler::fit(array![[10.0f32], [20.0]].view()).unwrap();
        let raw = Array2::from_shape_fn((10, 1), |(t, _)| 10.0 + 2.0 * t as f32);
        let scaled = scaler.transform_array(raw.view()).unwrap();
        let view = WindowedDataset::from_array(scaled.view(), 4, 3, None).unwrap();

        let model = Persistence { d_in: 4, d_out: 3 };
        let eval = evaluate::<InferBackend, _>(&model, &view, &scaler, &device).unwrap();

        // 4 windows of horizon 3 -> 6 steps covering rows 4..10.
        assert_eq!(eval.len(), 6);
        let expected: Vec<f32> = (4..10).map(|t| 10.0 + 2.0 * t as f32).collect();
        for (a, e) in eval.actual.iter().zip(&expected) {
            assert!((a - e).abs() < 1e-3);
        }
        // Persistence lags by one step at the stitch points.
        assert!((eval.predicted[0] - 16.0).abs() < 1e-3);
        assert!(eval.metrics.mae > 0.0);
    }
}
