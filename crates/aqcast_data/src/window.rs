//! Windowed (lookback, forecast) view over a scaled series.

use aqcast_core::{CoreError, WindowBatch};
use burn::prelude::*;
use ndarray::{s, Array1, Array2, ArrayView2};

use crate::error::Result;
use crate::scaler::ScaledSeries;

/// One (lookback, forecast) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    /// Rows `i..i+L`, shape `(L, C)`.
    pub lookback: Array2<f32>,
    /// Target values of rows `i+L..i+L+F`, shape `(F,)`.
    pub forecast: Array1<f32>,
}

/// Indexable view of every lookback/forecast window of a series.
///
/// Window `i` covers rows `i..i+L` as lookback and `i+L..i+L+F` as forecast,
/// for `i` in `0..=N-L-F`. A series shorter than `L+F` has no windows.
///
/// # Example
///
/// ```rust,ignore
/// let view = WindowedDataset::new(&split.train, 24, 7, None)?;
/// let window = view.get(0)?;
/// assert_eq!(window.lookback.nrows(), 24);
/// ```
#[derive(Debug, Clone)]
pub struct WindowedDataset {
    data: Array2<f32>,
    lookback: usize,
    horizon: usize,
    target: usize,
}

impl WindowedDataset {
    /// Create a view over a scaled series.
    ///
    /// # Arguments
    ///
    /// * `series` - Scaled series of shape `(N, C)`
    /// * `lookback` - Lookback length `L`
    /// * `horizon` - Forecast horizon `F`
    /// * `target_channel` - Channel to forecast; required when `C > 1`
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] for zero `L` or `F`, a missing
    /// target channel on multi-channel input, or a target index out of range.
    pub fn new(
        series: &ScaledSeries,
        lookback: usize,
        horizon: usize,
        target_channel: Option<usize>,
    ) -> Result<Self> {
        Self::from_array(series.values(), lookback, horizon, target_channel)
    }

    /// Create a view over a raw `(N, C)` array.
    ///
    /// # Errors
    ///
    /// Same as [`WindowedDataset::new`].
    pub fn from_array(
        data: ArrayView2<'_, f32>,
        lookback: usize,
        horizon: usize,
        target_channel: Option<usize>,
    ) -> Result<Self> {
        if lookback == 0 || horizon == 0 {
            return Err(CoreError::config(format!(
                "lookback ({}) and forecast ({}) sizes must be > 0",
                lookback, horizon
            ))
            .into());
        }

        let n_channels = data.ncols();
        let target = match (n_channels, target_channel) {
            (1, None) => 0,
            (_, None) => {
                return Err(CoreError::config(
                    "multi-channel input requires an explicit target column",
                )
                .into())
            }
            (c, Some(t)) if t >= c => {
                return Err(CoreError::config(format!(
                    "target channel {} out of range for {} channels",
                    t, c
                ))
                .into())
            }
            (_, Some(t)) => t,
        };

        Ok(Self {
            data: data.to_owned(),
            lookback,
            horizon,
            target,
        })
    }

    /// Number of windows, `max(0, N - L - F + 1)`.
    #[must_use]
    pub fn len(&self) -> usize {
        (self.data.nrows() + 1).saturating_sub(self.lookback + self.horizon)
    }

    /// Check if there are no windows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lookback length `L`.
    #[must_use]
    pub fn lookback_len(&self) -> usize {
        self.lookback
    }

    /// Forecast horizon `F`.
    #[must_use]
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Channel count `C`.
    #[must_use]
    pub fn n_channels(&self) -> usize {
        self.data.ncols()
    }

    /// Channel the forecast is reduced to.
    #[must_use]
    pub fn target_channel(&self) -> usize {
        self.target
    }

    fn check_index(&self, index: usize) -> Result<()> {
        let length = self.len();
        if index >= length {
            return Err(CoreError::IndexOutOfRange { index, length }.into());
        }
        Ok(())
    }

    /// Get window `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexOutOfRange`] outside `0..len()`.
    pub fn get(&self, index: usize) -> Result<Window> {
        self.check_index(index)?;
        let split = index + self.lookback;
        Ok(Window {
            lookback: self.data.slice(s![index..split, ..]).to_owned(),
            forecast: self
                .data
                .slice(s![split..split + self.horizon, self.target])
                .to_owned(),
        })
    }

    /// Forecast rows of window `index` with every channel, shape `(F, C)`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexOutOfRange`] outside `0..len()`.
    pub fn forecast_rows(&self, index: usize) -> Result<Array2<f32>> {
        self.check_index(index)?;
        let split = index + self.lookback;
        Ok(self.data.slice(s![split..split + self.horizon, ..]).to_owned())
    }

    /// Stack the given windows into a batch on `device`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexOutOfRange`] for any invalid index.
    pub fn batch<B: Backend>(
        &self,
        indices: &[usize],
        device: &B::Device,
    ) -> Result<WindowBatch<B>> {
        let (l, c, f) = (self.lookback, self.n_channels(), self.horizon);
        let mut x = Vec::with_capacity(indices.len() * l * c);
        let mut y = Vec::with_capacity(indices.len() * f);

        for &idx in indices {
            let window = self.get(idx)?;
            x.extend(window.lookback.iter().copied());
            y.extend(window.forecast.iter().copied());
        }

        let batch_size = indices.len();
        let lookback = Tensor::<B, 3>::from_data(TensorData::new(x, [batch_size, l, c]), device);
        let forecast = Tensor::<B, 2>::from_data(TensorData::new(y, [batch_size, f]), device);
        Ok(WindowBatch::new(lookback, forecast)?)
    }

    /// Every window in index order as one batch.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::EmptyDataset`](crate::DataError::EmptyDataset)
    /// if there are no windows.
    pub fn full_batch<B: Backend>(&self, device: &B::Device) -> Result<WindowBatch<B>> {
        if self.is_empty() {
            return Err(crate::DataError::EmptyDataset);
        }
        let indices: Vec<usize> = (0..self.len()).collect();
        self.batch(&indices, device)
    }
}
