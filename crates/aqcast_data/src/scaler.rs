//! Per-channel min-max scaling.

use aqcast_core::CoreError;
use chrono::NaiveDateTime;
use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{DataError, Result};
use crate::series::TimeSeries;

/// Min-max scaler fit once on a training prefix.
///
/// `transform` maps `x` to `(x - min) * scale` with `scale = 1 / (max - min)`,
/// so training values land in `[0, 1]`; `inverse` maps back with
/// `x / scale + min`. Parameters are fixed at construction and there is no
/// way to refit, so test rows can never influence them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    data_min: Vec<f64>,
    data_max: Vec<f64>,
    scale: Vec<f64>,
}

impl MinMaxScaler {
    /// Fit per-channel parameters on `train` of shape `(T, C)`.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::EmptyDataset`] for zero rows and
    /// [`CoreError::NumericDegeneracy`] if a channel is constant.
    pub fn fit(train: ArrayView2<'_, f32>) -> Result<Self> {
        if train.nrows() == 0 {
            return Err(DataError::EmptyDataset);
        }

        let mut data_min = Vec::with_capacity(train.ncols());
        let mut data_max = Vec::with_capacity(train.ncols());
        let mut scale = Vec::with_capacity(train.ncols());

        for (channel, column) in train.axis_iter(Axis(1)).enumerate() {
            let (lo, hi) = column.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                let v = f64::from(v);
                (lo.min(v), hi.max(v))
            });
            let range = hi - lo;
            if !range.is_finite() || range <= 0.0 {
                return Err(CoreError::NumericDegeneracy(format!(
                    "channel {} is constant in the training split (min = max = {})",
                    channel, lo
                ))
                .into());
            }
            data_min.push(lo);
            data_max.push(hi);
            scale.push(1.0 / range);
        }

        tracing::debug!("Fitted min-max scaler on {} rows", train.nrows());
        Ok(Self {
            data_min,
            data_max,
            scale,
        })
    }

    /// Number of channels the scaler was fit on.
    #[must_use]
    pub fn n_channels(&self) -> usize {
        self.scale.len()
    }

    /// Per-channel training minimum.
    #[must_use]
    pub fn data_min(&self) -> &[f64] {
        &self.data_min
    }

    /// Per-channel training maximum.
    #[must_use]
    pub fn data_max(&self) -> &[f64] {
        &self.data_max
    }

    /// Per-channel scale `1 / (max - min)`.
    #[must_use]
    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    fn check_channels(&self, n_channels: usize) -> Result<()> {
        if n_channels != self.n_channels() {
            return Err(CoreError::shape(format!(
                "scaler fit on {} channels, got {}",
                self.n_channels(),
                n_channels
            ))
            .into());
        }
        Ok(())
    }

    fn check_channel(&self, channel: usize) -> Result<()> {
        if channel >= self.n_channels() {
            return Err(CoreError::IndexOutOfRange {
                index: channel,
                length: self.n_channels(),
            }
            .into());
        }
        Ok(())
    }

    /// Scale an array of shape `(T, C)`.
    ///
    /// # Errors
    ///
    /// Returns a shape mismatch if the channel count differs from the fit.
    pub fn transform_array(&self, data: ArrayView2<'_, f32>) -> Result<Array2<f32>> {
        self.check_channels(data.ncols())?;
        let mut out = data.to_owned();
        for (channel, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (min, scale) = (self.data_min[channel], self.scale[channel]);
            column.mapv_inplace(|v| ((f64::from(v) - min) * scale) as f32);
        }
        Ok(out)
    }

    /// Map a scaled array of shape `(T, C)` back to original units.
    ///
    /// # Errors
    ///
    /// Returns a shape mismatch if the channel count differs from the fit.
    pub fn inverse(&self, data: ArrayView2<'_, f32>) -> Result<Array2<f32>> {
        self.check_channels(data.ncols())?;
        let mut out = data.to_owned();
        for (channel, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (min, scale) = (self.data_min[channel], self.scale[channel]);
            column.mapv_inplace(|v| (f64::from(v) / scale + min) as f32);
        }
        Ok(out)
    }

    /// Map scaled values of one channel back to original units.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexOutOfRange`] for an unknown channel.
    pub fn inverse_channel(&self, values: &[f32], channel: usize) -> Result<Vec<f32>> {
        self.check_channel(channel)?;
        let (min, scale) = (self.data_min[channel], self.scale[channel]);
        Ok(values
            .iter()
            .map(|&v| (f64::from(v) / scale + min) as f32)
            .collect())
    }

    /// Scale a whole series.
    ///
    /// # Errors
    ///
    /// Returns a shape mismatch if the channel count differs from the fit.
    pub fn transform(&self, series: &TimeSeries) -> Result<ScaledSeries> {
        Ok(ScaledSeries {
            timestamps: series.timestamps().to_vec(),
            values: self.transform_array(series.values())?,
            channel_names: series.channel_names().to_vec(),
        })
    }
}

/// A [`TimeSeries`] after min-max scaling.
#[derive(Debug, Clone)]
pub struct ScaledSeries {
    timestamps: Vec<NaiveDateTime>,
    values: Array2<f32>,
    channel_names: Vec<String>,
}

impl ScaledSeries {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    /// Check if the series has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    /// Number of channels.
    #[must_use]
    pub fn n_channels(&self) -> usize {
        self.values.ncols()
    }

    /// Scaled values `(T, C)`.
    #[must_use]
    pub fn values(&self) -> ArrayView2<'_, f32> {
        self.values.view()
    }

    /// Row timestamps.
    #[must_use]
    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    /// Channel names in column order.
    #[must_use]
    pub fn channel_names(&self) -> &[String] {
        &self.channel_names
    }
}
