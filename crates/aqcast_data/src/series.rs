//! In-memory time series.

use chrono::NaiveDateTime;
use ndarray::{s, Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{DataError, Result};

/// An ordered sequence of timestamped channel vectors, shape `(T, C)`.
///
/// Timestamps are strictly increasing; the constructors sort rows and reject
/// duplicates so every `TimeSeries` upholds that.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    timestamps: Vec<NaiveDateTime>,
    values: Array2<f32>,
    channel_names: Vec<String>,
}

impl TimeSeries {
    /// Build a series from its parts.
    ///
    /// Rows are stably sorted by timestamp.
    ///
    /// # Arguments
    ///
    /// * `timestamps` - One timestamp per row
    /// * `values` - Channel values of shape `(T, C)`
    /// * `channel_names` - One name per channel
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidShape`] if the parts disagree in length and
    /// [`DataError::DuplicateTimestamp`] if a timestamp repeats.
    pub fn from_parts(
        timestamps: Vec<NaiveDateTime>,
        values: Array2<f32>,
        channel_names: Vec<String>,
    ) -> Result<Self> {
        if values.nrows() != timestamps.len() {
            return Err(DataError::InvalidShape(format!(
                "{} timestamps for {} rows",
                timestamps.len(),
                values.nrows()
            )));
        }
        if values.ncols() == 0 {
            return Err(DataError::InvalidShape(
                "series must have at least one channel".to_string(),
            ));
        }
        if channel_names.len() != values.ncols() {
            return Err(DataError::InvalidShape(format!(
                "{} channel names for {} channels",
                channel_names.len(),
                values.ncols()
            )));
        }

        let mut order: Vec<usize> = (0..timestamps.len()).collect();
        order.sort_by_key(|&i| timestamps[i]);

        if let Some(pair) = order
            .windows(2)
            .find(|pair| timestamps[pair[0]] == timestamps[pair[1]])
        {
            return Err(DataError::DuplicateTimestamp(
                timestamps[pair[0]].to_string(),
            ));
        }

        let is_sorted = order.iter().enumerate().all(|(pos, &i)| pos == i);
        let (timestamps, values) = if is_sorted {
            (timestamps, values)
        } else {
            let sorted_ts = order.iter().map(|&i| timestamps[i]).collect();
            (sorted_ts, values.select(Axis(0), &order))
        };

        Ok(Self {
            timestamps,
            values,
            channel_names,
        })
    }

    /// Number of rows `T`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Number of channels `C`.
    #[must_use]
    pub fn n_channels(&self) -> usize {
        self.values.ncols()
    }

    /// Row timestamps.
    #[must_use]
    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    /// Channel values `(T, C)`.
    #[must_use]
    pub fn values(&self) -> ArrayView2<'_, f32> {
        self.values.view()
    }

    /// Channel names in column order.
    #[must_use]
    pub fn channel_names(&self) -> &[String] {
        &self.channel_names
    }

    /// Position of a named channel.
    #[must_use]
    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channel_names.iter().position(|c| c == name)
    }

    /// Values of a single channel.
    #[must_use]
    pub fn channel(&self, index: usize) -> Option<ArrayView1<'_, f32>> {
        (index < self.n_channels()).then(|| self.values.column(index))
    }

    /// Copy of the rows in `start..end`.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidShape`] if the range is out of bounds.
    pub fn slice_rows(&self, start: usize, end: usize) -> Result<Self> {
        if start > end || end > self.len() {
            return Err(DataError::InvalidShape(format!(
                "row range {}..{} out of bounds for {} rows",
                start,
                end,
                self.len()
            )));
        }
        Ok(Self {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values.slice(s![start..end, ..]).to_owned(),
            channel_names: self.channel_names.clone(),
        })
    }

    /// Keep only the named channel.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingColumn`] if no channel has that name.
    pub fn select_channel(&self, name: &str) -> Result<Self> {
        let index = self
            .channel_index(name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))?;
        Ok(Self {
            timestamps: self.timestamps.clone(),
            values: self.values.slice(s![.., index..index + 1]).to_owned(),
            channel_names: vec![name.to_string()],
        })
    }
}
