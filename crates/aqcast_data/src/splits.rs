//! Chronological train/test splitting.

use crate::error::{DataError, Result};
use crate::scaler::{MinMaxScaler, ScaledSeries};
use crate::series::TimeSeries;

/// Split a series into a training prefix and a held-out tail.
///
/// The training part is `rows[..N - tst_size]`. The test part is
/// `rows[N - tst_size - lookback ..]`: the held-out rows plus the trailing
/// `lookback` training rows that seed the first test window.
///
/// # Arguments
///
/// * `series` - The full series
/// * `tst_size` - Number of rows held out at the tail
/// * `lookback` - Lookback length `L`
///
/// # Returns
///
/// A tuple of (train_series, test_series).
///
/// # Errors
///
/// Returns [`DataError::SplitError`] if `tst_size` is zero or
/// `tst_size + lookback` exceeds the series length.
pub fn split_train_test(
    series: &TimeSeries,
    tst_size: usize,
    lookback: usize,
) -> Result<(TimeSeries, TimeSeries)> {
    let n = series.len();
    if tst_size == 0 {
        return Err(DataError::SplitError(
            "test size must be greater than 0".to_string(),
        ));
    }
    if tst_size + lookback > n {
        return Err(DataError::SplitError(format!(
            "test size {} + lookback {} exceeds series length {}",
            tst_size, lookback, n
        )));
    }

    let train = series.slice_rows(0, n - tst_size)?;
    let test = series.slice_rows(n - tst_size - lookback, n)?;
    Ok((train, test))
}

/// Scaled train/test parts together with the scaler fit on the train part.
#[derive(Debug, Clone)]
pub struct ScaledSplit {
    /// Scaler fit on the training prefix only.
    pub scaler: MinMaxScaler,
    /// Scaled training prefix.
    pub train: ScaledSeries,
    /// Scaled test region, lookback rows included.
    pub test: ScaledSeries,
}

/// Split a series, fit a scaler on the training prefix and scale both parts.
///
/// # Errors
///
/// Propagates split errors and scaler degeneracy.
pub fn scale_split(series: &TimeSeries, tst_size: usize, lookback: usize) -> Result<ScaledSplit> {
    let (train, test) = split_train_test(series, tst_size, lookback)?;
    let scaler = MinMaxScaler::fit(train.values())?;

    tracing::info!(
        "Split {} rows into {} train / {} test (incl. {} lookback rows)",
        series.len(),
        train.len(),
        test.len(),
        lookback
    );

    Ok(ScaledSplit {
        train: scaler.transform(&train)?,
        test: scaler.transform(&test)?,
        scaler,
    })
}
