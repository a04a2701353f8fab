//! CSV loading for sensor series.

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{DataError, Result};
use crate::series::TimeSeries;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Column selection for [`TimeSeries::from_csv`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvOptions {
    /// Name of the timestamp column.
    pub timestamp_column: String,
    /// Name of the forecast target column.
    pub target_column: String,
    /// Keep only the target column.
    pub single_channel: bool,
}

impl CsvOptions {
    /// Create options for the given timestamp and target columns.
    pub fn new(timestamp_column: impl Into<String>, target_column: impl Into<String>) -> Self {
        Self {
            timestamp_column: timestamp_column.into(),
            target_column: target_column.into(),
            single_channel: true,
        }
    }

    /// Keep only the target column, or every non-timestamp column.
    #[must_use]
    pub fn with_single_channel(mut self, single_channel: bool) -> Self {
        self.single_channel = single_channel;
        self
    }
}

/// Parse a timestamp cell.
///
/// Accepts RFC 3339 and the common `YYYY-MM-DD[ HH:MM[:SS]]` forms with `-`
/// or `/` date separators. Date-only cells map to midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn parse_value(raw: &str) -> Option<f32> {
    raw.parse::<f32>().ok().filter(|v| v.is_finite())
}

impl TimeSeries {
    /// Load a series from a headered CSV file.
    ///
    /// Rows with an empty, `NaN` or unparsable channel value are dropped.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the CSV file
    /// * `options` - Timestamp/target columns and channel selection
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingColumn`] if a configured column is absent,
    /// [`DataError::Parse`] for an unreadable timestamp,
    /// [`DataError::DuplicateTimestamp`] for repeated timestamps and
    /// [`DataError::EmptyDataset`] if no row survives.
    pub fn from_csv<P: AsRef<Path>>(path: P, options: &CsvOptions) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| DataError::MissingColumn(name.to_string()))
        };

        let ts_col = find(&options.timestamp_column)?;
        let target_col = find(&options.target_column)?;

        let channel_cols: Vec<usize> = if options.single_channel {
            vec![target_col]
        } else {
            (0..headers.len()).filter(|&i| i != ts_col).collect()
        };
        let channel_names: Vec<String> = channel_cols
            .iter()
            .map(|&i| headers[i].to_string())
            .collect();

        let mut timestamps = Vec::new();
        let mut flat = Vec::new();
        let mut dropped = 0usize;

        for (row_idx, record) in reader.records().enumerate() {
            let record = record?;
            let raw_ts = record.get(ts_col).unwrap_or_default();
            let timestamp = parse_timestamp(raw_ts).ok_or_else(|| {
                DataError::Parse(format!(
                    "row {}: unrecognized timestamp '{}'",
                    row_idx + 1,
                    raw_ts
                ))
            })?;

            let row: Option<Vec<f32>> = channel_cols
                .iter()
                .map(|&i| record.get(i).and_then(parse_value))
                .collect();

            match row {
                Some(row) => {
                    timestamps.push(timestamp);
                    flat.extend(row);
                }
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            tracing::warn!(
                "Dropped {} rows with missing values from {}",
                dropped,
                path.display()
            );
        }
        if timestamps.is_empty() {
            return Err(DataError::EmptyDataset);
        }

        let n_rows = timestamps.len();
        let values = Array2::from_shape_vec((n_rows, channel_cols.len()), flat)
            .map_err(|e| DataError::InvalidShape(e.to_string()))?;

        tracing::info!(
            "Loaded {} rows x {} channels from {}",
            n_rows,
            channel_names.len(),
            path.display()
        );

        Self::from_parts(timestamps, values, channel_names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2023-01-01T05:00:00Z").is_some());
        assert!(parse_timestamp("2023-01-01 05:00:00").is_some());
        assert!(parse_timestamp("2023-01-01 05:00").is_some());
        assert!(parse_timestamp("2023/01/01 05:00").is_some());
        assert_eq!(
            parse_timestamp("2023-01-02"),
            NaiveDate::from_ymd_opt(2023, 1, 2).unwrap().and_hms_opt(0, 0, 0)
        );
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_from_csv_single_channel() {
        let file = write_csv(
            "time,pm25,temp\n\
             2023-01-01 02:00,3.0,10\n\
             2023-01-01 00:00,1.0,11\n\
             2023-01-01 01:00,2.0,12\n",
        );
        let options = CsvOptions::new("time", "pm25");
        let series = TimeSeries::from_csv(file.path(), &options).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.n_channels(), 1);
        assert_eq!(series.channel_names(), &["pm25".to_string()]);
        assert_eq!(series.values().column(0).to_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_from_csv_multi_channel_drops_missing() {
        let file = write_csv(
            "time,pm25,temp\n\
             2023-01-01 00:00,1.0,11\n\
             2023-01-01 01:00,,12\n\
             2023-01-01 02:00,3.0,NaN\n\
             2023-01-01 03:00,4.0,14\n",
        );
        let options = CsvOptions::new("time", "pm25").with_single_channel(false);
        let series = TimeSeries::from_csv(file.path(), &options).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.n_channels(), 2);
        assert_eq!(series.channel_index("temp"), Some(1));
        assert_eq!(series.values()[[1, 1]], 14.0);
    }

    #[test]
    fn test_from_csv_missing_column() {
        let file = write_csv("time,pm25\n2023-01-01,1.0\n");
        let options = CsvOptions::new("time", "no2");
        assert!(matches!(
            TimeSeries::from_csv(file.path(), &options),
            Err(DataError::MissingColumn(c)) if c == "no2"
        ));
    }

    #[test]
    fn test_from_csv_duplicate_timestamp() {
        let file = write_csv("time,pm25\n2023-01-01,1.0\n2023-01-01,2.0\n");
        let options = CsvOptions::new("time", "pm25");
        assert!(matches!(
            TimeSeries::from_csv(file.path(), &options),
            Err(DataError::DuplicateTimestamp(_))
        ));
    }

    #[test]
    fn test_from_csv_bad_timestamp() {
        let file = write_csv("time,pm25\nnot-a-date,1.0\n");
        let options = CsvOptions::new("time", "pm25");
        assert!(matches!(
            TimeSeries::from_csv(file.path(), &options),
            Err(DataError::Parse(_))
        ));
    }
}
