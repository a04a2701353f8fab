//! Integration tests for the forecasting pipeline.
//!
//! These tests drive the public API end to end with small synthetic series.

use std::fmt::Write as _;
use std::path::Path;

use aqcast::prelude::*;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use ndarray::Array2;

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn pm25(t: usize) -> f32 {
    40.0 + 15.0 * (t as f32 * 0.4).sin() + 0.1 * t as f32
}

fn no2(t: usize) -> f32 {
    25.0 + 5.0 * (t as f32 * 0.2).cos()
}

/// Write an hourly CSV with `time,pm25,no2` columns.
fn write_csv(path: &Path, n: usize) {
    let mut text = String::from("time,pm25,no2\n");
    for t in 0..n {
        let ts = start() + Duration::hours(t as i64);
        writeln!(text, "{},{},{}", ts.format("%Y-%m-%d %H:%M:%S"), pm25(t), no2(t)).unwrap();
    }
    std::fs::write(path, text).unwrap();
}

fn write_config(dir: &Path, model: &str, extra: &str) -> std::path::PathBuf {
    let text = format!(
        r#"
seed = 11
{extra}

[dataset]
path = "station.csv"
timestamp_column = "time"
target_column = "pm25"

[window]
lookback_size = 10
forecast_size = 5
tst_size = 10

[train]
batch_size = 4
epochs = 2
optimizer = {{ type = "adam", lr = 0.001 }}

[model]
{model}

[artifacts]
predictions_csv = "out/predictions.csv"
plot = "out/graph.svg"
report_json = "out/report.json"
"#
    );
    let path = dir.join("run.toml");
    std::fs::write(&path, text).unwrap();
    path
}

fn single_channel_series(n: usize) -> TimeSeries {
    let timestamps = (0..n).map(|t| start() + Duration::hours(t as i64)).collect();
    let values = Array2::from_shape_fn((n, 1), |(t, _)| pm25(t));
    TimeSeries::from_parts(timestamps, values, vec!["pm25".to_string()]).unwrap()
}

#[test]
fn test_csv_to_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(&dir.path().join("station.csv"), 40);
    let config_path = write_config(dir.path(), "type = \"feed_forward\"\nhidden_sizes = [16]", "");

    let config = RunConfig::load(&config_path).unwrap();
    let mut history = HistoryObserver::new();
    let mut progress = ProgressObserver::new();
    let mut observers = ObserverList::new().with(&mut progress).with(&mut history);
    let outcome = run::<TrainBackend>(&config, &NdArrayDevice::Cpu, &mut observers).unwrap();

    // 40 rows, 10 held out: 30 train rows give 16 windows, 20 test rows
    // (10 + 10 lookback) give 6 windows stitched back into 10 steps.
    assert_eq!(outcome.report.n_train_windows, 16);
    assert_eq!(outcome.report.n_test_windows, 6);
    assert_eq!(outcome.evaluation.len(), 10);
    assert_eq!(history.train_losses().len(), 2);
    for loss in history.train_losses().iter().chain(history.valid_losses()) {
        assert!(loss.is_finite(), "loss is not finite: {}", loss);
    }

    let csv = std::fs::read_to_string(dir.path().join("out/predictions.csv")).unwrap();
    assert_eq!(csv.lines().count(), 11);
    assert!(csv.starts_with("step,actual,predicted"));

    let svg = std::fs::read_to_string(dir.path().join("out/graph.svg")).unwrap();
    assert!(svg.contains("MAPE:"));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("out/report.json")).unwrap())
            .unwrap();
    assert_eq!(report["model"], "feed_forward");
    assert_eq!(report["train_losses"].as_array().unwrap().len(), 2);
    assert_eq!(report["config"]["window"]["tst_size"], 10);
}

#[test]
fn test_stitched_actual_matches_series_tail() {
    let series = single_channel_series(40);
    let mut config = RunConfig::from_toml_str(
        "[dataset]\npath = \"-\"\ntimestamp_column = \"time\"\ntarget_column = \"pm25\"\n",
    )
    .unwrap();
    config.window.lookback_size = 10;
    config.window.forecast_size = 5;
    config.window.tst_size = 10;
    config.train.epochs = 1;
    config.train.batch_size = 8;
    config.model = ModelConfig::FeedForward(FeedForwardConfig::new(vec![8]));

    let mut observer = |_: &EpochReport| {};
    let outcome =
        run_series::<TrainBackend>(&config, &series, &NdArrayDevice::Cpu, &mut observer).unwrap();

    let expected: Vec<f32> = (30..40).map(pm25).collect();
    assert_eq!(outcome.evaluation.actual.len(), expected.len());
    for (got, want) in outcome.evaluation.actual.iter().zip(&expected) {
        assert!((got - want).abs() < 1e-3, "{} != {}", got, want);
    }
}

#[test]
fn test_scaler_sees_training_rows_only() {
    // A ramp: the test tail exceeds everything the scaler was fit on.
    let n = 60;
    let timestamps = (0..n).map(|t| start() + Duration::hours(t as i64)).collect();
    let values = Array2::from_shape_fn((n, 1), |(t, _)| t as f32);
    let series = TimeSeries::from_parts(timestamps, values, vec!["pm25".to_string()]).unwrap();

    let split = scale_split(&series, 10, 5).unwrap();
    assert_eq!(split.scaler.data_min()[0], 0.0);
    assert_eq!(split.scaler.data_max()[0], 49.0);

    assert!(split.train.values().iter().all(|&v| (0.0..=1.0).contains(&v)));
    let last_test = split.test.values()[[split.test.len() - 1, 0]];
    assert!((last_test - 59.0 / 49.0).abs() < 1e-5);
}

#[test]
fn test_multi_channel_requires_target() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("station.csv");
    write_csv(&csv_path, 40);

    let options = CsvOptions::new("time", "pm25").with_single_channel(false);
    let series = TimeSeries::from_csv(&csv_path, &options).unwrap();
    assert_eq!(series.n_channels(), 2);

    let split = scale_split(&series, 10, 10).unwrap();
    let err = WindowedDataset::new(&split.train, 10, 5, None).unwrap_err();
    assert!(err.to_string().contains("explicit target"), "{}", err);

    let view = WindowedDataset::new(&split.train, 10, 5, Some(0)).unwrap();
    let window = view.get(0).unwrap();
    assert_eq!(window.lookback.dim(), (10, 2));
    assert_eq!(window.forecast.len(), 5);
}

#[test]
fn test_multi_channel_run_forecasts_target_only() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(&dir.path().join("station.csv"), 40);
    let config_path = write_config(
        dir.path(),
        "type = \"recurrent\"\nhidden_size = 8",
        "use_single_channel = false",
    );

    let config = RunConfig::load(&config_path).unwrap();
    let mut observer = |_: &EpochReport| {};
    let outcome = run::<TrainBackend>(&config, &NdArrayDevice::Cpu, &mut observer).unwrap();

    assert_eq!(outcome.report.n_channels, 2);
    let expected: Vec<f32> = (30..40).map(pm25).collect();
    for (got, want) in outcome.evaluation.actual.iter().zip(&expected) {
        assert!((got - want).abs() < 1e-3);
    }
}

#[test]
fn test_patch_tst_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(&dir.path().join("station.csv"), 40);
    let config_path = write_config(
        dir.path(),
        "type = \"patch_tst\"\npatch_len = 5\nstride = 5\nd_model = 8\nn_heads = 2\nn_layers = 1\nd_ff = 16",
        "",
    );

    let config = RunConfig::load(&config_path).unwrap();
    let mut history = HistoryObserver::new();
    let outcome = run::<TrainBackend>(&config, &NdArrayDevice::Cpu, &mut history).unwrap();

    assert_eq!(outcome.report.model, "patch_tst");
    assert_eq!(outcome.evaluation.predicted.len(), 10);
    assert!(outcome.evaluation.metrics.mae.is_finite());
}

#[test]
fn test_invalid_configs_fail_before_training() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(&dir.path().join("station.csv"), 40);

    let config_path = write_config(dir.path(), "type = \"feed_forward\"", "");
    let mut config = RunConfig::load(&config_path).unwrap();
    config.eval.dynamic = true;

    let mut calls = 0usize;
    let mut observer = |_: &EpochReport| calls += 1;
    let err = run::<TrainBackend>(&config, &NdArrayDevice::Cpu, &mut observer).unwrap_err();
    assert!(matches!(err, TrainError::Config(_)));
    assert_eq!(calls, 0);

    // Patch longer than the lookback window.
    let config_path = write_config(dir.path(), "type = \"patch_tst\"\npatch_len = 16", "");
    let config = RunConfig::load(&config_path).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_shipped_configs_validate() {
    let configs = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../configs");
    for name in ["pm25.toml", "multichannel_lstm.json"] {
        let config = RunConfig::load(configs.join(name)).unwrap();
        config.validate().unwrap();
    }
}
