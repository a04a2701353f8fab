//! End-to-end experiment driver.
//!
//! [`run`] loads the CSV named by a [`RunConfig`] and hands it to
//! [`run_series`], which performs split, scaling, windowing, training,
//! evaluation and artifact writing in that order.

use aqcast_core::{ForecastModel, Split};
use aqcast_data::{scale_split, DataError, MinMaxScaler, TimeSeries, WindowLoader, WindowedDataset};
use aqcast_models::ModelConfig;
use burn::module::AutodiffModule;
use burn::tensor::backend::AutodiffBackend;

use crate::artifacts::{self, RunReport};
use crate::config::RunConfig;
use crate::error::Result;
use crate::evaluation::{evaluate, Evaluation};
use crate::observer::EpochObserver;
use crate::training::ForecastTrainer;

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Summary written to the JSON report.
    pub report: RunReport,
    /// Stitched test predictions and metrics.
    pub evaluation: Evaluation,
}

struct FitResult {
    train_losses: Vec<f32>,
    valid_losses: Vec<f32>,
    training_time_secs: f64,
    evaluation: Evaluation,
}

/// Run one experiment from a configuration.
///
/// # Errors
///
/// Returns the first configuration, data, training or artifact error.
pub fn run<B: AutodiffBackend>(
    config: &RunConfig,
    device: &B::Device,
    observer: &mut dyn EpochObserver,
) -> Result<RunOutcome> {
    config.validate()?;

    tracing::info!("Loading {}", config.dataset.path.display());
    let series = TimeSeries::from_csv(&config.dataset.path, &config.csv_options())?;

    run_series::<B>(config, &series, device, observer)
}

/// Run one experiment on an already loaded series.
///
/// The dataset path in `config` is ignored; column names still select the
/// target channel.
///
/// # Errors
///
/// Same as [`run`].
pub fn run_series<B: AutodiffBackend>(
    config: &RunConfig,
    series: &TimeSeries,
    device: &B::Device,
    observer: &mut dyn EpochObserver,
) -> Result<RunOutcome> {
    config.validate()?;

    let target = series
        .channel_index(&config.dataset.target_column)
        .ok_or_else(|| DataError::MissingColumn(config.dataset.target_column.clone()))?;
    let dims = config.model_dims(series.n_channels());
    config.model.validate(&dims)?;

    let window = &config.window;
    let split = scale_split(series, window.tst_size, window.lookback_size)?;

    let train_view = WindowedDataset::new(
        &split.train,
        window.lookback_size,
        window.forecast_size,
        Some(target),
    )?;
    let test_view = WindowedDataset::new(
        &split.test,
        window.lookback_size,
        window.forecast_size,
        Some(target),
    )?;
    let n_train_windows = train_view.len();
    let n_test_windows = test_view.len();

    let loader = WindowLoader::builder(train_view)
        .batch_size(config.train.batch_size)
        .shuffle(config.train.shuffle)
        .seed(config.seed)
        .split(Split::Train)
        .build()?;

    tracing::info!("Model {} on {} channel(s)", config.model, dims.c_in);
    tracing::info!("{} split: {} windows", loader.split(), n_train_windows);
    tracing::info!("{} split: {} windows", Split::Test, n_test_windows);

    config.seed.seed_backend::<B>();
    let mut trainer = ForecastTrainer::<B>::new(config.trainer_config(), device.clone());

    let fit = match &config.model {
        ModelConfig::FeedForward(c) => {
            let model = c.init::<B>(dims, device)?;
            fit_and_evaluate(&mut trainer, model, &loader, &test_view, &split.scaler, device, observer)?
        }
        ModelConfig::Recurrent(c) => {
            let model = c.init::<B>(dims, device)?;
            fit_and_evaluate(&mut trainer, model, &loader, &test_view, &split.scaler, device, observer)?
        }
        ModelConfig::PatchTst(c) => {
            let model = c.init::<B>(dims, device)?;
            fit_and_evaluate(&mut trainer, model, &loader, &test_view, &split.scaler, device, observer)?
        }
    };

    let report = RunReport {
        config: config.clone(),
        model: config.model.name().to_string(),
        n_channels: dims.c_in,
        n_train_windows,
        n_test_windows,
        train_losses: fit.train_losses,
        valid_losses: fit.valid_losses,
        metrics: fit.evaluation.metrics,
        training_time_secs: fit.training_time_secs,
    };

    write_artifacts(config, &report, &fit.evaluation)?;

    Ok(RunOutcome {
        report,
        evaluation: fit.evaluation,
    })
}

fn fit_and_evaluate<B, M>(
    trainer: &mut ForecastTrainer<B>,
    model: M,
    loader: &WindowLoader,
    test_view: &WindowedDataset,
    scaler: &MinMaxScaler,
    device: &B::Device,
    observer: &mut dyn EpochObserver,
) -> Result<FitResult>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + ForecastModel<B>,
    M::InnerModule: ForecastModel<B::InnerBackend>,
{
    let output = trainer.fit(model, loader, test_view, observer)?;

    let trained = output.model.valid();
    let evaluation = evaluate::<B::InnerBackend, _>(&trained, test_view, scaler, device)?;

    Ok(FitResult {
        train_losses: output.train_losses,
        valid_losses: output.valid_losses,
        training_time_secs: output.training_time_secs,
        evaluation,
    })
}

fn write_artifacts(config: &RunConfig, report: &RunReport, evaluation: &Evaluation) -> Result<()> {
    let paths = &config.artifacts;
    if let Some(path) = &paths.predictions_csv {
        artifacts::write_predictions_csv(path, evaluation)?;
    }
    if let Some(path) = &paths.plot {
        artifacts::plot_forecast(path, evaluation, config.model.name())?;
    }
    if let Some(path) = &paths.report_json {
        artifacts::write_report(path, report)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WindowConfig;
    use crate::error::TrainError;
    use crate::observer::HistoryObserver;
    use aqcast_core::backend::TrainBackend;
    use aqcast_models::FeedForwardConfig;
    use chrono::{Duration, NaiveDate};
    use ndarray::Array2;

    type B = TrainBackend;

    fn series(n: usize, channels: &[&str]) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let timestamps = (0..n).map(|i| start + Duration::hours(i as i64)).collect();
        let values = Array2::from_shape_fn((n, channels.len()), |(t, c)| {
            50.0 + 20.0 * ((t as f32) * 0.3 + c as f32).sin()
        });
        let names = channels.iter().map(|c| c.to_string()).collect();
        TimeSeries::from_parts(timestamps, values, names).unwrap()
    }

    fn config(target: &str) -> RunConfig {
        let mut config = RunConfig::from_toml_str(&format!(
            "[dataset]\npath = \"unused.csv\"\ntimestamp_column = \"time\"\ntarget_column = \"{}\"\n",
            target
        ))
        .unwrap();
        config.window = WindowConfig {
            lookback_size: 10,
            forecast_size: 5,
            tst_size: 10,
        };
        config.train.epochs = 2;
        config.train.batch_size = 4;
        config.model = ModelConfig::FeedForward(FeedForwardConfig::new(vec![16]));
        config
    }

    #[test]
    fn test_run_series_window_counts() {
        let device = Default::default();
        let mut history = HistoryObserver::new();

        let outcome = run_series::<B>(&config("pm25"), &series(40, &["pm25"]), &device, &mut history)
            .unwrap();

        // 30 train rows -> 16 windows; 20 test rows -> 6 windows -> 10 steps.
        assert_eq!(outcome.report.n_train_windows, 16);
        assert_eq!(outcome.report.n_test_windows, 6);
        assert_eq!(outcome.evaluation.len(), 10);
        assert_eq!(outcome.report.train_losses.len(), 2);
        assert_eq!(history.train_losses().len(), 2);
    }

    #[test]
    fn test_run_series_multi_channel_target() {
        let device = Default::default();
        let mut cfg = config("no2");
        cfg.use_single_channel = false;
        let mut observer = |_: &crate::observer::EpochReport| {};

        let outcome = run_series::<B>(&cfg, &series(40, &["pm25", "no2"]), &device, &mut observer)
            .unwrap();
        assert_eq!(outcome.report.n_channels, 2);
        assert_eq!(outcome.evaluation.len(), 10);
    }

    #[test]
    fn test_missing_target_column() {
        let device = Default::default();
        let mut observer = |_: &crate::observer::EpochReport| {};
        let err = run_series::<B>(&config("o3"), &series(40, &["pm25"]), &device, &mut observer)
            .unwrap_err();
        assert!(matches!(
            err,
            TrainError::DataError(DataError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_series_too_short_for_split() {
        let device = Default::default();
        let mut observer = |_: &crate::observer::EpochReport| {};
        let err = run_series::<B>(&config("pm25"), &series(15, &["pm25"]), &device, &mut observer)
            .unwrap_err();
        assert!(matches!(err, TrainError::DataError(DataError::SplitError(_))));
    }

    #[test]
    fn test_artifacts_written() {
        let dir = tempfile::tempdir().unwrap();
        let device = Default::default();
        let mut cfg = config("pm25");
        cfg.train.epochs = 1;
        cfg.artifacts.predictions_csv = Some(dir.path().join("out/preds.csv"));
        cfg.artifacts.plot = Some(dir.path().join("out/graph.svg"));
        cfg.artifacts.report_json = Some(dir.path().join("out/report.json"));
        let mut observer = |_: &crate::observer::EpochReport| {};

        run_series::<B>(&cfg, &series(40, &["pm25"]), &device, &mut observer).unwrap();

        assert!(dir.path().join("out/preds.csv").exists());
        assert!(dir.path().join("out/graph.svg").exists());
        let report: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("out/report.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(report["model"], "feed_forward");
        assert_eq!(report["n_test_windows"], 6);
        assert!(report["metrics"]["mae"].is_number());
    }
}
