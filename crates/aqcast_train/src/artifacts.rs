//! Output artifacts: predictions CSV, forecast plot and JSON run report.

use std::path::Path;

use plotters::prelude::*;
use serde::Serialize;

use crate::config::RunConfig;
use crate::error::{Result, TrainError};
use crate::evaluation::Evaluation;
use crate::metrics::ForecastMetrics;

const PLOT_SIZE: (u32, u32) = (1024, 576);

/// Summary of a completed run, written as the JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Configuration the run used.
    pub config: RunConfig,
    /// Model variant name.
    pub model: String,
    /// Input channels seen by the model.
    pub n_channels: usize,
    /// Training windows per epoch.
    pub n_train_windows: usize,
    /// Test windows evaluated.
    pub n_test_windows: usize,
    /// Mean training loss per epoch.
    pub train_losses: Vec<f32>,
    /// Validation loss per epoch.
    pub valid_losses: Vec<f32>,
    /// Test metrics on the original scale.
    pub metrics: ForecastMetrics,
    /// Wall-clock training time.
    pub training_time_secs: f64,
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent)?;
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Write the stitched series as `step,actual,predicted` rows.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_predictions_csv<P: AsRef<Path>>(path: P, evaluation: &Evaluation) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["step", "actual", "predicted"])?;
    for (step, (actual, predicted)) in evaluation
        .actual
        .iter()
        .zip(&evaluation.predicted)
        .enumerate()
    {
        writer.write_record(&[step.to_string(), actual.to_string(), predicted.to_string()])?;
    }
    writer.flush()?;

    tracing::info!("Wrote {} predictions to {}", evaluation.len(), path.display());
    Ok(())
}

fn value_range(evaluation: &Evaluation) -> (f64, f64) {
    let (lo, hi) = evaluation
        .actual
        .iter()
        .chain(&evaluation.predicted)
        .map(|&v| f64::from(v))
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return (0.0, 1.0);
    }
    let margin = ((hi - lo) * 0.05).max(0.5);
    (lo - margin, hi + margin)
}

fn plot_caption(title: &str, metrics: &ForecastMetrics) -> String {
    format!(
        "{}, MAPE:{:.4}, MAE:{:.4}, R2:{:.4}",
        title, metrics.mape, metrics.mae, metrics.r2
    )
}

/// Draw actual and predicted series as an SVG line chart.
///
/// The caption carries the model title followed by MAPE, MAE and R2.
///
/// # Errors
///
/// Returns [`TrainError::Artifact`] if the evaluation is empty or drawing
/// fails.
pub fn plot_forecast<P: AsRef<Path>>(path: P, evaluation: &Evaluation, title: &str) -> Result<()> {
    let path = path.as_ref();
    if evaluation.is_empty() {
        return Err(TrainError::Artifact("nothing to plot".to_string()));
    }
    ensure_parent(path)?;

    let draw = || -> std::result::Result<(), Box<dyn std::error::Error>> {
        let root = SVGBackend::new(path, PLOT_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let (y_min, y_max) = value_range(evaluation);
        let x_max = evaluation.len().saturating_sub(1).max(1) as f64;

        let mut chart = ChartBuilder::on(&root)
            .caption(plot_caption(title, &evaluation.metrics), ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(0.0..x_max, y_min..y_max)?;

        chart
            .configure_mesh()
            .x_desc("step")
            .y_desc("value")
            .draw()?;

        let series = [
            ("True", &evaluation.actual, BLUE),
            ("Prediction", &evaluation.predicted, RED),
        ];
        for (label, values, color) in series {
            let points = values
                .iter()
                .enumerate()
                .map(|(i, &v)| (i as f64, f64::from(v)));
            chart
                .draw_series(LineSeries::new(points, color))?
                .label(label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    };
    draw().map_err(|e| TrainError::Artifact(format!("{}: {}", path.display(), e)))?;

    tracing::info!("Wrote forecast plot to {}", path.display());
    Ok(())
}

/// Serialize the run report as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_report<P: AsRef<Path>>(path: P, report: &RunReport) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;

    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;

    tracing::info!("Wrote run report to {}", path.display());
    Ok(())
}
