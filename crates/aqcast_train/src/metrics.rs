//! Forecast error metrics on the stitched evaluation series.

use aqcast_core::CoreError;
use serde::{Deserialize, Serialize};

use crate::error::Result;

fn check_pair(predicted: &[f32], actual: &[f32]) -> Result<()> {
    if predicted.len() != actual.len() {
        return Err(CoreError::shape(format!(
            "{} predictions for {} actual values",
            predicted.len(),
            actual.len()
        ))
        .into());
    }
    if actual.is_empty() {
        return Err(CoreError::NumericDegeneracy("no values to score".to_string()).into());
    }
    Ok(())
}

/// Mean absolute error.
///
/// # Errors
///
/// Returns an error for mismatched or empty inputs.
pub fn mae(predicted: &[f32], actual: &[f32]) -> Result<f64> {
    check_pair(predicted, actual)?;
    let sum: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(&p, &a)| (f64::from(p) - f64::from(a)).abs())
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Root mean squared error.
///
/// # Errors
///
/// Returns an error for mismatched or empty inputs.
pub fn rmse(predicted: &[f32], actual: &[f32]) -> Result<f64> {
    check_pair(predicted, actual)?;
    let sum: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(&p, &a)| (f64::from(p) - f64::from(a)).powi(2))
        .sum();
    Ok((sum / actual.len() as f64).sqrt())
}

/// Mean absolute percentage error, in percent.
///
/// Each term is `|(p - a) / a|`, so a negative actual is taken in absolute
/// value and the error stays non-negative.
///
/// # Errors
///
/// Returns [`CoreError::NumericDegeneracy`] if any actual value is zero.
pub fn mape(predicted: &[f32], actual: &[f32]) -> Result<f64> {
    check_pair(predicted, actual)?;
    if let Some(step) = actual.iter().position(|&a| a == 0.0) {
        return Err(CoreError::NumericDegeneracy(format!(
            "MAPE is undefined: actual value at step {} is zero",
            step
        ))
        .into());
    }
    let sum: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(&p, &a)| ((f64::from(p) - f64::from(a)) / f64::from(a)).abs())
        .sum();
    Ok(sum / actual.len() as f64 * 100.0)
}

/// Coefficient of determination, `1 - SS_res / SS_tot`, with `actual` as
/// ground truth.
///
/// A constant actual series scores 1.0 on a perfect fit and 0.0 otherwise.
///
/// # Errors
///
/// Returns an error for mismatched or empty inputs.
pub fn r2_score(predicted: &[f32], actual: &[f32]) -> Result<f64> {
    check_pair(predicted, actual)?;
    let n = actual.len() as f64;
    let mean = actual.iter().map(|&a| f64::from(a)).sum::<f64>() / n;

    let ss_res: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(&p, &a)| (f64::from(a) - f64::from(p)).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|&a| (f64::from(a) - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}

/// Metrics reported for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastMetrics {
    /// Mean absolute percentage error (%).
    pub mape: f64,
    /// Mean absolute error.
    pub mae: f64,
    /// Root mean squared error.
    pub rmse: f64,
    /// Coefficient of determination.
    pub r2: f64,
}

impl ForecastMetrics {
    /// Score `predicted` against `actual`.
    ///
    /// # Errors
    ///
    /// Propagates the first metric error, including a zero actual value for
    /// MAPE.
    pub fn compute(predicted: &[f32], actual: &[f32]) -> Result<Self> {
        Ok(Self {
            mape: mape(predicted, actual)?,
            mae: mae(predicted, actual)?,
            rmse: rmse(predicted, actual)?,
            r2: r2_score(predicted, actual)?,
        })
    }

    /// One-line summary used as plot caption and log line.
    pub fn summary(&self) -> String {
        format!(
            "MAPE: {:.4}, MAE: {:.4}, R2: {:.4}",
            self.mape, self.mae, self.r2
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrainError;
    use approx::assert_relative_eq;

    #[test]
    fn test_mae_rmse() {
        let p = [1.0, 2.0, 3.0, 4.0];
        let a = [1.0, 3.0, 3.0, 6.0];
        assert_relative_eq!(mae(&p, &a).unwrap(), 0.75);
        assert_relative_eq!(rmse(&p, &a).unwrap(), (5.0f64 / 4.0).sqrt());
    }

    #[test]
    fn test_mape() {
        let p = [110.0, 45.0];
        let a = [100.0, 50.0];
        assert_relative_eq!(mape(&p, &a).unwrap(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mape_negative_actual() {
        // |(-9 - -10) / -10| and |(-22 - -20) / -20| are both 10%.
        let p = [-9.0, -22.0];
        let a = [-10.0, -20.0];
        assert_relative_eq!(mape(&p, &a).unwrap(), 10.0, epsilon = 1e-6);
    }

    #[test]
    fn test_mape_zero_actual() {
        let err = mape(&[1.0, 2.0], &[1.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            TrainError::CoreError(CoreError::NumericDegeneracy(_))
        ));
    }

    #[test]
    fn test_r2() {
        let a = [3.0, -0.5, 2.0, 7.0];
        let p = [2.5, 0.0, 2.0, 8.0];
        assert_relative_eq!(r2_score(&p, &a).unwrap(), 0.948_608_137, epsilon = 1e-6);
        assert_relative_eq!(r2_score(&a, &a).unwrap(), 1.0);
    }

    #[test]
    fn test_r2_uses_actual_as_truth() {
        let a = [1.0, 2.0, 3.0];
        let p = [2.0, 2.0, 2.0];
        // SS_tot of the constant prediction would be zero; of actual it is 2.
        assert_relative_eq!(r2_score(&p, &a).unwrap(), 0.0);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            mae(&[1.0], &[1.0, 2.0]),
            Err(TrainError::CoreError(CoreError::ShapeMismatch(_)))
        ));
    }

    #[test]
    fn test_summary_contains_metrics() {
        let m = ForecastMetrics::compute(&[2.0, 4.0], &[2.0, 5.0]).unwrap();
        let caption = m.summary();
        assert!(caption.contains("MAPE"));
        assert!(caption.contains("MAE"));
        assert!(caption.contains("R2"));
    }
}
