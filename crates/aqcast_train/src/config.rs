//! Typed run configuration.
//!
//! A run is described by one [`RunConfig`] read from TOML or JSON. Every
//! section rejects unknown keys so a misspelled option fails at load time
//! instead of silently falling back to a default.
//!
//! ```toml
//! use_single_channel = true
//! seed = 42
//!
//! [dataset]
//! path = "data/station.csv"
//! timestamp_column = "timestamp"
//! target_column = "pm25"
//!
//! [window]
//! lookback_size = 384
//! forecast_size = 7
//! tst_size = 365
//!
//! [train]
//! batch_size = 128
//! epochs = 100
//! loss = { type = "mse" }
//! optimizer = { type = "adam_w", lr = 0.0001 }
//!
//! [model]
//! type = "patch_tst"
//! d_model = 128
//! ```

use std::path::{Path, PathBuf};

use aqcast_core::{ModelDims, Seed};
use aqcast_data::CsvOptions;
use aqcast_models::ModelConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrainError};
use crate::losses::LossKind;
use crate::optimizer::OptimizerConfig;
use crate::training::ForecastTrainerConfig;

fn default_true() -> bool {
    true
}

/// Complete description of one experiment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Keep only the target column as input.
    #[serde(default = "default_true")]
    pub use_single_channel: bool,
    /// Root seed for weight init and shuffling.
    #[serde(default)]
    pub seed: Seed,
    /// Input CSV and its columns.
    pub dataset: DatasetConfig,
    /// Window geometry and test split.
    #[serde(default)]
    pub window: WindowConfig,
    /// Training loop settings.
    #[serde(default)]
    pub train: TrainConfig,
    /// Model variant and its architecture.
    #[serde(default)]
    pub model: ModelConfig,
    /// Evaluation mode.
    #[serde(default)]
    pub eval: EvalConfig,
    /// Output artifact paths.
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
}

/// `[dataset]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    /// Path to the input CSV.
    pub path: PathBuf,
    /// Name of the timestamp column.
    pub timestamp_column: String,
    /// Name of the column to forecast.
    pub target_column: String,
}

/// `[window]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    /// Lookback length `L`.
    pub lookback_size: usize,
    /// Forecast horizon `F`.
    pub forecast_size: usize,
    /// Rows held out at the tail of the series.
    pub tst_size: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            lookback_size: 384,
            forecast_size: 7,
            tst_size: 365,
        }
    }
}

/// `[train]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainConfig {
    /// Windows per mini-batch.
    pub batch_size: usize,
    /// Reshuffle the training windows every epoch.
    pub shuffle: bool,
    /// Number of epochs.
    pub epochs: usize,
    /// Loss function.
    pub loss: LossKind,
    /// Optimizer and its hyperparameters.
    pub optimizer: OptimizerConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            batch_size: 128,
            shuffle: true,
            epochs: 100,
            loss: LossKind::default(),
            optimizer: OptimizerConfig::default(),
        }
    }
}

/// `[eval]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvalConfig {
    /// Feed predictions back as inputs. Reserved; rejected by validation.
    pub dynamic: bool,
}

/// `[artifacts]` section. Missing paths are simply not written.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactsConfig {
    /// `step,actual,predicted` CSV.
    pub predictions_csv: Option<PathBuf>,
    /// SVG chart of actual vs predicted.
    pub plot: Option<PathBuf>,
    /// JSON run report.
    pub report_json: Option<PathBuf>,
}

impl RunConfig {
    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::Config`] on malformed input or unknown keys.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| TrainError::Config(e.to_string()))
    }

    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::Config`] on malformed input or unknown keys.
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| TrainError::Config(e.to_string()))
    }

    /// Load a configuration file, choosing the format by extension.
    ///
    /// Relative dataset and artifact paths are resolved against the
    /// directory containing the file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read and
    /// [`TrainError::Config`] for an unknown extension or invalid content.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;

        let mut config = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&text)?,
            Some("json") => Self::from_json_str(&text)?,
            other => {
                return Err(TrainError::Config(format!(
                    "unsupported config extension {:?} for {} (expected .toml or .json)",
                    other.unwrap_or(""),
                    path.display()
                )))
            }
        };

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        tracing::debug!("Loaded run config from {}", path.display());
        Ok(config)
    }

    /// Make relative dataset and artifact paths relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.dataset.path);
        for p in [
            &mut self.artifacts.predictions_csv,
            &mut self.artifacts.plot,
            &mut self.artifacts.report_json,
        ]
        .into_iter()
        .flatten()
        {
            resolve(p);
        }
    }

    /// Model dimensions for a series with `n_channels` input channels.
    #[must_use]
    pub fn model_dims(&self, n_channels: usize) -> ModelDims {
        ModelDims::new(
            self.window.lookback_size,
            self.window.forecast_size,
            n_channels,
        )
    }

    /// CSV column selection derived from the dataset section.
    #[must_use]
    pub fn csv_options(&self) -> CsvOptions {
        CsvOptions::new(
            self.dataset.timestamp_column.clone(),
            self.dataset.target_column.clone(),
        )
        .with_single_channel(self.use_single_channel)
    }

    /// Trainer settings derived from the train section.
    #[must_use]
    pub fn trainer_config(&self) -> ForecastTrainerConfig {
        ForecastTrainerConfig::new(self.train.epochs)
            .with_loss(self.train.loss)
            .with_optimizer(self.train.optimizer.clone())
    }

    /// Check everything that can be checked before the data is read.
    ///
    /// Model geometry is checked against a single channel here; the runner
    /// re-checks it once the real channel count is known.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.dataset.timestamp_column.is_empty() || self.dataset.target_column.is_empty() {
            return Err(TrainError::Config(
                "dataset.timestamp_column and dataset.target_column must be set".to_string(),
            ));
        }
        if self.dataset.timestamp_column == self.dataset.target_column {
            return Err(TrainError::Config(format!(
                "timestamp and target column are both '{}'",
                self.dataset.target_column
            )));
        }

        let w = &self.window;
        if w.lookback_size == 0 || w.forecast_size == 0 || w.tst_size == 0 {
            return Err(TrainError::Config(format!(
                "window sizes must be > 0 (lookback_size={}, forecast_size={}, tst_size={})",
                w.lookback_size, w.forecast_size, w.tst_size
            )));
        }
        if w.tst_size < w.forecast_size {
            return Err(TrainError::Config(format!(
                "tst_size ({}) must be at least forecast_size ({}) to hold one test window",
                w.tst_size, w.forecast_size
            )));
        }

        if self.train.batch_size == 0 {
            return Err(TrainError::Config("train.batch_size must be > 0".to_string()));
        }
        if self.train.epochs == 0 {
            return Err(TrainError::Config("train.epochs must be > 0".to_string()));
        }
        if let LossKind::Huber { delta } = self.train.loss {
            if !delta.is_finite() || delta <= 0.0 {
                return Err(TrainError::Config(format!(
                    "huber delta must be positive, got {}",
                    delta
                )));
            }
        }
        self.train.optimizer.validate()?;

        if self.eval.dynamic {
            return Err(TrainError::Config(
                "dynamic evaluation is not supported; set eval.dynamic = false".to_string(),
            ));
        }

        self.model
            .validate(&self.model_dims(1))
            .map_err(|e| TrainError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[dataset]
path = "data.csv"
timestamp_column = "time"
target_column = "pm25"
"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = RunConfig::from_toml_str(MINIMAL).unwrap();
        assert!(config.use_single_channel);
        assert_eq!(config.seed, Seed::default());
        assert_eq!(config.window, WindowConfig::default());
        assert_eq!(config.train.batch_size, 128);
        assert!(config.train.shuffle);
        assert_eq!(config.train.loss, LossKind::Mse);
        assert_eq!(config.model, ModelConfig::default());
        assert!(config.artifacts.plot.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_toml_config() {
        let text = r#"
use_single_channel = false
seed = 7

[dataset]
path = "data.csv"
timestamp_column = "time"
target_column = "pm25"

[window]
lookback_size = 32
forecast_size = 4
tst_size = 20

[train]
batch_size = 16
shuffle = false
epochs = 3
loss = { type = "huber", delta = 0.5 }
optimizer = { type = "sgd", lr = 0.01, momentum = 0.9 }

[model]
type = "patch_tst"
patch_len = 8
stride = 8
d_model = 16
n_heads = 2
n_layers = 1
d_ff = 32

[artifacts]
plot = "out/plot.svg"
"#;
        let config = RunConfig::from_toml_str(text).unwrap();
        assert!(!config.use_single_channel);
        assert_eq!(config.seed, Seed::new(7));
        assert_eq!(config.window.lookback_size, 32);
        assert_eq!(config.train.loss, LossKind::Huber { delta: 0.5 });
        assert_eq!(config.train.optimizer.name(), "sgd");
        assert_eq!(config.model.name(), "patch_tst");
        assert_eq!(config.artifacts.plot, Some(PathBuf::from("out/plot.svg")));
        assert!(config.validate().is_ok());
        assert!(!config.csv_options().single_channel);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let text = format!("{}\n[window]\nlookback = 10\n", MINIMAL);
        let err = RunConfig::from_toml_str(&text).unwrap_err();
        assert!(matches!(err, TrainError::Config(_)));
    }

    #[test]
    fn test_json_config() {
        let text = r#"{
            "dataset": {"path": "d.csv", "timestamp_column": "t", "target_column": "y"},
            "window": {"lookback_size": 10, "forecast_size": 5, "tst_size": 10},
            "model": {"type": "recurrent", "hidden_size": 8}
        }"#;
        let config = RunConfig::from_json_str(text).unwrap();
        assert_eq!(config.model.name(), "recurrent");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = RunConfig::from_toml_str(MINIMAL).unwrap();

        let mut c = base.clone();
        c.eval.dynamic = true;
        assert!(c.validate().is_err());

        let mut c = base.clone();
        c.window.forecast_size = 0;
        assert!(c.validate().is_err());

        let mut c = base.clone();
        c.window.tst_size = 3;
        c.window.forecast_size = 7;
        assert!(c.validate().is_err());

        let mut c = base.clone();
        c.train.batch_size = 0;
        assert!(c.validate().is_err());

        let mut c = base.clone();
        c.train.optimizer = OptimizerConfig::Adam {
            lr: -1.0,
            weight_decay: 0.0,
        };
        assert!(c.validate().is_err());

        let mut c = base;
        c.dataset.target_column = "time".to_string();
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_load_by_extension_resolves_paths() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("run.toml");
        std::fs::write(&toml_path, MINIMAL).unwrap();

        let config = RunConfig::load(&toml_path).unwrap();
        assert_eq!(config.dataset.path, dir.path().join("data.csv"));

        let yaml_path = dir.path().join("run.yaml");
        std::fs::write(&yaml_path, MINIMAL).unwrap();
        assert!(matches!(
            RunConfig::load(&yaml_path),
            Err(TrainError::Config(_))
        ));
    }
}
