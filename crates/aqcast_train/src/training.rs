//! Training loop implementation.
//!
//! [`ForecastTrainer`] drives any [`ForecastModel`] through a fixed number of
//! epochs of mini-batch optimization, reporting a size-weighted training loss
//! and a held-out validation loss to an [`EpochObserver`] after each epoch.

use std::time::Instant;

use aqcast_core::{ForecastModel, LookbackInput};
use aqcast_data::{WindowLoader, WindowedDataset};
use burn::module::AutodiffModule;
use burn::optim::{GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;

use crate::error::{Result, TrainError};
use crate::losses::LossKind;
use crate::observer::{EpochObserver, EpochReport};
use crate::optimizer::{self, OptimizerConfig};

/// Lifecycle of a [`ForecastTrainer`].
///
/// There is no early stopping: a trainer always runs every configured epoch
/// or fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrainingState {
    /// No epoch has started.
    #[default]
    Uninitialized,
    /// Running the given epoch (0-based).
    Training {
        /// Current epoch.
        epoch: usize,
    },
    /// All epochs completed.
    Converged,
}

/// Configuration for [`ForecastTrainer`].
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastTrainerConfig {
    /// Number of epochs.
    pub n_epochs: usize,
    /// Loss function.
    pub loss: LossKind,
    /// Optimizer and its hyperparameters.
    pub optimizer: OptimizerConfig,
}

impl Default for ForecastTrainerConfig {
    fn default() -> Self {
        Self {
            n_epochs: 100,
            loss: LossKind::Mse,
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl ForecastTrainerConfig {
    /// Create a config for the given epoch count.
    pub fn new(n_epochs: usize) -> Self {
        Self {
            n_epochs,
            ..Default::default()
        }
    }

    /// Set the loss function.
    #[must_use]
    pub fn with_loss(mut self, loss: LossKind) -> Self {
        self.loss = loss;
        self
    }

    /// Set the optimizer.
    #[must_use]
    pub fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }
}

/// Training output with loss history and the final model.
#[derive(Debug)]
pub struct TrainingOutput<M> {
    /// Model after the last epoch.
    pub model: M,
    /// Training losses per epoch.
    pub train_losses: Vec<f32>,
    /// Validation losses per epoch.
    pub valid_losses: Vec<f32>,
    /// Total training time in seconds.
    pub training_time_secs: f64,
}

/// Trainer for forecasting models.
pub struct ForecastTrainer<B: AutodiffBackend> {
    config: ForecastTrainerConfig,
    device: B::Device,
    state: TrainingState,
}

impl<B: AutodiffBackend> ForecastTrainer<B> {
    /// Create a new trainer.
    pub fn new(config: ForecastTrainerConfig, device: B::Device) -> Self {
        Self {
            config,
            device,
            state: TrainingState::Uninitialized,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TrainingState {
        self.state
    }

    /// Get the configuration.
    pub fn config(&self) -> &ForecastTrainerConfig {
        &self.config
    }

    /// Train `model` with the configured optimizer.
    ///
    /// # Arguments
    ///
    /// * `model` - Freshly initialized model
    /// * `train` - Loader over the training windows
    /// * `valid` - Held-out windows, scored in one batch after every epoch
    /// * `observer` - Receives one [`EpochReport`] per epoch
    ///
    /// # Errors
    ///
    /// Any shape mismatch, non-finite loss or observer error aborts the run.
    pub fn fit<M, O>(
        &mut self,
        model: M,
        train: &WindowLoader,
        valid: &WindowedDataset,
        observer: &mut O,
    ) -> Result<TrainingOutput<M>>
    where
        M: AutodiffModule<B> + ForecastModel<B>,
        M::InnerModule: ForecastModel<B::InnerBackend>,
        O: EpochObserver + ?Sized,
    {
        match self.config.optimizer.clone() {
            OptimizerConfig::Adam { weight_decay, .. } => {
                let optim = optimizer::adam(weight_decay).init::<B, M>();
                self.fit_with_optimizer(model, optim, train, valid, observer)
            }
            OptimizerConfig::AdamW { weight_decay, .. } => {
                let optim = optimizer::adam_w(weight_decay).init::<B, M>();
                self.fit_with_optimizer(model, optim, train, valid, observer)
            }
            OptimizerConfig::Sgd {
                momentum,
                weight_decay,
                ..
            } => {
                let optim = optimizer::sgd(momentum, weight_decay).init::<B, M>();
                self.fit_with_optimizer(model, optim, train, valid, observer)
            }
        }
    }

    /// Train `model` with an already built optimizer.
    ///
    /// The learning rate still comes from the configured optimizer.
    ///
    /// # Errors
    ///
    /// Same as [`ForecastTrainer::fit`].
    pub fn fit_with_optimizer<M, Opt, O>(
        &mut self,
        model: M,
        mut optim: Opt,
        train: &WindowLoader,
        valid: &WindowedDataset,
        observer: &mut O,
    ) -> Result<TrainingOutput<M>>
    where
        M: AutodiffModule<B> + ForecastModel<B>,
        M::InnerModule: ForecastModel<B::InnerBackend>,
        Opt: Optimizer<M, B>,
        O: EpochObserver + ?Sized,
    {
        let start_time = Instant::now();
        let n_epochs = self.config.n_epochs;
        let lr = self.config.optimizer.lr();

        tracing::info!(
            "Starting training for {} epochs ({} {} windows, {} batches/epoch, optimizer={}, loss={})",
            n_epochs,
            train.len(),
            train.split(),
            train.n_batches(),
            self.config.optimizer.name(),
            self.config.loss.name()
        );

        let mut train_losses = Vec::with_capacity(n_epochs);
        let mut valid_losses = Vec::with_capacity(n_epochs);
        let mut current_model = model;

        for epoch in 0..n_epochs {
            self.state = TrainingState::Training { epoch };

            let train_loss = self.train_epoch(&mut current_model, &mut optim, lr, train, epoch)?;
            let valid_loss = self.valid_epoch(&current_model, valid, epoch)?;

            train_losses.push(train_loss);
            valid_losses.push(valid_loss);

            observer.on_epoch_end(&EpochReport {
                epoch,
                n_epochs,
                train_loss,
                valid_loss,
            })?;
        }

        self.state = TrainingState::Converged;
        observer.on_fit_end()?;

        let training_time_secs = start_time.elapsed().as_secs_f64();
        tracing::info!("Training complete in {:.1}s", training_time_secs);

        Ok(TrainingOutput {
            model: current_model,
            train_losses,
            valid_losses,
            training_time_secs,
        })
    }

    fn train_epoch<M, Opt>(
        &self,
        model: &mut M,
        optim: &mut Opt,
        lr: f64,
        train: &WindowLoader,
        epoch: usize,
    ) -> Result<f32>
    where
        M: AutodiffModule<B> + ForecastModel<B>,
        Opt: Optimizer<M, B>,
    {
        let mut weighted_loss = 0.0f64;
        let mut n_samples = 0usize;
        let layout = model.input_layout();

        for (batch_idx, batch_result) in train.iter::<B>(epoch, &self.device).enumerate() {
            let batch = batch_result?;
            let batch_size = batch.batch_size();

            let input = LookbackInput::from_windows(batch.lookback, layout);
            let preds = model.predict_batch(input)?;

            let loss = self.config.loss.forward(preds, batch.forecast);
            let loss_value = loss.clone().into_scalar().elem::<f32>();
            if !loss_value.is_finite() {
                return Err(TrainError::NonFiniteLoss {
                    epoch,
                    batch: batch_idx,
                    value: loss_value,
                });
            }

            // Gradients are rebuilt from this loss alone, nothing carries
            // over from the previous batch.
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, model);
            *model = optim.step(lr, model.clone(), grads);

            weighted_loss += f64::from(loss_value) * batch_size as f64;
            n_samples += batch_size;

            tracing::debug!(
                "epoch {} batch {}: loss={:.6} (n={})",
                epoch,
                batch_idx,
                loss_value,
                batch_size
            );
        }

        Ok((weighted_loss / n_samples.max(1) as f64) as f32)
    }

    fn valid_epoch<M>(&self, model: &M, valid: &WindowedDataset, epoch: usize) -> Result<f32>
    where
        M: AutodiffModule<B>,
        M::InnerModule: ForecastModel<B::InnerBackend>,
    {
        let inner_model = model.clone().valid();
        let inner_device: <B::InnerBackend as Backend>::Device = self.device.clone();

        let batch = valid.full_batch::<B::InnerBackend>(&inner_device)?;
        let input = LookbackInput::from_windows(batch.lookback, inner_model.input_layout());
        let preds = inner_model.predict_batch(input)?;

        let loss = self
            .config
            .loss
            .forward(preds, batch.forecast)
            .into_scalar()
            .elem::<f32>();
        if !loss.is_finite() {
            return Err(TrainError::NonFiniteLoss {
                epoch,
                batch: 0,
                value: loss,
            });
        }
        Ok(loss)
    }
}
