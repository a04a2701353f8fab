//! Optimizer selection.
//!
//! Wraps burn's Adam, AdamW and SGD configurations behind one serde-tagged
//! configuration type.

use burn::optim::decay::WeightDecayConfig;
use burn::optim::momentum::MomentumConfig;
use burn::optim::{AdamConfig, AdamWConfig, SgdConfig};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrainError};

/// Optimizer selected from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum OptimizerConfig {
    /// Adam with optional L2 weight decay.
    Adam {
        /// Learning rate.
        lr: f64,
        /// L2 penalty (0 = disabled).
        #[serde(default)]
        weight_decay: f32,
    },
    /// Adam with decoupled weight decay.
    AdamW {
        /// Learning rate.
        lr: f64,
        /// Decoupled weight decay.
        #[serde(default = "default_adamw_decay")]
        weight_decay: f32,
    },
    /// Stochastic gradient descent.
    Sgd {
        /// Learning rate.
        lr: f64,
        /// Momentum factor (0 = disabled).
        #[serde(default)]
        momentum: f64,
        /// L2 penalty (0 = disabled).
        #[serde(default)]
        weight_decay: f32,
    },
}

fn default_adamw_decay() -> f32 {
    0.01
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::AdamW {
            lr: 1e-4,
            weight_decay: default_adamw_decay(),
        }
    }
}

impl OptimizerConfig {
    /// Learning rate.
    #[must_use]
    pub fn lr(&self) -> f64 {
        match *self {
            Self::Adam { lr, .. } | Self::AdamW { lr, .. } | Self::Sgd { lr, .. } => lr,
        }
    }

    /// Short name for logs and reports.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Adam { .. } => "adam",
            Self::AdamW { .. } => "adam_w",
            Self::Sgd { .. } => "sgd",
        }
    }

    /// Check the hyperparameters.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::Config`] for a non-positive or non-finite
    /// learning rate, a negative weight decay or a momentum outside `[0, 1)`.
    pub fn validate(&self) -> Result<()> {
        let lr = self.lr();
        if !lr.is_finite() || lr <= 0.0 {
            return Err(TrainError::Config(format!(
                "learning rate must be positive and finite, got {}",
                lr
            )));
        }
        let weight_decay = match *self {
            Self::Adam { weight_decay, .. }
            | Self::AdamW { weight_decay, .. }
            | Self::Sgd { weight_decay, .. } => weight_decay,
        };
        if !weight_decay.is_finite() || weight_decay < 0.0 {
            return Err(TrainError::Config(format!(
                "weight_decay must be >= 0, got {}",
                weight_decay
            )));
        }
        if let Self::Sgd { momentum, .. } = *self {
            if !(0.0..1.0).contains(&momentum) {
                return Err(TrainError::Config(format!(
                    "momentum must be in [0, 1), got {}",
                    momentum
                )));
            }
        }
        Ok(())
    }
}

fn weight_decay(penalty: f32) -> Option<WeightDecayConfig> {
    (penalty > 0.0).then(|| WeightDecayConfig::new(penalty))
}

/// Burn's Adam configuration for the given L2 penalty.
pub fn adam(weight_decay_penalty: f32) -> AdamConfig {
    AdamConfig::new().with_weight_decay(weight_decay(weight_decay_penalty))
}

/// Burn's AdamW configuration for the given decoupled decay.
pub fn adam_w(weight_decay_penalty: f32) -> AdamWConfig {
    AdamWConfig::new().with_weight_decay(weight_decay_penalty)
}

/// Burn's SGD configuration; a zero momentum disables it.
pub fn sgd(momentum: f64, weight_decay_penalty: f32) -> SgdConfig {
    let momentum = (momentum > 0.0).then(|| {
        MomentumConfig::new()
            .with_momentum(momentum)
            .with_dampening(0.0)
    });
    SgdConfig::new()
        .with_momentum(momentum)
        .with_weight_decay(weight_decay(weight_decay_penalty))
}
