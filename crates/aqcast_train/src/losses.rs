//! Regression loss functions.

use burn::nn::loss::{MseLoss, Reduction};
use burn::prelude::*;
use serde::{Deserialize, Serialize};

/// Mean Squared Error loss.
#[derive(Debug, Clone, Copy, Default)]
pub struct MSELoss;

impl MSELoss {
    /// Create a new MSE loss.
    pub fn new() -> Self {
        Self
    }

    /// Compute the loss.
    pub fn forward<B: Backend>(&self, preds: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
        MseLoss::new().forward(preds, targets, Reduction::Mean)
    }
}

/// Mean Absolute Error (L1) loss.
#[derive(Debug, Clone, Copy, Default)]
pub struct MAELoss;

impl MAELoss {
    /// Create a new MAE loss.
    pub fn new() -> Self {
        Self
    }

    /// Compute the loss.
    pub fn forward<B: Backend>(&self, preds: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
        (preds - targets).abs().mean()
    }
}

/// Huber loss (smooth L1).
///
/// L = 0.5 * (y - pred)^2                  if |y - pred| <= delta
/// L = delta * (|y - pred| - 0.5 * delta)  otherwise
///
/// Written as `0.5 * q^2 + delta * (|d| - q)` with `q = min(|d|, delta)` so
/// it stays differentiable end to end.
#[derive(Debug, Clone, Copy)]
pub struct HuberLoss {
    /// Threshold between L2 and L1 behavior.
    pub delta: f32,
}

impl HuberLoss {
    /// Create a new Huber loss.
    pub fn new(delta: f32) -> Self {
        Self { delta }
    }

    /// Compute the loss.
    pub fn forward<B: Backend>(&self, preds: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
        let abs_diff = (preds - targets).abs();
        let quadratic = abs_diff.clone().clamp_max(self.delta);
        let linear = abs_diff - quadratic.clone();
        (quadratic.powf_scalar(2.0).mul_scalar(0.5) + linear.mul_scalar(self.delta)).mean()
    }
}

impl Default for HuberLoss {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Loss selected from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum LossKind {
    /// Mean squared error.
    #[default]
    Mse,
    /// Mean absolute error.
    Mae,
    /// Huber loss with the given threshold.
    Huber {
        /// Threshold between L2 and L1 behavior.
        delta: f32,
    },
}

impl LossKind {
    /// Compute the mean loss of `preds` against `targets`, both `(B, F)`.
    pub fn forward<B: Backend>(&self, preds: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
        match *self {
            Self::Mse => MSELoss::new().forward(preds, targets),
            Self::Mae => MAELoss::new().forward(preds, targets),
            Self::Huber { delta } => HuberLoss::new(delta).forward(preds, targets),
        }
    }

    /// Short name for logs and reports.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mse => "mse",
            Self::Mae => "mae",
            Self::Huber { .. } => "huber",
        }
    }
}
