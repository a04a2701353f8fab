//! Model variant selection.

use aqcast_core::{InputLayout, ModelDims, Result};
use serde::{Deserialize, Serialize};

use crate::{FeedForwardConfig, PatchTstConfig, RecurrentConfig};

/// The closed set of model variants, chosen from configuration.
///
/// Serialized with a `type` tag:
///
/// ```toml
/// [model]
/// type = "patch_tst"
/// patch_len = 16
/// stride = 16
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelConfig {
    /// [`FeedForward`](crate::FeedForward) over the flattened lookback.
    FeedForward(FeedForwardConfig),
    /// [`Recurrent`](crate::Recurrent) LSTM over the lookback sequence.
    Recurrent(RecurrentConfig),
    /// [`PatchTst`](crate::PatchTst) transformer over lookback patches.
    PatchTst(PatchTstConfig),
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::FeedForward(FeedForwardConfig::default())
    }
}

impl ModelConfig {
    /// Short variant name, as used in configuration.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::FeedForward(_) => "feed_forward",
            Self::Recurrent(_) => "recurrent",
            Self::PatchTst(_) => "patch_tst",
        }
    }

    /// Input layout the variant consumes.
    #[must_use]
    pub fn input_layout(&self) -> InputLayout {
        match self {
            Self::FeedForward(_) => InputLayout::Flattened,
            Self::Recurrent(_) | Self::PatchTst(_) => InputLayout::Sequence,
        }
    }

    /// Check the variant's hyperparameters against the window geometry.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`](aqcast_core::CoreError::Configuration)
    /// describing the first invalid parameter.
    pub fn validate(&self, dims: &ModelDims) -> Result<()> {
        match self {
            Self::FeedForward(c) => c.validate(dims),
            Self::Recurrent(c) => c.validate(dims),
            Self::PatchTst(c) => c.validate(dims),
        }
    }
}

impl std::fmt::Display for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
