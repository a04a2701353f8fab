//! Data split tags.

use serde::{Deserialize, Serialize};

/// Which part of the series a view, loader or log line belongs to.
///
/// The training split is the series prefix the scaler is fit on; the test
/// split is the held-out tail (plus the lookback rows needed to seed its
/// first window). The test split doubles as the per-epoch validation set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    /// Training prefix.
    #[default]
    Train,
    /// Held-out tail.
    Test,
}

impl Split {
    /// Check if this is the training split.
    #[must_use]
    pub const fn is_train(&self) -> bool {
        matches!(self, Split::Train)
    }

    /// Check if this is the held-out split.
    #[must_use]
    pub const fn is_test(&self) -> bool {
        matches!(self, Split::Test)
    }
}

impl std::fmt::Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Split::Train => write!(f, "train"),
            Split::Test => write!(f, "test"),
        }
    }
}
