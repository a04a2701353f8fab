//! Index samplers for the window loader.

use rand::prelude::*;

use aqcast_core::Seed;

/// Produces the window visiting order for an epoch.
pub trait Sampler: Send + Sync {
    /// Indices `0..n` in the order they should be visited during `epoch`.
    fn sample(&self, n: usize, epoch: usize) -> Vec<usize>;
}

/// Visits windows in index order every epoch.
#[derive(Debug, Clone, Default)]
pub struct SequentialSampler;

impl Sampler for SequentialSampler {
    fn sample(&self, n: usize, _epoch: usize) -> Vec<usize> {
        (0..n).collect()
    }
}

/// Draws a fresh permutation each epoch.
///
/// The permutation for epoch `e` comes from a ChaCha8 generator seeded with
/// `seed.epoch(e)`, so epochs differ from each other while a rerun with the
/// same seed repeats them exactly.
#[derive(Debug, Clone)]
pub struct EpochShuffleSampler {
    seed: Seed,
}

impl EpochShuffleSampler {
    /// Create a shuffling sampler from a run seed.
    #[must_use]
    pub fn new(seed: Seed) -> Self {
        Self { seed }
    }

    /// Create a shuffling sampler with an entropy-based seed.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            seed: Seed::new(rand::random()),
        }
    }
}

impl Sampler for EpochShuffleSampler {
    fn sample(&self, n: usize, epoch: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = self.seed.epoch(epoch).to_rng();
        indices.shuffle(&mut rng);
        indices
    }
}
