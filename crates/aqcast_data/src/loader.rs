//! Mini-batch iteration over a windowed view.

use burn::prelude::*;

use crate::error::{DataError, Result};
use crate::sampler::{EpochShuffleSampler, Sampler, SequentialSampler};
use crate::window::WindowedDataset;
use aqcast_core::{Seed, Split, WindowBatch};

/// A loader that produces window batches from a [`WindowedDataset`].
///
/// # Example
///
/// ```rust,ignore
/// use aqcast_data::{WindowLoader, WindowedDataset};
/// use aqcast_core::Seed;
///
/// let loader = WindowLoader::builder(view)
///     .batch_size(32)
///     .shuffle(true)
///     .seed(Seed::new(42))
///     .build()?;
///
/// for batch in loader.iter::<B>(epoch, &device) {
///     let batch = batch?;
///     // (batch, L, C) lookback, (batch, F) forecast
/// }
/// ```
pub struct WindowLoader {
    dataset: WindowedDataset,
    batch_size: usize,
    shuffle: bool,
    sampler: Box<dyn Sampler>,
    split: Split,
}

impl std::fmt::Debug for WindowLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowLoader")
            .field("windows", &self.dataset.len())
            .field("batch_size", &self.batch_size)
            .field("shuffle", &self.shuffle)
            .field("split", &self.split)
            .finish()
    }
}

impl WindowLoader {
    /// Create a new loader builder.
    #[must_use]
    pub fn builder(dataset: WindowedDataset) -> WindowLoaderBuilder {
        WindowLoaderBuilder::new(dataset)
    }

    /// Get the windowed view.
    #[must_use]
    pub fn dataset(&self) -> &WindowedDataset {
        &self.dataset
    }

    /// Get the batch size.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Whether windows are reshuffled each epoch.
    #[must_use]
    pub fn is_shuffled(&self) -> bool {
        self.shuffle
    }

    /// Get the number of batches per epoch. The last one may be partial.
    #[must_use]
    pub fn n_batches(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size)
    }

    /// Get the total number of windows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    /// Check if the loader is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Get the data split type.
    #[must_use]
    pub fn split(&self) -> Split {
        self.split
    }

    /// Iterate over the batches of one epoch.
    ///
    /// # Type Parameters
    ///
    /// * `B` - The Burn backend to use for tensors
    #[must_use]
    pub fn iter<B: Backend>(&self, epoch: usize, device: &B::Device) -> WindowLoaderIter<'_, B> {
        WindowLoaderIter {
            loader: self,
            device: device.clone(),
            indices: self.sampler.sample(self.dataset.len(), epoch),
            current_batch: 0,
            n_batches: self.n_batches(),
        }
    }

    /// Every window in index order as one batch.
    ///
    /// # Errors
    ///
    /// Returns an error if tensor assembly fails.
    pub fn full_batch<B: Backend>(&self, device: &B::Device) -> Result<WindowBatch<B>> {
        self.dataset.full_batch(device)
    }
}

/// Builder for [`WindowLoader`].
pub struct WindowLoaderBuilder {
    dataset: WindowedDataset,
    batch_size: usize,
    shuffle: bool,
    seed: Option<Seed>,
    split: Split,
}

impl WindowLoaderBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new(dataset: WindowedDataset) -> Self {
        Self {
            dataset,
            batch_size: 32,
            shuffle: false,
            seed: None,
            split: Split::Train,
        }
    }

    /// Set the batch size.
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Enable or disable per-epoch shuffling.
    #[must_use]
    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Set the random seed for shuffling.
    #[must_use]
    pub fn seed(mut self, seed: Seed) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the data split type.
    #[must_use]
    pub fn split(mut self, split: Split) -> Self {
        self.split = split;
        self
    }

    /// Build the loader.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidBatchSize`] for a zero batch size,
    /// [`DataError::EmptyDataset`] if the view has no windows and
    /// [`DataError::SplitError`] for a shuffled test loader.
    pub fn build(self) -> Result<WindowLoader> {
        if self.batch_size == 0 {
            return Err(DataError::InvalidBatchSize(
                "Batch size must be greater than 0".to_string(),
            ));
        }

        // Test windows are stitched back in order.
        if self.split.is_test() && self.shuffle {
            return Err(DataError::SplitError(
                "test windows must be served in chronological order".to_string(),
            ));
        }

        if self.dataset.is_empty() {
            return Err(DataError::EmptyDataset);
        }

        let sampler: Box<dyn Sampler> = match (self.shuffle, self.seed) {
            (false, _) => Box::new(SequentialSampler),
            (true, Some(seed)) => Box::new(EpochShuffleSampler::new(seed)),
            (true, None) => Box::new(EpochShuffleSampler::from_entropy()),
        };

        Ok(WindowLoader {
            dataset: self.dataset,
            batch_size: self.batch_size,
            shuffle: self.shuffle,
            sampler,
            split: self.split,
        })
    }
}

/// Iterator over the batches of one epoch.
pub struct WindowLoaderIter<'a, B: Backend> {
    loader: &'a WindowLoader,
    device: B::Device,
    indices: Vec<usize>,
    current_batch: usize,
    n_batches: usize,
}

impl<'a, B: Backend> Iterator for WindowLoaderIter<'a, B> {
    type Item = Result<WindowBatch<B>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_batch >= self.n_batches {
            return None;
        }

        let start = self.current_batch * self.loader.batch_size;
        let end = std::cmp::min(start + self.loader.batch_size, self.indices.len());
        self.current_batch += 1;

        Some(
            self.loader
                .dataset
                .batch(&self.indices[start..end], &self.device),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.n_batches - self.current_batch;
        (remaining, Some(remaining))
    }
}

impl<'a, B: Backend> ExactSizeIterator for WindowLoaderIter<'a, B> {}
