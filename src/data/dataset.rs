use burn::data::dataset::{transform::ShuffledDataset, Dataset};
use rand::RngCore;
use std::sync::Arc;

use crate::domain::image::ImageVector;
use crate::domain::traits::BatchSource;

/// In-memory image set, already normalised to the training range.
pub struct ImageDataset {
    images: Vec<ImageVector>,
}

impl ImageDataset {
    pub fn new(images: Vec<ImageVector>) -> Self {
        Self { images }
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Width of the first image, if any.
    pub fn image_len(&self) -> Option<usize> {
        self.images.first().map(ImageVector::len)
    }
}

impl Dataset<ImageVector> for ImageDataset {
    fn get(&self, index: usize) -> Option<ImageVector> {
        self.images.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.images.len()
    }
}

/// Shuffled mini-batches over a dataset, one pass per `restart`.
///
/// Each `restart` wraps the dataset in a burn `ShuffledDataset` seeded
/// from the caller's RNG. Before the first restart the pass is in
/// dataset order. The final batch of a pass may be shorter than
/// `batch_size`.
pub struct ShuffledBatches<D: Dataset<ImageVector>> {
    dataset:    Arc<D>,
    pass:       Option<ShuffledDataset<Arc<D>, ImageVector>>,
    batch_size: usize,
    cursor:     usize,
}

impl<D: Dataset<ImageVector>> ShuffledBatches<D> {
    /// A `batch_size` of zero is treated as one.
    pub fn new(dataset: D, batch_size: usize) -> Self {
        Self {
            dataset: Arc::new(dataset),
            pass: None,
            batch_size: batch_size.max(1),
            cursor: 0,
        }
    }

    pub fn dataset(&self) -> &D {
        &self.dataset
    }

    fn get(&self, index: usize) -> Option<ImageVector> {
        match &self.pass {
            Some(pass) => pass.get(index),
            None => self.dataset.get(index),
        }
    }
}

impl<D: Dataset<ImageVector>> BatchSource for ShuffledBatches<D> {
    fn next_batch(&mut self) -> Option<Vec<ImageVector>> {
        let len = self.dataset.len();
        if self.cursor >= len {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(len);
        let batch = (self.cursor..end).filter_map(|i| self.get(i)).collect();
        self.cursor = end;
        Some(batch)
    }

    fn restart(&mut self, rng: &mut dyn RngCore) {
        let seed = rng.next_u64();
        self.pass = Some(ShuffledDataset::with_seed(Arc::clone(&self.dataset), seed));
        self.cursor = 0;
    }

    fn batches_per_pass(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size)
    }
}
