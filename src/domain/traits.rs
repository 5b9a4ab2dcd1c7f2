// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The trainer never touches files or shuffling directly. It
// pulls batches through BatchSource, and the application
// layer fills the source from an ImageSource.
//
//   ImageSource  → MnistLoader (IDX files on disk)
//   BatchSource  → ShuffledBatches (in-memory dataset)

use anyhow::Result;
use rand::RngCore;

use crate::domain::image::ImageVector;

// ─── ImageSource ──────────────────────────────────────────────────────────────
/// Any component that can load a full set of images.
pub trait ImageSource {
    /// Load every available image, pixels in [0, 1].
    fn load_all(&self) -> Result<Vec<ImageVector>>;
}

// ─── BatchSource ──────────────────────────────────────────────────────────────
/// A restartable stream of mini-batches.
///
/// One pass over the data ends when `next_batch` returns `None`.
/// `restart` begins the next pass, reshuffling with the given RNG.
pub trait BatchSource {
    /// The next batch of the current pass, or `None` once exhausted.
    fn next_batch(&mut self) -> Option<Vec<ImageVector>>;

    /// Begin a new pass over the data.
    fn restart(&mut self, rng: &mut dyn RngCore);

    /// Number of batches in one pass.
    fn batches_per_pass(&self) -> usize;
}
