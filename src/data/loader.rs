// ============================================================
// Layer 4 — MNIST Loader
// ============================================================
// Reads the standard MNIST IDX files with the `mnist` crate.
// Downloading the dataset is not our job: the four files
// must already sit in the data directory, uncompressed:
//
//   data/
//     train-images-idx3-ubyte
//     train-labels-idx1-ubyte
//     t10k-images-idx3-ubyte
//     t10k-labels-idx1-ubyte
//
// Only the training images are used; a GAN needs no labels.

use anyhow::{bail, Result};
use mnist::MnistBuilder;
use std::path::Path;

use crate::domain::image::{ImageVector, MNIST_PIXELS};
use crate::domain::traits::ImageSource;

/// The file names the `mnist` crate expects.
pub const MNIST_FILES: [&str; 4] = [
    "train-images-idx3-ubyte",
    "train-labels-idx1-ubyte",
    "t10k-images-idx3-ubyte",
    "t10k-labels-idx1-ubyte",
];

const MNIST_TRAIN_LEN: usize = 60_000;
const MNIST_TEST_LEN: usize = 10_000;

/// Loads MNIST training digits from a directory of IDX files.
pub struct MnistLoader {
    dir: String,
    /// Cap on the number of training images, if any
    limit: Option<usize>,
}

impl MnistLoader {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: dir.into(), limit: None }
    }

    /// Load at most `limit` images (useful for quick runs).
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Names of expected files missing from the directory.
    pub fn missing_files(&self) -> Vec<&'static str> {
        let dir = Path::new(&self.dir);
        MNIST_FILES
            .iter()
            .copied()
            .filter(|name| !dir.join(name).is_file())
            .collect()
    }

    fn train_len(&self) -> usize {
        self.limit.unwrap_or(MNIST_TRAIN_LEN).clamp(1, MNIST_TRAIN_LEN)
    }
}

impl ImageSource for MnistLoader {
    fn load_all(&self) -> Result<Vec<ImageVector>> {
        // The mnist crate panics on missing files, so check first.
        let missing = self.missing_files();
        if !missing.is_empty() {
            bail!(
                "MNIST files missing from '{}': {}. Download and gunzip them first.",
                self.dir,
                missing.join(", ")
            );
        }

        let train_len = self.train_len();
        let mnist = MnistBuilder::new()
            .base_path(&self.dir)
            .label_format_digit()
            .training_set_length(train_len as u32)
            .validation_set_length(0)
            .test_set_length(MNIST_TEST_LEN as u32)
            .finalize();

        let images: Vec<ImageVector> = mnist
            .trn_img
            .chunks(MNIST_PIXELS)
            .take(train_len)
            .map(ImageVector::from_bytes)
            .collect();

        tracing::info!("Loaded {} MNIST training images from '{}'", images.len(), self.dir);
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_directory_reports_all_files() {
        let loader = MnistLoader::new("/definitely/not/a/mnist/dir");
        assert_eq!(loader.missing_files().len(), 4);
        let err = loader.load_all().unwrap_err().to_string();
        assert!(err.contains("train-images-idx3-ubyte"));
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(MnistLoader::new("data").train_len(), 60_000);
        assert_eq!(MnistLoader::new("data").with_limit(Some(500)).train_len(), 500);
        assert_eq!(MnistLoader::new("data").with_limit(Some(0)).train_len(), 1);
        assert_eq!(MnistLoader::new("data").with_limit(Some(90_000)).train_len(), 60_000);
    }
}
