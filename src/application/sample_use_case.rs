// ============================================================
// Layer 2 — SampleUseCase
// ============================================================
// Generates digits from a trained checkpoint:
//
//   Step 1: Rebuild the Generator from the checkpoint (Layer 5)
//   Step 2: Draw `count` images from seeded latents    (Layer 5)
//   Step 3: Map pixels back to [0, 1]                  (Layer 4)
//   Step 4: Write them as one PNG grid                 (Layer 6)

use anyhow::{ensure, Context, Result};
use rand::{rngs::StdRng, SeedableRng};
use std::path::{Path, PathBuf};

use crate::application::train_use_case::image_side;
use crate::data::preprocessor::Preprocessor;
use crate::infra::{checkpoint::CheckpointManager, image_grid::save_grid};
use crate::ml::sampler::Sampler;

pub struct SampleUseCase {
    checkpoint_dir: String,
    count:          usize,
    seed:           u64,
    output:         PathBuf,
}

impl SampleUseCase {
    pub fn new(checkpoint_dir: String, count: usize, seed: u64, output: impl AsRef<Path>) -> Self {
        Self {
            checkpoint_dir,
            count,
            seed,
            output: output.as_ref().to_path_buf(),
        }
    }

    /// Returns the path of the written grid.
    pub fn execute(&self) -> Result<PathBuf> {
        ensure!(self.count > 0, "count must be at least 1");

        let ckpt = CheckpointManager::new(&self.checkpoint_dir);
        let sampler = Sampler::from_checkpoint(&ckpt)?;

        let pixels = sampler.image_size();
        let side = image_side(pixels)
            .with_context(|| format!("Generated images of {pixels} pixels are not square"))?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let images = sampler.generate(self.count, &mut rng)?;

        let preprocessor = Preprocessor::new(sampler.pixel_range());
        let images: Vec<_> = images.iter().map(|img| preprocessor.denormalize(img)).collect();

        save_grid(&images, side, &self.output)?;

        tracing::info!("Wrote {} samples to '{}'", images.len(), self.output.display());
        Ok(self.output.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainConfig;
    use crate::ml::{generator::Generator, trainer::generator_config};
    use burn::backend::{ndarray::NdArrayDevice, NdArray};

    fn write_checkpoint(dir: &Path) -> TrainConfig {
        let cfg = TrainConfig {
            checkpoint_dir: dir.to_string_lossy().into_owned(),
            image_size:     4,
            latent_size:    2,
            g_hidden:       vec![3],
            ..TrainConfig::default()
        };
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir);
        let device = NdArrayDevice::default();
        let generator: Generator<NdArray> =
            generator_config(&cfg).init(&mut StdRng::seed_from_u64(0), &device);
        ckpt.save_config(&cfg).unwrap();
        ckpt.save_module::<NdArray, _>("generator", &generator, 1).unwrap();
        ckpt.mark_latest(1).unwrap();
        cfg
    }

    #[test]
    fn test_samples_from_saved_checkpoint() {
        let dir = std::env::temp_dir().join(format!("mnist_gan_sample_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let cfg = write_checkpoint(&dir);

        let output = dir.join("out").join("samples.png");
        let use_case = SampleUseCase::new(cfg.checkpoint_dir.clone(), 4, 7, &output);
        assert_eq!(use_case.execute().unwrap(), output);

        let grid = image::open(&output).unwrap().to_luma8();
        // 2×2 tiles of 2px with 2px padding
        assert_eq!(grid.dimensions(), (10, 10));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_missing_checkpoint_fails() {
        let dir = std::env::temp_dir().join(format!("mnist_gan_nockpt_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let use_case = SampleUseCase::new(dir.to_string_lossy().into_owned(), 4, 7, dir.join("x.png"));
        assert!(use_case.execute().is_err());
        let _ = std::fs::remove_dir_all(dir);
    }
}
