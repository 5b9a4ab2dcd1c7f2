// ============================================================
// Layer 5 — Sampler
// ============================================================
// Rebuilds the Generator from a checkpoint directory and draws
// new digits from it. Runs on the plain NdArray backend: no
// autodiff, no dropout, no GPU needed.

use anyhow::Result;
use burn::backend::{ndarray::NdArrayDevice, NdArray};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::data::batcher::{unstack_images, VectorBatcher};
use crate::domain::{
    image::{ImageVector, PixelRange},
    latent::LatentSampler,
};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::generator::Generator;
use crate::ml::trainer::generator_config;

type InferBackend = NdArray;

pub struct Sampler {
    generator: Generator<InferBackend>,
    latents:   LatentSampler,
    batcher:   VectorBatcher<InferBackend>,
}

impl Sampler {
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager) -> Result<Self> {
        let device = NdArrayDevice::default();
        let cfg = ckpt_manager.load_config()?;

        // Initial values are overwritten by the record
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let generator = generator_config(&cfg).init::<InferBackend, _>(&mut rng, &device);
        let generator = ckpt_manager.load_module::<InferBackend, _>("generator", generator, &device)?;
        tracing::info!("Generator loaded from checkpoint");

        Ok(Self::new(
            generator,
            LatentSampler::new(cfg.latent_size, cfg.latent_distribution),
            device,
        ))
    }

    pub fn new(generator: Generator<InferBackend>, latents: LatentSampler, device: NdArrayDevice) -> Self {
        Self { generator, latents, batcher: VectorBatcher::new(device) }
    }

    pub fn pixel_range(&self) -> PixelRange {
        self.generator.pixel_range()
    }

    /// Flattened width of every generated image.
    pub fn image_size(&self) -> usize {
        self.generator.output_size()
    }

    /// `count` images in the generator's pixel range.
    pub fn generate<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Result<Vec<ImageVector>> {
        let z = self.latents.sample_batch(count, rng);
        let z = self.batcher.latents(&z, self.generator.latent_size)?;
        let images = unstack_images(self.generator.forward(z)?)?;
        tracing::debug!("Generated {} samples", images.len());
        Ok(images)
    }
}
