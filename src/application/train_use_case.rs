// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Validate hyperparameters
//   Step 2: Load MNIST digits              (Layer 4 - data)
//   Step 3: Rescale to the pixel range     (Layer 4 - data)
//   Step 4: Build the shuffled batch source (Layer 4 - data)
//   Step 5: Save config                    (Layer 6 - infra)
//   Step 6: Run the adversarial loop       (Layer 5 - ml)

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::{ImageDataset, ShuffledBatches},
    loader::MnistLoader,
    preprocessor::Preprocessor,
};
use crate::domain::{
    image::{PixelRange, MNIST_PIXELS},
    latent::LatentDistribution,
    traits::{BatchSource, ImageSource},
};
use crate::error::{GanError, GanResult};
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::backend::BackendKind;
use crate::ml::trainer::{run_training, StopFlag, TrainingSummary};

// ─── Training Configuration ──────────────────────────────────────────────────
// Every hyperparameter of a run. Saved next to the checkpoints
// so `sample` can rebuild the same Generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub data_dir:            String,
    pub checkpoint_dir:      String,
    pub backend:             BackendKind,
    pub epochs:              usize,
    pub batch_size:          usize,
    pub image_size:          usize,
    pub latent_size:         usize,
    pub d_hidden:            Vec<usize>,
    pub g_hidden:            Vec<usize>,
    pub leaky_slope:         f64,
    pub dropout:             f64,
    pub lr_d:                f64,
    pub lr_g:                f64,
    pub beta_1:              f64,
    pub latent_distribution: LatentDistribution,
    pub pixel_range:         PixelRange,
    /// Train D against 0.9 instead of 1.0 for real images
    pub smooth_labels:       bool,
    pub seed:                u64,
    /// Fixed-latent samples written after every epoch (0 = none)
    pub sample_count:        usize,
    /// Log batch losses every N batches
    pub log_every:           usize,
    pub train_limit:         Option<usize>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:            "data".to_string(),
            checkpoint_dir:      "checkpoints".to_string(),
            backend:             BackendKind::NdArray,
            epochs:              40,
            batch_size:          64,
            image_size:          MNIST_PIXELS,
            latent_size:         100,
            d_hidden:            vec![128, 64, 32],
            g_hidden:            vec![32, 64, 128],
            leaky_slope:         0.2,
            dropout:             0.3,
            lr_d:                0.002,
            lr_g:                0.002,
            beta_1:              0.5,
            latent_distribution: LatentDistribution::Uniform,
            pixel_range:         PixelRange::Symmetric,
            smooth_labels:       false,
            seed:                42,
            sample_count:        16,
            log_every:           100,
            train_limit:         None,
        }
    }
}

impl TrainConfig {
    /// Reject settings no network or loop could run with.
    pub fn validate(&self) -> GanResult<()> {
        let invalid = |msg: String| Err(GanError::InvalidConfig(msg));

        if self.epochs == 0 {
            return invalid("epochs must be at least 1".into());
        }
        if self.batch_size == 0 {
            return invalid("batch_size must be at least 1".into());
        }
        if self.image_size == 0 || self.latent_size == 0 {
            return invalid("image_size and latent_size must be positive".into());
        }
        for (name, widths) in [("d_hidden", &self.d_hidden), ("g_hidden", &self.g_hidden)] {
            if widths.is_empty() {
                return invalid(format!("{name} needs at least one hidden layer"));
            }
            if widths.contains(&0) {
                return invalid(format!("{name} contains a zero-width layer"));
            }
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return invalid(format!("dropout {} is outside [0, 1)", self.dropout));
        }
        if !(self.lr_d > 0.0 && self.lr_g > 0.0) {
            return invalid("learning rates must be positive".into());
        }
        if !(0.0..1.0).contains(&self.beta_1) {
            return invalid(format!("beta_1 {} is outside [0, 1)", self.beta_1));
        }
        if self.sample_count > 0 && image_side(self.image_size).is_none() {
            return invalid(format!(
                "image_size {} is not a square, cannot write sample grids",
                self.image_size
            ));
        }
        Ok(())
    }

    /// Target label for real images in the discriminator step.
    pub fn real_label(&self) -> f32 {
        if self.smooth_labels { 0.9 } else { 1.0 }
    }
}

/// Side length of a square image with `pixels` pixels.
pub fn image_side(pixels: usize) -> Option<usize> {
    let side = (pixels as f64).sqrt().round() as usize;
    (side > 0 && side * side == pixels).then_some(side)
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Runs every epoch unless `stop` is raised, which ends training
    /// at the next batch boundary.
    pub fn execute(&self, stop: &StopFlag) -> Result<TrainingSummary> {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        cfg.validate()?;

        // ── Step 2: Load MNIST ────────────────────────────────────────────────
        tracing::info!("Loading MNIST from '{}'", cfg.data_dir);
        let loader = MnistLoader::new(&cfg.data_dir).with_limit(cfg.train_limit);
        let raw = loader.load_all()?;
        ensure!(!raw.is_empty(), GanError::EmptyBatch);

        // ── Step 3: Rescale pixels ────────────────────────────────────────────
        let images = Preprocessor::new(cfg.pixel_range).normalize_all(raw);

        // ── Step 4: Batch source ──────────────────────────────────────────────
        let dataset = ImageDataset::new(images);
        if let Some(width) = dataset.image_len() {
            if width != cfg.image_size {
                return Err(GanError::ShapeMismatch { expected: cfg.image_size, actual: width }.into());
            }
        }
        let mut source = ShuffledBatches::new(dataset, cfg.batch_size);
        tracing::info!(
            "{} images, {} batches of up to {} per epoch",
            source.dataset().image_count(),
            source.batches_per_pass(),
            cfg.batch_size
        );

        // ── Step 5: Save config for sampling ──────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.save_config(cfg)?;
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;

        // ── Step 6: Adversarial training (Layer 5) ────────────────────────────
        run_training(cfg, &mut source, &ckpt_manager, &metrics, stop)
    }
}
