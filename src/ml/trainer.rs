// ============================================================
// Layer 5 — Adversarial Training Loop
// ============================================================
// One training step on a batch of B real images:
//
//   1. D loss on real images vs "real"
//   2. D loss on B detached fakes vs "fake"
//   3. backward(real + fake), Adam step on D only
//   4. fresh latents → fakes → D loss vs "real" (G's loss)
//   5. backward through D into G, Adam step on G only
//
// Each network has its own optimiser, and gradients are
// extracted per module with GradientsParams::from_grads, so a
// step can only ever move the parameters it targets.
//
// Randomness (latents, dropout masks) comes from one seeded
// StdRng owned by the trainer; batch shuffling uses a second.

use anyhow::Result;
use burn::{
    backend::{
        ndarray::NdArrayDevice,
        wgpu::WgpuDevice,
        Autodiff, NdArray, Wgpu,
    },
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::{rngs::StdRng, SeedableRng};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::application::train_use_case::{image_side, TrainConfig};
use crate::data::{
    batcher::{unstack_images, VectorBatcher},
    preprocessor::Preprocessor,
};
use crate::domain::{
    image::ImageVector,
    latent::{LatentSampler, LatentVector},
    traits::BatchSource,
};
use crate::error::{ensure_finite, GanError, GanResult};
use crate::infra::{
    checkpoint::CheckpointManager,
    image_grid::save_grid,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::backend::BackendKind;
use crate::ml::discriminator::{Discriminator, DiscriminatorConfig};
use crate::ml::generator::{Generator, GeneratorConfig};
use crate::ml::layers::bce_with_logits;

const FAKE_LABEL: f32 = 0.0;
const REAL_LABEL: f32 = 1.0;

// ─── Step Results ─────────────────────────────────────────────────────────────
/// Losses from one full D + G step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepLosses {
    pub d_real: f32,
    pub d_fake: f32,
    /// d_real + d_fake
    pub d_loss: f32,
    pub g_loss: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSettings {
    pub lr_d: f64,
    pub lr_g: f64,
    /// Target for real images in the D step (1.0, or 0.9 smoothed)
    pub real_label: f32,
}

// ─── Stop Flag ────────────────────────────────────────────────────────────────
/// Checked between batches; raising it ends training after the
/// current batch.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ─── GanTrainer ───────────────────────────────────────────────────────────────
pub struct GanTrainer<B, OD, OG>
where
    B: AutodiffBackend,
    OD: Optimizer<Discriminator<B>, B>,
    OG: Optimizer<Generator<B>, B>,
{
    discriminator: Discriminator<B>,
    generator:     Generator<B>,
    optim_d:       OD,
    optim_g:       OG,
    sampler:       LatentSampler,
    batcher:       VectorBatcher<B>,
    settings:      StepSettings,
    rng:           StdRng,
}

impl<B, OD, OG> GanTrainer<B, OD, OG>
where
    B: AutodiffBackend,
    OD: Optimizer<Discriminator<B>, B>,
    OG: Optimizer<Generator<B>, B>,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        discriminator: Discriminator<B>,
        generator:     Generator<B>,
        optim_d:       OD,
        optim_g:       OG,
        sampler:       LatentSampler,
        settings:      StepSettings,
        rng:           StdRng,
        device:        B::Device,
    ) -> Self {
        Self {
            discriminator,
            generator,
            optim_d,
            optim_g,
            sampler,
            batcher: VectorBatcher::new(device),
            settings,
            rng,
        }
    }

    pub fn discriminator(&self) -> &Discriminator<B> {
        &self.discriminator
    }

    pub fn generator(&self) -> &Generator<B> {
        &self.generator
    }

    pub fn sample_latents(&mut self, count: usize) -> Vec<LatentVector> {
        self.sampler.sample_batch(count, &mut self.rng)
    }

    /// Full D + G step with latents drawn from the trainer's RNG.
    pub fn train_step(&mut self, real: &[ImageVector]) -> GanResult<StepLosses> {
        if real.is_empty() {
            return Err(GanError::EmptyBatch);
        }
        let d_latents = self.sample_latents(real.len());
        let g_latents = self.sample_latents(real.len());
        self.train_step_with(real, &d_latents, &g_latents)
    }

    /// Full D + G step with explicit latents for each half.
    pub fn train_step_with(
        &mut self,
        real:      &[ImageVector],
        d_latents: &[LatentVector],
        g_latents: &[LatentVector],
    ) -> GanResult<StepLosses> {
        let real = self.batcher.images(real, self.discriminator.input_size)?;
        let d_latents = self.batcher.latents(d_latents, self.generator.latent_size)?;
        let (d_real, d_fake) = self.discriminator_step(real, d_latents)?;

        let g_latents = self.batcher.latents(g_latents, self.generator.latent_size)?;
        let g_loss = self.generator_step(g_latents)?;

        Ok(StepLosses { d_real, d_fake, d_loss: d_real + d_fake, g_loss })
    }

    /// Steps 1–3: update D on real images and detached fakes.
    /// Returns (real loss, fake loss) before the update.
    pub fn discriminator_step(
        &mut self,
        real:    Tensor<B, 2>,
        latents: Tensor<B, 2>,
    ) -> GanResult<(f32, f32)> {
        let fake = self.generator.forward(latents)?.detach();

        let real_logits = self.discriminator.forward_train(real, &mut self.rng)?;
        let fake_logits = self.discriminator.forward_train(fake, &mut self.rng)?;
        let real_loss = bce_with_logits(real_logits, self.settings.real_label);
        let fake_loss = bce_with_logits(fake_logits, FAKE_LABEL);

        let d_real = ensure_finite("d_real_loss", scalar(&real_loss))?;
        let d_fake = ensure_finite("d_fake_loss", scalar(&fake_loss))?;

        let grads = (real_loss + fake_loss).backward();
        let grads = GradientsParams::from_grads(grads, &self.discriminator);
        self.discriminator = self
            .optim_d
            .step(self.settings.lr_d, self.discriminator.clone(), grads);
        ensure_finite("discriminator parameters", self.discriminator.param_sum())?;

        Ok((d_real, d_fake))
    }

    /// Steps 4–5: update G so that D scores its fakes as real.
    pub fn generator_step(&mut self, latents: Tensor<B, 2>) -> GanResult<f32> {
        let fake = self.generator.forward(latents)?;
        let logits = self.discriminator.forward_train(fake, &mut self.rng)?;
        let loss = bce_with_logits(logits, REAL_LABEL);
        let g_loss = ensure_finite("g_loss", scalar(&loss))?;

        // D's gradients are computed on the way through but never applied
        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.generator);
        self.generator = self
            .optim_g
            .step(self.settings.lr_g, self.generator.clone(), grads);
        ensure_finite("generator parameters", self.generator.param_sum())?;

        Ok(g_loss)
    }

    /// Run the generator in evaluation mode on the given latents.
    pub fn generate(&self, latents: &[LatentVector]) -> GanResult<Vec<ImageVector>> {
        let generator = self.generator.valid();
        let batcher = VectorBatcher::<B::InnerBackend>::new(self.batcher.device.clone());
        let z = batcher.latents(latents, generator.latent_size)?;
        unstack_images(generator.forward(z)?)
    }
}

fn scalar<B: Backend>(loss: &Tensor<B, 1>) -> f32 {
    loss.clone().into_scalar().elem::<f32>()
}

// ─── Construction From Config ─────────────────────────────────────────────────
pub fn discriminator_config(cfg: &TrainConfig) -> DiscriminatorConfig {
    DiscriminatorConfig::new(cfg.image_size, cfg.d_hidden.clone())
        .with_leaky_slope(cfg.leaky_slope)
        .with_dropout(cfg.dropout)
}

pub fn generator_config(cfg: &TrainConfig) -> GeneratorConfig {
    GeneratorConfig::new(cfg.latent_size, cfg.g_hidden.clone(), cfg.image_size)
        .with_leaky_slope(cfg.leaky_slope)
        .with_pixel_range(cfg.pixel_range)
}

/// Both networks initialised from `cfg.seed`, each with its own Adam.
pub fn build_trainer<B: AutodiffBackend>(
    cfg:    &TrainConfig,
    device: &B::Device,
) -> GanResult<GanTrainer<B, impl Optimizer<Discriminator<B>, B>, impl Optimizer<Generator<B>, B>>> {
    cfg.validate()?;

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let discriminator = discriminator_config(cfg).init::<B, _>(&mut rng, device)?;
    let generator = generator_config(cfg).init::<B, _>(&mut rng, device);

    // m = β1*m + (1-β1)*g,  v = β2*v + (1-β2)*g²,  θ -= lr * m / (√v + ε)
    let adam = AdamConfig::new().with_beta_1(cfg.beta_1 as f32);
    let optim_d = adam.init::<B, Discriminator<B>>();
    let optim_g = adam.init::<B, Generator<B>>();

    let settings = StepSettings {
        lr_d: cfg.lr_d,
        lr_g: cfg.lr_g,
        real_label: cfg.real_label(),
    };
    let sampler = LatentSampler::new(cfg.latent_size, cfg.latent_distribution);

    Ok(GanTrainer::new(
        discriminator,
        generator,
        optim_d,
        optim_g,
        sampler,
        settings,
        rng,
        device.clone(),
    ))
}

// ─── Epoch Loop ───────────────────────────────────────────────────────────────
/// Outcome of a training run.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub history:     Vec<EpochMetrics>,
    pub interrupted: bool,
}

impl TrainingSummary {
    pub fn epochs_completed(&self) -> usize {
        self.history.len()
    }
}

/// Pick the configured backend and train on it.
pub fn run_training(
    cfg:          &TrainConfig,
    source:       &mut dyn BatchSource,
    ckpt_manager: &CheckpointManager,
    metrics:      &MetricsLogger,
    stop:         &StopFlag,
) -> Result<TrainingSummary> {
    match cfg.backend {
        BackendKind::NdArray => {
            let device = NdArrayDevice::default();
            tracing::info!("Using NdArray device: {:?}", device);
            train_loop::<Autodiff<NdArray>>(cfg, source, ckpt_manager, metrics, stop, device)
        }
        BackendKind::Wgpu => {
            let device = WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            train_loop::<Autodiff<Wgpu>>(cfg, source, ckpt_manager, metrics, stop, device)
        }
    }
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:          &TrainConfig,
    source:       &mut dyn BatchSource,
    ckpt_manager: &CheckpointManager,
    metrics:      &MetricsLogger,
    stop:         &StopFlag,
    device:       B::Device,
) -> Result<TrainingSummary> {
    let mut trainer = build_trainer::<B>(cfg, &device)?;
    tracing::info!(
        "GAN ready: D {} → {:?} → 1, G {} → {:?} → {}",
        cfg.image_size, cfg.d_hidden, cfg.latent_size, cfg.g_hidden, cfg.image_size
    );

    let mut data_rng = StdRng::seed_from_u64(cfg.seed.wrapping_add(1));
    // Same latents every epoch so sample grids show progress
    let fixed_latents = trainer.sample_latents(cfg.sample_count);
    let preprocessor = Preprocessor::new(cfg.pixel_range);
    let log_every = cfg.log_every.max(1);

    let mut history = Vec::with_capacity(cfg.epochs);
    let mut interrupted = false;

    for epoch in 1..=cfg.epochs {
        source.restart(&mut data_rng);
        let mut steps: Vec<StepLosses> = Vec::new();

        while !stop.is_raised() {
            let Some(batch) = source.next_batch() else { break };
            let losses = trainer.train_step(&batch)?;
            if steps.len() % log_every == 0 {
                tracing::debug!(
                    "epoch {} batch {}: d_loss={:.4} g_loss={:.4}",
                    epoch, steps.len(), losses.d_loss, losses.g_loss
                );
            }
            steps.push(losses);
        }
        interrupted = stop.is_raised();

        if steps.is_empty() {
            if interrupted {
                break;
            }
            return Err(GanError::EmptyBatch.into());
        }

        let m = EpochMetrics::from_steps(epoch, &steps);
        println!(
            "Epoch {:>3}/{} | d_loss={:.4} (real {:.4}, fake {:.4}) | g_loss={:.4}",
            epoch, cfg.epochs, m.d_loss, m.d_real_loss, m.d_fake_loss, m.g_loss,
        );
        metrics.log(&m)?;

        ckpt_manager.save_module::<B, _>("discriminator", trainer.discriminator(), epoch)?;
        ckpt_manager.save_module::<B, _>("generator", trainer.generator(), epoch)?;
        ckpt_manager.mark_latest(epoch)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);

        if let (false, Some(side)) = (fixed_latents.is_empty(), image_side(cfg.image_size)) {
            let images: Vec<ImageVector> = trainer
                .generate(&fixed_latents)?
                .iter()
                .map(|img| preprocessor.denormalize(img))
                .collect();
            let path = ckpt_manager.samples_dir().join(format!("epoch_{epoch}.png"));
            save_grid(&images, side, &path)?;
        }

        history.push(m);
        if interrupted {
            tracing::warn!("Stop requested, ending after epoch {}", epoch);
            break;
        }
    }

    tracing::info!("Training complete!");
    Ok(TrainingSummary { history, interrupted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::latent::LatentDistribution;
    use crate::ml::layers::linear_from_values;
    use std::f32::consts::LN_2;

    type TestBackend = Autodiff<NdArray<f32>>;

    fn toy_config() -> TrainConfig {
        TrainConfig {
            image_size:  4,
            latent_size: 2,
            d_hidden:    vec![3],
            g_hidden:    vec![3],
            dropout:     0.0,
            batch_size:  2,
            epochs:      2,
            sample_count: 4,
            seed:        11,
            ..TrainConfig::default()
        }
    }

    fn toy_real() -> Vec<ImageVector> {
        vec![
            ImageVector::new(vec![0.1, 0.2, 0.3, 0.4]),
            ImageVector::new(vec![0.4, 0.3, 0.2, 0.1]),
        ]
    }

    fn toy_latents() -> Vec<LatentVector> {
        vec![LatentVector::new(vec![0.5, -0.5]); 2]
    }

    fn device() -> NdArrayDevice {
        NdArrayDevice::default()
    }

    fn zeros(d_input: usize, d_output: usize) -> burn::nn::Linear<TestBackend> {
        linear_from_values(vec![0.0; d_input * d_output], vec![0.0; d_output], d_input, d_output, &device())
    }

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("mnist_gan_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_toy_step_produces_finite_losses() {
        let mut trainer = build_trainer::<TestBackend>(&toy_config(), &device()).unwrap();
        let losses = trainer
            .train_step_with(&toy_real(), &toy_latents(), &toy_latents())
            .unwrap();
        assert!(losses.d_loss.is_finite());
        assert!(losses.g_loss.is_finite());
        assert!((losses.d_loss - (losses.d_real + losses.d_fake)).abs() < 1e-6);
    }

    #[test]
    fn test_same_seed_same_losses() {
        let run = || {
            let mut trainer = build_trainer::<TestBackend>(&toy_config(), &device()).unwrap();
            (0..3).map(|_| trainer.train_step(&toy_real()).unwrap()).collect::<Vec<_>>()
        };
        let (a, b) = (run(), run());
        for (x, y) in a.iter().zip(&b) {
            assert!((x.d_loss - y.d_loss).abs() < 1e-6);
            assert!((x.g_loss - y.g_loss).abs() < 1e-6);
        }
    }

    #[test]
    fn test_zeroed_discriminator_gives_recorded_losses() {
        // D ≡ 0 → every logit is 0 → each BCE term is ln 2. The real and
        // fake gradients on the output bias cancel, so D stays at zero
        // and G's loss is ln 2 as well.
        let cfg = toy_config();
        let mut trainer = build_trainer::<TestBackend>(&cfg, &device()).unwrap();
        let zeroed = discriminator_config(&cfg)
            .assemble(vec![zeros(4, 3)], zeros(3, 1))
            .unwrap();
        trainer.discriminator = zeroed;

        let losses = trainer
            .train_step_with(&toy_real(), &toy_latents(), &toy_latents())
            .unwrap();
        assert!((losses.d_real - LN_2).abs() < 1e-6);
        assert!((losses.d_fake - LN_2).abs() < 1e-6);
        assert!((losses.d_loss - 2.0 * LN_2).abs() < 1e-6);
        assert!((losses.g_loss - LN_2).abs() < 1e-6);
        assert!(trainer.discriminator().param_values().unwrap().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_discriminator_step_leaves_generator_untouched() {
        let mut trainer = build_trainer::<TestBackend>(&toy_config(), &device()).unwrap();
        let g_before = trainer.generator().param_values().unwrap();
        let d_before = trainer.discriminator().param_values().unwrap();

        let real = trainer.batcher.images(&toy_real(), 4).unwrap();
        let z = trainer.batcher.latents(&toy_latents(), 2).unwrap();
        trainer.discriminator_step(real, z).unwrap();

        assert_eq!(trainer.generator().param_values().unwrap(), g_before);
        assert_ne!(trainer.discriminator().param_values().unwrap(), d_before);
    }

    #[test]
    fn test_generator_step_leaves_discriminator_untouched() {
        let mut trainer = build_trainer::<TestBackend>(&toy_config(), &device()).unwrap();
        let g_before = trainer.generator().param_values().unwrap();
        let d_before = trainer.discriminator().param_values().unwrap();

        let z = trainer.batcher.latents(&toy_latents(), 2).unwrap();
        trainer.generator_step(z).unwrap();

        assert_eq!(trainer.discriminator().param_values().unwrap(), d_before);
        assert_ne!(trainer.generator().param_values().unwrap(), g_before);
    }

    #[test]
    fn test_discriminator_loss_falls_on_a_fixed_batch() {
        let cfg = TrainConfig { lr_d: 0.01, ..toy_config() };
        let mut trainer = build_trainer::<TestBackend>(&cfg, &device()).unwrap();
        let z = vec![
            LatentVector::new(vec![0.9, -0.3]),
            LatentVector::new(vec![-0.7, 0.8]),
        ];

        let mut losses = Vec::new();
        for _ in 0..100 {
            let real = trainer.batcher.images(&toy_real(), 4).unwrap();
            let latents = trainer.batcher.latents(&z, 2).unwrap();
            let (r, f) = trainer.discriminator_step(real, latents).unwrap();
            losses.push(r + f);
        }
        let first: f32 = losses[..10].iter().sum::<f32>() / 10.0;
        let last: f32 = losses[90..].iter().sum::<f32>() / 10.0;
        assert!(last < first, "D loss rose from {first} to {last}");
    }

    #[test]
    fn test_wrong_widths_and_empty_batches() {
        let mut trainer = build_trainer::<TestBackend>(&toy_config(), &device()).unwrap();
        assert_eq!(trainer.train_step(&[]).unwrap_err(), GanError::EmptyBatch);

        let bad = vec![ImageVector::new(vec![0.0; 784])];
        assert_eq!(
            trainer.train_step(&bad).unwrap_err(),
            GanError::ShapeMismatch { expected: 4, actual: 784 }
        );

        let bad_z = vec![LatentVector::new(vec![0.0; 3]); 2];
        assert_eq!(
            trainer.train_step_with(&toy_real(), &bad_z, &toy_latents()).unwrap_err(),
            GanError::ShapeMismatch { expected: 2, actual: 3 }
        );
    }

    #[test]
    fn test_nan_parameters_are_divergence() {
        let cfg = toy_config();
        let mut trainer = build_trainer::<TestBackend>(&cfg, &device()).unwrap();
        let poisoned = linear_from_values(vec![f32::NAN; 3], vec![0.0], 3, 1, &device());
        trainer.discriminator = discriminator_config(&cfg)
            .assemble(vec![zeros(4, 3)], poisoned)
            .unwrap();

        let err = trainer.train_step(&toy_real()).unwrap_err();
        assert!(matches!(err, GanError::NumericDivergence { .. }), "got {err:?}");
    }

    #[test]
    fn test_generated_samples_are_bounded() {
        let trainer = build_trainer::<TestBackend>(&toy_config(), &device()).unwrap();
        let sampler = LatentSampler::new(2, LatentDistribution::Normal);
        let z = sampler.sample_batch(5, &mut StdRng::seed_from_u64(0));
        let images = trainer.generate(&z).unwrap();
        assert_eq!(images.len(), 5);
        assert!(images
            .iter()
            .all(|img| img.len() == 4 && img.pixels().iter().all(|p| (-1.0..=1.0).contains(p))));
    }

    // ─── Epoch loop ───────────────────────────────────────────────────────────

    struct FixedSource {
        batches: Vec<Vec<ImageVector>>,
        cursor:  usize,
    }

    impl BatchSource for FixedSource {
        fn next_batch(&mut self) -> Option<Vec<ImageVector>> {
            let batch = self.batches.get(self.cursor).cloned();
            self.cursor += 1;
            batch
        }

        fn restart(&mut self, _rng: &mut dyn rand::RngCore) {
            self.cursor = 0;
        }

        fn batches_per_pass(&self) -> usize {
            self.batches.len()
        }
    }

    fn run(name: &str, batches: Vec<Vec<ImageVector>>, stop: &StopFlag) -> (Result<TrainingSummary>, std::path::PathBuf) {
        let dir = temp_dir(name);
        let cfg = TrainConfig {
            checkpoint_dir: dir.to_string_lossy().into_owned(),
            ..toy_config()
        };
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir);
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir).unwrap();
        let mut source = FixedSource { batches, cursor: 0 };
        let result = train_loop::<TestBackend>(&cfg, &mut source, &ckpt, &metrics, stop, device());
        (result, dir)
    }

    #[test]
    fn test_loop_runs_all_epochs_and_writes_artifacts() {
        let (result, dir) = run("loop", vec![toy_real(), toy_real()], &StopFlag::default());
        let summary = result.unwrap();
        assert_eq!(summary.epochs_completed(), 2);
        assert!(!summary.interrupted);
        assert!(summary.history.iter().all(|m| m.d_loss.is_finite() && m.g_loss.is_finite()));

        assert!(dir.join("metrics.csv").exists());
        assert!(dir.join("latest_epoch.json").exists());
        assert!(dir.join("samples").join("epoch_2.png").exists());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_loop_rejects_empty_batches() {
        let (result, dir) = run("empty_batch", vec![vec![]], &StopFlag::default());
        let err = result.unwrap_err();
        assert_eq!(err.downcast_ref::<GanError>(), Some(&GanError::EmptyBatch));

        let (result, dir2) = run("empty_epoch", vec![], &StopFlag::default());
        assert!(result.is_err());
        let _ = std::fs::remove_dir_all(dir);
        let _ = std::fs::remove_dir_all(dir2);
    }

    #[test]
    fn test_raised_stop_flag_ends_training() {
        let stop = StopFlag::default();
        stop.raise();
        let (result, dir) = run("stopped", vec![toy_real()], &stop);
        let summary = result.unwrap();
        assert!(summary.interrupted);
        assert_eq!(summary.epochs_completed(), 0);
        let _ = std::fs::remove_dir_all(dir);
    }
}
