// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All network and optimisation code lives here.
//
//   backend.rs       — NdArray (CPU) or Wgpu (GPU) selection
//
//   layers.rs        — seeded Linear init, dropout and the
//                      stable BCE-with-logits loss shared by both nets
//
//   discriminator.rs — MLP: image → hidden (leaky ReLU,
//                      dropout) → one real/fake logit
//
//   generator.rs     — MLP: latent → hidden (leaky ReLU) →
//                      image, squashed by tanh or sigmoid
//
//   trainer.rs       — The adversarial step and epoch loop
//                      with per-epoch checkpoints and samples
//
//   sampler.rs       — Loads a trained Generator and draws
//                      new digits from it

/// Backend selection
pub mod backend;

/// Shared layers and loss
pub mod layers;

/// Real/fake classifier
pub mod discriminator;

/// Latent-to-image network
pub mod generator;

/// Adversarial training loop
pub mod trainer;

/// Checkpoint-backed sample generation
pub mod sampler;
