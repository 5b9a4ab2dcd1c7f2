// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types describing what flows through the GAN:
// images, latent noise, and the data-source abstractions.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Randomness only through an RNG passed in by the caller

// A flattened grayscale image and its pixel-range convention
pub mod image;

// Latent noise vectors and the sampler that draws them
pub mod latent;

// Core abstractions (traits) that other layers implement
pub mod traits;
