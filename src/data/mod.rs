// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from IDX files on disk to device tensors.
//
//   IDX files
//       │
//       ▼
//   MnistLoader       → reads digits, pixels in [0, 1]
//       │
//       ▼
//   Preprocessor      → rescales into the training pixel range
//       │
//       ▼
//   ImageDataset      → implements Burn's Dataset trait
//       │
//       ▼
//   ShuffledBatches   → one shuffled pass per epoch (BatchSource)
//       │
//       ▼
//   VectorBatcher     → stacks rows into [batch, width] tensors

/// Loads MNIST training digits with the `mnist` crate
pub mod loader;

/// Pixel-range normalisation
pub mod preprocessor;

/// In-memory dataset and shuffled batch source
pub mod dataset;

/// Row vectors ↔ tensors
pub mod batcher;
