// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that don't belong in any specific
// business layer:
//
//   checkpoint.rs — Saving and loading network weights
//                   Uses Burn's CompactRecorder for the
//                   parameters, plus TrainConfig as JSON so
//                   sampling can rebuild the Generator.
//
//   metrics.rs    — Per-epoch loss averages appended to a
//                   CSV file for plotting learning curves.
//
//   image_grid.rs — Tiles generated digits into one PNG.

/// Network checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// PNG sample grids
pub mod image_grid;
