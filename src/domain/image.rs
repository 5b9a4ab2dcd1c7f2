// ============================================================
// Layer 3 — Image Domain Types
// ============================================================
// An MNIST digit is a 28×28 grayscale image flattened into
// 784 floats, row-major. Once read from the data source the
// pixel values are never mutated; normalisation produces a
// new ImageVector.
//
// PixelRange is the convention shared by the data pipeline
// and the Generator's output activation:
//   Unit      → pixels in [0, 1], generator ends in sigmoid
//   Symmetric → pixels in [-1, 1], generator ends in tanh

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Side length of an MNIST digit.
pub const MNIST_SIDE: usize = 28;

/// Length of a flattened MNIST digit.
pub const MNIST_PIXELS: usize = MNIST_SIDE * MNIST_SIDE;

/// A flattened grayscale image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageVector {
    pixels: Vec<f32>,
}

impl ImageVector {
    pub fn new(pixels: Vec<f32>) -> Self {
        Self { pixels }
    }

    /// Decode raw 8-bit pixels into [0, 1].
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::new(bytes.iter().map(|&b| b as f32 / 255.0).collect())
    }

    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Encode back to 8-bit grayscale, clamping anything outside [0, 1].
    pub fn to_bytes(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .map(|&p| (p.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect()
    }
}

/// Value range of pixels fed to, and produced by, the networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PixelRange {
    /// [0, 1], sigmoid generator output
    Unit,
    /// [-1, 1], tanh generator output
    #[default]
    Symmetric,
}

impl PixelRange {
    /// Map a [0, 1] pixel into this range.
    pub fn from_unit(self, p: f32) -> f32 {
        match self {
            PixelRange::Unit => p,
            PixelRange::Symmetric => p * 2.0 - 1.0,
        }
    }

    /// Map a pixel in this range back to [0, 1].
    pub fn to_unit(self, p: f32) -> f32 {
        match self {
            PixelRange::Unit => p,
            PixelRange::Symmetric => (p + 1.0) / 2.0,
        }
    }
}
