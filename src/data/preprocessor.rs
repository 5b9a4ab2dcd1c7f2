// ============================================================
// Layer 4 — Pixel Preprocessor
// ============================================================
// Rescales loaded [0, 1] images into the range the networks
// train in, and maps generator output back to [0, 1] for
// writing image files.

use crate::domain::image::{ImageVector, PixelRange};

/// Converts images between [0, 1] and the training pixel range.
#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    range: PixelRange,
}

impl Preprocessor {
    pub fn new(range: PixelRange) -> Self {
        Self { range }
    }

    /// [0, 1] → training range.
    pub fn normalize(&self, image: &ImageVector) -> ImageVector {
        ImageVector::new(image.pixels().iter().map(|&p| self.range.from_unit(p)).collect())
    }

    pub fn normalize_all(&self, images: Vec<ImageVector>) -> Vec<ImageVector> {
        match self.range {
            // Already in range, skip the copy
            PixelRange::Unit => images,
            PixelRange::Symmetric => images.iter().map(|img| self.normalize(img)).collect(),
        }
    }

    /// Training range → [0, 1], clamped.
    pub fn denormalize(&self, image: &ImageVector) -> ImageVector {
        ImageVector::new(
            image
                .pixels()
                .iter()
                .map(|&p| self.range.to_unit(p).clamp(0.0, 1.0))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_normalize() {
        let p = Preprocessor::new(PixelRange::Symmetric);
        let out = p.normalize(&ImageVector::new(vec![0.0, 0.5, 1.0]));
        assert_eq!(out.pixels(), &[-1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unit_is_identity() {
        let p = Preprocessor::new(PixelRange::Unit);
        let img = ImageVector::new(vec![0.25, 0.75]);
        assert_eq!(p.normalize_all(vec![img.clone()]), vec![img]);
    }

    #[test]
    fn test_denormalize_clamps() {
        let p = Preprocessor::new(PixelRange::Symmetric);
        let out = p.denormalize(&ImageVector::new(vec![-1.5, 0.0, 1.0]));
        assert_eq!(out.pixels(), &[0.0, 0.5, 1.0]);
    }
}
