// ============================================================
// Layer 4 — Tensor Batcher
// ============================================================
// Stacks row vectors (images or latent noise) into a single
// [batch, width] tensor on the target device, and unstacks
// generator output back into ImageVectors.
//
//   Input:  N vectors of width W
//   Output: Tensor of shape [N, W]
//
// Rows are flattened into one Vec<f32> then reshaped, so
// every row must have exactly the expected width.

use burn::prelude::*;

use crate::domain::image::ImageVector;
use crate::domain::latent::LatentVector;
use crate::error::{GanError, GanResult};

/// Holds the device tensors are created on.
#[derive(Clone, Debug)]
pub struct VectorBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> VectorBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// Stack images into `[N, width]`.
    pub fn images(&self, items: &[ImageVector], width: usize) -> GanResult<Tensor<B, 2>> {
        self.stack(items.iter().map(ImageVector::pixels), items.len(), width)
    }

    /// Stack latent vectors into `[N, width]`.
    pub fn latents(&self, items: &[LatentVector], width: usize) -> GanResult<Tensor<B, 2>> {
        self.stack(items.iter().map(LatentVector::values), items.len(), width)
    }

    fn stack<'a>(
        &self,
        rows: impl Iterator<Item = &'a [f32]>,
        batch_size: usize,
        width: usize,
    ) -> GanResult<Tensor<B, 2>> {
        if batch_size == 0 {
            return Err(GanError::EmptyBatch);
        }

        let mut flat = Vec::with_capacity(batch_size * width);
        for row in rows {
            if row.len() != width {
                return Err(GanError::ShapeMismatch {
                    expected: width,
                    actual: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }

        Ok(Tensor::<B, 2>::from_data(
            TensorData::new(flat, [batch_size, width]),
            &self.device,
        ))
    }
}

/// Read tensor data back as `f32`, reporting a dtype mismatch.
pub fn host_values(data: TensorData) -> GanResult<Vec<f32>> {
    data.to_vec::<f32>()
        .map_err(|e| GanError::TensorRead(format!("{e:?}")))
}

/// Split a `[N, W]` tensor back into N image vectors.
pub fn unstack_images<B: Backend>(tensor: Tensor<B, 2>) -> GanResult<Vec<ImageVector>> {
    let [_, width] = tensor.dims();
    let flat = host_values(tensor.into_data().convert::<f32>())?;
    Ok(flat
        .chunks(width.max(1))
        .map(|row| ImageVector::new(row.to_vec()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn batcher() -> VectorBatcher<TestBackend> {
        VectorBatcher::new(Default::default())
    }

    #[test]
    fn test_images_stack_to_batch_by_width() {
        let imgs = vec![
            ImageVector::new(vec![0.1, 0.2, 0.3, 0.4]),
            ImageVector::new(vec![0.5, 0.6, 0.7, 0.8]),
        ];
        let t = batcher().images(&imgs, 4).unwrap();
        assert_eq!(t.dims(), [2, 4]);
        assert_eq!(unstack_images(t).unwrap(), imgs);
    }

    #[test]
    fn test_host_values_reports_wrong_dtype() {
        let ints = TensorData::new(vec![1i64, 2, 3], [3]);
        assert!(matches!(host_values(ints), Err(GanError::TensorRead(_))));
        let floats = TensorData::new(vec![1.0f32, 2.0], [2]);
        assert_eq!(host_values(floats), Ok(vec![1.0, 2.0]));
    }

    #[test]
    fn test_wrong_width_is_shape_mismatch() {
        let imgs = vec![ImageVector::new(vec![0.0; 3])];
        assert_eq!(
            batcher().images(&imgs, 784).unwrap_err(),
            GanError::ShapeMismatch { expected: 784, actual: 3 }
        );
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        assert_eq!(batcher().latents(&[], 2).unwrap_err(), GanError::EmptyBatch);
    }
}
