use burn::{nn::Linear, prelude::*, tensor::activation::sigmoid};
use rand::Rng;

use crate::domain::image::PixelRange;
use crate::error::{GanError, GanResult};
use crate::ml::layers::{linear_leaky, linear_output_size, linear_param_sum, seeded_linear};

#[derive(Config, Debug)]
pub struct GeneratorConfig {
    pub latent_size: usize,
    /// Hidden layer widths, latent side first
    pub hidden: Vec<usize>,
    /// Flattened image width (784 for MNIST)
    pub output_size: usize,
    #[config(default = 0.2)]
    pub leaky_slope: f64,
    #[config(default = "PixelRange::Symmetric")]
    pub pixel_range: PixelRange,
}

impl GeneratorConfig {
    pub fn init<B: Backend, R: Rng + ?Sized>(&self, rng: &mut R, device: &B::Device) -> Generator<B> {
        let mut hidden = Vec::with_capacity(self.hidden.len());
        let mut d_in = self.latent_size;
        for &width in &self.hidden {
            hidden.push(seeded_linear(d_in, width, rng, device));
            d_in = width;
        }
        let output = seeded_linear(d_in, self.output_size, rng, device);
        Generator {
            hidden,
            output,
            latent_size: self.latent_size,
            leaky_slope: self.leaky_slope,
            unit_output: self.pixel_range == PixelRange::Unit,
        }
    }
}

/// Maps latent noise to flattened images.
#[derive(Module, Debug)]
pub struct Generator<B: Backend> {
    pub hidden: Vec<Linear<B>>,
    pub output: Linear<B>,
    pub latent_size: usize,
    pub leaky_slope: f64,
    /// sigmoid into [0, 1] when set, tanh into [-1, 1] otherwise
    pub unit_output: bool,
}

impl<B: Backend> Generator<B> {
    /// `[batch, latent_size]` → `[batch, output_size]`, bounded by the pixel range.
    pub fn forward(&self, latents: Tensor<B, 2>) -> GanResult<Tensor<B, 2>> {
        let [_, width] = latents.dims();
        if width != self.latent_size {
            return Err(GanError::ShapeMismatch {
                expected: self.latent_size,
                actual: width,
            });
        }

        let mut x = latents;
        for layer in &self.hidden {
            x = linear_leaky(layer, x, self.leaky_slope);
        }
        let x = self.output.forward(x);
        Ok(if self.unit_output { sigmoid(x) } else { x.tanh() })
    }

    pub fn output_size(&self) -> usize {
        linear_output_size(&self.output)
    }

    pub fn pixel_range(&self) -> PixelRange {
        if self.unit_output {
            PixelRange::Unit
        } else {
            PixelRange::Symmetric
        }
    }

    pub fn param_sum(&self) -> f32 {
        self.hidden.iter().map(linear_param_sum).sum::<f32>() + linear_param_sum(&self.output)
    }

    #[cfg(test)]
    pub fn param_values(&self) -> GanResult<Vec<f32>> {
        let mut out = Vec::new();
        for layer in self.hidden.iter().chain(std::iter::once(&self.output)) {
            out.extend(crate::ml::layers::linear_values(layer)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use rand::{rngs::StdRng, SeedableRng};

    type TestBackend = NdArray<f32>;

    fn generator(range: PixelRange) -> Generator<TestBackend> {
        GeneratorConfig::new(100, vec![32, 64, 128], 784)
            .with_pixel_range(range)
            .init(&mut StdRng::seed_from_u64(7), &Default::default())
    }

    fn latents(rows: usize, scale: f32) -> Tensor<TestBackend, 2> {
        let values: Vec<f32> = (0..rows * 100).map(|i| ((i % 13) as f32 - 6.0) * scale).collect();
        Tensor::from_data(TensorData::new(values, [rows, 100]), &Default::default())
    }

    #[test]
    fn test_output_shape() {
        let g = generator(PixelRange::Symmetric);
        let out = g.forward(latents(4, 0.1)).unwrap();
        assert_eq!(out.dims(), [4, 784]);
        assert_eq!(g.output_size(), 784);
    }

    #[test]
    fn test_tanh_output_within_symmetric_bounds() {
        let g = generator(PixelRange::Symmetric);
        // Large latents push the pre-activation far out
        let out: Vec<f32> = g.forward(latents(2, 10.0)).unwrap().into_data().to_vec().unwrap();
        assert!(out.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn test_sigmoid_output_within_unit_bounds() {
        let g = generator(PixelRange::Unit);
        assert_eq!(g.pixel_range(), PixelRange::Unit);
        let out: Vec<f32> = g.forward(latents(2, 10.0)).unwrap().into_data().to_vec().unwrap();
        assert!(out.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_wrong_latent_width_is_rejected() {
        let g = generator(PixelRange::Symmetric);
        let z = Tensor::<TestBackend, 2>::zeros([1, 64], &Default::default());
        assert_eq!(
            g.forward(z).unwrap_err(),
            GanError::ShapeMismatch { expected: 100, actual: 64 }
        );
    }
}
