use burn::{nn::Linear, prelude::*};
use rand::{rngs::StdRng, Rng};

use crate::error::{GanError, GanResult};
use crate::ml::layers::{dropout, linear_leaky, linear_param_sum, seeded_linear};

#[derive(Config, Debug)]
pub struct DiscriminatorConfig {
    /// Flattened image width (784 for MNIST)
    pub input_size: usize,
    /// Hidden layer widths, input side first
    pub hidden: Vec<usize>,
    #[config(default = 0.2)]
    pub leaky_slope: f64,
    /// Applied after every hidden activation, training mode only
    #[config(default = 0.0)]
    pub dropout: f64,
}

impl DiscriminatorConfig {
    /// Rejects a dropout probability outside `[0, 1)`.
    pub fn init<B: Backend, R: Rng + ?Sized>(&self, rng: &mut R, device: &B::Device) -> GanResult<Discriminator<B>> {
        let mut hidden = Vec::with_capacity(self.hidden.len());
        let mut d_in = self.input_size;
        for &width in &self.hidden {
            hidden.push(seeded_linear(d_in, width, rng, device));
            d_in = width;
        }
        let output = seeded_linear(d_in, 1, rng, device);
        self.assemble(hidden, output)
    }

    /// Wrap pre-built layers, e.g. with fixed parameters.
    pub fn assemble<B: Backend>(&self, hidden: Vec<Linear<B>>, output: Linear<B>) -> GanResult<Discriminator<B>> {
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(GanError::InvalidConfig(format!(
                "dropout {} is outside [0, 1)",
                self.dropout
            )));
        }
        Ok(Discriminator {
            hidden,
            output,
            input_size: self.input_size,
            leaky_slope: self.leaky_slope,
            dropout: self.dropout,
        })
    }
}

/// Scores flattened images with one realness logit each.
#[derive(Module, Debug)]
pub struct Discriminator<B: Backend> {
    pub hidden: Vec<Linear<B>>,
    pub output: Linear<B>,
    pub input_size: usize,
    pub leaky_slope: f64,
    pub dropout: f64,
}

impl<B: Backend> Discriminator<B> {
    /// Evaluation pass, no dropout. `[batch, input_size]` → `[batch, 1]` logits.
    pub fn forward(&self, images: Tensor<B, 2>) -> GanResult<Tensor<B, 2>> {
        self.run(images, None::<&mut StdRng>)
    }

    /// Training pass with dropout masks drawn from `rng`.
    pub fn forward_train<R: Rng + ?Sized>(&self, images: Tensor<B, 2>, rng: &mut R) -> GanResult<Tensor<B, 2>> {
        self.run(images, Some(rng))
    }

    fn run<R: Rng + ?Sized>(&self, images: Tensor<B, 2>, mut rng: Option<&mut R>) -> GanResult<Tensor<B, 2>> {
        let [_, width] = images.dims();
        if width != self.input_size {
            return Err(GanError::ShapeMismatch {
                expected: self.input_size,
                actual: width,
            });
        }

        let mut x = images;
        for layer in &self.hidden {
            x = linear_leaky(layer, x, self.leaky_slope);
            if let Some(rng) = rng.as_deref_mut() {
                x = dropout(x, self.dropout, rng);
            }
        }
        // Raw logit; the loss applies the sigmoid
        Ok(self.output.forward(x))
    }

    /// Sum over all parameters, for divergence checks.
    pub fn param_sum(&self) -> f32 {
        self.hidden.iter().map(linear_param_sum).sum::<f32>() + linear_param_sum(&self.output)
    }

    /// Host copy of every parameter, layer by layer.
    #[cfg(test)]
    pub fn param_values(&self) -> GanResult<Vec<f32>> {
        let mut out = Vec::new();
        for layer in self.hidden.iter().chain(std::iter::once(&self.output)) {
            out.extend(crate::ml::layers::linear_values(layer)?);
        }
        Ok(out)
    }
}
