// ============================================================
// Layer 5 — Building Blocks
// ============================================================
// Shared pieces of the two networks:
//
//   seeded_linear    — burn Linear filled from the caller's RNG
//   dropout          — inverted dropout with an explicit RNG
//   bce_with_logits  — stable sigmoid + binary cross-entropy
//
// Parameters are drawn from the caller's RNG rather than the
// backend's global seed, so a seeded run is fully reproducible
// on any backend.

use burn::{
    module::Param,
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::activation::leaky_relu,
};
use rand::Rng;

#[cfg(test)]
use crate::{data::batcher::host_values, error::GanResult};

// ─── Linear ───────────────────────────────────────────────────────────────────
/// Linear layer with weights and biases drawn from `U(-1/√d_in, 1/√d_in)`.
pub fn seeded_linear<B: Backend, R: Rng + ?Sized>(
    d_input:  usize,
    d_output: usize,
    rng:      &mut R,
    device:   &B::Device,
) -> Linear<B> {
    let bound = 1.0 / (d_input.max(1) as f32).sqrt();
    let weights = (0..d_input * d_output)
        .map(|_| rng.gen_range(-bound..bound))
        .collect();
    let bias = (0..d_output).map(|_| rng.gen_range(-bound..bound)).collect();
    linear_from_values(weights, bias, d_input, d_output, device)
}

/// Linear layer with explicit row-major weights `[d_input, d_output]` and bias.
pub fn linear_from_values<B: Backend>(
    weights:  Vec<f32>,
    bias:     Vec<f32>,
    d_input:  usize,
    d_output: usize,
    device:   &B::Device,
) -> Linear<B> {
    let mut linear = LinearConfig::new(d_input, d_output).init(device);
    linear.weight = Param::from_tensor(Tensor::from_data(
        TensorData::new(weights, [d_input, d_output]),
        device,
    ));
    linear.bias = Some(Param::from_tensor(Tensor::from_data(
        TensorData::new(bias, [d_output]),
        device,
    )));
    linear
}

/// Output width of a linear layer.
pub fn linear_output_size<B: Backend>(linear: &Linear<B>) -> usize {
    linear.weight.val().dims()[1]
}

/// Sum of every parameter; NaN or ±inf if any parameter is.
pub fn linear_param_sum<B: Backend>(linear: &Linear<B>) -> f32 {
    let w: f32 = linear.weight.val().sum().into_scalar().elem();
    let b: f32 = linear
        .bias
        .as_ref()
        .map_or(0.0, |b| b.val().sum().into_scalar().elem());
    w + b
}

/// Host copy of weights followed by bias.
#[cfg(test)]
pub fn linear_values<B: Backend>(linear: &Linear<B>) -> GanResult<Vec<f32>> {
    let mut out = host_values(linear.weight.val().into_data().convert::<f32>())?;
    if let Some(bias) = &linear.bias {
        out.extend(host_values(bias.val().into_data().convert::<f32>())?);
    }
    Ok(out)
}

/// Linear layer followed by leaky ReLU.
pub fn linear_leaky<B: Backend>(layer: &Linear<B>, x: Tensor<B, 2>, slope: f64) -> Tensor<B, 2> {
    leaky_relu(layer.forward(x), slope)
}

// ─── Dropout ──────────────────────────────────────────────────────────────────
/// Inverted dropout: zero each activation with probability `prob`
/// and scale survivors by `1 / (1 - prob)`. `prob >= 1` drops everything.
pub fn dropout<B: Backend, R: Rng + ?Sized>(x: Tensor<B, 2>, prob: f64, rng: &mut R) -> Tensor<B, 2> {
    if prob <= 0.0 {
        return x;
    }
    if prob >= 1.0 {
        return x.zeros_like();
    }
    let keep = 1.0 - prob;
    let scale = (1.0 / keep) as f32;
    let [rows, cols] = x.dims();
    let mask: Vec<f32> = (0..rows * cols)
        .map(|_| if rng.gen_bool(keep) { scale } else { 0.0 })
        .collect();
    let mask = Tensor::<B, 2>::from_data(TensorData::new(mask, [rows, cols]), &x.device());
    x * mask
}

// ─── Loss ─────────────────────────────────────────────────────────────────────
/// Mean binary cross-entropy of `logits` against a constant `target`,
/// computed as `softplus(x) - x·z`.
///
/// softplus uses the shifted log-sum-exp `m + ln(e^(-m) + e^(x-m))`
/// with `m = max(x, 0)`: it never overflows, and the gradient through
/// `m` cancels so `d/dx` is exactly `sigmoid(x) - z`, including at 0.
pub fn bce_with_logits<B: Backend>(logits: Tensor<B, 2>, target: f32) -> Tensor<B, 1> {
    let shift = logits.clone().clamp_min(0.0);
    let softplus = shift.clone()
        + (shift.clone().neg().exp() + (logits.clone() - shift).exp()).log();
    (softplus - logits.mul_scalar(target)).mean()
}
