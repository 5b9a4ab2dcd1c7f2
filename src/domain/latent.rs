// ============================================================
// Layer 3 — Latent Noise
// ============================================================
// The Generator's input is a vector of independent noise
// samples. A fresh vector is drawn for every generator call;
// the random source is always passed in by the caller so a
// seeded run is reproducible end to end.

use clap::ValueEnum;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal, Uniform};
use serde::{Deserialize, Serialize};

/// One latent noise vector.
#[derive(Debug, Clone, PartialEq)]
pub struct LatentVector {
    values: Vec<f32>,
}

impl LatentVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// Distribution each latent component is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LatentDistribution {
    /// Uniform over [-1, 1)
    #[default]
    Uniform,
    /// Standard normal, mean 0 and variance 1
    #[value(alias = "gaussian")]
    Normal,
}

/// Draws latent vectors of a fixed size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatentSampler {
    size: usize,
    distribution: LatentDistribution,
}

impl LatentSampler {
    pub fn new(size: usize, distribution: LatentDistribution) -> Self {
        Self { size, distribution }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> LatentVector {
        let values = match self.distribution {
            LatentDistribution::Uniform => {
                let dist = Uniform::new(-1.0f32, 1.0f32);
                (0..self.size).map(|_| dist.sample(rng)).collect()
            }
            LatentDistribution::Normal => (0..self.size)
                .map(|_| -> f32 { StandardNormal.sample(rng) })
                .collect(),
        };
        LatentVector::new(values)
    }

    pub fn sample_batch<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<LatentVector> {
        (0..count).map(|_| self.sample(rng)).collect()
    }
}
