// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `sample`, and all
// their configurable flags.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::train_use_case::TrainConfig;
use crate::domain::{
    image::{PixelRange, MNIST_PIXELS},
    latent::LatentDistribution,
};
use crate::ml::backend::BackendKind;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the GAN on the MNIST training set
    Train(TrainArgs),

    /// Draw digits from a trained Generator into a PNG grid
    Sample(SampleArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory holding the four MNIST IDX files
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Directory for checkpoints, metrics.csv and sample grids
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Tensor backend
    #[arg(long, value_enum, ignore_case = true, default_value_t = BackendKind::NdArray)]
    pub backend: BackendKind,

    /// Number of full passes through the training images
    #[arg(long, default_value_t = 40)]
    pub epochs: usize,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Width of the Generator's noise input
    #[arg(long, default_value_t = 100)]
    pub latent_size: usize,

    /// Discriminator hidden widths, input side first
    #[arg(long, value_delimiter = ',', default_value = "128,64,32")]
    pub d_hidden: Vec<usize>,

    /// Generator hidden widths, latent side first
    #[arg(long, value_delimiter = ',', default_value = "32,64,128")]
    pub g_hidden: Vec<usize>,

    /// Dropout probability after each Discriminator hidden layer
    #[arg(long, default_value_t = 0.3)]
    pub dropout: f64,

    /// Negative slope of the leaky ReLU activations
    #[arg(long, default_value_t = 0.2)]
    pub leaky_slope: f64,

    /// Discriminator learning rate
    #[arg(long, default_value_t = 0.002)]
    pub lr_d: f64,

    /// Generator learning rate
    #[arg(long, default_value_t = 0.002)]
    pub lr_g: f64,

    /// Adam's first-moment decay
    #[arg(long = "beta1", default_value_t = 0.5)]
    pub beta_1: f64,

    /// Distribution of the latent noise
    #[arg(long, value_enum, ignore_case = true, default_value_t = LatentDistribution::Uniform)]
    pub latent_distribution: LatentDistribution,

    /// Pixel range the networks work in
    #[arg(long, value_enum, ignore_case = true, default_value_t = PixelRange::Symmetric)]
    pub pixel_range: PixelRange,

    /// Train the Discriminator against 0.9 instead of 1.0 for real images
    #[arg(long)]
    pub smooth_labels: bool,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Fixed-latent samples written after each epoch (0 disables)
    #[arg(long, default_value_t = 16)]
    pub sample_count: usize,

    /// Log batch losses every N batches (debug level)
    #[arg(long, default_value_t = 100)]
    pub log_every: usize,

    /// Only use the first N training images
    #[arg(long)]
    pub train_limit: Option<usize>,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:            a.data_dir,
            checkpoint_dir:      a.checkpoint_dir,
            backend:             a.backend,
            epochs:              a.epochs,
            batch_size:          a.batch_size,
            image_size:          MNIST_PIXELS,
            latent_size:         a.latent_size,
            d_hidden:            a.d_hidden,
            g_hidden:            a.g_hidden,
            leaky_slope:         a.leaky_slope,
            dropout:             a.dropout,
            lr_d:                a.lr_d,
            lr_g:                a.lr_g,
            beta_1:              a.beta_1,
            latent_distribution: a.latent_distribution,
            pixel_range:         a.pixel_range,
            smooth_labels:       a.smooth_labels,
            seed:                a.seed,
            sample_count:        a.sample_count,
            log_every:           a.log_every,
            train_limit:         a.train_limit,
        }
    }
}

/// All arguments for the `sample` command
#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Number of digits to generate
    #[arg(long, default_value_t = 16)]
    pub count: usize,

    /// Seed for the latent noise
    #[arg(long, default_value_t = 7)]
    pub seed: u64,

    /// PNG file to write
    #[arg(long, default_value = "samples.png")]
    pub output: PathBuf,
}
