// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments
// with clap and hands everything else to Layer 2.
//
// Two commands are supported:
//   1. `train`  — trains the GAN on MNIST, checkpointing per epoch
//   2. `sample` — loads the latest Generator and writes a PNG grid

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, SampleArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "mnist-gan",
    version = "0.1.0",
    about = "Train a minimal MLP GAN on MNIST digits, then sample new ones."
)]
pub struct Cli {
    /// The subcommand to run (train or sample)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route to the matching use case. The CLI never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)  => run_train(args),
            Commands::Sample(args) => run_sample(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;
    use crate::ml::trainer::StopFlag;

    tracing::info!("Starting training on MNIST in: {}", args.data_dir);
    let checkpoint_dir = args.checkpoint_dir.clone();

    let use_case = TrainUseCase::new(args.into());
    let summary = use_case.execute(&StopFlag::default())?;

    if summary.interrupted {
        println!(
            "Training stopped after {} epoch(s). Checkpoints in '{}'.",
            summary.epochs_completed(),
            checkpoint_dir
        );
    } else {
        println!("Training complete. Checkpoints saved to '{}'.", checkpoint_dir);
    }
    Ok(())
}

fn run_sample(args: SampleArgs) -> Result<()> {
    use crate::application::sample_use_case::SampleUseCase;

    let use_case = SampleUseCase::new(args.checkpoint_dir, args.count, args.seed, &args.output);
    let path = use_case.execute()?;
    println!("Wrote {} samples to '{}'", args.count, path.display());
    Ok(())
}
