// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores network weights using Burn's
// CompactRecorder (MessagePack, gzip-compressed, half
// precision).
//
// File naming convention:
//   checkpoints/
//     discriminator_epoch_1.mpk.gz
//     generator_epoch_1.mpk.gz
//     ...
//     latest_epoch.json      ← number of the latest epoch
//     train_config.json      ← hyperparameters of the run
//     samples/epoch_N.png    ← fixed-latent sample grids
//
// The config is needed to rebuild the exact architecture
// before a record can be loaded into it.

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use std::{fs, path::PathBuf};

use crate::application::train_use_case::TrainConfig;

/// Manages checkpoint files inside one directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<String>) -> Self {
        let dir = PathBuf::from(dir.into());
        // Errors surface later, on the first write
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Where per-epoch sample grids are written.
    pub fn samples_dir(&self) -> PathBuf {
        self.dir.join("samples")
    }

    fn module_path(&self, name: &str, epoch: usize) -> PathBuf {
        // Without extension, the recorder adds it
        self.dir.join(format!("{name}_epoch_{epoch}"))
    }

    /// Save one network's weights as `{name}_epoch_{epoch}.mpk.gz`.
    pub fn save_module<B: Backend, M: Module<B>>(
        &self,
        name:   &str,
        module: &M,
        epoch:  usize,
    ) -> Result<()> {
        let path = self.module_path(name, epoch);
        let recorder = CompactRecorder::new();
        Recorder::<B>::record(&recorder, module.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        tracing::debug!("Saved {} weights for epoch {}", name, epoch);
        Ok(())
    }

    /// Load `{name}` weights from the latest epoch into `module`.
    ///
    /// `module` must have the architecture the weights were saved with.
    pub fn load_module<B: Backend, M: Module<B>>(
        &self,
        name:   &str,
        module: M,
        device: &B::Device,
    ) -> Result<M> {
        let epoch = self.latest_epoch()?;
        let path = self.module_path(name, epoch);
        tracing::info!("Loading {} from epoch {}", name, epoch);

        let recorder = CompactRecorder::new();
        let record = Recorder::<B>::load(&recorder, path.clone(), device).with_context(|| {
            format!(
                "Cannot load checkpoint '{}'. Have you trained the model first?",
                path.display()
            )
        })?;

        Ok(module.load_record(record))
    }

    /// Point `latest_epoch.json` at `epoch`.
    pub fn mark_latest(&self, epoch: usize) -> Result<()> {
        let path = self.dir.join("latest_epoch.json");
        fs::write(&path, serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        Ok(())
    }

    /// Save the training configuration as pretty JSON.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. Make sure you have run 'train' before 'sample'.",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Epoch number in `latest_epoch.json`.
    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join("latest_epoch.json");
        let s = fs::read_to_string(&path)
            .with_context(|| "Cannot find 'latest_epoch.json'. Have you run 'train' first?")?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }
}
