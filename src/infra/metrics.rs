// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records the average adversarial losses of each epoch to a
// CSV file, so learning curves can be plotted after a run.
//
// Metrics recorded per epoch:
//   - epoch:       the epoch number (1, 2, 3, ...)
//   - d_loss:      discriminator loss, real + fake
//   - d_real_loss: BCE of D on real images vs "real"
//   - d_fake_loss: BCE of D on generated images vs "fake"
//   - g_loss:      BCE of D on generated images vs "real"
//
// Output file: checkpoints/metrics.csv
//
// Example CSV output:
//   epoch,d_loss,d_real_loss,d_fake_loss,g_loss
//   1,1.102400,0.561200,0.541200,1.487300
//   2,1.198700,0.612500,0.586200,1.021900
//
// A balanced game keeps d_loss near 2·ln 2 ≈ 1.386. d_loss
// falling towards 0 while g_loss climbs means D has won and
// G has stopped receiving a useful signal.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

use crate::ml::trainer::StepLosses;

/// Mean losses over every step of one epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochMetrics {
    pub epoch:       usize,
    pub d_loss:      f32,
    pub d_real_loss: f32,
    pub d_fake_loss: f32,
    pub g_loss:      f32,
}

impl EpochMetrics {
    pub fn new(epoch: usize, d_real_loss: f32, d_fake_loss: f32, g_loss: f32) -> Self {
        Self {
            epoch,
            d_loss: d_real_loss + d_fake_loss,
            d_real_loss,
            d_fake_loss,
            g_loss,
        }
    }

    /// Average the per-step losses. All zero for an empty slice.
    pub fn from_steps(epoch: usize, steps: &[StepLosses]) -> Self {
        if steps.is_empty() {
            return Self::new(epoch, 0.0, 0.0, 0.0);
        }
        let n = steps.len() as f32;
        let mean = |f: fn(&StepLosses) -> f32| steps.iter().map(f).sum::<f32>() / n;
        Self::new(epoch, mean(|s| s.d_real), mean(|s| s.d_fake), mean(|s| s.g_loss))
    }
}

/// Appends epoch metrics to `metrics.csv`.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet, so
    /// repeated runs into one directory append to a single log.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,d_loss,d_real_loss,d_fake_loss,g_loss")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch, m.d_loss, m.d_real_loss, m.d_fake_loss, m.g_loss,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: d_loss={:.4}, g_loss={:.4}",
            m.epoch,
            m.d_loss,
            m.g_loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn step(d_real: f32, d_fake: f32, g_loss: f32) -> StepLosses {
        StepLosses { d_real, d_fake, d_loss: d_real + d_fake, g_loss }
    }

    #[test]
    fn test_from_steps_averages() {
        let m = EpochMetrics::from_steps(3, &[step(0.5, 0.25, 1.0), step(0.25, 0.75, 2.0)]);
        assert_eq!(m.epoch, 3);
        assert!((m.d_real_loss - 0.375).abs() < 1e-6);
        assert!((m.d_fake_loss - 0.5).abs() < 1e-6);
        assert!((m.d_loss - 0.875).abs() < 1e-6);
        assert!((m.g_loss - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_from_no_steps_is_zero() {
        assert_eq!(EpochMetrics::from_steps(1, &[]), EpochMetrics::new(1, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_logger_writes_header_once_and_appends_rows() {
        let dir = std::env::temp_dir().join(format!("mnist_gan_metrics_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let dir_str = dir.to_string_lossy().into_owned();

        let logger = MetricsLogger::new(dir_str.clone()).unwrap();
        logger.log(&EpochMetrics::new(1, 0.5, 0.25, 1.0)).unwrap();
        // A second logger on the same dir must not rewrite the header
        let logger = MetricsLogger::new(dir_str).unwrap();
        logger.log(&EpochMetrics::new(2, 0.5, 0.5, 0.5)).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "epoch,d_loss,d_real_loss,d_fake_loss,g_loss");
        assert_eq!(lines[1], "1,0.750000,0.500000,0.250000,1.000000");
        assert_eq!(lines[2], "2,1.000000,0.500000,0.500000,0.500000");
        assert_eq!(lines.len(), 3);
        let _ = fs::remove_dir_all(dir);
    }
}
