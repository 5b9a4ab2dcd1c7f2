// ============================================================
// Core Error Types
// ============================================================
// Failures raised by the GAN core (networks, batching, trainer).
// The application and CLI layers wrap these in anyhow::Error
// through `?`, adding file-level context where it matters.

use thiserror::Error;

/// Root error type for the GAN core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GanError {
    /// A vector or tensor row does not match the configured layer width.
    #[error("shape mismatch: expected width {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// The data source produced a batch (or an epoch) with zero samples.
    #[error("empty batch: the data source yielded zero samples")]
    EmptyBatch,

    /// A loss or parameter became NaN or infinite.
    #[error("numeric divergence: {quantity} = {value}")]
    NumericDivergence { quantity: String, value: f32 },

    /// Hyperparameters rejected before any network is built.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Tensor data could not be read back to the host as f32.
    #[error("cannot read tensor data: {0}")]
    TensorRead(String),
}

pub type GanResult<T> = Result<T, GanError>;

/// Returns `value` unchanged when finite, otherwise a `NumericDivergence`.
pub fn ensure_finite(quantity: &str, value: f32) -> GanResult<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(GanError::NumericDivergence {
            quantity: quantity.to_string(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite_value_passes_through() {
        assert_eq!(ensure_finite("d_loss", 0.5), Ok(0.5));
    }

    #[test]
    fn test_nan_and_inf_are_divergence() {
        assert!(matches!(
            ensure_finite("g_loss", f32::NAN),
            Err(GanError::NumericDivergence { .. })
        ));
        let err = ensure_finite("d_loss", f32::INFINITY).unwrap_err();
        assert_eq!(err.to_string(), "numeric divergence: d_loss = inf");
    }
}
