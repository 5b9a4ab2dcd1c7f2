use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which Burn backend runs the tensor math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// CPU, deterministic for a given seed
    #[default]
    #[value(name = "ndarray", alias = "cpu")]
    NdArray,
    /// GPU through WebGPU
    #[value(alias = "gpu")]
    Wgpu,
}
