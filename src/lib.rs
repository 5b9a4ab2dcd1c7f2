//! Minimal MLP generative adversarial network on MNIST digits.
//!
//! Layers, outermost first: `cli → application → domain → data → ml → infra`.

#![recursion_limit = "256"]

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod infra;
pub mod ml;
