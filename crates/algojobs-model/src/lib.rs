//! Text-embedding model for algojobs.
//!
//! The model is loaded once at startup by [`load_model`] and then only read.
//! Inference runs on the CPU; the embedding matrix has one L2-normalised row
//! per input text.

mod hashing;
mod loader;
mod tokenize;

pub use hashing::{HashingEmbedder, ModelSpec};
pub use loader::load_model;

use ndarray::{Array2, ShapeError};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model not found at path: {0}")]
    NotFound(String),

    #[error("Failed to read model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse model file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown builtin model: {0}")]
    UnknownBuiltin(String),

    #[error("Invalid model: {0}")]
    Invalid(String),

    #[error("Shape error: {0}")]
    Shape(#[from] ShapeError),

    #[error("Inference failed: {0}")]
    Inference(String),
}

/// Where inference executes. Only the CPU path is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cpu,
}

impl Device {
    /// Picks the execution device. A CUDA request falls back to the CPU.
    pub fn select(cuda_requested: bool) -> Self {
        if cuda_requested {
            tracing::warn!("CUDA requested but this build is CPU-only; using cpu");
        }
        Device::Cpu
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Cpu => "cpu",
        }
    }
}

/// Static description of a loaded model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub dimension: usize,
    pub device: Device,
    pub compute_threads: usize,
}

/// A loaded embedding model. Implementations are read-only after load.
pub trait Embedder: Send + Sync {
    fn info(&self) -> &ModelInfo;

    /// Embeds `texts` into a `(texts.len(), dimension)` matrix.
    fn embed(&self, texts: &[String]) -> Result<Array2<f32>, ModelError>;
}
