//! Inference execution for algojobs.
//!
//! - [`InferenceWorker`] owns the model on a dedicated thread and runs one
//!   job at a time, in arrival order.
//! - [`RankingService`] turns validated requests into worker jobs and scores
//!   the resulting embeddings.

mod service;
mod worker;

pub use service::RankingService;
pub use worker::{InferenceHandle, InferenceWorker};

use algojobs_core::ValidationError;
use algojobs_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Model inference failed: {0}")]
    Model(#[from] ModelError),

    #[error("Inference panicked: {0}")]
    Panicked(String),

    #[error("Inference worker is not running")]
    WorkerUnavailable,

    #[error("Failed to start inference worker: {0}")]
    Spawn(#[from] std::io::Error),
}
