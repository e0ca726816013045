use algojobs_model::ModelInfo;
use serde::{Deserialize, Serialize};

// === HTTP DTOs ===

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: Option<String>,
    pub environment: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ModelResponse {
    #[serde(flatten)]
    pub model: ModelInfo,
    pub queued_jobs: usize,
    pub max_resumes: usize,
    pub embed_batch_size: usize,
}

#[derive(Debug, Deserialize, Default)]
pub struct MetricsQuery {
    pub limit: Option<usize>,
}
