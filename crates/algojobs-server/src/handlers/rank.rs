//! Inference handlers. Each call is recorded in the monitor, success or not.

use std::sync::Arc;
use std::time::Instant;

use algojobs_core::{
    EmbedRequest, EmbedResponse, MultiJobRankRequest, MultiJobRankResponse, RankRequest,
    RankResponse,
};
use algojobs_monitor::Operation;
use axum::extract::State;
use axum::Json;

use crate::error::{ApiJson, AppError};
use crate::state::AppState;

/// POST /api/v1/rank - Rank resumes against one job description.
pub async fn rank(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RankRequest>,
) -> Result<Json<RankResponse>, AppError> {
    let service = state.service()?;
    let items = request.resumes.len();
    let started = Instant::now();

    let result = service.rank(request).await;
    state.record(Operation::Rank, items, started, result.is_ok());

    Ok(Json(result?))
}

/// POST /api/v1/rank/jobs - Rank resumes against several jobs, grouped by
/// candidate.
pub async fn rank_jobs(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<MultiJobRankRequest>,
) -> Result<Json<MultiJobRankResponse>, AppError> {
    let service = state.service()?;
    let items = request.resumes.len();
    let started = Instant::now();

    let result = service.rank_jobs(request).await;
    state.record(Operation::RankJobs, items, started, result.is_ok());

    Ok(Json(result?))
}

/// POST /api/v1/embed - Raw embeddings for a list of texts.
pub async fn embed(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<EmbedRequest>,
) -> Result<Json<EmbedResponse>, AppError> {
    let service = state.service()?;
    let items = request.texts.len();
    let started = Instant::now();

    let result = service.embed(request).await;
    state.record(Operation::Embed, items, started, result.is_ok());

    Ok(Json(result?))
}
