use std::sync::Arc;

use algojobs_monitor::{InferenceRecord, MetricsCollector, MetricsSummary};
use axum::extract::State;
use axum::Json;

use crate::dto::{MetricsQuery, ModelResponse};
use crate::error::{ApiQuery, AppError};
use crate::state::AppState;

const DEFAULT_RECENT_LIMIT: usize = 50;

/// GET /api/v1/model - Loaded model and queue depth.
pub async fn info(State(state): State<Arc<AppState>>) -> Result<Json<ModelResponse>, AppError> {
    let service = state.service()?;
    Ok(Json(ModelResponse {
        model: service.model().clone(),
        queued_jobs: service.queued(),
        max_resumes: service.max_items(),
        embed_batch_size: state.settings.ranking.embed_batch_size,
    }))
}

/// GET /api/v1/metrics/summary
pub async fn metrics_summary(State(state): State<Arc<AppState>>) -> Json<MetricsSummary> {
    Json(state.monitor.summary())
}

/// GET /api/v1/metrics/recent - Latest inference records, newest first.
pub async fn metrics_recent(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<MetricsQuery>,
) -> Json<Vec<InferenceRecord>> {
    let limit = params.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    Json(state.monitor.recent(limit))
}
