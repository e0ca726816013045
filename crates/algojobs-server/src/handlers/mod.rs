//! HTTP route handlers for the ranking server.

pub mod model;
pub mod rank;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::dto::HealthResponse;
use crate::state::AppState;

/// Readiness check: 200 once the model is loaded, 503 before.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let environment = state.settings.environment.as_str();
    match state.service() {
        Ok(service) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ready",
                model: Some(service.model().name.clone()),
                environment,
            }),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "initializing",
                model: None,
                environment,
            }),
        ),
    }
}
