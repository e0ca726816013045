//! Application error types and Axum response conversion.

use algojobs_engine::EngineError;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application-level errors with HTTP status code mapping.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unauthorized,
    PayloadTooLarge(String),
    NotReady,
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(self) -> String {
        match self {
            AppError::BadRequest(m) | AppError::PayloadTooLarge(m) | AppError::Internal(m) => m,
            AppError::Unauthorized => "Invalid or missing API key".into(),
            AppError::NotReady => "Service is initializing".into(),
        }
    }
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Validation(v) if v.is_too_large() => AppError::PayloadTooLarge(v.to_string()),
            EngineError::Validation(v) => AppError::BadRequest(v.to_string()),
            other => {
                tracing::error!(error = %other, "Inference failed");
                AppError::Internal(other.to_string())
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(rejection.body_text())
        } else {
            AppError::BadRequest(rejection.body_text())
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ErrorResponse { error: self.message() })).into_response()
    }
}

/// `Json` extractor whose rejections render as [`AppError`] JSON bodies.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Query` extractor with the same JSON error bodies.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use algojobs_core::ValidationError;
    use algojobs_model::ModelError;

    #[test]
    fn test_engine_error_mapping() {
        let too_many = AppError::from(EngineError::Validation(ValidationError::TooMany { max: 1, got: 2 }));
        assert_eq!(too_many.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let invalid = AppError::from(EngineError::Validation(ValidationError::NoResumes));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let model = AppError::from(EngineError::Model(ModelError::Inference("boom".into())));
        assert_eq!(model.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let gone = AppError::from(EngineError::WorkerUnavailable);
        assert_eq!(gone.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_into_response_status() {
        assert_eq!(AppError::NotReady.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(AppError::Unauthorized.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
