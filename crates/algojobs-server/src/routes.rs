use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::Response;
use axum::middleware::{self, Next};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::AppError;
use crate::handlers;
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// 1000 full resumes fit comfortably.
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %req.method(),
                uri = %req.uri(),
                version = ?req.version(),
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &tracing::Span| {
            info!(
                latency = %format!("{} ms", latency.as_millis()),
                status = %res.status().as_u16(),
                "finished processing request"
            );
        });

    let inference = Router::new()
        .route("/rank", post(handlers::rank::rank))
        .route("/rank/jobs", post(handlers::rank::rank_jobs))
        .route("/embed", post(handlers::rank::embed))
        .route("/model", get(handlers::model::info))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_ready));

    let api = Router::new()
        .merge(inference)
        .route("/metrics/summary", get(handlers::model::metrics_summary))
        .route("/metrics/recent", get(handlers::model::metrics_recent))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .layer(trace_layer);

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Rejects requests without the configured `x-api-key`. Open when no key is
/// configured.
async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    if let Some(expected) = state.settings.api_key.as_deref() {
        let provided = request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected) {
            warn!(uri = %request.uri(), "Rejected request with invalid API key");
            return Err(AppError::Unauthorized);
        }
    }
    Ok(next.run(request).await)
}

/// Answers 503 until the model is loaded, before the body is read.
async fn require_ready(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    if !state.is_ready() {
        return Err(AppError::NotReady);
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use algojobs_config::Settings;
    use algojobs_engine::{InferenceWorker, RankingService};
    use algojobs_model::{Device, Embedder, HashingEmbedder, ModelError, ModelInfo, ModelSpec};
    use algojobs_monitor::MetricsCollector;
    use axum::http::StatusCode;
    use ndarray::Array2;
    use serde_json::{json, Value};
    use tower::ServiceExt; // for `app.oneshot()`

    struct SlowEmbedder {
        info: ModelInfo,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    impl Embedder for SlowEmbedder {
        fn info(&self) -> &ModelInfo {
            &self.info
        }

        fn embed(&self, texts: &[String]) -> Result<Array2<f32>, ModelError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(25));
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(Array2::ones((texts.len(), self.info.dimension)))
        }
    }

    struct BrokenEmbedder {
        info: ModelInfo,
    }

    impl Embedder for BrokenEmbedder {
        fn info(&self) -> &ModelInfo {
            &self.info
        }

        fn embed(&self, _texts: &[String]) -> Result<Array2<f32>, ModelError> {
            Err(ModelError::Inference("weights corrupted".into()))
        }
    }

    fn test_info() -> ModelInfo {
        ModelInfo {
            name: "test".into(),
            dimension: 4,
            device: Device::Cpu,
            compute_threads: 1,
        }
    }

    fn test_settings() -> Settings {
        let mut settings = Settings::default();
        settings.ranking.max_resumes = 3;
        settings
    }

    fn initializing(settings: Settings) -> (Router, Arc<AppState>) {
        let state = Arc::new(AppState::new(settings));
        (create_router(state.clone()), state)
    }

    fn ready_with(settings: Settings, model: Arc<dyn Embedder>) -> (Router, Arc<AppState>) {
        let (app, state) = initializing(settings);
        let handle = InferenceWorker::spawn(model, 8).unwrap();
        assert!(state.mark_ready(RankingService::new(handle, state.settings.ranking.clone())));
        (app, state)
    }

    fn ready(settings: Settings) -> (Router, Arc<AppState>) {
        let model = HashingEmbedder::new(ModelSpec::builtin(64), Device::Cpu, 1).unwrap();
        ready_with(settings, Arc::new(model))
    }

    fn post_json(uri: &str, body: impl Into<String>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.into()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn rank_body() -> String {
        json!({
            "job_description": "Rust backend engineer building async services",
            "resumes": [
                {"candidate_id": "a", "name": "Ann", "summary": "Pastry chef"},
                {"candidate_id": "b", "name": "Bob", "summary": "Async Rust backend engineer",
                 "skills": [{"name": "Rust"}]}
            ],
            "top_k": 5
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_health_initializing() {
        let (app, _) = initializing(test_settings());
        let (status, body) = send(&app, get_req("/health")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "initializing");
        assert_eq!(body["environment"], "development");
    }

    #[tokio::test]
    async fn test_inference_rejected_while_initializing() {
        let (app, _) = initializing(test_settings());

        let (status, body) = send(&app, post_json("/api/v1/rank", rank_body())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].is_string());

        let (status, _) = send(&app, post_json("/api/v1/embed", "{not json")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, _) = send(&app, get_req("/api/v1/model")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_health_ready() {
        let (app, _) = ready(test_settings());
        let (status, body) = send(&app, get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
        assert_eq!(body["model"], "hashing-64");
    }

    #[tokio::test]
    async fn test_rank_success_is_deterministic() {
        let (app, _) = ready(test_settings());

        let (status, first) = send(&app, post_json("/api/v1/rank", rank_body())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["total_resumes"], 2);
        assert_eq!(first["results"][0]["candidate_id"], "b");

        let (_, second) = send(&app, post_json("/api/v1/rank", rank_body())).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_malformed_input_is_client_error() {
        let (app, _) = ready(test_settings());

        let (status, body) = send(&app, post_json("/api/v1/rank", "{\"job_description\": ")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, _) = send(&app, post_json("/api/v1/rank", r#"{"resumes": []}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let blank = json!({"job_description": "    ", "resumes": [{"candidate_id": "a", "name": "A"}]});
        let (status, body) = send(&app, post_json("/api/v1/rank", blank.to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "job_description is empty");

        // still serving
        let (status, _) = send(&app, post_json("/api/v1/rank", rank_body())).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_too_many_resumes() {
        let (app, _) = ready(test_settings());
        let resumes: Vec<Value> = (0..4)
            .map(|i| json!({"candidate_id": i.to_string(), "name": "X"}))
            .collect();
        let body = json!({"job_description": "Rust engineer", "resumes": resumes});

        let (status, body) = send(&app, post_json("/api/v1/rank", body.to_string())).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"], "Too many items. Max allowed is 3, got 4");
    }

    #[tokio::test]
    async fn test_api_key_required_when_configured() {
        let mut settings = test_settings();
        settings.api_key = Some("secret".into());
        let (app, _) = ready(settings);

        let (status, _) = send(&app, post_json("/api/v1/rank", rank_body())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let mut wrong = post_json("/api/v1/rank", rank_body());
        wrong.headers_mut().insert(API_KEY_HEADER, "nope".parse().unwrap());
        let (status, _) = send(&app, wrong).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let mut right = post_json("/api/v1/rank", rank_body());
        right.headers_mut().insert(API_KEY_HEADER, "secret".parse().unwrap());
        let (status, _) = send(&app, right).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_serialized() {
        let model = Arc::new(SlowEmbedder {
            info: test_info(),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        });
        let (app, _) = ready_with(test_settings(), model.clone());

        let tasks: Vec<_> = (0..5)
            .map(|_| {
                let app = app.clone();
                tokio::spawn(async move { send(&app, post_json("/api/v1/rank", rank_body())).await.0 })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap(), StatusCode::OK);
        }
        assert_eq!(model.max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_model_failure_is_server_error() {
        let (app, state) = ready_with(test_settings(), Arc::new(BrokenEmbedder { info: test_info() }));

        let (status, body) = send(&app, post_json("/api/v1/rank", rank_body())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("weights corrupted"));

        let summary = state.monitor.summary();
        assert_eq!(summary.total_requests, 1);
        assert_eq!(summary.failed_requests, 1);
    }

    #[tokio::test]
    async fn test_embed_and_multi_job_routes() {
        let (app, _) = ready(test_settings());

        let (status, body) = send(&app, post_json("/api/v1/embed", r#"{"texts": ["rust", "go"]}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["dimension"], 64);
        assert_eq!(body["embeddings"].as_array().unwrap().len(), 2);

        let jobs = json!({
            "jobs": [
                {"id": "backend", "title": "Rust backend engineer"},
                {"id": "blank"}
            ],
            "resumes": [{"candidate_id": "b", "name": "Bob", "summary": "Rust backend engineer"}],
            "top_k_per_job": 1
        });
        let (status, body) = send(&app, post_json("/api/v1/rank/jobs", jobs.to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["processed_jobs"], 1);
        assert_eq!(body["skipped_jobs"], 1);
        assert_eq!(body["candidates"][0]["recommended_jobs"][0]["job_id"], "backend");
    }

    #[tokio::test]
    async fn test_model_and_metrics_routes() {
        let (app, _) = ready(test_settings());
        send(&app, post_json("/api/v1/rank", rank_body())).await;

        let (status, body) = send(&app, get_req("/api/v1/model")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "hashing-64");
        assert_eq!(body["device"], "cpu");
        assert_eq!(body["max_resumes"], 3);

        let (status, body) = send(&app, get_req("/api/v1/metrics/summary")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_requests"], 1);
        assert_eq!(body["total_items"], 2);

        let (status, body) = send(&app, get_req("/api/v1/metrics/recent?limit=5")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["operation"], "rank");
    }

    #[tokio::test]
    async fn test_rank_jobs_skips_jobs_without_id() {
        let (app, _) = ready(test_settings());
        let resumes = json!([{"candidate_id": "b", "name": "Bob", "summary": "Rust backend engineer"}]);

        for unnamed in [json!({"id": "", "title": "Pastry chef"}), json!({"title": "Pastry chef"})] {
            let body = json!({
                "jobs": [{"id": "backend", "title": "Rust backend engineer"}, unnamed],
                "resumes": resumes,
            });
            let (status, body) = send(&app, post_json("/api/v1/rank/jobs", body.to_string())).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["processed_jobs"], 1);
            assert_eq!(body["skipped_jobs"], 1);
            assert_eq!(body["candidates"][0]["recommended_jobs"][0]["job_id"], "backend");
        }
    }

    #[tokio::test]
    async fn test_bad_query_string_is_json_error() {
        let (app, _) = ready(test_settings());

        let (status, body) = send(&app, get_req("/api/v1/metrics/recent?limit=abc")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("limit"));
    }
}
