mod dto;
mod error;
mod handlers;
mod routes;
mod startup;
mod state;

use std::sync::Arc;

use algojobs_config::Settings;
use anyhow::{Context, Result};
use tracing::{error, info};

use crate::state::AppState;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env();
    let production = settings
        .as_ref()
        .map(|s| s.environment.is_production())
        .unwrap_or(false);

    tracing_subscriber::fmt()
        .with_target(false)
        .with_ansi(!production)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    let settings = settings.inspect_err(|e| error!(error = %e, "Invalid configuration"))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(settings.server.workers)
        .thread_name("http-worker")
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(run(settings))
}

async fn run(settings: Settings) -> Result<()> {
    let addr = settings.bind_addr();
    info!(
        environment = %settings.environment,
        workers = settings.server.workers,
        "Starting server on {}",
        addr
    );

    let state = Arc::new(AppState::new(settings));
    let app = routes::create_router(state.clone());

    // Bind before loading so /health can answer while the model loads.
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(startup::shutdown_signal())
            .await
    });

    if let Err(e) = startup::initialize(&state).await {
        error!(error = %format!("{e:#}"), "Initialization failed");
        server.abort();
        return Err(e);
    }

    server.await.context("server task failed")??;
    info!("Server stopped");
    Ok(())
}
