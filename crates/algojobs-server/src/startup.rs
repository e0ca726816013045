//! Initialization: load the model, start the inference worker, flip the
//! server to ready.

use std::sync::Arc;

use algojobs_engine::{InferenceWorker, RankingService};
use algojobs_model::load_model;
use anyhow::{Context, Result};
use tracing::info;

use crate::state::AppState;

/// Loads the model off the async runtime and installs the ranking service.
///
/// On error the state stays initializing and the caller should exit.
pub async fn initialize(state: &Arc<AppState>) -> Result<()> {
    let model_settings = state.settings.model.clone();
    info!(source = %model_settings.source, "Loading embedding model");

    let model = tokio::task::spawn_blocking(move || load_model(&model_settings))
        .await
        .context("model loading task failed")?
        .context("failed to load embedding model")?;

    let handle = InferenceWorker::spawn(model, state.settings.model.queue_capacity)
        .context("failed to start inference worker")?;
    let service = RankingService::new(handle, state.settings.ranking.clone());

    let model = service.model().clone();
    state.mark_ready(service);
    info!(
        model = %model.name,
        dimension = model.dimension,
        device = model.device.as_str(),
        "Service ready"
    );

    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
