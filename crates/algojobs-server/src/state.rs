use std::sync::OnceLock;
use std::time::Instant;

use algojobs_config::Settings;
use algojobs_engine::RankingService;
use algojobs_monitor::{InMemoryCollector, InferenceRecord, MetricsCollector, Operation};
use tracing::warn;

use crate::error::AppError;

/// Shared server state. The ranking service is set exactly once, when the
/// model has loaded; until then the server is initializing.
pub struct AppState {
    pub settings: Settings,
    pub monitor: InMemoryCollector,
    service: OnceLock<RankingService>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            monitor: InMemoryCollector::default(),
            service: OnceLock::new(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.service.get().is_some()
    }

    pub fn service(&self) -> Result<&RankingService, AppError> {
        self.service.get().ok_or(AppError::NotReady)
    }

    /// Moves the state to ready. Returns false if it already was.
    pub fn mark_ready(&self, service: RankingService) -> bool {
        let installed = self.service.set(service).is_ok();
        if !installed {
            warn!("Ranking service already installed; ignoring");
        }
        installed
    }

    pub fn record(&self, operation: Operation, items: usize, started: Instant, success: bool) {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.monitor
            .record(InferenceRecord::new(operation, items, elapsed_ms, success));
    }
}
