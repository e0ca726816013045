use std::fs;
use std::path::Path;
use std::sync::Arc;

use algojobs_config::ModelSettings;
use tracing::info;

use crate::hashing::{HashingEmbedder, ModelSpec};
use crate::{Device, Embedder, ModelError};

pub const BUILTIN_PREFIX: &str = "builtin:";
pub const DEFAULT_DIMENSION: usize = 384;

/// Resolves a `builtin:` source to its spec.
///
/// Accepted forms: `builtin:hashing` and `builtin:hashing-<dimension>`.
pub fn parse_builtin(source: &str) -> Result<ModelSpec, ModelError> {
    let name = source.strip_prefix(BUILTIN_PREFIX).unwrap_or(source);
    let dimension = match name.strip_prefix("hashing") {
        Some("") => DEFAULT_DIMENSION,
        Some(rest) => rest
            .strip_prefix('-')
            .and_then(|d| d.parse::<usize>().ok())
            .filter(|d| *d > 0)
            .ok_or_else(|| ModelError::UnknownBuiltin(source.to_string()))?,
        None => return Err(ModelError::UnknownBuiltin(source.to_string())),
    };
    Ok(ModelSpec::builtin(dimension))
}

/// Loads the model named by `settings.source`: a `builtin:` name or the path
/// to a JSON model artifact.
///
/// This is blocking work; call it off the async runtime.
pub fn load_model(settings: &ModelSettings) -> Result<Arc<dyn Embedder>, ModelError> {
    let source = settings.source.trim();
    let spec = if source.starts_with(BUILTIN_PREFIX) {
        parse_builtin(source)?
    } else {
        read_spec(Path::new(source))?
    };

    let device = Device::select(settings.cuda_requested);
    let embedder = HashingEmbedder::new(spec, device, settings.compute_threads)?;

    let model = embedder.info();
    info!(
        model = %model.name,
        dimension = model.dimension,
        device = model.device.as_str(),
        threads = model.compute_threads,
        "Loaded embedding model"
    );

    Ok(Arc::new(embedder))
}

fn read_spec(path: &Path) -> Result<ModelSpec, ModelError> {
    if !path.exists() {
        return Err(ModelError::NotFound(path.display().to_string()));
    }
    let content = fs::read_to_string(path)?;
    let spec: ModelSpec = serde_json::from_str(&content)?;
    Ok(spec)
}
