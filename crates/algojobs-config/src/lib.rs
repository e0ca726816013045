//! Typed service settings read from the process environment.
//!
//! Every setting has a default so the container starts with nothing but the
//! variables its build file pins (`OMP_NUM_THREADS`, `UVICORN_WORKERS`,
//! `TORCH_CUDA_AVAILABLE`). Parsing goes through a lookup closure, which keeps
//! tests away from the real process environment.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

// ─────────────────────────────────────────────────────────────────────────────
// Error
// ─────────────────────────────────────────────────────────────────────────────

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Keys & defaults
// ─────────────────────────────────────────────────────────────────────────────

pub const ENV: &str = "ENV";
pub const API_KEY: &str = "API_KEY";
pub const HOST: &str = "HOST";
pub const PORT: &str = "PORT";
pub const UVICORN_WORKERS: &str = "UVICORN_WORKERS";
pub const OMP_NUM_THREADS: &str = "OMP_NUM_THREADS";
pub const TORCH_CUDA_AVAILABLE: &str = "TORCH_CUDA_AVAILABLE";
pub const EMBEDDING_MODEL: &str = "EMBEDDING_MODEL";
pub const EMBED_BATCH_SIZE: &str = "EMBED_BATCH_SIZE";
pub const MAX_RESUMES: &str = "MAX_RESUMES";
pub const INFERENCE_QUEUE_CAPACITY: &str = "INFERENCE_QUEUE_CAPACITY";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_EMBEDDING_MODEL: &str = "builtin:hashing-384";
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 32;
pub const DEFAULT_MAX_RESUMES: usize = 1000;
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

// ─────────────────────────────────────────────────────────────────────────────
// Environment
// ─────────────────────────────────────────────────────────────────────────────

/// Deployment environment named by `ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" | "local" => Ok(Environment::Development),
            "stage" | "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Threads driving HTTP handling. Inference is always a single lane.
    pub workers: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSettings {
    /// `builtin:hashing-<dim>` or a path to a JSON model artifact.
    pub source: String,
    pub compute_threads: usize,
    pub cuda_requested: bool,
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingSettings {
    pub embed_batch_size: usize,
    pub max_resumes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub environment: Environment,
    pub api_key: Option<String>,
    pub server: ServerSettings,
    pub model: ModelSettings,
    pub ranking: RankingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            api_key: None,
            server: ServerSettings {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
                workers: 1,
            },
            model: ModelSettings {
                source: DEFAULT_EMBEDDING_MODEL.to_string(),
                compute_threads: 1,
                cuda_requested: false,
                queue_capacity: DEFAULT_QUEUE_CAPACITY,
            },
            ranking: RankingSettings {
                embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
                max_resumes: DEFAULT_MAX_RESUMES,
            },
        }
    }
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`; unset and blank values take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let environment = match get(ENV) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: ENV,
                value: raw,
                reason: "expected development, staging or production",
            })?,
            None => Environment::default(),
        };

        let port = match get(PORT) {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: PORT,
                value: raw,
                reason: "expected a port number",
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            environment,
            api_key: get(API_KEY),
            server: ServerSettings {
                host: get(HOST).unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port,
                workers: positive(UVICORN_WORKERS, get(UVICORN_WORKERS), 1)?,
            },
            model: ModelSettings {
                source: get(EMBEDDING_MODEL).unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
                compute_threads: positive(OMP_NUM_THREADS, get(OMP_NUM_THREADS), 1)?,
                cuda_requested: flag(TORCH_CUDA_AVAILABLE, get(TORCH_CUDA_AVAILABLE))?,
                queue_capacity: positive(
                    INFERENCE_QUEUE_CAPACITY,
                    get(INFERENCE_QUEUE_CAPACITY),
                    DEFAULT_QUEUE_CAPACITY,
                )?,
            },
            ranking: RankingSettings {
                embed_batch_size: positive(EMBED_BATCH_SIZE, get(EMBED_BATCH_SIZE), DEFAULT_EMBED_BATCH_SIZE)?,
                max_resumes: positive(MAX_RESUMES, get(MAX_RESUMES), DEFAULT_MAX_RESUMES)?,
            },
        })
    }

    /// Socket address string the HTTP server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn positive(key: &'static str, raw: Option<String>, default: usize) -> Result<usize, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw,
            reason: "expected a positive integer",
        }),
    }
}

fn flag(key: &'static str, raw: Option<String>) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(false);
    };
    match raw.to_ascii_lowercase().as_str() {
        "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw,
            reason: "expected 0 or 1",
        }),
    }
}
