use std::{env, num::NonZeroUsize, thread};

use serde::Deserialize;
use thiserror::Error;

pub const WORKERS_VAR: &str = "NODEFLOW_WORKERS";
pub const THREAD_NAME_VAR: &str = "NODEFLOW_THREAD_NAME";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("At least one worker thread is required.")]
    NoWorkers,

    #[error("Invalid value '{value}' for {var}.")]
    InvalidVar { var: &'static str, value: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Settings of the recomputation engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of threads running node recomputations.
    pub workers: usize,
    pub thread_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(4),
            thread_name: "nodeflow-worker".into(),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `NODEFLOW_WORKERS` and `NODEFLOW_THREAD_NAME`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(value) = env::var(WORKERS_VAR) {
            config.workers = value.trim().parse().map_err(|_| ConfigError::InvalidVar {
                var: WORKERS_VAR,
                value,
            })?;
        }
        if let Ok(name) = env::var(THREAD_NAME_VAR) {
            config.thread_name = name;
        }
        config.validate()
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<Self>(json)?.validate()
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        Ok(self)
    }
}
