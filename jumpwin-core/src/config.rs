//! Evaluator tuning, loadable from JSON.
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::window::WindowStrategy;

/// Default cap on how long a relocated jump may be held.
pub const DEFAULT_MAX_HOLD_FRAMES: usize = 25;
/// Default number of extra replays made by the consistency checker.
pub const DEFAULT_CONSISTENCY_REPLAYS: usize = 3;

/// Errors raised when evaluator configuration invariants are violated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: u64,
        value: u64,
    },
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    #[serde(default)]
    pub strategy: WindowStrategy,
    #[serde(default = "EvaluatorConfig::default_max_hold_frames")]
    pub max_hold_frames: usize,
    #[serde(default = "EvaluatorConfig::default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default = "EvaluatorConfig::default_check_separation")]
    pub check_separation: bool,
    #[serde(default)]
    pub verify_original_window: bool,
    #[serde(default)]
    pub consistency_checks: bool,
    #[serde(default = "EvaluatorConfig::default_consistency_replays")]
    pub consistency_replays: usize,
}

impl EvaluatorConfig {
    const fn default_max_hold_frames() -> usize {
        DEFAULT_MAX_HOLD_FRAMES
    }

    fn default_max_concurrency() -> usize {
        std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
    }

    const fn default_check_separation() -> bool {
        true
    }

    const fn default_consistency_replays() -> usize {
        DEFAULT_CONSISTENCY_REPLAYS
    }

    /// Parse and validate a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and the first
    /// violated invariant otherwise.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read, otherwise
    /// the same errors as [`EvaluatorConfig::from_json`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::MinViolation`] naming the first field out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(&'static str, usize); 3] = [
            ("max_hold_frames", self.max_hold_frames),
            ("max_concurrency", self.max_concurrency),
            ("consistency_replays", self.consistency_replays),
        ];
        for (field, value) in checks {
            if value == 0 {
                return Err(ConfigError::MinViolation {
                    field,
                    min: 1,
                    value: 0,
                });
            }
        }
        if self.timeout_ms == Some(0) {
            return Err(ConfigError::MinViolation {
                field: "timeout_ms",
                min: 1,
                value: 0,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: WindowStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            strategy: WindowStrategy::default(),
            max_hold_frames: Self::default_max_hold_frames(),
            max_concurrency: Self::default_max_concurrency(),
            timeout_ms: None,
            check_separation: Self::default_check_separation(),
            verify_original_window: false,
            consistency_checks: false,
            consistency_replays: Self::default_consistency_replays(),
        }
    }
}
