//! Gateway configuration. Loaded from a JSON file; the backend URL can be overridden from the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable that overrides `backend.base_url`.
pub const BASE_URL_ENV: &str = "RAINFALL_API_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Prediction service location and per-call bounds
    pub backend: BackendConfig,
    /// Feature transformation options
    pub transform: TransformConfig,
    /// Thresholds for interpreting a prediction response
    pub prediction: PredictionConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the prediction service; every path is appended to it
    pub base_url: String,
    /// Health candidates, tried in order until one answers 2xx
    pub health_paths: Vec<String>,
    pub predict_path: String,
    pub stats_path: String,
    pub regional_data_path: String,
    /// Per-attempt bound for each health candidate (seconds)
    pub health_timeout_secs: u64,
    /// Bound for stats and regional data lookups (seconds)
    pub data_timeout_secs: u64,
    /// Bound for prediction calls (seconds)
    pub predict_timeout_secs: u64,
    /// TCP connect bound shared by all calls (seconds)
    pub connect_timeout_secs: u64,
}

/// How the four seasonal aggregate fields are encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateEncoding {
    /// Each aggregate is the sum of its constituent months.
    #[default]
    Sums,
    /// The aggregate window containing the selected month is 1, the others 0.
    WindowSelector,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub aggregate_encoding: AggregateEncoding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Probability above which rain is predicted (0.0–1.0)
    pub rain_threshold: f64,
    /// Percentage above which (or below 100 minus which) confidence is high
    pub high_confidence_pct: i64,
    /// Percentage above which (or below 100 minus which) confidence is medium
    pub medium_confidence_pct: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            health_paths: vec![
                "/health".to_string(),
                "/check-backend".to_string(),
                "/predict-rainfall/check-backend".to_string(),
            ],
            predict_path: "/predict".to_string(),
            stats_path: "/stats".to_string(),
            regional_data_path: "/regional-data".to_string(),
            health_timeout_secs: 5,
            data_timeout_secs: 10,
            predict_timeout_secs: 15,
            connect_timeout_secs: 5,
        }
    }
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            rain_threshold: 0.5,
            high_confidence_pct: 80,
            medium_confidence_pct: 65,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl BackendConfig {
    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }

    pub fn data_timeout(&self) -> Duration {
        Duration::from_secs(self.data_timeout_secs)
    }

    pub fn predict_timeout(&self) -> Duration {
        Duration::from_secs(self.predict_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Config file present but unusable; defaults were used instead.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl GatewayConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &Path) -> Self {
        Self::load_checked(path).0
    }

    /// Like [`load`](Self::load), but also hands back why an existing file
    /// was ignored. A missing file is not an error.
    ///
    /// Loading happens before the logger is installed, so the caller logs
    /// the problem once logging is up.
    pub fn load_checked(path: &Path) -> (Self, Option<ConfigError>) {
        if !path.exists() {
            return (Self::default(), None);
        }
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(source) => {
                let err = ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                };
                return (Self::default(), Some(err));
            }
        };
        match serde_json::from_str::<GatewayConfig>(&data) {
            Ok(c) => (c, None),
            Err(source) => {
                let err = ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                };
                (Self::default(), Some(err))
            }
        }
    }

    /// Load from file, then apply `RAINFALL_API_URL` if set.
    pub fn load_with_env(path: &Path) -> (Self, Option<ConfigError>) {
        let (mut config, problem) = Self::load_checked(path);
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            config.apply_base_url_override(&url);
        }
        (config, problem)
    }

    fn apply_base_url_override(&mut self, url: &str) {
        let url = url.trim();
        if !url.is_empty() {
            self.backend.base_url = url.to_string();
        }
    }
}
