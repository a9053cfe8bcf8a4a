//! Backend gateway: forwards feature vectors and lookups to the prediction service.
//!
//! Every call runs `Idle → InFlight → {Success, TimedOut, UpstreamError, NetworkError}`
//! and stops there. Only the health candidates are iterated; nothing else is retried.

use crate::config::BackendConfig;
use crate::error::{GatewayError, ProbeFailure, UpstreamBody};
use crate::features::FeatureVector;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Terminal state of a single outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    Success,
    TimedOut,
    UpstreamError,
    NetworkError,
}

impl CallOutcome {
    pub fn of<T>(result: &Result<T, GatewayError>) -> Self {
        match result {
            Ok(_) => CallOutcome::Success,
            Err(GatewayError::Timeout { .. }) => CallOutcome::TimedOut,
            Err(GatewayError::UpstreamNonSuccess { .. }) => CallOutcome::UpstreamError,
            Err(_) => CallOutcome::NetworkError,
        }
    }
}

/// Successful health probe.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub message: &'static str,
    /// Body of the answering endpoint (JSON, raw text, or null when empty)
    pub backend_status: Value,
    pub backend_url: String,
    /// URL that answered
    pub endpoint: String,
    /// Candidates tried before `endpoint`, in order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_attempts: Vec<ProbeFailure>,
}

/// How a 2xx body is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyMode {
    /// Must be JSON
    Json,
    /// JSON if possible, else raw text; empty is null
    Lenient,
}

/// `base` + `path` with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

pub struct BackendGateway {
    config: BackendConfig,
    client: Client,
}

impl BackendGateway {
    pub fn new(config: BackendConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()?;
        Ok(Self { config, client })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        join_url(&self.config.base_url, path)
    }

    /// Try each health candidate in order; the first 2xx wins.
    pub fn probe_health(&self) -> Result<HealthReport, GatewayError> {
        let timeout = self.config.health_timeout();
        let mut failures = Vec::new();
        for path in &self.config.health_paths {
            let url = self.url(path);
            debug!(%url, "trying health endpoint");
            match self.execute::<Value>(Method::GET, &url, None, timeout, BodyMode::Lenient) {
                Ok(body) => {
                    return Ok(HealthReport {
                        status: "success",
                        message: "prediction service is running",
                        backend_status: body,
                        backend_url: self.config.base_url.clone(),
                        endpoint: url,
                        failed_attempts: failures,
                    });
                }
                Err(e) => failures.push(ProbeFailure {
                    url,
                    reason: e.to_string(),
                }),
            }
        }
        warn!(base_url = %self.config.base_url, attempts = failures.len(), "no health endpoint answered");
        Err(GatewayError::BackendUnreachable {
            base_url: self.config.base_url.clone(),
            attempts: failures,
        })
    }

    /// POST the feature vector to the prediction path; the response is returned verbatim.
    pub fn forward_predict(&self, features: &FeatureVector) -> Result<Value, GatewayError> {
        let url = self.url(&self.config.predict_path);
        info!(%url, fields = features.len(), "sending prediction request");
        self.execute(
            Method::POST,
            &url,
            Some(features),
            self.config.predict_timeout(),
            BodyMode::Json,
        )
    }

    pub fn forward_stats(&self) -> Result<Value, GatewayError> {
        let url = self.url(&self.config.stats_path);
        self.execute::<Value>(
            Method::GET,
            &url,
            None,
            self.config.data_timeout(),
            BodyMode::Json,
        )
    }

    /// Regional statistics for one subdivision. A missing or blank name fails
    /// before any network call.
    pub fn forward_regional_data(&self, subdivision: Option<&str>) -> Result<Value, GatewayError> {
        let subdivision = match subdivision {
            Some(s) if !s.trim().is_empty() => s,
            _ => return Err(GatewayError::MissingParameter("subdivision")),
        };
        let url = self.url(&self.config.regional_data_path);
        self.execute(
            Method::POST,
            &url,
            Some(&json!({ "subdivision": subdivision })),
            self.config.data_timeout(),
            BodyMode::Json,
        )
    }

    fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
        timeout: Duration,
        mode: BodyMode,
    ) -> Result<Value, GatewayError> {
        let call_id = Uuid::new_v4();
        let started = Instant::now();
        let result = self.send(method.clone(), url, body, timeout, mode);
        let outcome = CallOutcome::of(&result);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => info!(%call_id, %method, %url, ?outcome, elapsed_ms, "backend call complete"),
            Err(e) => warn!(%call_id, %method, %url, ?outcome, elapsed_ms, error = %e, "backend call failed"),
        }
        result
    }

    fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
        timeout: Duration,
        mode: BodyMode,
    ) -> Result<Value, GatewayError> {
        let mut req = self
            .client
            .request(method, url)
            .timeout(timeout)
            .header(CONTENT_TYPE, "application/json");
        if let Some(b) = body {
            req = req.json(b);
        }

        let res = req.send().map_err(|e| classify(url, timeout, e))?;
        let status = res.status();
        let text = res.text().map_err(|e| classify(url, timeout, e))?;

        if !status.is_success() {
            return Err(GatewayError::UpstreamNonSuccess {
                status: status.as_u16(),
                body: UpstreamBody::parse(text),
            });
        }

        match mode {
            BodyMode::Json => serde_json::from_str(&text).map_err(|source| GatewayError::InvalidBody {
                url: url.to_string(),
                source,
            }),
            BodyMode::Lenient => Ok(lenient_body(text)),
        }
    }
}

fn classify(url: &str, timeout: Duration, e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout {
            url: url.to_string(),
            timeout,
        }
    } else {
        GatewayError::Network {
            url: url.to_string(),
            source: e,
        }
    }
}

fn lenient_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    match UpstreamBody::parse(text) {
        UpstreamBody::Json(v) => v,
        UpstreamBody::Text(t) => Value::String(t),
    }
}
