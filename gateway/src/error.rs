use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const TIP_UNREACHABLE: &str =
    "Make sure the prediction service is running at the configured backend.base_url (or RAINFALL_API_URL).";
const TIP_CHECK: &str =
    "Check that the prediction service is running and backend.base_url (or RAINFALL_API_URL) is set correctly.";

/// Body returned by the prediction service on a failed call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UpstreamBody {
    Json(Value),
    Text(String),
}

impl UpstreamBody {
    /// JSON when the text parses, raw text otherwise.
    pub fn parse(text: String) -> Self {
        match serde_json::from_str::<Value>(&text) {
            Ok(v) => UpstreamBody::Json(v),
            Err(_) => UpstreamBody::Text(text),
        }
    }
}

impl std::fmt::Display for UpstreamBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpstreamBody::Json(v) => write!(f, "{v}"),
            UpstreamBody::Text(t) => f.write_str(t),
        }
    }
}

/// Attempt against one health candidate that did not answer 2xx.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeFailure {
    pub url: String,
    pub reason: String,
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("request to {url} timed out after {}s", .timeout.as_secs_f64())]
    Timeout { url: String, timeout: Duration },

    #[error("prediction service responded with status {status}: {body}")]
    UpstreamNonSuccess { status: u16, body: UpstreamBody },

    #[error("failed to connect to any prediction service endpoint at {base_url}")]
    BackendUnreachable {
        base_url: String,
        attempts: Vec<ProbeFailure>,
    },

    #[error("{0} parameter is required")]
    MissingParameter(&'static str),

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("response from {url} is not valid JSON: {source}")]
    InvalidBody {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),
}

/// Uniform error shape handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEnvelope {
    /// HTTP status a route handler should answer with
    #[serde(skip)]
    pub http_status: u16,
    pub status: &'static str,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip: Option<&'static str>,
    #[serde(rename = "statusCode", skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<UpstreamBody>,
}

impl GatewayError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::Timeout { .. })
    }

    pub fn http_status(&self) -> u16 {
        match self {
            GatewayError::Timeout { .. } => 504,
            GatewayError::UpstreamNonSuccess { status, .. } => *status,
            GatewayError::BackendUnreachable { .. } => 503,
            GatewayError::MissingParameter(_) => 400,
            GatewayError::Network { .. } | GatewayError::InvalidBody { .. } => 502,
            GatewayError::Client(_) => 500,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        let mut env = ErrorEnvelope {
            http_status: self.http_status(),
            status: "error",
            error: self.to_string(),
            details: None,
            tip: None,
            status_code: None,
            body: None,
        };
        match self {
            GatewayError::Timeout { .. } => {
                env.error = "Request timed out. The prediction service might not be running or is unreachable."
                    .to_string();
                env.details = Some(self.to_string());
                env.tip = Some(TIP_UNREACHABLE);
            }
            GatewayError::UpstreamNonSuccess { status, body } => {
                env.status_code = Some(*status);
                env.body = Some(body.clone());
                env.tip = Some(TIP_CHECK);
            }
            GatewayError::BackendUnreachable { attempts, .. } => {
                let tried: Vec<String> = attempts
                    .iter()
                    .map(|a| format!("{} ({})", a.url, a.reason))
                    .collect();
                env.details = Some(tried.join("; "));
                env.tip = Some(TIP_CHECK);
            }
            GatewayError::MissingParameter(_) => {}
            GatewayError::Network { .. } | GatewayError::InvalidBody { .. } => {
                env.tip = Some(TIP_CHECK);
            }
            GatewayError::Client(_) => {}
        }
        env
    }
}

impl From<&GatewayError> for ErrorEnvelope {
    fn from(e: &GatewayError) -> Self {
        e.envelope()
    }
}
