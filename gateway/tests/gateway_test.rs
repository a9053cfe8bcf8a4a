//! Gateway against a local stub prediction service: probe order, timeouts, error shapes.

use axum::{
    body::Bytes,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use rainfall_gateway::{
    config::BackendConfig,
    error::{GatewayError, UpstreamBody},
    features::{self, FeatureVector},
    gateway::BackendGateway,
};
use serde_json::{json, Value};
use std::net::{SocketAddr, TcpListener};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Request {
    method: String,
    path: String,
    body: String,
}

enum Reply {
    Respond(u16, String),
    /// Hold the connection open without answering
    Hang,
}

type Handler = Arc<dyn Fn(&Request) -> Reply + Send + Sync>;

/// Prediction service double: every path goes to `handler`, requests are recorded.
struct StubServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl StubServer {
    fn start(handler: impl Fn(&Request) -> Reply + Send + Sync + 'static) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler: Handler = Arc::new(handler);
        let log = requests.clone();
        let app = Router::new().fallback(move |method: Method, uri: Uri, body: Bytes| {
            let handler = handler.clone();
            let log = log.clone();
            async move { respond(method, uri, body, &handler, &log).await }
        });

        // The gateway under test is blocking, so the stub gets its own runtime thread.
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
                tx.send(listener.local_addr().unwrap()).unwrap();
                axum::serve(listener, app).await.unwrap();
            });
        });
        let addr = rx.recv().unwrap();
        Self { addr, requests }
    }

    fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn seen(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

async fn respond(
    method: Method,
    uri: Uri,
    body: Bytes,
    handler: &Handler,
    log: &Mutex<Vec<Request>>,
) -> Response {
    let request = Request {
        method: method.to_string(),
        path: uri.path().to_string(),
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    log.lock().unwrap().push(request.clone());

    match handler(&request) {
        Reply::Respond(status, body) => {
            let status = StatusCode::from_u16(status).unwrap();
            (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
        }
        Reply::Hang => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            StatusCode::GATEWAY_TIMEOUT.into_response()
        }
    }
}

fn gateway_for(server: &StubServer) -> BackendGateway {
    gateway_with(BackendConfig {
        base_url: server.base_url(),
        health_timeout_secs: 1,
        data_timeout_secs: 1,
        predict_timeout_secs: 1,
        connect_timeout_secs: 1,
        ..BackendConfig::default()
    })
}

fn gateway_with(config: BackendConfig) -> BackendGateway {
    BackendGateway::new(config).unwrap()
}

fn kerala_vector() -> FeatureVector {
    features::transform(&json!({
        "year": 2024, "month": "JUN", "subdivision": "KERALA", "season": "MONSOON",
        "rainToday": "yes", "monthlyRainfall": {"JUN": 650.8, "JUL": 850.2}
    }))
}

#[test]
fn health_probe_reports_third_candidate() {
    let server = StubServer::start(|req| match req.path.as_str() {
        "/predict-rainfall/check-backend" => {
            Reply::Respond(200, r#"{"status":"healthy"}"#.to_string())
        }
        _ => Reply::Respond(404, r#"{"detail":"Not Found"}"#.to_string()),
    });
    let report = gateway_for(&server).probe_health().unwrap();

    assert_eq!(
        report.endpoint,
        format!("{}/predict-rainfall/check-backend", server.base_url())
    );
    assert_eq!(report.backend_status, json!({"status": "healthy"}));
    assert_eq!(report.failed_attempts.len(), 2);
    assert!(report.failed_attempts[0].url.ends_with("/health"));
    assert!(report.failed_attempts[1].url.ends_with("/check-backend"));

    let paths: Vec<String> = server.seen().into_iter().map(|r| r.path).collect();
    assert_eq!(
        paths,
        ["/health", "/check-backend", "/predict-rainfall/check-backend"]
    );
}

#[test]
fn health_probe_stops_at_first_success() {
    let server = StubServer::start(|_| Reply::Respond(200, String::new()));
    let report = gateway_for(&server).probe_health().unwrap();
    assert!(report.endpoint.ends_with("/health"));
    assert_eq!(report.backend_status, Value::Null);
    assert!(report.failed_attempts.is_empty());
    assert_eq!(server.seen().len(), 1);
}

#[test]
fn health_probe_moves_past_a_hanging_candidate() {
    let server = StubServer::start(|req| match req.path.as_str() {
        "/health" => Reply::Hang,
        _ => Reply::Respond(200, "OK".to_string()),
    });
    let report = gateway_for(&server).probe_health().unwrap();
    assert!(report.endpoint.ends_with("/check-backend"));
    assert_eq!(report.backend_status, json!("OK"));
    assert!(report.failed_attempts[0].reason.contains("timed out"));
}

#[test]
fn health_probe_all_failing_is_unreachable() {
    let server = StubServer::start(|_| Reply::Respond(503, "down".to_string()));
    let err = gateway_for(&server).probe_health().unwrap_err();
    match &err {
        GatewayError::BackendUnreachable { attempts, base_url } => {
            assert_eq!(attempts.len(), 3);
            assert_eq!(base_url, &server.base_url());
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let env = err.envelope();
    assert_eq!(env.http_status, 503);
    assert!(env.tip.is_some());
}

#[test]
fn predict_posts_vector_and_passes_response_through() {
    let upstream = json!({
        "prediction": 0.91,
        "confidence": "High",
        "regional_info": {"avg_annual_rainfall": 3000.5}
    });
    let reply = upstream.to_string();
    let server = StubServer::start(move |_| Reply::Respond(200, reply.clone()));

    let response = gateway_for(&server).forward_predict(&kerala_vector()).unwrap();
    assert_eq!(response, upstream);

    let seen = server.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].path, "/predict");
    let sent: Value = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(sent["SUBDIVISION_KERALA"], json!(1));
    assert_eq!(sent["MONSOON"], json!(1));
    assert_eq!(sent["RainToday"], json!(1));
}

#[test]
fn predict_upstream_failure_keeps_status_and_body() {
    let server = StubServer::start(|_| {
        Reply::Respond(422, r#"{"detail":[{"loc":["body","YEAR"],"msg":"field required"}]}"#.to_string())
    });
    let err = gateway_for(&server).forward_predict(&kerala_vector()).unwrap_err();
    match &err {
        GatewayError::UpstreamNonSuccess { status, body } => {
            assert_eq!(*status, 422);
            assert!(matches!(body, UpstreamBody::Json(v) if v["detail"][0]["msg"] == "field required"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let env = err.envelope();
    assert_eq!(env.http_status, 422);
    assert_eq!(env.status_code, Some(422));
}

#[test]
fn predict_upstream_text_body_is_kept_raw() {
    let server = StubServer::start(|_| Reply::Respond(500, "Internal Server Error".to_string()));
    let err = gateway_for(&server).forward_predict(&kerala_vector()).unwrap_err();
    assert!(matches!(
        err,
        GatewayError::UpstreamNonSuccess { status: 500, body: UpstreamBody::Text(ref t) } if t == "Internal Server Error"
    ));
}

#[test]
fn predict_times_out_within_bound() {
    let server = StubServer::start(|_| Reply::Hang);
    let started = Instant::now();
    let err = gateway_for(&server).forward_predict(&kerala_vector()).unwrap_err();
    assert!(err.is_timeout(), "expected timeout, got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(err.envelope().http_status, 504);
}

#[test]
fn stats_passthrough_with_trailing_slash_base() {
    let server = StubServer::start(|req| match req.path.as_str() {
        "/stats" => Reply::Respond(200, r#"{"success":true,"data":{"total_records":468}}"#.to_string()),
        _ => Reply::Respond(404, String::new()),
    });
    let gw = gateway_with(BackendConfig {
        base_url: format!("{}/", server.base_url()),
        ..BackendConfig::default()
    });
    let stats = gw.forward_stats().unwrap();
    assert_eq!(stats["data"]["total_records"], json!(468));
    assert_eq!(server.seen()[0].method, "GET");
}

#[test]
fn stats_non_json_success_is_invalid_body() {
    let server = StubServer::start(|_| Reply::Respond(200, "<html>".to_string()));
    let err = gateway_for(&server).forward_stats().unwrap_err();
    assert!(matches!(err, GatewayError::InvalidBody { .. }));
    assert_eq!(err.envelope().http_status, 502);
}

#[test]
fn regional_data_posts_subdivision() {
    let server = StubServer::start(|req| {
        let body: Value = serde_json::from_str(&req.body).unwrap_or(Value::Null);
        Reply::Respond(
            200,
            json!({"subdivision": body["subdivision"], "avg_annual_rainfall": 2900.1}).to_string(),
        )
    });
    let data = gateway_for(&server)
        .forward_regional_data(Some("KERALA"))
        .unwrap();
    assert_eq!(data["subdivision"], json!("KERALA"));
    let seen = server.seen();
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].path, "/regional-data");
}

#[test]
fn regional_data_without_subdivision_makes_no_call() {
    let server = StubServer::start(|_| Reply::Respond(200, "{}".to_string()));
    let err = gateway_for(&server).forward_regional_data(None).unwrap_err();
    assert!(matches!(err, GatewayError::MissingParameter("subdivision")));
    thread::sleep(Duration::from_millis(50));
    assert!(server.seen().is_empty());
}

#[test]
fn refused_connection_is_a_network_error() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let gw = gateway_with(BackendConfig {
        base_url: format!("http://{addr}"),
        ..BackendConfig::default()
    });
    let err = gw.forward_stats().unwrap_err();
    assert!(matches!(err, GatewayError::Network { .. }), "got {err:?}");
    assert_eq!(err.envelope().http_status, 502);
}
