//! Webhook HTTP entry point.
//!
//! `POST /` (or `/webhook`) takes a raw update body, routes it and answers
//! with a fixed envelope. Bot-level failures are reported inside the envelope
//! with HTTP 200; only an unparseable body yields HTTP 500.

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use echobot_core::Update;
use serde::Serialize;
use tracing::{info, warn};

use crate::client::{TelegramClient, WebhookInfo};
use crate::config::BotConfig;
use crate::dev::{SharedWebhookState, WebhookState};
use crate::error::Result;
use crate::reporter::{ErrorReport, ErrorReporter};
use crate::router::{RouteOutcome, UpdateRouter};

/// Header marking a request from the simulator; such requests run dry.
pub const SIMULATOR_HEADER: &str = "x-simulator";

/// Response body of the webhook endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum Envelope {
    Ok { message: String, details: RouteOutcome },
    Error { message: String },
}

/// Shared state of the webhook server.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BotConfig>,
    pub client: TelegramClient,
    pub reporter: ErrorReporter,
    /// Set when running as a dev server with a managed webhook.
    pub webhook: Option<SharedWebhookState>,
    /// Port the server listens on, for the health endpoint.
    pub port: u16,
}

impl AppState {
    pub fn new(config: BotConfig, port: u16) -> Self {
        let client = TelegramClient::from_config(&config);
        let reporter = ErrorReporter::from_config(&config);
        Self {
            config: Arc::new(config),
            client,
            reporter,
            webhook: None,
            port,
        }
    }

    /// Attach the dev webhook state, enabling `/status`.
    pub fn with_webhook_state(mut self, state: SharedWebhookState) -> Self {
        self.webhook = Some(state);
        self
    }

    /// Router for one request; dry-run when `simulated`.
    pub fn update_router(&self, simulated: bool) -> UpdateRouter {
        let client = if simulated {
            self.client.dry_run()
        } else {
            self.client.clone()
        };
        UpdateRouter::new(client, self.reporter.clone())
    }
}

/// Parse `body` as an update and route it.
pub async fn process_body(
    router: &UpdateRouter,
    reporter: &ErrorReporter,
    body: &[u8],
) -> (StatusCode, Envelope) {
    let update: Update = match serde_json::from_slice(body) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, "Malformed update body");
            let message = e.to_string();
            let preview = String::from_utf8_lossy(&body[..body.len().min(512)]).into_owned();
            reporter
                .report(&ErrorReport::new("PARSE_ERROR", &message).with_details(&preview))
                .await;
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Envelope::Error { message },
            );
        }
    };

    info!(update_id = ?update.update_id, "Received update");
    let details = router.route(&update).await;
    (
        StatusCode::OK,
        Envelope::Ok {
            message: "Webhook processed".to_string(),
            details,
        },
    )
}

fn is_simulated(headers: &HeaderMap) -> bool {
    headers
        .get(SIMULATOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// POST / - Receive an update.
pub async fn handle_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Envelope>) {
    let router = state.update_router(is_simulated(&headers));
    let (status, envelope) = process_body(&router, &state.reporter, &body).await;
    (status, Json(envelope))
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Registered tunnel URL, or "not configured".
    pub webhook: String,
    pub port: u16,
}

/// GET / - Health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let webhook = match &state.webhook {
        Some(shared) => shared.read().await.tunnel_url.clone(),
        None => None,
    };
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        webhook: webhook.unwrap_or_else(|| "not configured".to_string()),
        port: state.port,
    })
}

/// Dev webhook status response.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub local: WebhookState,
    /// What the platform currently has registered.
    pub platform_webhook: Option<WebhookInfo>,
}

/// GET /status - Managed webhook state next to the live registration.
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let local = match &state.webhook {
        Some(shared) => shared.read().await.clone(),
        None => WebhookState::default(),
    };
    Json(StatusResponse {
        local,
        platform_webhook: state.client.get_webhook_info().await,
    })
}

/// Creates the webhook router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health).post(handle_update))
        .route("/webhook", post(handle_update))
        .route("/status", get(status))
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve<S>(addr: &str, state: AppState, shutdown: S) -> Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Webhook server listening");
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Webhook server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;
    use serde_json::json;

    fn make_test_state() -> AppState {
        let config = BotConfig::new("t").with_api_url("http://127.0.0.1:9").unwrap();
        AppState::new(config, 7172)
    }

    #[tokio::test]
    async fn test_malformed_body_is_500() {
        let state = make_test_state();
        let router = state.update_router(true);
        let (status, envelope) = process_body(&router, &state.reporter, b"{not json").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        match envelope {
            Envelope::Error { message } => assert!(!message.is_empty()),
            other => panic!("expected error envelope, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_envelope_shape() {
        let state = make_test_state();
        let router = state.update_router(true);
        let (status, envelope) =
            process_body(&router, &state.reporter, br#"{"message":{"chat":{"id":1},"text":"hello"}}"#)
                .await;
        assert_eq!(status, StatusCode::OK);

        let value = serde_json::to_value(envelope).unwrap();
        assert_eq!(value["result"], "ok");
        assert_eq!(value["message"], "Webhook processed");
        assert_eq!(value["details"]["success"], true);
        assert_eq!(value["details"]["response_text"], "Siz yuborganingiz: hello ✅");
    }

    #[test]
    fn test_error_envelope_shape() {
        let value = serde_json::to_value(Envelope::Error {
            message: "bad".into(),
        })
        .unwrap();
        assert_eq!(value, json!({"result": "error", "message": "bad"}));
    }

    #[test]
    fn test_is_simulated() {
        let mut headers = HeaderMap::new();
        assert!(!is_simulated(&headers));
        headers.insert(SIMULATOR_HEADER, "True".parse().unwrap());
        assert!(is_simulated(&headers));
        headers.insert(SIMULATOR_HEADER, "false".parse().unwrap());
        assert!(!is_simulated(&headers));
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let server = TestServer::new(create_router(make_test_state())).unwrap();
        let response = server.get("/").await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["webhook"], "not configured");
        assert_eq!(body["port"], 7172);
    }

    #[tokio::test]
    async fn test_health_reports_tunnel_url() {
        let shared: SharedWebhookState = Default::default();
        shared.write().await.tunnel_url = Some("https://dev.ngrok.app".into());
        let state = make_test_state().with_webhook_state(shared);

        let server = TestServer::new(create_router(state)).unwrap();
        let body: serde_json::Value = server.get("/").await.json();
        assert_eq!(body["webhook"], "https://dev.ngrok.app");
    }

    #[tokio::test]
    async fn test_status_without_platform() {
        let server = TestServer::new(create_router(make_test_state())).unwrap();
        let response = server.get("/status").await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["needs_cleanup"], false);
        assert!(body["platform_webhook"].is_null());
    }

    #[tokio::test]
    async fn test_simulated_request_on_webhook_path() {
        let server = TestServer::new(create_router(make_test_state())).unwrap();
        let response = server
            .post("/webhook")
            .add_header(
                axum::http::HeaderName::from_static(SIMULATOR_HEADER),
                axum::http::HeaderValue::from_static("true"),
            )
            .json(&json!({"message": {"chat": {"id": 1}, "text": "/info"}}))
            .await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["details"]["success"], true);
        assert!(body["details"]["response_text"]
            .as_str()
            .unwrap()
            .starts_with("ℹ️ Men haqimda:"));
    }
}
