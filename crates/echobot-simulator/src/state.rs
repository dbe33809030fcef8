//! Application state and update delivery.

use std::sync::Arc;

use echobot_telegram::config::DEFAULT_API_URL;
use echobot_telegram::webhook::{process_body, SIMULATOR_HEADER};
use echobot_telegram::{ErrorReporter, TelegramClient, UpdateRouter};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::SimulatorConfig;
use crate::error::{Result, SimulatorError};
use crate::types::{ChatReply, Mode};

/// Token of the in-process bot; it never reaches the network.
const LOCAL_TOKEN: &str = "simulator";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Simulator configuration.
    pub config: Arc<SimulatorConfig>,
    /// In-process router with a dry-run client.
    local: UpdateRouter,
    reporter: ErrorReporter,
    /// Client for remote mode.
    http: reqwest::Client,
}

impl AppState {
    pub fn new(config: SimulatorConfig) -> Self {
        let reporter = ErrorReporter::disabled();
        let client = TelegramClient::new(LOCAL_TOKEN, DEFAULT_API_URL).dry_run();
        Self {
            config: Arc::new(config),
            local: UpdateRouter::new(client, reporter.clone()),
            reporter,
            http: reqwest::Client::new(),
        }
    }

    /// Modes usable with the current configuration.
    pub fn available_modes(&self) -> Vec<Mode> {
        if self.config.remote_url.is_some() {
            vec![Mode::Local, Mode::Remote]
        } else {
            vec![Mode::Local]
        }
    }

    /// Deliver `update` in `mode` and return the bot's reply.
    pub async fn deliver(&self, mode: Mode, update: &Value) -> Result<ChatReply> {
        info!(mode = mode.as_str(), update_id = %update["update_id"], "Delivering simulated update");
        match mode {
            Mode::Local => self.deliver_local(update).await,
            Mode::Remote => self.deliver_remote(update).await,
        }
    }

    async fn deliver_local(&self, update: &Value) -> Result<ChatReply> {
        let body = serde_json::to_vec(update)?;
        let (status, envelope) = process_body(&self.local, &self.reporter, &body).await;
        if !status.is_success() {
            return Ok(ChatReply::webhook_status(Mode::Local, status.as_u16()));
        }
        let envelope = serde_json::to_value(envelope)?;
        Ok(ChatReply::from_envelope(Mode::Local, &envelope))
    }

    async fn deliver_remote(&self, update: &Value) -> Result<ChatReply> {
        let url = self
            .config
            .remote_url
            .as_deref()
            .ok_or(SimulatorError::RemoteNotConfigured)?;

        debug!(url, "Forwarding update to remote webhook");
        let result = self
            .http
            .post(url)
            .header(SIMULATOR_HEADER, "true")
            .timeout(self.config.remote_timeout)
            .json(update)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                warn!(url, "Remote webhook timed out");
                return Ok(ChatReply::timeout(Mode::Remote));
            }
            Err(e) => {
                warn!(url, error = %e, "Remote webhook unreachable");
                return Ok(ChatReply::connection_error(Mode::Remote, &e.to_string()));
            }
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!(url, status = %status, "Remote webhook returned an error");
            return Ok(ChatReply::webhook_status(Mode::Remote, status.as_u16()));
        }

        match response.json::<Value>().await {
            Ok(envelope) => Ok(ChatReply::from_envelope(Mode::Remote, &envelope)),
            Err(e) => {
                warn!(url, error = %e, "Remote webhook returned an unreadable body");
                Ok(ChatReply::connection_error(Mode::Remote, &e.to_string()))
            }
        }
    }
}
