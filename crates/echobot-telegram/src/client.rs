//! Thin Bot API client.
//!
//! Every call is a single HTTP request with a fixed timeout and no retry.
//! Failures are logged and reported as `false` / `None`; nothing here returns
//! an error to the caller.

use std::time::Duration;

use echobot_core::OutboundMessage;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::BotConfig;

/// Per-request timeout for Bot API calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Webhook registration as reported by `getWebhookInfo`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookInfo {
    /// Registered URL; empty when no webhook is set.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub pending_update_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error_message: Option<String>,
}

/// Payload of `answerCallbackQuery`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallbackAnswer<'a> {
    pub callback_query_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
    pub show_alert: bool,
}

/// Common Bot API response wrapper.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

/// Client for the Bot API methods the bot uses.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    /// `{api_url}/bot{token}`
    base_url: String,
    /// Log calls instead of sending them.
    dry_run: bool,
}

impl TelegramClient {
    /// Create a client for `token` against `api_url`.
    pub fn new(token: &str, api_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
            dry_run: false,
        }
    }

    /// Create a client from the bot configuration.
    pub fn from_config(config: &BotConfig) -> Self {
        Self::new(&config.token, &config.api_url)
    }

    /// A copy of this client that only logs outbound calls and reports success.
    pub fn dry_run(&self) -> Self {
        Self {
            dry_run: true,
            ..self.clone()
        }
    }

    /// Whether outbound calls are suppressed.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// Send a message. Returns `true` on HTTP 200.
    pub async fn send_message(&self, message: &OutboundMessage) -> bool {
        if self.dry_run {
            info!(chat_id = message.chat_id, text = %message.text, "[dry-run] sendMessage");
            return true;
        }
        self.post_for_status("sendMessage", message).await
    }

    /// Acknowledge a button press. Returns `true` on HTTP 200.
    pub async fn answer_callback_query(&self, callback_query_id: &str, text: Option<&str>) -> bool {
        if self.dry_run {
            info!(callback_query_id, text = ?text, "[dry-run] answerCallbackQuery");
            return true;
        }
        let payload = CallbackAnswer {
            callback_query_id,
            text,
            show_alert: false,
        };
        self.post_for_status("answerCallbackQuery", &payload).await
    }

    /// Current webhook registration, or `None` if it could not be read.
    pub async fn get_webhook_info(&self) -> Option<WebhookInfo> {
        if self.dry_run {
            info!("[dry-run] getWebhookInfo");
            return Some(WebhookInfo::default());
        }
        let request = self.http.get(self.method_url("getWebhookInfo"));
        let info: Option<WebhookInfo> = self.call("getWebhookInfo", request).await;
        if let Some(info) = &info {
            debug!(url = %info.url, pending = info.pending_update_count, "Current webhook");
        }
        info
    }

    /// Register `url` as the webhook target.
    pub async fn set_webhook(&self, url: &str) -> bool {
        if self.dry_run {
            info!(url, "[dry-run] setWebhook");
            return true;
        }
        let request = self
            .http
            .post(self.method_url("setWebhook"))
            .json(&json!({ "url": url }));
        let ok = self.call::<bool>("setWebhook", request).await.is_some();
        if ok {
            info!(url, "Webhook set");
        }
        ok
    }

    /// Remove the webhook registration.
    pub async fn delete_webhook(&self) -> bool {
        if self.dry_run {
            info!("[dry-run] deleteWebhook");
            return true;
        }
        let request = self.http.post(self.method_url("deleteWebhook"));
        let ok = self.call::<bool>("deleteWebhook", request).await.is_some();
        if ok {
            info!("Webhook deleted");
        }
        ok
    }

    /// POST a JSON payload; success is HTTP 200.
    async fn post_for_status<P: Serialize + ?Sized>(&self, method: &str, payload: &P) -> bool {
        let result = self
            .http
            .post(self.method_url(method))
            .timeout(REQUEST_TIMEOUT)
            .json(payload)
            .send()
            .await;

        match result {
            Ok(response) if response.status() == reqwest::StatusCode::OK => {
                debug!(method, "Bot API call succeeded");
                true
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!(method, status = %status, body = %body, "Bot API call failed");
                false
            }
            Err(e) => {
                warn!(method, error = %e.without_url(), "Bot API request error");
                false
            }
        }
    }

    /// Send a request and unwrap `result` from an `ok: true` response.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        request: reqwest::RequestBuilder,
    ) -> Option<T> {
        let response = match request.timeout(REQUEST_TIMEOUT).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(method, error = %e.without_url(), "Bot API request error");
                return None;
            }
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!(method, status = %status, body = %body, "Bot API call failed");
            return None;
        }

        match response.json::<ApiResponse<T>>().await {
            Ok(ApiResponse {
                ok: true,
                result: Some(result),
                ..
            }) => Some(result),
            Ok(api) => {
                warn!(method, description = ?api.description, "Bot API returned not ok");
                None
            }
            Err(e) => {
                warn!(method, error = %e.without_url(), "Failed to parse Bot API response");
                None
            }
        }
    }
}
