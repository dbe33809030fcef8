//! Response DTOs for the simulator API.

use serde::Serialize;
use serde_json::Value;

use super::requests::Mode;

/// Shown when the bot produced no reply text.
pub const NO_REPLY_TEXT: &str = "Javob topilmadi";

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub simulator: String,
    pub version: String,
    /// Webhook used by remote mode, if configured.
    pub remote_url: Option<String>,
    pub modes: Vec<Mode>,
}

/// The bot's reply to a simulated update, as a chat UI renders it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub success: bool,
    pub message: String,
    pub response_text: String,
    /// Inline keyboard markup, when the reply carries one.
    pub buttons: Option<Value>,
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatReply {
    /// Reply built from a webhook envelope answered with HTTP 200.
    pub fn from_envelope(mode: Mode, envelope: &Value) -> Self {
        let details = &envelope["details"];
        Self {
            success: details["success"].as_bool().unwrap_or(false),
            message: details["message"].as_str().unwrap_or_default().to_string(),
            response_text: details["response_text"]
                .as_str()
                .unwrap_or(NO_REPLY_TEXT)
                .to_string(),
            buttons: details.get("buttons").filter(|b| !b.is_null()).cloned(),
            mode,
            error: details["error"].as_str().map(str::to_string),
        }
    }

    /// Reply for a webhook that answered with a non-200 status.
    pub fn webhook_status(mode: Mode, status: u16) -> Self {
        Self {
            success: false,
            message: format!("Webhook error: {}", status),
            response_text: format!("❌ Webhook xatosi: {}", status),
            buttons: None,
            mode,
            error: None,
        }
    }

    /// Reply for a webhook that did not answer in time.
    pub fn timeout(mode: Mode) -> Self {
        Self {
            success: false,
            message: "Webhook timeout".to_string(),
            response_text: "❌ Webhook javob bermadi (timeout)".to_string(),
            buttons: None,
            mode,
            error: Some("Request timeout".to_string()),
        }
    }

    /// Reply for a webhook that could not be reached.
    pub fn connection_error(mode: Mode, error: &str) -> Self {
        Self {
            success: false,
            message: format!("Connection error: {}", error),
            response_text: format!("❌ Ulanish xatosi: {}", error),
            buttons: None,
            mode,
            error: Some(error.to_string()),
        }
    }
}
