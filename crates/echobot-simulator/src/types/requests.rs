//! Request DTOs for the simulator API.

use serde::{Deserialize, Serialize};

/// Where a simulated update is delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// In-process webhook entry point, dry-run.
    #[default]
    Local,
    /// The deployed webhook.
    #[serde(alias = "aws")]
    Remote,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Local => "local",
            Mode::Remote => "remote",
        }
    }
}

/// Send a text message as a user.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub user_id: i64,
    pub text: String,
    #[serde(default)]
    pub mode: Mode,
    /// Chat to send from; defaults to the user's private chat.
    pub chat_id: Option<i64>,
}

/// Press an inline keyboard button as a user.
#[derive(Debug, Clone, Deserialize)]
pub struct SendCallbackRequest {
    pub user_id: i64,
    pub callback_data: String,
    #[serde(default)]
    pub mode: Mode,
}
