//! Error types for the Telegram bot.

use thiserror::Error;

/// Errors that can occur in the Telegram bot.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// Bot token not provided.
    #[error("Telegram bot token not set. Set TELEGRAM_BOT_TOKEN environment variable.")]
    NoToken,

    /// A configuration value could not be used.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The update parsed but lacks something routing needs.
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    /// Webhook registration failed.
    #[error("Failed to register webhook: {0}")]
    WebhookFailed(String),

    /// A shutdown signal arrived before webhook setup finished.
    #[error("Interrupted during webhook setup")]
    SetupInterrupted,

    /// Ngrok tunnel error.
    #[error("Ngrok error: {0}")]
    NgrokError(String),

    /// Ngrok not installed or not in PATH.
    #[error("ngrok not found. Install from https://ngrok.com/download")]
    NgrokNotFound,

    /// Ngrok auth token not set.
    #[error("NGROK_AUTHTOKEN not set. Get a token from https://dashboard.ngrok.com/")]
    NgrokNoAuthToken,

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type for Telegram operations.
pub type Result<T> = std::result::Result<T, TelegramError>;

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        // Bot API URLs embed the token, keep it out of messages.
        TelegramError::HttpError(e.without_url().to_string())
    }
}
