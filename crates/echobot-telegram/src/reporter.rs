//! Error reports delivered to a separate Telegram chat.
//!
//! Enabled only when both `BUG_HUNTER_BOT_TOKEN` and `BUG_HUNTER_CHAT_ID` are
//! configured. Reporting is best-effort: a failed report is logged and
//! otherwise ignored.

use chrono::{DateTime, Utc};
use echobot_core::OutboundMessage;
use tracing::{debug, warn};

use crate::client::TelegramClient;
use crate::config::BotConfig;

/// Maximum message length accepted by Telegram.
const MAX_MESSAGE_CHARS: usize = 4096;

/// One error report.
#[derive(Debug, Clone, Default)]
pub struct ErrorReport<'a> {
    /// Short machine-ish category, e.g. `ROUTING_ERROR`.
    pub kind: &'a str,
    pub message: &'a str,
    /// Longer free-form details (request body, backtrace...).
    pub details: Option<&'a str>,
    pub context: Vec<(&'a str, String)>,
}

impl<'a> ErrorReport<'a> {
    pub fn new(kind: &'a str, message: &'a str) -> Self {
        Self {
            kind,
            message,
            ..Self::default()
        }
    }

    pub fn with_details(mut self, details: &'a str) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_context(mut self, key: &'a str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }
}

/// Sends error reports to the configured chat.
#[derive(Clone, Default)]
pub struct ErrorReporter {
    target: Option<(TelegramClient, i64)>,
}

impl ErrorReporter {
    /// A reporter that never sends anything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Build from config; disabled when no reporter is configured.
    pub fn from_config(config: &BotConfig) -> Self {
        let target = config.reporter.as_ref().map(|reporter| {
            (
                TelegramClient::new(&reporter.token, &config.api_url),
                reporter.chat_id,
            )
        });
        Self { target }
    }

    pub fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    /// Send a report. Returns whether it was delivered.
    pub async fn report(&self, report: &ErrorReport<'_>) -> bool {
        let Some((client, chat_id)) = &self.target else {
            debug!(kind = report.kind, "Error reporting disabled, dropping report");
            return false;
        };

        let text = format_report(report, Utc::now());
        let delivered = client
            .send_message(&OutboundMessage::text(*chat_id, text))
            .await;
        if !delivered {
            warn!(kind = report.kind, "Failed to deliver error report");
        }
        delivered
    }
}

/// Render a report as plain text, truncated to the Telegram message limit.
pub fn format_report(report: &ErrorReport<'_>, at: DateTime<Utc>) -> String {
    let mut text = format!(
        "🐞 {}\n🕒 {}\n\n{}",
        report.kind,
        at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.message
    );

    if let Some(details) = report.details {
        text.push_str("\n\nDetails:\n");
        text.push_str(details);
    }

    if !report.context.is_empty() {
        text.push_str("\n\nContext:");
        for (key, value) in &report.context {
            text.push_str(&format!("\n- {}: {}", key, value));
        }
    }

    if text.chars().count() > MAX_MESSAGE_CHARS {
        text = text.chars().take(MAX_MESSAGE_CHARS).collect();
    }
    text
}
