//! Routes one inbound update to its reply.

use echobot_core::{
    respond, respond_to_callback, CallbackQuery, Message, OutboundMessage, Request, Update,
    UpdateKind,
};
use serde::Serialize;
use teloxide::types::InlineKeyboardMarkup;
use tracing::{debug, error, info, warn};

use crate::client::TelegramClient;
use crate::error::{Result, TelegramError};
use crate::reporter::{ErrorReport, ErrorReporter};

/// Result of routing a single update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteOutcome {
    pub success: bool,
    pub message: String,
    /// Text sent back to the chat, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_text: Option<String>,
    /// Keyboard sent with the reply, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buttons: Option<InlineKeyboardMarkup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RouteOutcome {
    /// Nothing to do for this update.
    fn ignored(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            response_text: None,
            buttons: None,
            error: None,
        }
    }

    /// A reply was produced and handed to the platform.
    fn replied(sent: bool, outbound: OutboundMessage) -> Self {
        Self {
            success: sent,
            message: if sent {
                "Message processed and sent".to_string()
            } else {
                "Failed to send message".to_string()
            },
            response_text: Some(outbound.text),
            buttons: outbound.reply_markup,
            error: None,
        }
    }

    fn failed(error: &TelegramError) -> Self {
        Self {
            success: false,
            message: error.to_string(),
            response_text: None,
            buttons: None,
            error: Some(error.to_string()),
        }
    }

    /// Whether a reply was produced.
    pub fn has_response(&self) -> bool {
        self.response_text.is_some()
    }
}

/// Dispatches updates to the responder and sends the replies.
#[derive(Clone)]
pub struct UpdateRouter {
    client: TelegramClient,
    reporter: ErrorReporter,
}

impl UpdateRouter {
    pub fn new(client: TelegramClient, reporter: ErrorReporter) -> Self {
        Self { client, reporter }
    }

    /// Route one update. Never fails: errors end up in the outcome.
    pub async fn route(&self, update: &Update) -> RouteOutcome {
        match self.dispatch(update).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(update_id = ?update.update_id, error = %e, "Update processing failed");
                let message = e.to_string();
                let report = ErrorReport::new("ROUTING_ERROR", &message).with_context(
                    "update_id",
                    update
                        .update_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "unknown".to_string()),
                );
                self.reporter.report(&report).await;
                RouteOutcome::failed(&e)
            }
        }
    }

    async fn dispatch(&self, update: &Update) -> Result<RouteOutcome> {
        match update.kind() {
            UpdateKind::Message(message) => self.handle_message(message).await,
            UpdateKind::Callback(query) => self.handle_callback(query).await,
            UpdateKind::Unhandled => {
                debug!(update_id = ?update.update_id, "Unhandled update kind, ignoring");
                Ok(RouteOutcome::ignored("Update ignored"))
            }
        }
    }

    async fn handle_message(&self, message: &Message) -> Result<RouteOutcome> {
        let text = message.text.as_deref().unwrap_or_default();
        let Some(request) = Request::parse(text, message.first_name()) else {
            debug!(chat_id = ?message.chat_id(), "Empty message, ignoring");
            return Ok(RouteOutcome::ignored("Empty message ignored"));
        };

        let chat_id = message
            .chat_id()
            .ok_or_else(|| TelegramError::InvalidUpdate("message has no chat".to_string()))?;

        info!(chat_id, request = ?request, "Message received");
        let reply = respond(&request);
        let outbound = OutboundMessage::text(chat_id, reply.text).with_markup(reply.buttons);
        let sent = self.client.send_message(&outbound).await;
        Ok(RouteOutcome::replied(sent, outbound))
    }

    async fn handle_callback(&self, query: &CallbackQuery) -> Result<RouteOutcome> {
        let callback_id = query
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| TelegramError::InvalidUpdate("callback query has no id".to_string()))?;
        let data = query.data.as_deref().unwrap_or_default();
        let text = respond_to_callback(data);

        info!(callback_id, data, "Button pressed");
        if !self.client.answer_callback_query(callback_id, Some(text)).await {
            warn!(callback_id, "Callback acknowledgment failed");
        }

        let chat_id = query.chat_id().ok_or_else(|| {
            TelegramError::InvalidUpdate("callback query has no originating chat".to_string())
        })?;
        let outbound = OutboundMessage::text(chat_id, text);
        let sent = self.client.send_message(&outbound).await;
        Ok(RouteOutcome::replied(sent, outbound))
    }
}
