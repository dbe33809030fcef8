//! Inbound update and outbound response types.
//!
//! Only the fields the bot actually reads are modelled. Everything is optional
//! so that partial payloads (simulators, hand-written test bodies) still parse;
//! the router decides what a missing field means.

use serde::{Deserialize, Serialize};
use teloxide::types::InlineKeyboardMarkup;

/// One inbound event pushed by the platform to the webhook.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Update {
    /// Platform-assigned update id.
    #[serde(default)]
    pub update_id: Option<i64>,
    /// A new incoming message.
    #[serde(default)]
    pub message: Option<Message>,
    /// A button press on an inline keyboard.
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

/// A chat message.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub message_id: Option<i64>,
    #[serde(default)]
    pub chat: Option<Chat>,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

/// The chat a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// The sender of a message or callback.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
}

/// A button press.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CallbackQuery {
    /// Identifier used to acknowledge the press.
    #[serde(default)]
    pub id: Option<String>,
    /// Opaque token of the pressed button.
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub from: Option<User>,
    /// The message the keyboard was attached to.
    #[serde(default)]
    pub message: Option<Message>,
}

/// What an update is, from the router's point of view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateKind<'a> {
    Message(&'a Message),
    Callback(&'a CallbackQuery),
    Unhandled,
}

impl Update {
    /// Classify the update. A message takes precedence over a callback.
    pub fn kind(&self) -> UpdateKind<'_> {
        if let Some(message) = &self.message {
            UpdateKind::Message(message)
        } else if let Some(query) = &self.callback_query {
            UpdateKind::Callback(query)
        } else {
            UpdateKind::Unhandled
        }
    }
}

impl Message {
    /// Id of the chat this message was posted in.
    pub fn chat_id(&self) -> Option<i64> {
        self.chat.map(|c| c.id)
    }

    /// Sender's first name, if the platform sent a non-empty one.
    pub fn first_name(&self) -> Option<&str> {
        self.from
            .as_ref()
            .and_then(|u| u.first_name.as_deref())
            .filter(|name| !name.is_empty())
    }
}

impl CallbackQuery {
    /// Id of the chat holding the message with the pressed keyboard.
    pub fn chat_id(&self) -> Option<i64> {
        self.message.as_ref().and_then(Message::chat_id)
    }
}

/// A message the bot sends back. Serializes to the `sendMessage` payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl OutboundMessage {
    /// Plain text message without a keyboard.
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            reply_markup: None,
        }
    }

    /// Attach an inline keyboard.
    pub fn with_markup(mut self, markup: Option<InlineKeyboardMarkup>) -> Self {
        self.reply_markup = markup;
        self
    }
}
