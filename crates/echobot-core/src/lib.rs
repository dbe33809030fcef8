//! Core types and reply logic for Echobot.
//!
//! - [`types`]: the inbound update and outbound message model
//! - [`responder`]: maps commands, text and button presses to canned replies
//! - [`config`]: state directory and `.env` helpers

pub mod config;
pub mod responder;
pub mod types;

pub use responder::{respond, respond_to_callback, Button, Reply, Request};
pub use types::{CallbackQuery, Chat, Message, OutboundMessage, Update, UpdateKind, User};
