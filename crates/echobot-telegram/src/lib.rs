//! Telegram webhook server for Echobot.
//!
//! This crate receives Telegram updates over a webhook, answers them with the
//! canned replies from `echobot-core`, and manages a tunnel webhook while
//! developing locally.
//!
//! # Features
//!
//! - Webhook endpoint that always answers with a JSON envelope
//! - Bot API client for sending messages and managing the webhook
//! - Optional error reports to a separate "bug hunter" chat
//! - ngrok integration that restores the previous webhook on shutdown
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_BOT_TOKEN` (or `BOT_TOKEN`): Bot token from @BotFather
//!
//! Optional:
//! - `TELEGRAM_API_URL`: Bot API base URL (default: https://api.telegram.org)
//! - `BUG_HUNTER_BOT_TOKEN`, `BUG_HUNTER_CHAT_ID`: Error report destination
//! - `WEBHOOK_HOST`, `WEBHOOK_PORT`: Listen address (default: 0.0.0.0:7172)
//! - `NGROK_API_URL`: ngrok local API (default: http://127.0.0.1:4040/api/tunnels)
//! - `NGROK_AUTHTOKEN`: Needed only when the dev server spawns ngrok itself
//!
//! # Example
//!
//! ```no_run
//! use echobot_telegram::{webhook, AppState, BotConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BotConfig::from_env()?;
//!     let state = AppState::new(config, 7172);
//!     webhook::serve("0.0.0.0:7172", state, webhook::shutdown_signal()).await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod dev;
pub mod error;
pub mod ngrok;
pub mod reporter;
pub mod router;
pub mod webhook;

pub use cache::{CachedWebhook, WebhookCache};
pub use client::{TelegramClient, WebhookInfo};
pub use config::{BotConfig, ReporterConfig};
pub use dev::{SharedWebhookState, WebhookManager, WebhookState};
pub use error::{Result, TelegramError};
pub use ngrok::{NgrokTunnel, TunnelProbe};
pub use reporter::{ErrorReport, ErrorReporter};
pub use router::{RouteOutcome, UpdateRouter};
pub use webhook::{create_router, AppState, Envelope};
