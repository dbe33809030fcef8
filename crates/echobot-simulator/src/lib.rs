//! Local chat simulator for Echobot.
//!
//! A small HTTP API a chat UI can talk to instead of Telegram:
//! - `GET /` - health and available modes
//! - `POST /send-message` - send text as a user
//! - `POST /send-callback` - press an inline keyboard button
//!
//! Updates are delivered either in-process through the webhook entry point
//! with a dry-run client (`local`), or to a deployed webhook (`remote`, alias
//! `aws`) with the `X-Simulator: true` header.
//!
//! # Example
//!
//! ```no_run
//! use echobot_simulator::{serve, AppState, SimulatorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SimulatorConfig::new("127.0.0.1", 8000);
//!     serve(AppState::new(config)).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
pub mod types;
pub mod update;

pub use config::SimulatorConfig;
pub use error::{Result, SimulatorError};
pub use router::{create_router, serve};
pub use state::AppState;
