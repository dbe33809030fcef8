//! Chat handlers: simulated messages and button presses.

use axum::{extract::State, Json};
use chrono::Utc;
use tracing::info;

use crate::error::Result;
use crate::state::AppState;
use crate::types::{ChatReply, SendCallbackRequest, SendMessageRequest};
use crate::update::{callback_update, message_update};

/// POST /send-message - Send a text message as a user.
pub async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<ChatReply>> {
    info!(user_id = request.user_id, text = %request.text, "Simulated message");
    let chat_id = request.chat_id.unwrap_or(request.user_id);
    let update = message_update(request.user_id, chat_id, &request.text, Utc::now());
    let reply = state.deliver(request.mode, &update).await?;
    Ok(Json(reply))
}

/// POST /send-callback - Press an inline keyboard button as a user.
pub async fn send_callback(
    State(state): State<AppState>,
    Json(request): Json<SendCallbackRequest>,
) -> Result<Json<ChatReply>> {
    info!(user_id = request.user_id, data = %request.callback_data, "Simulated button press");
    let update = callback_update(request.user_id, &request.callback_data, Utc::now());
    let reply = state.deliver(request.mode, &update).await?;
    Ok(Json(reply))
}
