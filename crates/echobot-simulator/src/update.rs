//! Platform-shaped updates for simulated user actions.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

/// Update for a text message from `user_id`, sent in `chat_id`.
pub fn message_update(user_id: i64, chat_id: i64, text: &str, at: DateTime<Utc>) -> Value {
    let millis = at.timestamp_millis();
    json!({
        "update_id": millis,
        "message": {
            "message_id": millis,
            "date": at.timestamp(),
            "chat": {"id": chat_id, "type": "private"},
            "from": {"id": user_id, "is_bot": false},
            "text": text
        }
    })
}

/// Update for a press of the button carrying `callback_data`.
pub fn callback_update(user_id: i64, callback_data: &str, at: DateTime<Utc>) -> Value {
    let millis = at.timestamp_millis();
    json!({
        "update_id": millis,
        "callback_query": {
            "id": format!("callback_{}", millis),
            "from": {"id": user_id, "is_bot": false, "first_name": "User"},
            "data": callback_data,
            "message": {
                "message_id": 1,
                "date": at.timestamp(),
                "chat": {"id": user_id, "type": "private"},
                "text": "Menu"
            }
        }
    })
}
