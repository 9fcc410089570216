//! Single-recipient endpoint — POST /send-message
//!
//! Request:  `{"usernameOrId": "alice", "message": "hello"}`
//!           (`userId`, `username`, and `channelId` are also accepted)
//! Response: `{"success": true, "message": "...", "username": "...", "userId": "..."}`
//! Error:    `{"error": "...", "code": "..."}` with an HTTP status matching
//!           the classified failure.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use herald_core::types::{RecipientRef, SendRequest};

use crate::app::AppState;
use crate::http::{bad_request, dispatch_rejection, ApiError};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    /// Username or numeric ID in one field; classified server-side.
    #[serde(default)]
    pub username_or_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct SendMessageReply {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// POST /send-message — deliver one private or channel message.
pub async fn send_message_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SendMessagePayload>,
) -> Result<Json<SendMessageReply>, (StatusCode, Json<ApiError>)> {
    let text = match payload.message.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => return Err(bad_request("message is required")),
    };

    let Some(request) = pick_recipient(&payload, &text) else {
        return Err(bad_request(
            "provide usernameOrId, userId, username, or channelId",
        ));
    };

    match state.dispatcher.dispatch(&request).await {
        Ok(result) => Ok(Json(SendMessageReply {
            success: true,
            message: "message sent".to_string(),
            username: result.username,
            user_id: result.user_id,
        })),
        Err(e) => {
            warn!(error = %e, "POST /send-message failed");
            Err(dispatch_rejection(e))
        }
    }
}

/// Recipient precedence: the combined field wins, then the explicit channel,
/// then the explicit ID, then the username.
fn pick_recipient(payload: &SendMessagePayload, text: &str) -> Option<SendRequest> {
    if let Some(combined) = non_empty(&payload.username_or_id) {
        let recipient = RecipientRef::classify(&combined)?;
        return Some(SendRequest::for_recipient(&recipient, text));
    }
    if let Some(channel_id) = non_empty(&payload.channel_id) {
        return Some(SendRequest::ToChannel {
            channel_id,
            text: text.to_string(),
        });
    }
    if let Some(user_id) = non_empty(&payload.user_id) {
        return Some(SendRequest::ToUserId {
            user_id,
            text: text.to_string(),
        });
    }
    if let Some(username) = non_empty(&payload.username) {
        return Some(SendRequest::ToUsername {
            username,
            text: text.to_string(),
        });
    }
    None
}

fn non_empty(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(
        username_or_id: Option<&str>,
        username: Option<&str>,
        user_id: Option<&str>,
    ) -> SendMessagePayload {
        SendMessagePayload {
            username_or_id: username_or_id.map(String::from),
            username: username.map(String::from),
            user_id: user_id.map(String::from),
            channel_id: None,
            message: Some("hi".to_string()),
        }
    }

    #[test]
    fn combined_field_wins_and_is_classified() {
        let request = pick_recipient(&payload(Some(" 123456789012345678 "), None, None), "hi");
        assert!(matches!(request, Some(SendRequest::ToUserId { .. })));

        let request = pick_recipient(&payload(Some("alice"), Some("bob"), Some("1")), "hi");
        assert!(
            matches!(request, Some(SendRequest::ToUsername { ref username, .. }) if username == "alice")
        );
    }

    #[test]
    fn explicit_id_beats_username() {
        let request = pick_recipient(&payload(None, Some("alice"), Some("42")), "hi");
        assert!(matches!(request, Some(SendRequest::ToUserId { .. })));
    }

    #[test]
    fn blank_fields_do_not_count() {
        assert!(pick_recipient(&payload(Some("   "), None, None), "hi").is_none());
        assert!(pick_recipient(&payload(None, None, None), "hi").is_none());
    }
}
