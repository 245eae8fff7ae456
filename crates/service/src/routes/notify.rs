//! Peer notification route handler.
//!
//! Inbound channel for the rewards peer: it announces events (a mined
//! block, a credited reward) and we relay them into the chat. The channel
//! authenticates with the shared secret; the comparison is constant-time.

use axum::Json;
use axum::extract::State;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use tonlink_core::TelegramUserId;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Notify request body.
#[derive(Debug, Deserialize)]
pub struct NotifyRequest {
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub uid: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Notify response.
#[derive(Debug, Serialize)]
pub struct NotifyResponse {
    pub ok: bool,
}

/// Relay a peer-service message to a chat.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` (403) on secret mismatch,
/// `AppError::InvalidInput` (400) on missing `uid` or `message`.
#[instrument(skip_all)]
pub async fn notify(
    State(state): State<AppState>,
    Json(req): Json<NotifyRequest>,
) -> Result<Json<NotifyResponse>> {
    if !constant_time_compare(
        &req.secret,
        state.config().peer_shared_secret.expose_secret(),
    ) {
        return Err(AppError::Unauthorized("secret mismatch".to_owned()));
    }

    let uid = req
        .uid
        .map(TelegramUserId::new)
        .filter(TelegramUserId::is_valid)
        .ok_or_else(|| AppError::InvalidInput("uid is required".to_owned()))?;

    let message = req
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::InvalidInput("message is required".to_owned()))?;

    state.telegram().notify(uid.as_i64(), message, None).await;

    Ok(Json(NotifyResponse { ok: true }))
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}
