//! Unsubscribe route handler.
//!
//! Deletion is immediate and complete: the row is removed, not flagged. A
//! best-effort goodbye is pushed to the chat off the request path.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use tonlink_core::TelegramUserId;

use crate::bot::menus;
use crate::error::{AppError, Result};
use crate::services::registration::RegistrationService;
use crate::state::AppState;

/// Unsubscribe request body.
#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub uid: i64,
}

/// Unsubscribe response.
#[derive(Debug, Serialize)]
pub struct UnsubscribeResponse {
    pub ok: bool,
    pub removed: bool,
}

/// Delete a user's registration.
///
/// # Errors
///
/// Returns `AppError::InvalidInput` (400) on a non-positive `uid`,
/// `AppError::Database` (500) on store failure.
#[instrument(skip(state))]
pub async fn unsubscribe(
    State(state): State<AppState>,
    Json(req): Json<UnsubscribeRequest>,
) -> Result<Json<UnsubscribeResponse>> {
    let uid = TelegramUserId::new(req.uid);
    if !uid.is_valid() {
        return Err(AppError::InvalidInput(
            "uid must be a positive integer".to_owned(),
        ));
    }

    let removed = RegistrationService::new(state.pool())
        .unsubscribe(uid)
        .await?;

    if removed {
        let state = state.clone();
        tokio::spawn(async move {
            let (_, keyboard) = menus::main_menu(false);
            state
                .telegram()
                .notify(
                    uid.as_i64(),
                    "🗑️ You have been unsubscribed. Your rewards are gone.",
                    Some(keyboard),
                )
                .await;
        });
    }

    Ok(Json(UnsubscribeResponse { ok: true, removed }))
}
