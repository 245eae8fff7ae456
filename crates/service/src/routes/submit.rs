//! Wallet submit route handler.
//!
//! The confirmation step of the handshake. Whatever goes wrong, the reply is
//! always the `{ok, error?}` envelope the connect page understands, so the
//! page can show the error and offer a retry instead of choking on a bare
//! status line.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use tonlink_core::{ReferralCode, TelegramUserId, WalletAddress};

use crate::bot::menus;
use crate::services::registration::{RegistrationService, SubmitError};
use crate::state::AppState;

/// Submit request body.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub uid: i64,
    pub nonce: String,
    pub address: String,
    #[serde(default)]
    pub referral: Option<String>,
}

/// Submit response envelope.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubmitResponse {
    fn success() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    fn failure(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(msg.into()),
        }
    }
}

fn reply(status: StatusCode, body: SubmitResponse) -> Response {
    (status, Json(body)).into_response()
}

/// Handle the handshake submit.
///
/// Validates the payload, runs the registration state machine, then
/// triggers the reward refresh and the confirmation push. Retried POSTs
/// with an identical payload are answered idempotently.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            return reply(
                StatusCode::BAD_REQUEST,
                SubmitResponse::failure(format!("invalid payload: {rejection}")),
            );
        }
    };

    let uid = TelegramUserId::new(req.uid);
    if !uid.is_valid() {
        return reply(
            StatusCode::BAD_REQUEST,
            SubmitResponse::failure("uid must be a positive integer"),
        );
    }

    let address = match WalletAddress::parse(&req.address) {
        Ok(address) => address,
        Err(e) => return reply(StatusCode::BAD_REQUEST, SubmitResponse::failure(e.to_string())),
    };

    let referral = match req.referral.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match ReferralCode::parse(&raw.to_ascii_uppercase()) {
            Ok(code) => Some(code),
            Err(e) => {
                return reply(StatusCode::BAD_REQUEST, SubmitResponse::failure(e.to_string()));
            }
        },
    };

    let service = RegistrationService::new(state.pool());
    let outcome = match service
        .submit(uid, req.nonce.trim(), &address, referral.as_ref())
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            let (status, message) = match &e {
                SubmitError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                SubmitError::UnknownSession
                | SubmitError::SessionReplayed
                | SubmitError::SessionExpired => (StatusCode::BAD_REQUEST, e.to_string()),
                SubmitError::Repository(_) => {
                    let event_id = sentry::capture_error(&e);
                    tracing::error!(error = %e, sentry_event_id = %event_id, "Submit failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_owned(),
                    )
                }
            };
            return reply(status, SubmitResponse::failure(message));
        }
    };

    if outcome.fresh {
        // Best-effort tail of the flow: warm the reward cache, confirm in
        // chat. Neither can fail the submit.
        state.rewards().refresh(state.pool(), uid).await;

        let (menu_text, keyboard) = menus::main_menu(true);
        let text = format!(
            "🔗 TON wallet received: {}\n✅ Registration recorded.\n\n{menu_text}",
            address.as_str()
        );
        state
            .telegram()
            .notify(uid.as_i64(), &text, Some(keyboard))
            .await;
    }

    reply(StatusCode::OK, SubmitResponse::success())
}

/// Informative 405 so a browser hitting the endpoint sees what it expects.
pub async fn method_hint() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        "This endpoint accepts POST with JSON {uid, nonce, address}.",
    )
        .into_response()
}
