//! Profile route handler.
//!
//! Absence of registration is a normal state, not a fault: an unknown `uid`
//! answers `200 {registered: false}`.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde::Serialize;

use tonlink_core::TelegramUserId;

use crate::error::{AppError, Result};
use crate::models::user::{RegistrationState, UserRecord};
use crate::services::registration::RegistrationService;
use crate::state::AppState;

/// Query parameters of the profile endpoint.
#[derive(Debug, Deserialize)]
pub struct ProfileParams {
    pub uid: i64,
}

/// Non-cosmetic projection of a user's registration.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub registered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<RegistrationState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_code_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_count: Option<i64>,
}

impl ProfileResponse {
    fn unregistered() -> Self {
        Self {
            registered: false,
            state: None,
            wallet: None,
            personal_code: None,
            referral_code_used: None,
            reward_count: None,
        }
    }

    fn registered(user: &UserRecord, reward_count: i64) -> Self {
        Self {
            registered: true,
            state: Some(user.state()),
            wallet: user.wallet_address.as_ref().map(ToString::to_string),
            personal_code: Some(user.personal_code.to_string()),
            referral_code_used: user.referral_code_used.as_ref().map(ToString::to_string),
            reward_count: Some(reward_count),
        }
    }
}

/// Read a user's registration projection plus the reward counter.
///
/// The reward counter is refreshed read-through on every profile hit; a
/// slow or dead peer degrades to the cached value without failing the
/// request.
///
/// # Errors
///
/// Returns `AppError::InvalidInput` (400) on a non-positive `uid`,
/// `AppError::Database` (500) on store failure.
pub async fn profile(
    State(state): State<AppState>,
    Query(params): Query<ProfileParams>,
) -> Result<Json<ProfileResponse>> {
    let uid = TelegramUserId::new(params.uid);
    if !uid.is_valid() {
        return Err(AppError::InvalidInput(
            "uid must be a positive integer".to_owned(),
        ));
    }

    let Some(user) = RegistrationService::new(state.pool()).profile(uid).await? else {
        return Ok(Json(ProfileResponse::unregistered()));
    };

    let reward_count = state.rewards().refresh(state.pool(), uid).await;

    Ok(Json(ProfileResponse::registered(&user, reward_count)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregistered_projection_is_minimal() {
        let json = serde_json::to_value(ProfileResponse::unregistered()).expect("serialize");
        assert_eq!(json, serde_json::json!({"registered": false}));
    }
}
