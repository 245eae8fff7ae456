//! Telegram bot loop.
//!
//! The chat-side execution context: a long-poll loop over `getUpdates` that
//! dispatches start commands and menu callbacks. It shares nothing with the
//! HTTP server except the store; reward refreshes triggered from here are
//! dispatched as detached tasks so the poll loop never waits on the peer.

pub mod commands;
pub mod menus;

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use tonlink_core::TelegramUserId;

use crate::db::{RepositoryError, SessionRepository};
use crate::models::user::RegistrationState;
use crate::services::registration::RegistrationService;
use crate::state::AppState;
use crate::telegram::TelegramError;
use crate::telegram::types::{CallbackQuery, Message, Update};

/// Long-poll window for `getUpdates`.
const POLL_TIMEOUT_SECS: u64 = 30;

/// Pause after a failed poll before trying again.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// How often to sweep expired handshake sessions.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Errors from handling a single update.
#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Telegram(#[from] TelegramError),
}

/// Run the bot loop until the process shuts down.
///
/// One failed update never kills the loop; it is logged and the loop moves
/// on to the next one.
pub async fn run(state: AppState) {
    info!("Bot loop started");

    let mut offset = 0i64;
    let mut last_sweep = Instant::now();

    loop {
        match state.telegram().get_updates(offset, POLL_TIMEOUT_SECS).await {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    if let Err(e) = handle_update(&state, update).await {
                        warn!(error = %e, "Update handling failed");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "getUpdates failed");
                tokio::time::sleep(ERROR_BACKOFF).await;
            }
        }

        if last_sweep.elapsed() >= SWEEP_INTERVAL {
            last_sweep = Instant::now();
            match SessionRepository::new(state.pool()).sweep_expired().await {
                Ok(0) => {}
                Ok(n) => debug!(removed = n, "Swept expired handshake sessions"),
                Err(e) => warn!(error = %e, "Session sweep failed"),
            }
        }
    }
}

async fn handle_update(state: &AppState, update: Update) -> Result<(), BotError> {
    if let Some(message) = update.message {
        handle_message(state, &message).await
    } else if let Some(query) = update.callback_query {
        handle_callback(state, &query).await
    } else {
        Ok(())
    }
}

/// Handle an incoming message. Only `/start` is a command; everything else
/// is ignored (wallets are linked through the web handshake, never typed).
async fn handle_message(state: &AppState, message: &Message) -> Result<(), BotError> {
    let Some(from) = &message.from else {
        return Ok(());
    };
    let Some(text) = message.text.as_deref() else {
        return Ok(());
    };
    let Some(payload) = commands::start_payload(text) else {
        return Ok(());
    };

    let uid = TelegramUserId::new(from.id);
    if !uid.is_valid() {
        return Ok(());
    }

    let referral = commands::parse_referral(payload);
    let user = RegistrationService::new(state.pool())
        .ensure_registered(uid, referral.as_ref())
        .await?;

    let (text, keyboard) =
        menus::main_menu(user.state() == RegistrationState::Linked);
    state
        .telegram()
        .send_message(message.chat.id, &text, Some(keyboard))
        .await?;

    Ok(())
}

/// Handle an inline-keyboard callback.
async fn handle_callback(state: &AppState, query: &CallbackQuery) -> Result<(), BotError> {
    // Acknowledge first so the client stops its spinner; a failure here
    // should not block the action itself.
    if let Err(e) = state.telegram().answer_callback_query(&query.id).await {
        warn!(error = %e, "answerCallbackQuery failed");
    }

    let Some(message) = &query.message else {
        return Ok(());
    };
    let uid = TelegramUserId::new(query.from.id);
    if !uid.is_valid() {
        return Ok(());
    }

    let chat_id = message.chat.id;
    let message_id = message.message_id;
    let action = query.data.as_deref().unwrap_or("");
    let service = RegistrationService::new(state.pool());

    let (text, keyboard) = match action {
        "register" => {
            let nonce = service.issue_session(uid).await?;
            let url = state.config().connect_url(uid, &nonce);
            menus::connect_menu(&url)
        }

        "profile" => match service.profile(uid).await? {
            Some(user) => {
                // Render the cached counter immediately; refresh out of band.
                spawn_reward_refresh(state, uid);
                let cached = user.reward_cache;
                menus::profile_menu(&user, cached)
            }
            None => {
                let (_, keyboard) = menus::main_menu(false);
                ("❌ You are not registered yet.".to_owned(), keyboard)
            }
        },

        "referral" => {
            let user = service.profile(uid).await?;
            menus::referral_menu(user.as_ref().map(|u| &u.personal_code))
        }

        "mines" => menus::mines_menu(),

        "settings" => menus::settings_menu(),

        "unsubscribe" => menus::unsubscribe_confirm_menu(),

        "confirm_unsubscribe" => {
            service.unsubscribe(uid).await?;
            let (_, keyboard) = menus::main_menu(false);
            ("🗑️ You have been unsubscribed.".to_owned(), keyboard)
        }

        "back_main" => {
            let linked = service
                .profile(uid)
                .await?
                .is_some_and(|u| u.state() == RegistrationState::Linked);
            menus::main_menu(linked)
        }

        other => {
            debug!(action = other, "Ignoring unknown callback action");
            return Ok(());
        }
    };

    state
        .telegram()
        .edit_message_text(chat_id, message_id, &text, Some(keyboard))
        .await?;

    Ok(())
}

/// Kick off a reward refresh without holding up the poll loop. The client's
/// own timeout bounds the task.
fn spawn_reward_refresh(state: &AppState, uid: TelegramUserId) {
    let state = state.clone();
    tokio::spawn(async move {
        state.rewards().refresh(state.pool(), uid).await;
    });
}
