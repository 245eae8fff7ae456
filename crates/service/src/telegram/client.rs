//! Telegram Bot API client.
//!
//! Provides long polling for the bot loop and message push for the gateway.
//! The [`TelegramClient::notify`] helper is the best-effort messaging
//! gateway: failures are logged and swallowed, never retried, never surfaced
//! to HTTP callers.

use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::error::TelegramError;
use super::types::{ApiResponse, InlineKeyboardMarkup, Message, Update};

/// Telegram Bot API base URL.
const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Baseline timeout for ordinary API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Headroom added on top of the long-poll window.
const LONG_POLL_GRACE: Duration = Duration::from_secs(10);

/// Telegram API client for polling updates and sending messages.
#[derive(Clone)]
pub struct TelegramClient {
    /// HTTP client.
    client: Client,
    /// Bot token for authentication.
    bot_token: SecretString,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("bot_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Create a new Telegram client.
    #[must_use]
    pub fn new(bot_token: SecretString) -> Self {
        Self {
            client: Client::new(),
            bot_token,
        }
    }

    /// Call one Bot API method and unwrap Telegram's `{ok, result}` envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &impl Serialize,
        timeout: Duration,
    ) -> Result<T, TelegramError> {
        let url = format!(
            "{TELEGRAM_API_BASE}/bot{}/{method}",
            self.bot_token.expose_secret()
        );

        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| TelegramError::Request(e.to_string()))?;

        let result: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| TelegramError::Response(e.to_string()))?;

        if !result.ok {
            return Err(TelegramError::Api(
                result
                    .description
                    .unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        result
            .result
            .ok_or_else(|| TelegramError::Response("missing result payload".to_string()))
    }

    /// Fetch pending updates, long-polling for up to `poll_secs`.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or Telegram returns an error.
    pub async fn get_updates(
        &self,
        offset: i64,
        poll_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        #[derive(Serialize)]
        struct GetUpdates {
            offset: i64,
            timeout: u64,
            allowed_updates: &'static [&'static str],
        }

        let payload = GetUpdates {
            offset,
            timeout: poll_secs,
            allowed_updates: &["message", "callback_query"],
        };

        self.call(
            "getUpdates",
            &payload,
            Duration::from_secs(poll_secs) + LONG_POLL_GRACE,
        )
        .await
    }

    /// Send a text message, optionally with an inline keyboard.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or Telegram returns an error.
    #[instrument(skip(self, text, keyboard), fields(chat_id = %chat_id))]
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<Message, TelegramError> {
        #[derive(Serialize)]
        struct SendMessage<'a> {
            chat_id: i64,
            text: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            reply_markup: Option<InlineKeyboardMarkup>,
        }

        let payload = SendMessage {
            chat_id,
            text,
            reply_markup: keyboard,
        };

        let message = self.call("sendMessage", &payload, REQUEST_TIMEOUT).await?;
        debug!("Message sent");
        Ok(message)
    }

    /// Replace the text and keyboard of an existing message.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or Telegram returns an error.
    #[instrument(skip(self, text, keyboard), fields(chat_id = %chat_id, message_id = %message_id))]
    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), TelegramError> {
        #[derive(Serialize)]
        struct EditMessageText<'a> {
            chat_id: i64,
            message_id: i64,
            text: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            reply_markup: Option<InlineKeyboardMarkup>,
        }

        let payload = EditMessageText {
            chat_id,
            message_id,
            text,
            reply_markup: keyboard,
        };

        // Telegram answers with the edited Message or `true`; we need
        // neither.
        let _: serde_json::Value = self
            .call("editMessageText", &payload, REQUEST_TIMEOUT)
            .await?;
        Ok(())
    }

    /// Acknowledge a callback query so the client stops its spinner.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or Telegram returns an error.
    pub async fn answer_callback_query(&self, query_id: &str) -> Result<(), TelegramError> {
        #[derive(Serialize)]
        struct AnswerCallbackQuery<'a> {
            callback_query_id: &'a str,
        }

        let _: serde_json::Value = self
            .call(
                "answerCallbackQuery",
                &AnswerCallbackQuery {
                    callback_query_id: query_id,
                },
                REQUEST_TIMEOUT,
            )
            .await?;
        Ok(())
    }

    /// Best-effort push to a chat. Failures are logged and swallowed.
    pub async fn notify(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) {
        if let Err(e) = self.send_message(chat_id, text, keyboard).await {
            warn!(chat_id, error = %e, "Notification delivery failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let client = TelegramClient::new(SecretString::from("12345:AAtoken".to_string()));
        let debug_output = format!("{client:?}");

        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("AAtoken"));
    }

    #[tokio::test]
    async fn test_notify_swallows_failures() {
        // No network on a bogus token/host path; notify must not panic or
        // propagate the error.
        let client = TelegramClient::new(SecretString::from("0:invalid".to_string()));
        client.notify(1, "hello", None).await;
    }
}
