//! Serde types for the Telegram Bot API.
//!
//! Only the subset of the API surface the service actually uses: long-poll
//! updates, message sending/editing, callback queries, and inline keyboards.
//!
//! See: <https://core.telegram.org/bots/api>

use serde::{Deserialize, Serialize};

/// Envelope every Bot API method responds with.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the call succeeded.
    pub ok: bool,
    /// Payload, present when `ok` is true.
    pub result: Option<T>,
    /// Human-readable error, present when `ok` is false.
    pub description: Option<String>,
}

/// One incoming event from `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Monotonically increasing update identifier.
    pub update_id: i64,
    /// New incoming message, if this update carries one.
    #[serde(default)]
    pub message: Option<Message>,
    /// Callback query from an inline keyboard button.
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

/// A chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// Message identifier, unique within the chat.
    pub message_id: i64,
    /// Sender. Absent for channel posts.
    #[serde(default)]
    pub from: Option<User>,
    /// Chat the message belongs to.
    pub chat: Chat,
    /// Text content, if any.
    #[serde(default)]
    pub text: Option<String>,
}

/// A Telegram user.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    /// Stable numeric identity.
    pub id: i64,
    /// Optional public username.
    #[serde(default)]
    pub username: Option<String>,
}

/// A chat (private, group, channel).
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    /// Chat identifier. Equals the user id for private chats.
    pub id: i64,
}

/// An inline-keyboard button press.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    /// Query identifier, needed to acknowledge the press.
    pub id: String,
    /// User who pressed the button.
    pub from: User,
    /// Message the keyboard was attached to.
    #[serde(default)]
    pub message: Option<Message>,
    /// The button's `callback_data`.
    #[serde(default)]
    pub data: Option<String>,
}

/// An inline keyboard attached to a message.
#[derive(Debug, Clone, Serialize, Default)]
pub struct InlineKeyboardMarkup {
    /// Rows of buttons.
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    /// Build a keyboard from rows of buttons.
    #[must_use]
    pub fn new(rows: Vec<Vec<InlineKeyboardButton>>) -> Self {
        Self {
            inline_keyboard: rows,
        }
    }
}

/// One inline keyboard button. Exactly one of the optional actions should be
/// set.
#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardButton {
    /// Button label.
    pub text: String,
    /// Data sent back in a `CallbackQuery` when pressed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    /// External link to open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Web app to open inside the Telegram client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_app: Option<WebAppInfo>,
}

impl InlineKeyboardButton {
    /// Create a callback button.
    #[must_use]
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: Some(data.into()),
            url: None,
            web_app: None,
        }
    }

    /// Create a URL button.
    #[must_use]
    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: None,
            url: Some(url.into()),
            web_app: None,
        }
    }

    /// Create a web-app button (opens inside the Telegram client).
    #[must_use]
    pub fn web_app(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: None,
            url: None,
            web_app: Some(WebAppInfo { url: url.into() }),
        }
    }
}

/// Web app descriptor for a [`InlineKeyboardButton`].
#[derive(Debug, Clone, Serialize)]
pub struct WebAppInfo {
    /// HTTPS URL of the web app.
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_deserializes_message() {
        let json = r#"{
            "update_id": 10,
            "message": {
                "message_id": 1,
                "from": {"id": 42, "username": "alice"},
                "chat": {"id": 42},
                "text": "/start"
            }
        }"#;

        let update: Update = serde_json::from_str(json).expect("deserialize");
        assert_eq!(update.update_id, 10);
        let message = update.message.expect("message");
        assert_eq!(message.chat.id, 42);
        assert_eq!(message.text.as_deref(), Some("/start"));
        assert!(update.callback_query.is_none());
    }

    #[test]
    fn test_update_deserializes_callback_query() {
        let json = r#"{
            "update_id": 11,
            "callback_query": {
                "id": "q1",
                "from": {"id": 42},
                "data": "register"
            }
        }"#;

        let update: Update = serde_json::from_str(json).expect("deserialize");
        let query = update.callback_query.expect("callback query");
        assert_eq!(query.from.id, 42);
        assert_eq!(query.data.as_deref(), Some("register"));
    }

    #[test]
    fn test_button_serialization_skips_unset_actions() {
        let button = InlineKeyboardButton::callback("Profile", "profile");
        let json = serde_json::to_value(&button).expect("serialize");

        assert_eq!(json["text"], "Profile");
        assert_eq!(json["callback_data"], "profile");
        assert!(json.get("url").is_none());
        assert!(json.get("web_app").is_none());
    }

    #[test]
    fn test_web_app_button_serialization() {
        let button = InlineKeyboardButton::web_app("Connect", "https://x.test/connect");
        let json = serde_json::to_value(&button).expect("serialize");

        assert_eq!(json["web_app"]["url"], "https://x.test/connect");
    }

    #[test]
    fn test_api_response_error_envelope() {
        let json = r#"{"ok": false, "description": "Bad Request: chat not found"}"#;
        let resp: ApiResponse<Message> = serde_json::from_str(json).expect("deserialize");

        assert!(!resp.ok);
        assert!(resp.result.is_none());
        assert_eq!(
            resp.description.as_deref(),
            Some("Bad Request: chat not found")
        );
    }
}
