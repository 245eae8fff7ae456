//! Inline menu builders for the chat surface.
//!
//! Each builder returns the message text plus the keyboard to attach, so
//! handlers can hand both straight to `sendMessage`/`editMessageText`.

use tonlink_core::ReferralCode;

use crate::models::user::UserRecord;
use crate::telegram::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Main menu. The button set depends on whether a wallet is linked.
#[must_use]
pub fn main_menu(linked: bool) -> (String, InlineKeyboardMarkup) {
    let text = "Welcome to the mining bot!\n\nWhat would you like to do?".to_owned();

    let keyboard = if linked {
        InlineKeyboardMarkup::new(vec![
            vec![
                InlineKeyboardButton::callback("🤝 Referral", "referral"),
                InlineKeyboardButton::callback("🏭 Mines", "mines"),
            ],
            vec![
                InlineKeyboardButton::callback("📊 Profile", "profile"),
                InlineKeyboardButton::callback("⚙️ Settings", "settings"),
            ],
            vec![InlineKeyboardButton::callback(
                "❌ Unsubscribe",
                "unsubscribe",
            )],
        ])
    } else {
        InlineKeyboardMarkup::new(vec![
            vec![InlineKeyboardButton::callback("🚀 Register", "register")],
            vec![InlineKeyboardButton::callback("🤝 Referral", "referral")],
            vec![InlineKeyboardButton::callback("🏭 Mines", "mines")],
            vec![InlineKeyboardButton::callback("📊 Profile", "profile")],
            vec![InlineKeyboardButton::callback(
                "❌ Unsubscribe",
                "unsubscribe",
            )],
        ])
    };

    (text, keyboard)
}

/// Connect-link menu shown after pressing Register.
#[must_use]
pub fn connect_menu(connect_url: &str) -> (String, InlineKeyboardMarkup) {
    (
        "Registration via TON Connect.\nTap the button to link your wallet.".to_owned(),
        InlineKeyboardMarkup::new(vec![
            vec![InlineKeyboardButton::web_app(
                "🔗 Connect TON Wallet",
                connect_url,
            )],
            vec![InlineKeyboardButton::callback("⬅️ Back", "back_main")],
        ]),
    )
}

/// Referral info menu.
#[must_use]
pub fn referral_menu(personal_code: Option<&ReferralCode>) -> (String, InlineKeyboardMarkup) {
    let text = personal_code.map_or_else(
        || "🤝 Referral\n\nRegister first to get your personal code.".to_owned(),
        |code| {
            format!(
                "🤝 Referral\n\nYour personal code: {code}\nShare it - friends enter it when they register."
            )
        },
    );

    (text, back_only())
}

/// Static list of partner mines.
#[must_use]
pub fn mines_menu() -> (String, InlineKeyboardMarkup) {
    (
        "⛏️ Pick a partner mine:".to_owned(),
        InlineKeyboardMarkup::new(vec![
            vec![InlineKeyboardButton::link("Mine 1", "https://t.me/mine1")],
            vec![InlineKeyboardButton::link("Mine 2", "https://t.me/mine2")],
            vec![InlineKeyboardButton::link("Mine 3", "https://t.me/mine3")],
            vec![InlineKeyboardButton::callback("⬅️ Back", "back_main")],
        ]),
    )
}

/// Settings menu. Placeholder entries, mirrors the classic bot layout.
#[must_use]
pub fn settings_menu() -> (String, InlineKeyboardMarkup) {
    (
        "⚙️ Settings".to_owned(),
        InlineKeyboardMarkup::new(vec![
            vec![
                InlineKeyboardButton::callback("🌐 Time Zone", "timezone"),
                InlineKeyboardButton::callback("🇺🇸 Language", "language"),
            ],
            vec![InlineKeyboardButton::callback("💱 Currency", "currency")],
            vec![InlineKeyboardButton::callback("⬅️ Back", "back_main")],
        ]),
    )
}

/// Profile view.
#[must_use]
pub fn profile_menu(user: &UserRecord, reward_count: i64) -> (String, InlineKeyboardMarkup) {
    let wallet = user
        .wallet_address
        .as_ref()
        .map_or_else(|| "—".to_owned(), ToString::to_string);
    let referral = user
        .referral_code_used
        .as_ref()
        .map_or_else(|| "None".to_owned(), ToString::to_string);

    let text = format!(
        "👤 User profile\n\n💼 Wallet: {wallet}\n🎁 Personal code: {}\n👥 Code used: {referral}\n⛏️ Total rewards: {reward_count}",
        user.personal_code
    );

    (text, back_only())
}

/// Unsubscribe confirmation step.
#[must_use]
pub fn unsubscribe_confirm_menu() -> (String, InlineKeyboardMarkup) {
    (
        "⚠️ Are you sure you want to unsubscribe? You will lose all your rewards.".to_owned(),
        InlineKeyboardMarkup::new(vec![
            vec![InlineKeyboardButton::callback(
                "✅ Yes, I'm sure",
                "confirm_unsubscribe",
            )],
            vec![InlineKeyboardButton::callback("❌ Cancel", "back_main")],
        ]),
    )
}

fn back_only() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "⬅️ Back",
        "back_main",
    )]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_menu_hides_register_when_linked() {
        let (_, unlinked) = main_menu(false);
        let (_, linked) = main_menu(true);

        let has_register = |kb: &InlineKeyboardMarkup| {
            kb.inline_keyboard
                .iter()
                .flatten()
                .any(|b| b.callback_data.as_deref() == Some("register"))
        };

        assert!(has_register(&unlinked));
        assert!(!has_register(&linked));
    }

    #[test]
    fn test_connect_menu_uses_web_app_button() {
        let (_, keyboard) = connect_menu("https://link.example.net/connect?uid=1&nonce=ab");

        let web_app = keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .find_map(|b| b.web_app.as_ref())
            .expect("web app button");
        assert!(web_app.url.contains("nonce=ab"));
    }

    #[test]
    fn test_referral_menu_shows_code() {
        let code = ReferralCode::parse("AB12CD34").expect("valid code");
        let (text, _) = referral_menu(Some(&code));
        assert!(text.contains("AB12CD34"));

        let (text, _) = referral_menu(None);
        assert!(text.contains("Register first"));
    }
}
