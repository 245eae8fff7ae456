//! User domain types.
//!
//! These types represent validated domain objects separate from database row
//! types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tonlink_core::{ReferralCode, TelegramUserId, WalletAddress};

/// A registered user (domain type).
///
/// One row per Telegram identity; the ledger is the sole source of truth.
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// Stable Telegram identity. Immutable.
    pub telegram_id: TelegramUserId,
    /// Linked wallet address, if the handshake has completed.
    pub wallet_address: Option<WalletAddress>,
    /// The user's own referral code. Assigned once, never reassigned.
    pub personal_code: ReferralCode,
    /// The inviter's personal code, if one was recorded. Write-once.
    pub referral_code_used: Option<ReferralCode>,
    /// Last reward count observed from the rewards peer. Advisory.
    pub reward_cache: i64,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Registration state derived from the row.
    #[must_use]
    pub const fn state(&self) -> RegistrationState {
        if self.wallet_address.is_some() {
            RegistrationState::Linked
        } else {
            RegistrationState::AwaitingWallet
        }
    }
}

/// Per-user registration state machine.
///
/// `Unknown -> AwaitingWallet` on first chat contact, `AwaitingWallet ->
/// Linked` on a successful submit. `Linked` is terminal except for an
/// explicit unsubscribe, which deletes the row and returns the identity to
/// `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationState {
    /// No ledger row exists for this identity.
    Unknown,
    /// A row exists but no wallet has been linked yet.
    AwaitingWallet,
    /// A wallet address is recorded.
    Linked,
}
