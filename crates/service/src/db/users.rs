//! User repository for the registration ledger.
//!
//! All mutations are single atomic statements: the submit upsert, the
//! write-once referral update, and the reward-cache refresh each execute as
//! one statement so concurrent duplicate invocations (a retried POST, a
//! widget callback firing twice) net out to the same final state.

use chrono::{DateTime, Utc};
use rand::Rng;
use sqlx::SqlitePool;

use tonlink_core::{ReferralCode, TelegramUserId, WalletAddress};

use super::RepositoryError;
use crate::models::user::UserRecord;

/// How many fresh codes to try before giving up on a unique-violation loop.
///
/// Collisions at an 8-char A-Z0-9 alphabet are negligible at realistic user
/// counts; the bound only keeps the loop from spinning on a broken index.
const MAX_CODE_ATTEMPTS: u32 = 5;

/// Outcome of attempting to record a referral code against a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferralOutcome {
    /// The code was recorded.
    Applied,
    /// The user already recorded a referral; the field is write-once.
    AlreadySet,
    /// The code is the user's own personal code.
    SelfReferral,
    /// No user owns this code.
    UnknownCode,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a user by their Telegram identity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored values fail to
    /// parse back into their domain types.
    pub async fn get(
        &self,
        id: TelegramUserId,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT telegram_id, wallet_address, personal_code, referral_code_used,
                   reward_cache, created_at, updated_at
            FROM users
            WHERE telegram_id = ?1
            ",
        )
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(UserRow::into_record).transpose()
    }

    /// Create a ledger row for `id` if none exists, allocating a personal
    /// code.
    ///
    /// Idempotent: when the row already exists it is returned unchanged. A
    /// personal-code collision regenerates and retries.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if code generation exhausts its
    /// retries, `RepositoryError::Database` for other database errors.
    pub async fn create_if_absent(
        &self,
        id: TelegramUserId,
    ) -> Result<UserRecord, RepositoryError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_code();
            let now = Utc::now().timestamp();

            let result = sqlx::query(
                r"
                INSERT INTO users (telegram_id, personal_code, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?3)
                ON CONFLICT(telegram_id) DO NOTHING
                ",
            )
            .bind(id.as_i64())
            .bind(&code)
            .bind(now)
            .execute(self.pool)
            .await;

            match result {
                // Inserted, or the row already existed; either way it is
                // present now.
                Ok(_) => return self.get(id).await?.ok_or(RepositoryError::NotFound),
                Err(e) if is_unique_violation(&e) => {}
                Err(e) => return Err(e.into()),
            }
        }

        Err(RepositoryError::Conflict(
            "personal code generation exhausted retries".to_owned(),
        ))
    }

    /// Record a wallet address for `id`, creating the row if needed.
    ///
    /// The upsert is a single statement, so running it twice with the same
    /// arguments nets the same state as running it once. An existing wallet
    /// address is overwritten (idempotent last-write; only the owning
    /// identity can submit for its own `id`). `personal_code` and
    /// `referral_code_used` are never touched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if code generation exhausts its
    /// retries, `RepositoryError::Database` for other database errors.
    pub async fn link_wallet(
        &self,
        id: TelegramUserId,
        address: &WalletAddress,
    ) -> Result<UserRecord, RepositoryError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_code();
            let now = Utc::now().timestamp();

            let result = sqlx::query(
                r"
                INSERT INTO users (telegram_id, wallet_address, personal_code, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?4)
                ON CONFLICT(telegram_id) DO UPDATE
                SET wallet_address = excluded.wallet_address,
                    updated_at = excluded.updated_at
                ",
            )
            .bind(id.as_i64())
            .bind(address.as_str())
            .bind(&code)
            .bind(now)
            .execute(self.pool)
            .await;

            match result {
                Ok(_) => return self.get(id).await?.ok_or(RepositoryError::NotFound),
                // The generated personal code collided with another row;
                // only the insert arm can hit this.
                Err(e) if is_unique_violation(&e) => {}
                Err(e) => return Err(e.into()),
            }
        }

        Err(RepositoryError::Conflict(
            "personal code generation exhausted retries".to_owned(),
        ))
    }

    /// Record a referral code against `id`.
    ///
    /// The guard is a single conditional UPDATE: the field is set only if it
    /// is currently NULL, the code belongs to some user, and it is not the
    /// submitter's own code. Once non-null it is never overwritten.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no row exists for `id`,
    /// `RepositoryError::Database` if a query fails.
    pub async fn use_referral(
        &self,
        id: TelegramUserId,
        code: &ReferralCode,
    ) -> Result<ReferralOutcome, RepositoryError> {
        let now = Utc::now().timestamp();

        let result = sqlx::query(
            r"
            UPDATE users
            SET referral_code_used = ?2,
                updated_at = ?3
            WHERE telegram_id = ?1
              AND referral_code_used IS NULL
              AND personal_code <> ?2
              AND EXISTS (SELECT 1 FROM users WHERE personal_code = ?2)
            ",
        )
        .bind(id.as_i64())
        .bind(code.as_str())
        .bind(now)
        .execute(self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(ReferralOutcome::Applied);
        }

        // Zero rows affected: classify why, for the caller's error message.
        // The UPDATE above remains the only guard; these reads never write.
        let user = self.get(id).await?.ok_or(RepositoryError::NotFound)?;

        if user.referral_code_used.is_some() {
            Ok(ReferralOutcome::AlreadySet)
        } else if user.personal_code == *code {
            Ok(ReferralOutcome::SelfReferral)
        } else {
            Ok(ReferralOutcome::UnknownCode)
        }
    }

    /// Store the latest reward count observed from the rewards peer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no row exists for `id`,
    /// `RepositoryError::Database` for other database errors.
    pub async fn set_reward_cache(
        &self,
        id: TelegramUserId,
        value: i64,
    ) -> Result<(), RepositoryError> {
        let now = Utc::now().timestamp();

        let result = sqlx::query(
            r"
            UPDATE users
            SET reward_cache = ?2,
                updated_at = ?3
            WHERE telegram_id = ?1
            ",
        )
        .bind(id.as_i64())
        .bind(value)
        .bind(now)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete a user's row entirely (unsubscribe). No soft delete.
    ///
    /// # Returns
    ///
    /// Returns `true` if a row was deleted, `false` if none existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: TelegramUserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE telegram_id = ?1")
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Generate a fresh candidate personal code.
fn generate_code() -> String {
    let mut rng = rand::rng();

    (0..ReferralCode::LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..ReferralCode::ALPHABET.len());
            char::from(ReferralCode::ALPHABET.get(idx).copied().unwrap_or(b'A'))
        })
        .collect()
}

/// Whether a sqlx error is a unique-constraint rejection from the store.
fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Raw `users` row.
#[derive(sqlx::FromRow)]
struct UserRow {
    telegram_id: i64,
    wallet_address: Option<String>,
    personal_code: String,
    referral_code_used: Option<String>,
    reward_cache: i64,
    created_at: i64,
    updated_at: i64,
}

impl UserRow {
    fn into_record(self) -> Result<UserRecord, RepositoryError> {
        let personal_code = ReferralCode::parse(&self.personal_code).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid personal code in database: {e}"))
        })?;

        let referral_code_used = self
            .referral_code_used
            .as_deref()
            .map(ReferralCode::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid referral code in database: {e}"))
            })?;

        let wallet_address = self
            .wallet_address
            .as_deref()
            .map(WalletAddress::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid wallet address in database: {e}"))
            })?;

        Ok(UserRecord {
            telegram_id: TelegramUserId::new(self.telegram_id),
            wallet_address,
            personal_code,
            referral_code_used,
            reward_cache: self.reward_cache,
            created_at: timestamp(self.created_at)?,
            updated_at: timestamp(self.updated_at)?,
        })
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| {
        RepositoryError::DataCorruption(format!("timestamp out of range: {secs}"))
    })
}
