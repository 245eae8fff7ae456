//! Handshake session repository.
//!
//! A session binds one connect link to one submit attempt. Consumption is a
//! guarded single-statement UPDATE whose rows-affected count decides whether
//! this caller won; a second submit carrying the same nonce loses the guard
//! and is classified for the caller instead of silently re-applied.

use chrono::Utc;
use rand::Rng;
use sqlx::SqlitePool;

use tonlink_core::TelegramUserId;

use super::RepositoryError;

/// How long an issued session stays valid.
pub const SESSION_TTL_SECS: i64 = 15 * 60;

/// Nonce size in bytes before hex encoding (128 bits of entropy).
const NONCE_BYTES: usize = 16;

/// Retries on the astronomically unlikely nonce primary-key collision.
const MAX_NONCE_ATTEMPTS: u32 = 5;

/// A handshake session row.
#[derive(Debug, Clone)]
pub struct HandshakeSession {
    /// Single-use random token.
    pub nonce: String,
    /// Telegram identity the session is bound to.
    pub telegram_id: TelegramUserId,
    /// Unix timestamp of issuance.
    pub issued_at: i64,
    /// Whether a submit has already consumed this session.
    pub consumed: bool,
}

impl HandshakeSession {
    /// Whether the session has outlived its TTL at `now`.
    #[must_use]
    pub const fn is_expired(&self, now: i64) -> bool {
        now - self.issued_at > SESSION_TTL_SECS
    }
}

/// Outcome of attempting to consume a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// This caller consumed the session.
    Consumed,
    /// The session was already consumed by an earlier submit.
    AlreadyConsumed,
    /// The session exists but its TTL has elapsed.
    Expired,
    /// No live session matches this nonce and identity.
    Unknown,
}

/// Repository for handshake session operations.
pub struct SessionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SessionRepository<'a> {
    /// Create a new session repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Issue a fresh session bound to `id` and return its nonce.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if nonce generation somehow keeps
    /// colliding, `RepositoryError::Database` for other database errors.
    pub async fn issue(&self, id: TelegramUserId) -> Result<String, RepositoryError> {
        for _ in 0..MAX_NONCE_ATTEMPTS {
            let nonce = generate_nonce();
            let now = Utc::now().timestamp();

            let result = sqlx::query(
                r"
                INSERT INTO handshake_sessions (nonce, telegram_id, issued_at)
                VALUES (?1, ?2, ?3)
                ",
            )
            .bind(&nonce)
            .bind(id.as_i64())
            .bind(now)
            .execute(self.pool)
            .await;

            match result {
                Ok(_) => return Ok(nonce),
                Err(e) if is_unique_violation(&e) => {}
                Err(e) => return Err(e.into()),
            }
        }

        Err(RepositoryError::Conflict(
            "nonce generation exhausted retries".to_owned(),
        ))
    }

    /// Look up a session by nonce.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        nonce: &str,
    ) -> Result<Option<HandshakeSession>, RepositoryError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r"
            SELECT nonce, telegram_id, issued_at, consumed
            FROM handshake_sessions
            WHERE nonce = ?1
            ",
        )
        .bind(nonce)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(SessionRow::into_session))
    }

    /// Consume the session for (`nonce`, `id`) if it is live.
    ///
    /// The guard is one UPDATE matching only an unconsumed, unexpired
    /// session bound to `id`; exactly one concurrent caller can win it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn consume(
        &self,
        nonce: &str,
        id: TelegramUserId,
    ) -> Result<ConsumeOutcome, RepositoryError> {
        let now = Utc::now().timestamp();
        let cutoff = now - SESSION_TTL_SECS;

        let result = sqlx::query(
            r"
            UPDATE handshake_sessions
            SET consumed = 1
            WHERE nonce = ?1
              AND telegram_id = ?2
              AND consumed = 0
              AND issued_at > ?3
            ",
        )
        .bind(nonce)
        .bind(id.as_i64())
        .bind(cutoff)
        .execute(self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(ConsumeOutcome::Consumed);
        }

        // Zero rows: classify for the caller's error message. The UPDATE
        // above remains the only guard.
        let Some(session) = self.get(nonce).await? else {
            return Ok(ConsumeOutcome::Unknown);
        };

        if session.telegram_id != id {
            Ok(ConsumeOutcome::Unknown)
        } else if session.consumed {
            Ok(ConsumeOutcome::AlreadyConsumed)
        } else if session.is_expired(now) {
            Ok(ConsumeOutcome::Expired)
        } else {
            Ok(ConsumeOutcome::Unknown)
        }
    }

    /// Delete all sessions for an identity (unsubscribe housekeeping).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_for_user(&self, id: TelegramUserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM handshake_sessions WHERE telegram_id = ?1")
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Delete sessions whose TTL elapsed, consumed or not.
    ///
    /// # Returns
    ///
    /// The number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sweep_expired(&self) -> Result<u64, RepositoryError> {
        let cutoff = Utc::now().timestamp() - SESSION_TTL_SECS;

        let result = sqlx::query("DELETE FROM handshake_sessions WHERE issued_at <= ?1")
            .bind(cutoff)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// Generate a fresh hex nonce.
fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    rand::rng().fill(bytes.as_mut_slice());

    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Raw `handshake_sessions` row.
#[derive(sqlx::FromRow)]
struct SessionRow {
    nonce: String,
    telegram_id: i64,
    issued_at: i64,
    consumed: i64,
}

impl SessionRow {
    fn into_session(self) -> HandshakeSession {
        HandshakeSession {
            nonce: self.nonce,
            telegram_id: TelegramUserId::new(self.telegram_id),
            issued_at: self.issued_at,
            consumed: self.consumed != 0,
        }
    }
}
