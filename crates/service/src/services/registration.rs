//! Registration orchestration.
//!
//! Ties the ledger, session, and allocator pieces into the operations the
//! two transports call: first chat contact, connect-link issuance, the
//! submit state machine, profile reads, and unsubscribe.

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, instrument};

use tonlink_core::{ReferralCode, TelegramUserId, WalletAddress};

use crate::db::sessions::ConsumeOutcome;
use crate::db::users::ReferralOutcome;
use crate::db::{RepositoryError, SessionRepository, UserRepository};
use crate::models::user::UserRecord;

/// Errors a submit can fail with.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Malformed or missing input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No live session matches the nonce and identity.
    #[error("unknown session")]
    UnknownSession,

    /// The session was consumed by an earlier submit with a different
    /// address.
    #[error("session already used")]
    SessionReplayed,

    /// The session outlived its TTL before the submit arrived.
    #[error("session expired")]
    SessionExpired,

    /// Store failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result of a successful submit.
#[derive(Debug)]
pub struct SubmitOutcome {
    /// The ledger row after the submit.
    pub user: UserRecord,
    /// Referral handling for this submit, if a code accompanied it.
    pub referral: Option<ReferralOutcome>,
    /// False when a retried POST was answered idempotently without writes.
    pub fresh: bool,
}

/// Registration service over the shared store.
///
/// Stateless besides the pool reference; both execution contexts construct
/// it ad hoc.
pub struct RegistrationService<'a> {
    pool: &'a SqlitePool,
}

impl<'a> RegistrationService<'a> {
    /// Create a new registration service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// First chat contact: make sure a ledger row exists, optionally
    /// recording a referral code carried by the start command.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store rejects the operation.
    #[instrument(skip(self, referral), fields(uid = %uid))]
    pub async fn ensure_registered(
        &self,
        uid: TelegramUserId,
        referral: Option<&ReferralCode>,
    ) -> Result<UserRecord, RepositoryError> {
        let users = UserRepository::new(self.pool);
        let user = users.create_if_absent(uid).await?;

        if let Some(code) = referral {
            // Write-once; a user who already recorded a referral keeps it.
            let outcome = users.use_referral(uid, code).await?;
            info!(%uid, ?outcome, "Referral code processed at first contact");
            if outcome == ReferralOutcome::Applied {
                return users.get(uid).await?.ok_or(RepositoryError::NotFound);
            }
        }

        Ok(user)
    }

    /// Issue a connect-link session for `uid`, creating the ledger row if
    /// this identity was never seen before.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store rejects the operation.
    pub async fn issue_session(&self, uid: TelegramUserId) -> Result<String, RepositoryError> {
        UserRepository::new(self.pool).create_if_absent(uid).await?;
        SessionRepository::new(self.pool).issue(uid).await
    }

    /// The submit state machine: validate the session, upsert the wallet,
    /// record an accompanying referral.
    ///
    /// Safe under concurrent duplicate invocations for the same `uid`: the
    /// session consume is a one-winner guard, and a retried POST whose
    /// address already matches the ledger is answered idempotently.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError`] for validation and session failures; store
    /// failures pass through as [`SubmitError::Repository`].
    #[instrument(skip(self, address, referral), fields(uid = %uid))]
    pub async fn submit(
        &self,
        uid: TelegramUserId,
        nonce: &str,
        address: &WalletAddress,
        referral: Option<&ReferralCode>,
    ) -> Result<SubmitOutcome, SubmitError> {
        if !uid.is_valid() {
            return Err(SubmitError::InvalidInput(
                "uid must be a positive integer".to_owned(),
            ));
        }
        if nonce.is_empty() {
            return Err(SubmitError::InvalidInput("nonce is required".to_owned()));
        }

        let users = UserRepository::new(self.pool);
        let sessions = SessionRepository::new(self.pool);

        match sessions.consume(nonce, uid).await? {
            ConsumeOutcome::Consumed => {}
            ConsumeOutcome::AlreadyConsumed => {
                // Retried POST with an identical payload: answer idempotently
                // when the ledger already carries exactly this address.
                if let Some(user) = users.get(uid).await?
                    && user.wallet_address.as_ref() == Some(address)
                {
                    return Ok(SubmitOutcome {
                        user,
                        referral: None,
                        fresh: false,
                    });
                }
                return Err(SubmitError::SessionReplayed);
            }
            ConsumeOutcome::Expired => return Err(SubmitError::SessionExpired),
            ConsumeOutcome::Unknown => return Err(SubmitError::UnknownSession),
        }

        let user = users.link_wallet(uid, address).await?;
        info!(%uid, "Wallet linked");

        let referral_outcome = match referral {
            Some(code) => Some(users.use_referral(uid, code).await?),
            None => None,
        };

        // Re-read only when the referral changed the row.
        let user = if referral_outcome == Some(ReferralOutcome::Applied) {
            users.get(uid).await?.ok_or(RepositoryError::NotFound)?
        } else {
            user
        };

        Ok(SubmitOutcome {
            user,
            referral: referral_outcome,
            fresh: true,
        })
    }

    /// Read a user's ledger row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store rejects the operation.
    pub async fn profile(
        &self,
        uid: TelegramUserId,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        UserRepository::new(self.pool).get(uid).await
    }

    /// Unsubscribe: delete the ledger row and any live sessions.
    ///
    /// # Returns
    ///
    /// Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store rejects the operation.
    #[instrument(skip(self), fields(uid = %uid))]
    pub async fn unsubscribe(&self, uid: TelegramUserId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM users WHERE telegram_id = ?1")
            .bind(uid.as_i64())
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        sqlx::query("DELETE FROM handshake_sessions WHERE telegram_id = ?1")
            .bind(uid.as_i64())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if deleted {
            info!(%uid, "User unsubscribed");
        }

        Ok(deleted)
    }
}
