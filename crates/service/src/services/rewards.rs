//! External reward sync.
//!
//! The rewards peer owns the authoritative counter; this client reads it
//! through with a bounded timeout and degrades to the ledger's cached value
//! on any failure. Reward sync is best-effort telemetry, never a
//! registration precondition: [`RewardsClient::refresh`] is infallible by
//! construction.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use tonlink_core::TelegramUserId;

use crate::db::{RepositoryError, UserRepository};

/// Hard ceiling on one peer call.
const PEER_TIMEOUT: Duration = Duration::from_secs(6);

/// Errors that can occur when talking to the rewards peer.
///
/// These never leave this module's `refresh` path; they exist for logging
/// and for tests.
#[derive(Debug, Error)]
pub enum RewardsError {
    /// HTTP request failed.
    #[error("rewards request failed: {0}")]
    Request(String),

    /// Peer answered with a non-success status.
    #[error("rewards peer returned status {0}")]
    Status(u16),

    /// Failed to parse response body.
    #[error("rewards response error: {0}")]
    Response(String),
}

/// Reward counter payload from the peer.
#[derive(Debug, Deserialize)]
struct RewardsResponse {
    total_rewards: i64,
}

/// Client for the rewards peer service.
#[derive(Clone)]
pub struct RewardsClient {
    inner: Arc<RewardsClientInner>,
}

struct RewardsClientInner {
    client: Client,
    base_url: String,
    shared_secret: SecretString,
}

impl std::fmt::Debug for RewardsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewardsClient")
            .field("base_url", &self.inner.base_url)
            .field("shared_secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl RewardsClient {
    /// Create a new rewards client.
    #[must_use]
    pub fn new(base_url: String, shared_secret: SecretString) -> Self {
        let client = Client::builder()
            .timeout(PEER_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            inner: Arc::new(RewardsClientInner {
                client,
                base_url,
                shared_secret,
            }),
        }
    }

    /// Fetch the authoritative counter from the peer.
    async fn fetch(&self, uid: TelegramUserId) -> Result<i64, RewardsError> {
        let url = format!("{}/rewards", self.inner.base_url);

        let response = self
            .inner
            .client
            .get(url)
            .query(&[
                ("telegram_id", uid.to_string()),
                (
                    "secret",
                    self.inner.shared_secret.expose_secret().to_string(),
                ),
            ])
            .send()
            .await
            .map_err(|e| RewardsError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RewardsError::Status(status.as_u16()));
        }

        let body: RewardsResponse = response
            .json()
            .await
            .map_err(|e| RewardsError::Response(e.to_string()))?;

        Ok(body.total_rewards)
    }

    /// Refresh the reward counter for `uid`, falling back to the cache.
    ///
    /// On success the fresh value is persisted into the ledger and returned.
    /// On any failure - timeout, non-200, malformed body - the last cached
    /// value is returned (0 if none). Never returns an error.
    pub async fn refresh(&self, pool: &sqlx::SqlitePool, uid: TelegramUserId) -> i64 {
        let repo = UserRepository::new(pool);

        match self.fetch(uid).await {
            Ok(value) => {
                debug!(%uid, value, "Reward counter refreshed");
                match repo.set_reward_cache(uid, value).await {
                    // The user may have unsubscribed mid-flight; nothing to
                    // cache then.
                    Ok(()) | Err(RepositoryError::NotFound) => {}
                    Err(e) => warn!(%uid, error = %e, "Failed to persist reward cache"),
                }
                value
            }
            Err(e) => {
                warn!(%uid, error = %e, "Reward refresh failed, serving cached value");
                match repo.get(uid).await {
                    Ok(Some(user)) => user.reward_cache,
                    Ok(None) => 0,
                    Err(e) => {
                        warn!(%uid, error = %e, "Cache read failed");
                        0
                    }
                }
            }
        }
    }
}
