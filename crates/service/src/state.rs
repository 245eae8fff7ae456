//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::ServiceConfig;
use crate::services::rewards::RewardsClient;
use crate::telegram::TelegramClient;

/// Application state shared across all handlers and the bot loop.
///
/// This struct is cheaply cloneable via `Arc` and provides access to shared
/// resources like the database pool and external clients. It deliberately
/// holds no per-user session state; the store is the only coordination point
/// between the two execution contexts.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServiceConfig,
    pool: SqlitePool,
    telegram: TelegramClient,
    rewards: RewardsClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Service configuration
    /// * `pool` - SQLite connection pool
    #[must_use]
    pub fn new(config: ServiceConfig, pool: SqlitePool) -> Self {
        let telegram = TelegramClient::new(config.bot_token.clone());
        let rewards = RewardsClient::new(
            config.rewards_base_url.clone(),
            config.peer_shared_secret.clone(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                telegram,
                rewards,
            }),
        }
    }

    /// Get a reference to the service configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Get a reference to the Telegram Bot API client.
    #[must_use]
    pub fn telegram(&self) -> &TelegramClient {
        &self.inner.telegram
    }

    /// Get a reference to the rewards peer client.
    #[must_use]
    pub fn rewards(&self) -> &RewardsClient {
        &self.inner.rewards
    }
}
