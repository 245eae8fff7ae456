//! Database operations for the registration ledger.
//!
//! # Database: SQLite
//!
//! The registry is explicitly single-node, so the ledger lives in a SQLite
//! file opened in WAL mode. Both execution contexts (bot loop and HTTP
//! server) share one [`SqlitePool`]; no other coordination exists between
//! them.
//!
//! ## Tables
//!
//! - `users` - Registration ledger (wallet link, personal code, referral,
//!   reward cache)
//! - `handshake_sessions` - Single-use connect nonces
//!
//! # Migrations
//!
//! Migrations are stored in `crates/service/migrations/` and embedded into
//! the binary; they run automatically at startup.

pub mod sessions;
pub mod users;

use std::str::FromStr;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

pub use sessions::SessionRepository;
pub use users::UserRepository;

/// Embedded migrations for the service database.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., personal code generation exhausted).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a SQLite connection pool with sensible defaults.
///
/// Opens the database in WAL mode with a busy timeout so the bot loop and
/// the HTTP server can write concurrently without stepping on each other.
///
/// # Arguments
///
/// * `database_url` - SQLite connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url.expose_secret())?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Create an in-memory pool with migrations applied.
///
/// Intended for tests; a single connection keeps the in-memory database
/// alive and shared for the pool's lifetime.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection or a migration fails.
pub async fn create_memory_pool() -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    MIGRATOR
        .run(&pool)
        .await
        .map_err(|e| sqlx::Error::Migrate(Box::new(e)))?;

    Ok(pool)
}
