//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PUBLIC_BASE_URL` - Externally reachable base URL of the HTTP surface
//!   (connect links and the TON Connect manifest are composed from it)
//! - `TELEGRAM_BOT_TOKEN` - Telegram Bot API credential
//! - `PEER_SHARED_SECRET` - Shared secret for the rewards-peer channel
//!   (min entropy enforced)
//! - `REWARDS_BASE_URL` - Base URL of the peer service that owns the
//!   authoritative reward counter
//!
//! ## Optional
//! - `DATABASE_URL` - SQLite connection string (default: `sqlite:tonlink.db`)
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 8080)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Service application configuration.
#[derive(Clone)]
pub struct ServiceConfig {
    /// SQLite database connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the HTTP surface, without a trailing slash
    pub public_base_url: String,
    /// Telegram Bot API token
    pub bot_token: SecretString,
    /// Shared secret authenticating the rewards peer
    pub peer_shared_secret: SecretString,
    /// Base URL of the rewards peer service, without a trailing slash
    pub rewards_base_url: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("database_url", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("public_base_url", &self.public_base_url)
            .field("bot_token", &"[REDACTED]")
            .field("peer_shared_secret", &"[REDACTED]")
            .field("rewards_base_url", &self.rewards_base_url)
            .field("sentry_dsn", &self.sentry_dsn)
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = SecretString::from(get_env_or_default(
            "DATABASE_URL",
            "sqlite:tonlink.db",
        ));
        let host = get_env_or_default("HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PORT", "8080")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;

        let public_base_url = get_base_url("PUBLIC_BASE_URL")?;
        let rewards_base_url = get_base_url("REWARDS_BASE_URL")?;
        let bot_token = get_validated_secret("TELEGRAM_BOT_TOKEN")?;
        let peer_shared_secret = get_validated_secret("PEER_SHARED_SECRET")?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            database_url,
            host,
            port,
            public_base_url,
            bot_token,
            peer_shared_secret,
            rewards_base_url,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Absolute URL of the TON Connect manifest.
    #[must_use]
    pub fn manifest_url(&self) -> String {
        format!("{}/manifest", self.public_base_url)
    }

    /// Absolute URL of the connect page for one handshake attempt.
    ///
    /// `uid` and the nonce are both validated shapes (numeric id, hex
    /// token), so the composition needs no further encoding.
    #[must_use]
    pub fn connect_url(&self, uid: tonlink_core::TelegramUserId, nonce: &str) -> String {
        format!("{}/connect?uid={uid}&nonce={nonce}", self.public_base_url)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get and validate a base URL: must parse, must be http(s), no trailing
/// slash is kept.
///
/// Base URLs come from the deployment environment and end up composed into
/// links handed to third parties, so they are treated as untrusted input.
fn get_base_url(key: &str) -> Result<String, ConfigError> {
    let raw = get_required_env(key)?;
    let parsed = url::Url::parse(&raw)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", parsed.scheme()),
        ));
    }

    if parsed.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "URL must have a host".to_string(),
        ));
    }

    Ok(raw.trim_end_matches('/').to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API tokens have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
