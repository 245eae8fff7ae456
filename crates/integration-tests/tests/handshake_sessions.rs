//! Handshake session lifecycle scenarios.

use sqlx::SqlitePool;

use tonlink_core::{TelegramUserId, WalletAddress};
use tonlink_service::db::create_memory_pool;
use tonlink_service::db::sessions::{SESSION_TTL_SECS, SessionRepository};
use tonlink_service::services::registration::{RegistrationService, SubmitError};

async fn pool() -> SqlitePool {
    create_memory_pool().await.expect("in-memory pool")
}

fn uid(n: i64) -> TelegramUserId {
    TelegramUserId::new(n)
}

fn addr(s: &str) -> WalletAddress {
    WalletAddress::parse(s).expect("valid address")
}

/// Age a session so its TTL has elapsed.
async fn age_out(pool: &SqlitePool, nonce: &str) {
    let stale = chrono_now() - SESSION_TTL_SECS - 1;
    sqlx::query("UPDATE handshake_sessions SET issued_at = ?1 WHERE nonce = ?2")
        .bind(stale)
        .bind(nonce)
        .execute(pool)
        .await
        .expect("age session");
}

fn chrono_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time after epoch")
        .as_secs()
        .try_into()
        .expect("timestamp fits i64")
}

/// A submit referencing an expired session fails and writes nothing.
#[tokio::test]
async fn test_expired_session_fails_submit() {
    let pool = pool().await;
    let service = RegistrationService::new(&pool);

    let nonce = service.issue_session(uid(1)).await.expect("session");
    age_out(&pool, &nonce).await;

    let result = service.submit(uid(1), &nonce, &addr("EQabc"), None).await;
    assert!(matches!(result, Err(SubmitError::SessionExpired)));

    let user = service.profile(uid(1)).await.expect("profile").expect("row");
    assert_eq!(user.wallet_address, None);
}

/// The sweep removes aged sessions but leaves live ones alone, and a swept
/// nonce behaves like one that never existed.
#[tokio::test]
async fn test_sweep_then_submit_reports_unknown_session() {
    let pool = pool().await;
    let service = RegistrationService::new(&pool);
    let sessions = SessionRepository::new(&pool);

    let stale = service.issue_session(uid(1)).await.expect("session");
    let live = service.issue_session(uid(2)).await.expect("session");
    age_out(&pool, &stale).await;

    let removed = sessions.sweep_expired().await.expect("sweep");
    assert_eq!(removed, 1);

    let result = service.submit(uid(1), &stale, &addr("EQabc"), None).await;
    assert!(matches!(result, Err(SubmitError::UnknownSession)));

    service
        .submit(uid(2), &live, &addr("EQdef"), None)
        .await
        .expect("live session still works");
}

/// Nonces are never handed out twice, even across many issuances.
#[tokio::test]
async fn test_issued_nonces_are_unique() {
    let pool = pool().await;
    let service = RegistrationService::new(&pool);

    let mut seen = std::collections::HashSet::new();
    for n in 1..=30 {
        let nonce = service.issue_session(uid(n)).await.expect("session");
        assert!(seen.insert(nonce), "duplicate nonce at iteration {n}");
    }
}

/// A nonce bound to one identity cannot be spent by another.
#[tokio::test]
async fn test_nonce_is_bound_to_identity() {
    let pool = pool().await;
    let service = RegistrationService::new(&pool);

    let nonce = service.issue_session(uid(1)).await.expect("session");

    let result = service.submit(uid(2), &nonce, &addr("EQevil"), None).await;
    assert!(matches!(result, Err(SubmitError::UnknownSession)));

    // The rightful owner can still complete the handshake.
    service
        .submit(uid(1), &nonce, &addr("EQgood"), None)
        .await
        .expect("owner submit");
}
