//! End-to-end registration flow scenarios.
//!
//! These run the real service/repository stack against in-memory SQLite:
//! chat contact, session issuance, wallet submit, referrals, unsubscribe.

use sqlx::SqlitePool;

use tonlink_core::{ReferralCode, TelegramUserId, WalletAddress};
use tonlink_service::db::create_memory_pool;
use tonlink_service::models::user::RegistrationState;
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

/// User A contacts the bot, receives a connect link, submits, and the
/// profile reflects the link. Resubmitting the identical payload leaves the
/// profile unchanged. User B registers with A's code; A is untouched.
#[tokio::test]
async fn test_full_handshake_and_referral_scenario() {
    let pool = pool().await;
    let service = RegistrationService::new(&pool);

    // A: first contact + connect link
    let a = service.ensure_registered(uid(1), None).await.expect("contact");
    assert_eq!(a.state(), RegistrationState::AwaitingWallet);
    let nonce = service.issue_session(uid(1)).await.expect("session");

    // A: submit
    let outcome = service
        .submit(uid(1), &nonce, &addr("EQabc111"), None)
        .await
        .expect("submit");
    assert!(outcome.fresh);
    assert_eq!(outcome.user.state(), RegistrationState::Linked);
    assert_eq!(outcome.user.wallet_address, Some(addr("EQabc111")));

    // A: retried POST with identical payload is answered idempotently
    let retry = service
        .submit(uid(1), &nonce, &addr("EQabc111"), None)
        .await
        .expect("retried submit");
    assert!(!retry.fresh);
    assert_eq!(retry.user.wallet_address, Some(addr("EQabc111")));
    assert_eq!(retry.user.personal_code, outcome.user.personal_code);

    // B: registers carrying A's personal code
    let b_nonce = service.issue_session(uid(2)).await.expect("session");
    let b = service
        .submit(
            uid(2),
            &b_nonce,
            &addr("EQdef222"),
            Some(&outcome.user.personal_code),
        )
        .await
        .expect("submit B");
    assert_eq!(
        b.user.referral_code_used,
        Some(outcome.user.personal_code.clone())
    );

    // A's record is untouched by B's referral
    let a_after = service.profile(uid(1)).await.expect("profile").expect("row");
    assert_eq!(a_after.personal_code, outcome.user.personal_code);
    assert_eq!(a_after.referral_code_used, None);
    assert_eq!(a_after.wallet_address, Some(addr("EQabc111")));
}

/// A replayed nonce with a different address is rejected, not re-applied.
#[tokio::test]
async fn test_replayed_nonce_with_different_address_is_rejected() {
    let pool = pool().await;
    let service = RegistrationService::new(&pool);

    let nonce = service.issue_session(uid(1)).await.expect("session");
    service
        .submit(uid(1), &nonce, &addr("EQfirst"), None)
        .await
        .expect("submit");

    let result = service.submit(uid(1), &nonce, &addr("EQsecond"), None).await;
    assert!(matches!(result, Err(SubmitError::SessionReplayed)));

    // The first write stands.
    let user = service.profile(uid(1)).await.expect("profile").expect("row");
    assert_eq!(user.wallet_address, Some(addr("EQfirst")));
}

/// A submit referencing a nonce that was never issued fails.
#[tokio::test]
async fn test_submit_with_unknown_nonce_is_rejected() {
    let pool = pool().await;
    let service = RegistrationService::new(&pool);

    let result = service
        .submit(uid(1), "deadbeefdeadbeef", &addr("EQabc"), None)
        .await;
    assert!(matches!(result, Err(SubmitError::UnknownSession)));

    // No row was created.
    assert!(service.profile(uid(1)).await.expect("profile").is_none());
}

/// Two sessions for the same user: each nonce is independently single-use.
#[tokio::test]
async fn test_each_session_is_independent() {
    let pool = pool().await;
    let service = RegistrationService::new(&pool);

    let n1 = service.issue_session(uid(1)).await.expect("session");
    let n2 = service.issue_session(uid(1)).await.expect("session");
    assert_ne!(n1, n2);

    service
        .submit(uid(1), &n1, &addr("EQone"), None)
        .await
        .expect("submit n1");

    // The second link still works and overwrites the wallet (last write
    // wins for the owning identity).
    let outcome = service
        .submit(uid(1), &n2, &addr("EQtwo"), None)
        .await
        .expect("submit n2");
    assert_eq!(outcome.user.wallet_address, Some(addr("EQtwo")));
}

/// Self-referral is always rejected and never recorded.
#[tokio::test]
async fn test_self_referral_is_rejected() {
    let pool = pool().await;
    let service = RegistrationService::new(&pool);

    let user = service.ensure_registered(uid(1), None).await.expect("contact");
    let own_code = user.personal_code.clone();

    let nonce = service.issue_session(uid(1)).await.expect("session");
    let outcome = service
        .submit(uid(1), &nonce, &addr("EQabc"), Some(&own_code))
        .await
        .expect("submit");

    assert_eq!(outcome.user.referral_code_used, None);
}

/// Referral supplied at first chat contact is applied through the same
/// write-once path as a submit-time referral.
#[tokio::test]
async fn test_referral_at_first_contact() {
    let pool = pool().await;
    let service = RegistrationService::new(&pool);

    let inviter = service.ensure_registered(uid(1), None).await.expect("inviter");
    let invited = service
        .ensure_registered(uid(2), Some(&inviter.personal_code))
        .await
        .expect("invited");

    assert_eq!(
        invited.referral_code_used,
        Some(inviter.personal_code.clone())
    );

    // A later submit with a different referral cannot overwrite it.
    let other = service.ensure_registered(uid(3), None).await.expect("other");
    let nonce = service.issue_session(uid(2)).await.expect("session");
    let outcome = service
        .submit(uid(2), &nonce, &addr("EQxyz"), Some(&other.personal_code))
        .await
        .expect("submit");

    assert_eq!(
        outcome.user.referral_code_used,
        Some(inviter.personal_code)
    );
}

/// Unsubscribe removes the row; a fresh contact re-enters with a new code.
#[tokio::test]
async fn test_unsubscribe_then_fresh_registration() {
    let pool = pool().await;
    let service = RegistrationService::new(&pool);

    let nonce = service.issue_session(uid(1)).await.expect("session");
    let before = service
        .submit(uid(1), &nonce, &addr("EQabc"), None)
        .await
        .expect("submit");

    assert!(service.unsubscribe(uid(1)).await.expect("unsubscribe"));
    assert!(service.profile(uid(1)).await.expect("profile").is_none());

    // Second unsubscribe is a no-op.
    assert!(!service.unsubscribe(uid(1)).await.expect("unsubscribe again"));

    let fresh = service.ensure_registered(uid(1), None).await.expect("contact");
    assert_eq!(fresh.state(), RegistrationState::AwaitingWallet);
    assert_ne!(fresh.personal_code, before.user.personal_code);
}

/// A session issued before unsubscribe dies with the row.
#[tokio::test]
async fn test_unsubscribe_invalidates_pending_sessions() {
    let pool = pool().await;
    let service = RegistrationService::new(&pool);

    let nonce = service.issue_session(uid(1)).await.expect("session");
    service.unsubscribe(uid(1)).await.expect("unsubscribe");

    let result = service.submit(uid(1), &nonce, &addr("EQabc"), None).await;
    assert!(matches!(result, Err(SubmitError::UnknownSession)));
}

/// Invalid inputs never create state.
#[tokio::test]
async fn test_invalid_inputs_are_rejected_without_state_change() {
    let pool = pool().await;
    let service = RegistrationService::new(&pool);

    let result = service.submit(uid(0), "abcd", &addr("EQabc"), None).await;
    assert!(matches!(result, Err(SubmitError::InvalidInput(_))));

    let result = service.submit(uid(1), "", &addr("EQabc"), None).await;
    assert!(matches!(result, Err(SubmitError::InvalidInput(_))));

    assert!(service.profile(uid(1)).await.expect("profile").is_none());
}

/// Wallet updates never clear the personal code or the recorded referral.
#[tokio::test]
async fn test_wallet_update_preserves_codes() {
    let pool = pool().await;
    let service = RegistrationService::new(&pool);

    let inviter = service.ensure_registered(uid(1), None).await.expect("inviter");
    service
        .ensure_registered(uid(2), Some(&inviter.personal_code))
        .await
        .expect("invited");

    let n1 = service.issue_session(uid(2)).await.expect("session");
    let first = service
        .submit(uid(2), &n1, &addr("EQold"), None)
        .await
        .expect("submit");

    let n2 = service.issue_session(uid(2)).await.expect("session");
    let second = service
        .submit(uid(2), &n2, &addr("EQnew"), None)
        .await
        .expect("resubmit");

    assert_eq!(second.user.personal_code, first.user.personal_code);
    assert_eq!(
        second.user.referral_code_used,
        Some(inviter.personal_code)
    );
    assert_eq!(second.user.wallet_address, Some(addr("EQnew")));
}

/// Concurrent duplicate submits for the same uid: exactly one is fresh, the
/// ledger ends in the same state as a single submit.
#[tokio::test]
async fn test_concurrent_duplicate_submits() {
    let pool = pool().await;
    let service = RegistrationService::new(&pool);
    let nonce = service.issue_session(uid(1)).await.expect("session");

    let service_a = RegistrationService::new(&pool);
    let service_b = RegistrationService::new(&pool);
    let addr_a = addr("EQdup");
    let addr_b = addr("EQdup");
    let (first, second) = tokio::join!(
        service_a.submit(uid(1), &nonce, &addr_a, None),
        service_b.submit(uid(1), &nonce, &addr_b, None),
    );

    // Exactly one caller wins the consume. The other is either answered
    // idempotently (wallet already written) or rejected as a replay if it
    // observed the session before the winner's write landed; both net out
    // to the single-submit end state.
    let outcomes = [first, second];
    let fresh_count = outcomes
        .iter()
        .filter(|r| matches!(r, Ok(o) if o.fresh))
        .count();
    assert_eq!(fresh_count, 1);
    for outcome in &outcomes {
        if let Err(e) = outcome {
            assert!(matches!(e, SubmitError::SessionReplayed), "unexpected: {e}");
        }
    }

    let user = RegistrationService::new(&pool)
        .profile(uid(1))
        .await
        .expect("profile")
        .expect("row");
    assert_eq!(user.wallet_address, Some(addr("EQdup")));
}

/// A malformed referral accompanying a valid submit does not block the
/// wallet link (the referral is simply not recorded).
#[tokio::test]
async fn test_unknown_referral_does_not_block_submit() {
    let pool = pool().await;
    let service = RegistrationService::new(&pool);

    let nonce = service.issue_session(uid(1)).await.expect("session");
    let code = ReferralCode::parse("NOBODY99").expect("valid code shape");
    let outcome = service
        .submit(uid(1), &nonce, &addr("EQabc"), Some(&code))
        .await
        .expect("submit");

    assert_eq!(outcome.user.state(), RegistrationState::Linked);
    assert_eq!(outcome.user.referral_code_used, None);
}
