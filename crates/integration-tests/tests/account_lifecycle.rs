//! Integration tests for sign-out, profile management and account deletion.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use shopfront::StoreError;
use shopfront::account::ProfileChanges;
use shopfront::identity::{AuthState, IdentityError};
use shopfront_core::Email;
use shopfront_integration_tests::{TestContext, shopper};

async fn wait_for_empty_cart(ctx: &TestContext) {
    let mut rx = ctx.session.cart().subscribe();
    tokio::time::timeout(Duration::from_secs(1), rx.wait_for(|cart| cart.is_empty()))
        .await
        .unwrap()
        .unwrap();
}

// =============================================================================
// Sign-out
// =============================================================================

#[tokio::test]
async fn test_sign_out_clears_cart_and_profile() {
    let ctx = TestContext::signed_in("u1");
    ctx.session.account().create_profile("Ann").await.unwrap();
    ctx.fill_cart().await;

    ctx.session.sign_out().await.unwrap();
    assert!(ctx.session.cart().snapshot().is_empty());
    assert!(ctx.session.account().profile().is_none());
    assert_eq!(ctx.identity.state(), AuthState::SignedOut);

    let err = ctx.session.place_order().await.unwrap_err();
    assert!(matches!(err, StoreError::Unauthenticated));
}

#[tokio::test]
async fn test_switching_users_drops_previous_cart() {
    let ctx = TestContext::signed_in("u1");
    tokio::task::yield_now().await;
    ctx.fill_cart().await;

    ctx.identity.sign_in(shopper("u2"));
    wait_for_empty_cart(&ctx).await;
}

// =============================================================================
// Profile
// =============================================================================

#[tokio::test]
async fn test_profile_round_trip() {
    let ctx = TestContext::signed_in("u1");
    let created = ctx.session.account().create_profile("Ann").await.unwrap();
    assert_eq!(created.email, shopper("u1").email);

    ctx.session.account().forget_profile();
    let loaded = ctx.session.account().load_profile().await.unwrap();
    assert_eq!(loaded, created);

    let updated = ctx
        .session
        .account()
        .update_profile(ProfileChanges {
            name: Some("Ann Smith".to_string()),
            email: Some(Email::parse("ann.smith@example.com").unwrap()),
        })
        .await
        .unwrap();
    assert_eq!(updated.name, "Ann Smith");
    assert_eq!(ctx.session.account().profile(), Some(updated));
}

#[tokio::test]
async fn test_missing_profile_is_not_found() {
    let ctx = TestContext::signed_in("u1");
    let err = ctx.session.account().load_profile().await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn test_failed_profile_update_keeps_cached_profile() {
    let ctx = TestContext::signed_in("u1");
    let created = ctx.session.account().create_profile("Ann").await.unwrap();

    ctx.store.set_offline(true);
    let err = ctx
        .session
        .account()
        .update_profile(ProfileChanges {
            name: Some("Changed".to_string()),
            email: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::PersistenceFailure(_)));
    assert_eq!(ctx.session.account().profile(), Some(created));
}

// =============================================================================
// Account Deletion
// =============================================================================

#[tokio::test]
async fn test_delete_account_removes_everything() {
    let ctx = TestContext::signed_in("u1");
    ctx.session.account().create_profile("Ann").await.unwrap();
    ctx.fill_cart().await;
    ctx.session.place_order().await.unwrap();
    ctx.fill_cart().await;
    ctx.session.place_order().await.unwrap();
    ctx.fill_cart().await;

    let removed = ctx.session.delete_account().await.unwrap();
    assert_eq!(removed, 2);
    assert!(ctx.store.is_empty("orders").await);
    assert!(ctx.store.is_empty("users").await);
    assert!(ctx.session.cart().snapshot().is_empty());
    assert!(ctx.session.account().profile().is_none());
    assert_eq!(ctx.identity.state(), AuthState::SignedOut);
}

#[tokio::test]
async fn test_delete_account_keeps_other_users_orders() {
    let ctx = TestContext::signed_in("u1");
    tokio::task::yield_now().await;
    ctx.fill_cart().await;
    ctx.session.place_order().await.unwrap();

    ctx.identity.sign_in(shopper("u2"));
    tokio::task::yield_now().await;
    ctx.fill_cart().await;
    ctx.session.place_order().await.unwrap();

    assert_eq!(ctx.session.delete_account().await.unwrap(), 1);
    assert_eq!(ctx.store.len("orders").await, 1);
}

#[tokio::test]
async fn test_delete_account_requiring_recent_login() {
    let ctx = TestContext::signed_in("u1");
    ctx.session.account().create_profile("Ann").await.unwrap();
    ctx.identity.set_requires_recent_login(true);

    let err = ctx.session.delete_account().await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Identity(IdentityError::RequiresRecentLogin)
    ));
    assert!(matches!(ctx.identity.state(), AuthState::SignedIn(_)));
}

#[tokio::test]
async fn test_delete_account_signed_out() {
    let ctx = TestContext::signed_out();
    let err = ctx.session.delete_account().await.unwrap_err();
    assert!(matches!(err, StoreError::Unauthenticated));
}
