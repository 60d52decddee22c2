//! Integration tests for the checkout workflow.
//!
//! These tests drive a full session from catalog lookup through order
//! capture and read-back.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use rust_decimal::Decimal;
use shopfront::StoreError;
use shopfront::error::BackendError;
use shopfront_core::{OrderStatus, Price};
use shopfront_integration_tests::{TestContext, shopper};

fn cents(value: i64) -> Price {
    Price::from_cents(value).unwrap()
}

// =============================================================================
// Placing Orders
// =============================================================================

#[tokio::test]
async fn test_checkout_captures_cart_totals() {
    let ctx = TestContext::signed_in("u1");
    ctx.fill_cart().await;

    let cart = ctx.session.cart().snapshot();
    assert_eq!(cart.subtotal(), cents(2500));
    assert_eq!(cart.tax(), cents(200));
    assert_eq!(cart.total(), cents(2700));

    let order = ctx.session.place_order().await.unwrap();
    assert_eq!(order.subtotal, cents(2500));
    assert_eq!(order.tax(), cents(200));
    assert_eq!(order.total, cents(2700));
    assert_eq!(order.item_count(), 3);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.user_id, shopper("u1").id);
    assert_eq!(order.user_email, shopper("u1").email);
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert!(order.order_number.as_str().starts_with("ORD-"));

    assert!(ctx.session.cart().snapshot().is_empty());
    assert_eq!(ctx.store.len("orders").await, 1);
}

#[tokio::test]
async fn test_confirmation_reads_back_latest_order() {
    let ctx = TestContext::signed_in("u1");
    ctx.fill_cart().await;
    let placed = ctx.session.place_order().await.unwrap();

    let latest = ctx.session.checkout().latest_order().await.unwrap();
    assert_eq!(latest.id, placed.id);
    assert_eq!(latest.order, placed.order);
}

#[tokio::test]
async fn test_history_is_newest_first() {
    let ctx = TestContext::signed_in("u1");
    ctx.fill_cart().await;
    let first = ctx.session.place_order().await.unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;
    let (mug, _) = ctx.fill_cart().await;
    ctx.session.cart().remove_item(&mug.id);
    let second = ctx.session.place_order().await.unwrap();

    let history = ctx.session.checkout().order_history().await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].order_number, second.order_number);
    assert_eq!(history[1].order_number, first.order_number);
    assert_eq!(history[0].total, cents(540));
}

#[tokio::test]
async fn test_orders_keep_rate_in_effect_at_checkout() {
    let ctx = TestContext::signed_in("u1");
    ctx.fill_cart().await;
    ctx.session.place_order().await.unwrap();

    let change = ctx.session.cart().set_tax_rate(Decimal::new(10, 2));
    assert!(!change.clamped);

    let latest = ctx.session.checkout().latest_order().await.unwrap();
    assert_eq!(latest.total, cents(2700));
    assert_eq!(latest.tax_rate.rate(), Decimal::new(8, 2));
}

#[tokio::test]
async fn test_other_users_orders_are_not_visible() {
    let ctx = TestContext::signed_in("u1");
    ctx.fill_cart().await;
    ctx.session.place_order().await.unwrap();

    ctx.identity.sign_in(shopper("u2"));
    let err = ctx.session.checkout().order_history().await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

// =============================================================================
// Failure Paths
// =============================================================================

#[tokio::test]
async fn test_failed_write_leaves_cart_intact() {
    let ctx = TestContext::signed_in("u1");
    ctx.fill_cart().await;
    let before = ctx.session.cart().snapshot();

    ctx.store.set_offline(true);
    let err = ctx.session.place_order().await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::PersistenceFailure(BackendError::Unavailable(_))
    ));
    assert!(err.is_retryable());
    assert_eq!(ctx.session.cart().snapshot(), before);

    ctx.store.set_offline(false);
    let order = ctx.session.place_order().await.unwrap();
    assert_eq!(order.total, cents(2700));
    assert!(ctx.session.cart().snapshot().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_slow_write_times_out() {
    let ctx = TestContext::signed_in("u1");
    ctx.fill_cart().await;
    ctx.store.set_latency(Some(Duration::from_secs(60))).await;

    let err = ctx.session.place_order().await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::PersistenceFailure(BackendError::Timeout(_))
    ));
    assert_eq!(ctx.session.cart().snapshot().item_count(), 3);
}

#[tokio::test]
async fn test_empty_cart_is_rejected() {
    let ctx = TestContext::signed_in("u1");
    let err = ctx.session.place_order().await.unwrap_err();
    assert!(matches!(err, StoreError::ValidationFailure(_)));
    assert!(ctx.store.is_empty("orders").await);
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_signed_out_checkout_is_unauthenticated() {
    let ctx = TestContext::signed_out();
    ctx.fill_cart().await;

    let err = ctx.session.place_order().await.unwrap_err();
    assert!(matches!(err, StoreError::Unauthenticated));
    assert_eq!(ctx.session.cart().snapshot().item_count(), 3);
}

#[tokio::test]
async fn test_unauthenticated_and_not_found_are_distinct() {
    let signed_out = TestContext::signed_out();
    let err = signed_out.session.checkout().latest_order().await.unwrap_err();
    assert!(matches!(err, StoreError::Unauthenticated));

    let signed_in = TestContext::signed_in("u1");
    let err = signed_in.session.checkout().latest_order().await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn test_reads_wait_for_identity_resolution() {
    let ctx = TestContext::unresolved();

    let (result, ()) = tokio::join!(ctx.session.checkout().latest_order(), async {
        tokio::task::yield_now().await;
        ctx.identity.sign_in(shopper("u1"));
    });
    assert!(matches!(result.unwrap_err(), StoreError::NotFound(_)));
}

#[tokio::test]
async fn test_unresolved_identity_resolving_signed_out() {
    let ctx = TestContext::unresolved();

    let (result, ()) = tokio::join!(ctx.session.checkout().order_history(), async {
        tokio::task::yield_now().await;
        ctx.identity.resolve_signed_out();
    });
    assert!(matches!(result.unwrap_err(), StoreError::Unauthenticated));
}
