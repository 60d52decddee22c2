//! Integration tests for catalog reads and writes through the document store.

#![allow(clippy::unwrap_used)]

use shopfront::StoreError;
use shopfront::catalog::{CatalogSource, CategoryFilter};
use shopfront_core::{Price, ProductId};
use shopfront_integration_tests::{TestContext, draft};

#[tokio::test]
async fn test_category_filter() {
    let ctx = TestContext::signed_out();
    ctx.stock(draft("Mug", 1000, "kitchen")).await;
    ctx.stock(draft("Ring", 4500, "jewelery")).await;
    ctx.stock(draft("Plate", 800, "kitchen")).await;

    let all = ctx.catalog.list_products(&CategoryFilter::All).await.unwrap();
    let titles: Vec<_> = all.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["Mug", "Ring", "Plate"]);

    let kitchen = ctx
        .catalog
        .list_products(&"kitchen".parse().unwrap())
        .await
        .unwrap();
    assert_eq!(kitchen.len(), 2);
    assert!(kitchen.iter().all(|p| p.category == "kitchen"));
}

#[tokio::test]
async fn test_updates_are_visible_to_cart() {
    let ctx = TestContext::signed_in("u1");
    let mug = ctx.stock(draft("Mug", 1000, "kitchen")).await;
    assert_eq!(
        ctx.catalog.get_product(&mug.id).await.unwrap().price,
        Price::from_cents(1000).unwrap()
    );

    ctx.catalog
        .update_product(&mug.id, draft("Mug", 1200, "kitchen"))
        .await
        .unwrap();
    ctx.session.add_to_cart(&ctx.catalog, &mug.id).await.unwrap();

    let cart = ctx.session.cart().snapshot();
    assert_eq!(cart.subtotal(), Price::from_cents(1200).unwrap());
}

#[tokio::test]
async fn test_deleted_product_cannot_be_added() {
    let ctx = TestContext::signed_in("u1");
    let mug = ctx.stock(draft("Mug", 1000, "kitchen")).await;
    ctx.catalog.delete_product(&mug.id).await.unwrap();

    let err = ctx
        .session
        .add_to_cart(&ctx.catalog, &mug.id)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    assert!(ctx.session.cart().snapshot().is_empty());

    let err = ctx
        .catalog
        .delete_product(&ProductId::new("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}
