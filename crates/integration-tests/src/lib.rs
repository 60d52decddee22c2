//! Integration tests for Shopfront.
//!
//! The scenarios in `tests/` drive a full [`ShopSession`] against the
//! in-memory document store and identity provider, so they need no network
//! or external services.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::sync::Arc;

use shopfront::catalog::{DocumentCatalog, Product, ProductDraft, Rating};
use shopfront::config::{CatalogConfig, ShopConfig};
use shopfront::documents::MemoryDocumentStore;
use shopfront::identity::{CurrentUser, LocalIdentity};
use shopfront::session::ShopSession;
use shopfront_core::{Email, Price, UserId};

/// A shopper with a deterministic id and email.
#[must_use]
pub fn shopper(id: &str) -> CurrentUser {
    CurrentUser {
        id: UserId::new(id),
        email: Email::parse(&format!("{id}@example.com")).unwrap(),
    }
}

/// A valid product draft priced in cents.
#[must_use]
pub fn draft(title: &str, cents: i64, category: &str) -> ProductDraft {
    ProductDraft {
        title: title.to_string(),
        price: Price::from_cents(cents).unwrap(),
        description: format!("{title} for testing"),
        category: category.to_string(),
        image: String::new(),
        rating: Rating {
            rate: 4.0,
            count: 10,
        },
    }
}

/// Everything a scenario needs: shared store, identity, catalog and session.
pub struct TestContext {
    pub store: MemoryDocumentStore,
    pub identity: LocalIdentity,
    pub catalog: DocumentCatalog,
    pub session: ShopSession,
}

impl TestContext {
    /// A session whose identity has not resolved yet.
    #[must_use]
    pub fn unresolved() -> Self {
        Self::with_identity(LocalIdentity::new())
    }

    /// A session with `user_id` already signed in.
    #[must_use]
    pub fn signed_in(user_id: &str) -> Self {
        Self::with_identity(LocalIdentity::signed_in(shopper(user_id)))
    }

    /// A session that resolved with nobody signed in.
    #[must_use]
    pub fn signed_out() -> Self {
        Self::with_identity(LocalIdentity::signed_out())
    }

    fn with_identity(identity: LocalIdentity) -> Self {
        let store = MemoryDocumentStore::new();
        let catalog = DocumentCatalog::new(Arc::new(store.clone()), &CatalogConfig::default());
        let session = ShopSession::start(
            &ShopConfig::default(),
            Arc::new(identity.clone()),
            Arc::new(store.clone()),
        );
        Self {
            store,
            identity,
            catalog,
            session,
        }
    }

    /// Add `draft` to the catalog.
    pub async fn stock(&self, draft: ProductDraft) -> Product {
        self.catalog.add_product(draft).await.unwrap()
    }

    /// Stock two products and fill the cart with a $25.00 subtotal:
    /// two $10.00 mugs and one $5.00 coaster.
    pub async fn fill_cart(&self) -> (Product, Product) {
        let mug = self.stock(draft("Mug", 1000, "kitchen")).await;
        let coaster = self.stock(draft("Coaster", 500, "kitchen")).await;
        self.session.add_to_cart(&self.catalog, &mug.id).await.unwrap();
        self.session.add_to_cart(&self.catalog, &mug.id).await.unwrap();
        self.session
            .add_to_cart(&self.catalog, &coaster.id)
            .await
            .unwrap();
        (mug, coaster)
    }
}
