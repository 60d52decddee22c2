//! A signed-in shopping session.
//!
//! [`ShopSession`] owns the cart for one session and hands out the services
//! that act on it. It follows the identity provider: when the user signs out
//! (or a different user signs in) the cart and cached profile are dropped.

use std::sync::Arc;

use shopfront_core::{ProductId, UserId};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use crate::account::AccountService;
use crate::cart::{CartProduct, CartStore};
use crate::catalog::CatalogSource;
use crate::config::ShopConfig;
use crate::documents::DocumentStore;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::identity::{AuthState, IdentityProvider};
use crate::orders::{CheckoutService, OrderRecord};

/// One shopper's session: cart, checkout and account services.
///
/// Must be started inside a Tokio runtime. Dropping the session stops its
/// identity watcher.
pub struct ShopSession {
    identity: Arc<dyn IdentityProvider>,
    cart: CartStore,
    checkout: CheckoutService,
    account: AccountService,
    watcher: JoinHandle<()>,
}

impl ShopSession {
    /// Start a session with an empty cart.
    #[must_use]
    pub fn start(
        config: &ShopConfig,
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let cart = CartStore::new(config.tax_rate);
        let checkout =
            CheckoutService::new(identity.clone(), store.clone(), config.persist_timeout);
        let account = AccountService::new(identity.clone(), store, checkout.orders().clone());
        let watcher = spawn_auth_watcher(identity.as_ref(), cart.clone(), account.clone());

        Self {
            identity,
            cart,
            checkout,
            account,
            watcher,
        }
    }

    /// The session's cart.
    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// Checkout and order retrieval.
    #[must_use]
    pub const fn checkout(&self) -> &CheckoutService {
        &self.checkout
    }

    /// Profile and account management.
    #[must_use]
    pub const fn account(&self) -> &AccountService {
        &self.account
    }

    /// Look up `product_id` in `catalog` and add one unit to the cart.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist, or the catalog's
    /// error if the lookup fails. The cart is unchanged on error.
    #[instrument(skip(self, catalog))]
    pub async fn add_to_cart(
        &self,
        catalog: &dyn CatalogSource,
        product_id: &ProductId,
    ) -> Result<()> {
        let product = catalog.get_product(product_id).await?;
        self.cart.add_item(CartProduct::from(&product));
        Ok(())
    }

    /// Place an order for the current cart.
    ///
    /// # Errors
    ///
    /// See [`CheckoutService::place_order`].
    pub async fn place_order(&self) -> Result<OrderRecord> {
        self.checkout.place_order(&self.cart).await
    }

    /// Delete the signed-in user's account and everything stored for it.
    ///
    /// # Errors
    ///
    /// See [`AccountService::delete_account`].
    pub async fn delete_account(&self) -> Result<usize> {
        self.account.delete_account(&self.cart).await
    }

    /// Sign out and drop everything held for the user.
    ///
    /// The cart is empty by the time this returns.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Identity` if the provider fails to sign out; the
    /// cart is left as it was.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<()> {
        self.identity.sign_out().await?;
        self.cart.clear();
        self.account.forget_profile();
        clear_sentry_user();
        info!("Session signed out");
        Ok(())
    }
}

impl Drop for ShopSession {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

/// Follow identity changes: clear the cart on sign-out or user switch and keep
/// the Sentry user context current.
fn spawn_auth_watcher(
    identity: &dyn IdentityProvider,
    cart: CartStore,
    account: AccountService,
) -> JoinHandle<()> {
    let mut rx = identity.subscribe();
    tokio::spawn(async move {
        let mut current: Option<UserId> = None;
        loop {
            let state = rx.borrow_and_update().clone();
            match state {
                AuthState::Resolving => {}
                AuthState::SignedOut => {
                    if current.take().is_some() {
                        debug!("Identity signed out; clearing cart");
                        clear_sentry_user();
                    }
                    cart.clear();
                    account.forget_profile();
                }
                AuthState::SignedIn(user) => {
                    if current.as_ref() != Some(&user.id) {
                        if current.is_some() {
                            debug!("Identity switched users; clearing cart");
                            cart.clear();
                            account.forget_profile();
                        }
                        set_sentry_user(&user.id, Some(user.email.as_str()));
                        current = Some(user.id);
                    }
                }
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use shopfront_core::{Email, Price};

    use super::*;
    use crate::catalog::{DocumentCatalog, ProductDraft, Rating};
    use crate::config::CatalogConfig;
    use crate::documents::MemoryDocumentStore;
    use crate::error::StoreError;
    use crate::identity::{CurrentUser, LocalIdentity};

    fn shopper(id: &str) -> CurrentUser {
        CurrentUser {
            id: UserId::new(id),
            email: Email::parse(&format!("{id}@example.com")).unwrap(),
        }
    }

    fn product(id: &str) -> CartProduct {
        CartProduct {
            product_id: ProductId::new(id),
            title: id.to_string(),
            unit_price: Price::from_cents(500).unwrap(),
            image_url: String::new(),
        }
    }

    async fn wait_for_empty(cart: &CartStore) {
        let mut rx = cart.subscribe();
        tokio::time::timeout(Duration::from_secs(1), rx.wait_for(|c| c.is_empty()))
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_sign_out_clears_cart() {
        let identity = LocalIdentity::signed_in(shopper("u1"));
        let session = ShopSession::start(
            &ShopConfig::default(),
            Arc::new(identity.clone()),
            Arc::new(MemoryDocumentStore::new()),
        );
        session.cart().add_item(product("a"));

        session.sign_out().await.unwrap();
        assert!(session.cart().snapshot().is_empty());
        assert_eq!(identity.state(), AuthState::SignedOut);
    }

    #[tokio::test]
    async fn test_provider_sign_out_clears_cart() {
        let identity = LocalIdentity::signed_in(shopper("u1"));
        let session = ShopSession::start(
            &ShopConfig::default(),
            Arc::new(identity.clone()),
            Arc::new(MemoryDocumentStore::new()),
        );
        tokio::task::yield_now().await;
        session.cart().add_item(product("a"));

        identity.sign_out().await.unwrap();
        wait_for_empty(session.cart()).await;
    }

    #[tokio::test]
    async fn test_user_switch_clears_cart() {
        let identity = LocalIdentity::signed_in(shopper("u1"));
        let session = ShopSession::start(
            &ShopConfig::default(),
            Arc::new(identity.clone()),
            Arc::new(MemoryDocumentStore::new()),
        );
        tokio::task::yield_now().await;
        session.cart().add_item(product("a"));

        identity.sign_in(shopper("u2"));
        wait_for_empty(session.cart()).await;
    }

    #[tokio::test]
    async fn test_add_to_cart_from_catalog() {
        let store = MemoryDocumentStore::new();
        let catalog = DocumentCatalog::new(Arc::new(store.clone()), &CatalogConfig::default());
        let mug = catalog
            .add_product(ProductDraft {
                title: "Mug".to_string(),
                price: Price::from_cents(900).unwrap(),
                description: String::new(),
                category: "home".to_string(),
                image: String::new(),
                rating: Rating::default(),
            })
            .await
            .unwrap();

        let session = ShopSession::start(
            &ShopConfig::default(),
            Arc::new(LocalIdentity::signed_in(shopper("u1"))),
            Arc::new(store),
        );
        session.add_to_cart(&catalog, &mug.id).await.unwrap();
        session.add_to_cart(&catalog, &mug.id).await.unwrap();
        assert_eq!(session.cart().snapshot().item_count(), 2);

        let err = session
            .add_to_cart(&catalog, &ProductId::new("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert_eq!(session.cart().snapshot().item_count(), 2);
    }
}
