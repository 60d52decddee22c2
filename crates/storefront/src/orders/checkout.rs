//! Checkout and order retrieval.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use tracing::{info, instrument};

use super::{OrderRecord, OrderRepository, OrderSnapshot};
use crate::cart::CartStore;
use crate::documents::DocumentStore;
use crate::error::{BackendError, Result, StoreError, report};
use crate::identity::{IdentityProvider, require_user};

/// Marks a checkout as in flight until dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs the checkout workflow and serves order reads for the signed-in user.
///
/// Cheaply cloneable; clones share the in-flight guard, so a second
/// `place_order` from any clone fails fast while one is awaiting persistence.
#[derive(Clone)]
pub struct CheckoutService {
    identity: Arc<dyn IdentityProvider>,
    orders: OrderRepository,
    persist_timeout: Duration,
    in_flight: Arc<AtomicBool>,
}

impl CheckoutService {
    /// Create a checkout service.
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
        persist_timeout: Duration,
    ) -> Self {
        Self {
            identity,
            orders: OrderRepository::new(store),
            persist_timeout,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The order repository this service writes to.
    #[must_use]
    pub const fn orders(&self) -> &OrderRepository {
        &self.orders
    }

    /// Run `op` under the persistence bound.
    async fn bounded<T>(
        &self,
        op: impl Future<Output = std::result::Result<T, BackendError>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.persist_timeout, op).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(StoreError::PersistenceFailure(BackendError::Timeout(
                self.persist_timeout,
            ))),
        }
    }

    /// Capture the cart as an order, persist it, then clear the cart.
    ///
    /// The cart is cleared only after the order document is durably written.
    /// On any failure the cart is left exactly as it was and no order exists.
    ///
    /// The order holds the cart as it was when the write started. Clearing
    /// empties the whole cart, so lines added while the write is in flight
    /// are discarded along with the ordered ones.
    ///
    /// # Errors
    ///
    /// - `CheckoutInProgress` if another checkout is awaiting persistence
    /// - `Unauthenticated` if nobody is signed in
    /// - `ValidationFailure` if the cart is empty
    /// - `PersistenceFailure` if the write fails or exceeds the timeout
    #[instrument(skip(self, cart))]
    pub async fn place_order(&self, cart: &CartStore) -> Result<OrderRecord> {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            let err = StoreError::CheckoutInProgress;
            report(&err, "place_order");
            return Err(err);
        };

        let result = self.capture_and_persist(cart).await;
        match &result {
            Ok(record) => {
                cart.clear();
                info!(
                    order_id = %record.id,
                    order_number = %record.order_number,
                    total = %record.total,
                    "Order placed"
                );
            }
            Err(err) => report(err, "place_order"),
        }
        result
    }

    async fn capture_and_persist(&self, cart: &CartStore) -> Result<OrderRecord> {
        let user = require_user(self.identity.as_ref()).await?;
        let snapshot = OrderSnapshot::capture(&cart.snapshot(), &user, Utc::now())?;
        self.bounded(self.orders.insert(snapshot)).await
    }

    /// The signed-in user's most recent order.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` if nobody is signed in, `NotFound` if the user has
    /// no orders, `PersistenceFailure` if the read fails.
    #[instrument(skip(self))]
    pub async fn latest_order(&self) -> Result<OrderRecord> {
        let result: Result<OrderRecord> = async {
            let user = require_user(self.identity.as_ref()).await?;
            self.bounded(self.orders.latest_for_user(&user.id))
                .await?
                .ok_or_else(|| StoreError::NotFound(format!("orders for user {}", user.id)))
        }
        .await;
        if let Err(err) = &result {
            report(err, "latest_order");
        }
        result
    }

    /// Every order for the signed-in user, newest first.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` if nobody is signed in, `NotFound` if the user has
    /// no orders, `PersistenceFailure` if the read fails.
    #[instrument(skip(self))]
    pub async fn order_history(&self) -> Result<Vec<OrderRecord>> {
        let result: Result<Vec<OrderRecord>> = async {
            let user = require_user(self.identity.as_ref()).await?;
            let orders = self.bounded(self.orders.all_for_user(&user.id)).await?;
            if orders.is_empty() {
                return Err(StoreError::NotFound(format!("orders for user {}", user.id)));
            }
            Ok(orders)
        }
        .await;
        if let Err(err) = &result {
            report(err, "order_history");
        }
        result
    }
}
