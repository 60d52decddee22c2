//! Order capture.
//!
//! Checkout turns the current cart into an immutable [`OrderSnapshot`],
//! persists it to the `orders` collection keyed by the buyer's user id, and
//! only then clears the cart. [`CheckoutService`] runs that workflow and
//! serves the confirmation and history reads.

mod checkout;
mod repository;

pub use checkout::CheckoutService;
pub use repository::OrderRepository;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use shopfront_core::{Email, OrderId, OrderNumber, OrderStatus, Price, TaxRate, UserId};

use crate::cart::{CartState, LineItem};
use crate::error::{Result, StoreError};
use crate::identity::CurrentUser;

/// Everything captured about an order at checkout. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSnapshot {
    pub order_number: OrderNumber,
    pub items: Vec<LineItem>,
    pub subtotal: Price,
    pub tax_rate: TaxRate,
    pub total: Price,
    pub user_id: UserId,
    pub user_email: Email,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: OrderStatus,
}

impl OrderSnapshot {
    /// Capture `cart` for `user` at `at`.
    ///
    /// Line items are deep-copied, so later cart mutations never reach the
    /// snapshot. Totals are computed once, here. `at` is truncated to the
    /// microsecond precision orders are stored with.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ValidationFailure` if the cart is empty.
    pub fn capture(cart: &CartState, user: &CurrentUser, at: DateTime<Utc>) -> Result<Self> {
        if cart.is_empty() {
            return Err(StoreError::ValidationFailure(
                "cannot place an order with an empty cart".to_string(),
            ));
        }
        Ok(Self {
            order_number: OrderNumber::generate(at),
            items: cart.items().to_vec(),
            subtotal: cart.subtotal(),
            tax_rate: cart.tax_rate(),
            total: cart.total(),
            user_id: user.id.clone(),
            user_email: user.email.clone(),
            created_at: at.trunc_subsecs(6),
            status: OrderStatus::Confirmed,
        })
    }

    /// Tax charged on the order.
    #[must_use]
    pub fn tax(&self) -> Price {
        self.tax_rate.tax_on(self.subtotal)
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }
}

/// A persisted order with its store-assigned id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub id: OrderId,
    pub order: OrderSnapshot,
}

impl std::ops::Deref for OrderRecord {
    type Target = OrderSnapshot;

    fn deref(&self) -> &Self::Target {
        &self.order
    }
}
