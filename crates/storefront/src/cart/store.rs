//! Observable cart for a single session.

use std::sync::Arc;

use rust_decimal::Decimal;
use shopfront_core::{ProductId, TaxRate};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::{CartProduct, CartState};

/// Outcome of [`CartStore::set_tax_rate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxRateChange {
    /// The rate now in effect.
    pub rate: TaxRate,
    /// Whether the requested rate was outside `[0, 1]` and had to be clamped.
    pub clamped: bool,
}

/// Session-scoped cart shared by every view.
///
/// Mutations are applied atomically and published to subscribers. A mutation
/// that leaves the cart unchanged does not wake subscribers. Cheaply
/// cloneable; clones share the same cart.
#[derive(Clone)]
pub struct CartStore {
    state: Arc<watch::Sender<CartState>>,
}

impl CartStore {
    /// Create an empty cart taxed at `tax_rate`.
    #[must_use]
    pub fn new(tax_rate: TaxRate) -> Self {
        let (state, _) = watch::channel(CartState::new(tax_rate));
        Self {
            state: Arc::new(state),
        }
    }

    /// Subscribe to cart changes. The receiver sees the current cart immediately.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.subscribe()
    }

    /// A copy of the current cart.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.state.borrow().clone()
    }

    /// Add one unit of `product`.
    pub fn add_item(&self, product: CartProduct) {
        let product_id = product.product_id.clone();
        self.state.send_modify(|cart| cart.add_item(product));
        debug!(%product_id, "Added to cart");
    }

    /// Remove the line for `product_id`. Unknown ids are ignored.
    pub fn remove_item(&self, product_id: &ProductId) {
        if self.state.send_if_modified(|cart| cart.remove_item(product_id)) {
            debug!(%product_id, "Removed from cart");
        }
    }

    /// Set the quantity for `product_id`; zero or below removes the line.
    pub fn set_quantity(&self, product_id: &ProductId, quantity: i64) {
        if self
            .state
            .send_if_modified(|cart| cart.set_quantity(product_id, quantity))
        {
            debug!(%product_id, quantity, "Cart quantity set");
        }
    }

    /// Replace the tax rate, clamping into `[0, 1]`.
    pub fn set_tax_rate(&self, rate: Decimal) -> TaxRateChange {
        let mut change = TaxRateChange {
            rate: TaxRate::ZERO,
            clamped: false,
        };
        self.state.send_if_modified(|cart| {
            let previous = cart.tax_rate();
            let (rate, clamped) = cart.set_tax_rate(rate);
            change = TaxRateChange { rate, clamped };
            previous != rate
        });
        if change.clamped {
            warn!(requested = %rate, applied = %change.rate, "Tax rate out of range; clamped");
        }
        change
    }

    /// Empty the cart, keeping the tax rate.
    pub fn clear(&self) {
        if self.state.send_if_modified(CartState::clear) {
            debug!("Cart cleared");
        }
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new(TaxRate::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopfront_core::Price;

    use super::*;

    fn product(id: &str, cents: i64) -> CartProduct {
        CartProduct {
            product_id: ProductId::new(id),
            title: id.to_uppercase(),
            unit_price: Price::from_cents(cents).unwrap(),
            image_url: String::new(),
        }
    }

    #[test]
    fn test_subscribers_see_mutations() {
        let cart = CartStore::default();
        let mut rx = cart.subscribe();
        assert!(rx.borrow_and_update().is_empty());

        cart.add_item(product("a", 1000));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().item_count(), 1);

        cart.add_item(product("a", 1000));
        cart.add_item(product("b", 500));
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.subtotal(), Price::from_cents(2500).unwrap());
        assert_eq!(state.total(), Price::from_cents(2700).unwrap());
    }

    #[test]
    fn test_noop_mutations_do_not_notify() {
        let cart = CartStore::default();
        cart.add_item(product("a", 1000));
        let mut rx = cart.subscribe();
        rx.borrow_and_update();

        cart.remove_item(&ProductId::new("missing"));
        cart.set_quantity(&ProductId::new("missing"), 3);
        cart.set_quantity(&ProductId::new("a"), 1);
        cart.set_tax_rate(Decimal::new(8, 2));
        assert!(!rx.has_changed().unwrap());

        cart.set_quantity(&ProductId::new("a"), 0);
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_empty());
    }

    #[test]
    fn test_set_tax_rate_reports_clamping() {
        let cart = CartStore::default();
        let change = cart.set_tax_rate(Decimal::new(-5, 2));
        assert!(change.clamped);
        assert_eq!(change.rate, TaxRate::ZERO);
        assert_eq!(cart.snapshot().tax_rate(), TaxRate::ZERO);

        let change = cart.set_tax_rate(Decimal::new(10, 2));
        assert!(!change.clamped);
        assert_eq!(change.rate, TaxRate::from_basis_points(1000));
    }

    #[test]
    fn test_clones_share_state() {
        let cart = CartStore::default();
        let other = cart.clone();
        other.add_item(product("a", 100));
        assert_eq!(cart.snapshot().item_count(), 1);
        cart.clear();
        assert!(other.snapshot().is_empty());
    }
}
