//! Shopping cart state and store.
//!
//! [`CartState`] is a plain value: an ordered list of [`LineItem`]s plus a
//! tax rate, with pure transition methods. [`CartStore`] wraps it for a
//! session, publishing every change to any number of subscribers.
//!
//! # Invariants
//!
//! - at most one line item per product id
//! - every line item has quantity >= 1; a transition that would take a
//!   quantity to zero or below removes the line instead
//! - item count, subtotal and total are derived on every read, never stored

mod store;

pub use store::{CartStore, TaxRateChange};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopfront_core::{Price, ProductId, TaxRate};

/// The product fields the cart needs to display and price a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProduct {
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: Price,
    pub image_url: String,
}

/// One product entry in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: Price,
    pub image_url: String,
    pub quantity: u32,
}

impl LineItem {
    fn first_unit(product: CartProduct) -> Self {
        Self {
            product_id: product.product_id,
            title: product.title,
            unit_price: product.unit_price,
            image_url: product.image_url,
            quantity: 1,
        }
    }

    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// The full in-memory cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawCart")]
pub struct CartState {
    items: Vec<LineItem>,
    tax_rate: TaxRate,
}

impl Default for CartState {
    fn default() -> Self {
        Self::new(TaxRate::default())
    }
}

impl CartState {
    /// An empty cart with the given tax rate.
    #[must_use]
    pub const fn new(tax_rate: TaxRate) -> Self {
        Self {
            items: Vec::new(),
            tax_rate,
        }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// The line for `product_id`, if present.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&LineItem> {
        self.items.iter().find(|i| &i.product_id == product_id)
    }

    /// Current tax rate.
    #[must_use]
    pub const fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    /// Returns `true` if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Sum of line totals before tax.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// Tax owed on the subtotal.
    #[must_use]
    pub fn tax(&self) -> Price {
        self.tax_rate.tax_on(self.subtotal())
    }

    /// `subtotal * (1 + tax_rate)`.
    #[must_use]
    pub fn total(&self) -> Price {
        self.tax_rate.apply(self.subtotal())
    }

    /// Add one unit of `product`.
    ///
    /// Adding a product already in the cart increments its quantity by exactly
    /// one; otherwise a new line with quantity 1 is appended.
    pub fn add_item(&mut self, product: CartProduct) {
        if let Some(line) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product.product_id)
        {
            line.quantity = line.quantity.saturating_add(1);
        } else {
            self.items.push(LineItem::first_unit(product));
        }
    }

    /// Remove the line for `product_id`. Returns whether a line was removed.
    pub fn remove_item(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| &i.product_id != product_id);
        self.items.len() < before
    }

    /// Set the quantity for `product_id` to exactly `quantity`.
    ///
    /// A quantity of zero or below removes the line. Unknown products are
    /// ignored. Returns whether the cart changed.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: i64) -> bool {
        let quantity = u32::try_from(quantity.max(0)).unwrap_or(u32::MAX);
        if quantity == 0 {
            return self.remove_item(product_id);
        }
        match self.items.iter_mut().find(|i| &i.product_id == product_id) {
            Some(line) if line.quantity != quantity => {
                line.quantity = quantity;
                true
            }
            _ => false,
        }
    }

    /// Replace the tax rate, clamping into `[0, 1]`.
    ///
    /// Returns the rate actually applied and whether the input was clamped.
    pub fn set_tax_rate(&mut self, rate: Decimal) -> (TaxRate, bool) {
        let (rate, clamped) = TaxRate::clamped(rate);
        self.tax_rate = rate;
        (rate, clamped)
    }

    /// Remove every line. The tax rate is kept. Returns whether the cart changed.
    pub fn clear(&mut self) -> bool {
        let had_items = !self.items.is_empty();
        self.items.clear();
        had_items
    }
}

/// Unvalidated cart as read from storage, normalised into a [`CartState`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCart {
    items: Vec<LineItem>,
    tax_rate: Decimal,
}

impl TryFrom<RawCart> for CartState {
    type Error = std::convert::Infallible;

    /// Lines with zero quantity are dropped and duplicate product ids merged,
    /// so a stored cart can never violate the cart invariants.
    fn try_from(raw: RawCart) -> Result<Self, Self::Error> {
        let (tax_rate, _) = TaxRate::clamped(raw.tax_rate);
        let mut cart = Self::new(tax_rate);
        for item in raw.items.into_iter().filter(|i| i.quantity > 0) {
            match cart.items.iter_mut().find(|i| i.product_id == item.product_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                }
                None => cart.items.push(item),
            }
        }
        Ok(cart)
    }
}
