//! Product catalog.
//!
//! Views read products through [`CatalogSource`]. Two sources exist:
//! [`DocumentCatalog`] over the document store (which also supports
//! administration), and [`HttpCatalog`] over the public product-catalog API.
//! Both put a `moka` cache in front of their reads.

mod cache;
mod documents;
mod http;

pub use documents::DocumentCatalog;
pub use http::HttpCatalog;

use core::fmt;
use core::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shopfront_core::{Price, ProductId};

use crate::cart::CartProduct;
use crate::error::{Result, StoreError};

/// Customer rating summary.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rating {
    /// Average rating, 0 to 5.
    pub rate: f64,
    /// Number of ratings.
    pub count: u32,
}

impl Rating {
    /// Highest possible average rating.
    pub const MAX_RATE: f64 = 5.0;

    /// Number of stars in a full rating display.
    pub const MAX_STARS: u8 = 5;

    /// Number of whole stars to display, rounding half up.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn stars(&self) -> u8 {
        self.rate.clamp(0.0, Self::MAX_RATE).round() as u8
    }
}

/// The editable fields of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub title: String,
    pub price: Price,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub rating: Rating,
}

impl ProductDraft {
    /// Check the draft before it is written.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ValidationFailure` if the title is blank or the
    /// rating is outside `[0, 5]`. Negative prices are unrepresentable.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(StoreError::ValidationFailure(
                "product title is required".to_string(),
            ));
        }
        if !(0.0..=Rating::MAX_RATE).contains(&self.rating.rate) {
            return Err(StoreError::ValidationFailure(format!(
                "rating must be between 0 and 5 (got {})",
                self.rating.rate
            )));
        }
        Ok(())
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub description: String,
    pub category: String,
    pub image: String,
    pub rating: Rating,
}

impl Product {
    /// Attach an id to a draft.
    #[must_use]
    pub fn from_draft(id: ProductId, draft: ProductDraft) -> Self {
        Self {
            id,
            title: draft.title,
            price: draft.price,
            description: draft.description,
            category: draft.category,
            image: draft.image,
            rating: draft.rating,
        }
    }
}

impl From<&Product> for CartProduct {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            title: product.title.clone(),
            unit_price: product.price,
            image_url: product.image.clone(),
        }
    }
}

/// Category selection for product listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl CategoryFilter {
    /// Returns `true` if `category` passes the filter.
    #[must_use]
    pub fn accepts(&self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(name) => name == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = std::convert::Infallible;

    /// `""` and `"all"` (any case) select every category.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            Ok(Self::Named(s.to_owned()))
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Read access to a product catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Products in `filter`, in catalog order.
    async fn list_products(&self, filter: &CategoryFilter) -> Result<Vec<Product>>;

    /// A single product. Fails with `StoreError::NotFound` if it does not exist.
    async fn get_product(&self, id: &ProductId) -> Result<Product>;

    /// Category names, sorted.
    async fn list_categories(&self) -> Result<Vec<String>>;
}
