//! Browse the public product catalog.
//!
//! # Usage
//!
//! ```bash
//! # List every product
//! shopfront catalog list
//!
//! # List one category
//! shopfront catalog list --category jewelery
//!
//! # Show a single product
//! shopfront catalog show 1
//!
//! # List category names
//! shopfront catalog categories
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPFRONT_CATALOG_URL` - Catalog API base URL (default: <https://fakestoreapi.com>)

use shopfront::catalog::{CatalogSource, CategoryFilter, HttpCatalog, Product, Rating};
use shopfront::config::ShopConfig;
use shopfront_core::ProductId;
use tracing::info;

use super::CommandError;

/// Star bar for a rating, e.g. `***--` for 3 of 5.
fn star_bar(rating: Rating) -> String {
    let filled = usize::from(rating.stars());
    let empty = usize::from(Rating::MAX_STARS).saturating_sub(filled);
    format!("{}{}", "*".repeat(filled), "-".repeat(empty))
}

fn log_product(product: &Product) {
    info!(
        "  [{}] {} - {} ({}, {} {:.1}/5 from {})",
        product.id,
        product.title,
        product.price,
        product.category,
        star_bar(product.rating),
        product.rating.rate,
        product.rating.count
    );
}

/// List products, optionally limited to one category.
///
/// # Errors
///
/// Returns an error if the catalog API cannot be reached.
pub async fn list(config: &ShopConfig, category: Option<&str>) -> Result<(), CommandError> {
    let filter: CategoryFilter = category
        .unwrap_or_default()
        .parse()
        .unwrap_or_default();
    let catalog = HttpCatalog::new(&config.catalog);

    let products = catalog.list_products(&filter).await?;
    info!(category = %filter, count = products.len(), "Products");
    for product in &products {
        log_product(product);
    }
    Ok(())
}

/// Show a single product.
///
/// # Errors
///
/// Returns an error if the product does not exist or the API cannot be reached.
pub async fn show(config: &ShopConfig, id: &str) -> Result<(), CommandError> {
    let catalog = HttpCatalog::new(&config.catalog);
    let product = catalog.get_product(&ProductId::new(id)).await?;

    log_product(&product);
    if !product.description.is_empty() {
        info!("  {}", product.description);
    }
    if !product.image.is_empty() {
        info!("  Image: {}", product.image);
    }
    Ok(())
}

/// List category names.
///
/// # Errors
///
/// Returns an error if the catalog API cannot be reached.
pub async fn categories(config: &ShopConfig) -> Result<(), CommandError> {
    let catalog = HttpCatalog::new(&config.catalog);
    let names = catalog.list_categories().await?;
    info!(count = names.len(), "Categories");
    for name in names {
        info!("  {name}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_bar() {
        assert_eq!(star_bar(Rating { rate: 3.2, count: 7 }), "***--");
        assert_eq!(star_bar(Rating { rate: 4.6, count: 1 }), "*****");
        assert_eq!(star_bar(Rating::default()), "-----");
    }
}
