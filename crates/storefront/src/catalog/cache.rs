//! Cache types for catalog reads.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use shopfront_core::ProductId;

use super::{CategoryFilter, Product};

/// Cache key for products and listings.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products(CategoryFilter),
    Categories,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Arc<Vec<Product>>),
    Categories(Arc<Vec<String>>),
}

pub type CatalogCache = Cache<CacheKey, CacheValue>;

pub fn build(capacity: u64, ttl: Duration) -> CatalogCache {
    Cache::builder()
        .max_capacity(capacity)
        .time_to_live(ttl)
        .build()
}
